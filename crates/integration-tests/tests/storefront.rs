//! End-to-end tests for the storefront against a stub Glemora API.
//!
//! Each test starts its own storefront and stub API on ephemeral ports, so
//! no external services are needed.
//!
//! Run with: cargo test -p glemora-integration-tests

use glemora_integration_tests::{REJECTED_TOKEN, TestContext};
use reqwest::StatusCode;

const EMPTY_FORM: &[(&str, &str)] = &[];

async fn context() -> TestContext {
    TestContext::new()
        .await
        .expect("Failed to start test servers")
}

async fn text(ctx: &TestContext, path: &str) -> (StatusCode, String) {
    let resp = ctx
        .client
        .get(ctx.url(path))
        .send()
        .await
        .expect("Request failed");
    let status = resp.status();
    (status, resp.text().await.expect("Failed to read body"))
}

async fn quick_add(ctx: &TestContext, id: i64, form: &[(&str, &str)]) -> (StatusCode, String) {
    let resp = ctx
        .client
        .post(ctx.url(&format!("/products/{id}/quick-add")))
        .form(form)
        .send()
        .await
        .expect("Request failed");
    let status = resp.status();
    (status, resp.text().await.expect("Failed to read body"))
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = context().await;

    assert_eq!(text(&ctx, "/health").await, (StatusCode::OK, "ok".to_string()));
    assert_eq!(text(&ctx, "/health/ready").await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_home_page() {
    let ctx = context().await;

    let (status, body) = text(&ctx, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Visit our Premium outlet"));
    assert!(body.contains("Subscribe to our Newsletter"));
    assert!(body.contains("/products?q=dresses"));
}

#[tokio::test]
async fn test_products_page_lists_catalog() {
    let ctx = context().await;

    let (status, body) = text(&ctx, "/products").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Red Dress"));
    assert!(body.contains("Linen Shirt"));
    assert!(body.contains("Pleated Skirt"));
    assert!(body.contains("LKR 800.00"));
    assert!(body.contains("Out of stock"));
}

#[tokio::test]
async fn test_products_page_filters() {
    let ctx = context().await;

    let (_, body) = text(&ctx, "/products?q=DRESS").await;
    assert!(body.contains("Red Dress"));
    assert!(!body.contains("Linen Shirt"));

    let (_, body) = text(&ctx, "/products?category=3&category=4").await;
    assert!(!body.contains("Red Dress"));
    assert!(body.contains("Linen Shirt"));
    assert!(body.contains("Pleated Skirt"));

    let (_, body) = text(&ctx, "/products?min=0&max=1200").await;
    assert!(body.contains("Red Dress"));
    assert!(!body.contains("Pleated Skirt"));
}

#[tokio::test]
async fn test_products_page_sorts_by_price() {
    let ctx = context().await;

    let (_, body) = text(&ctx, "/products?sort=priceDesc").await;
    let shirt = body.find("Linen Shirt").expect("shirt listed");
    let skirt = body.find("Pleated Skirt").expect("skirt listed");
    let dress = body.find("Red Dress").expect("dress listed");
    assert!(shirt < skirt && skirt < dress);
}

#[tokio::test]
async fn test_products_page_empty_state() {
    let ctx = context().await;

    let (status, body) = text(&ctx, "/products?q=tuxedo").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No products found matching your criteria."));
}

// ============================================================================
// Anonymous quick-add
// ============================================================================

#[tokio::test]
async fn test_anonymous_quick_add_merges_lines() {
    let ctx = context().await;

    let (status, body) = quick_add(&ctx, 1, EMPTY_FORM).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Product added to cart!"));

    quick_add(&ctx, 1, EMPTY_FORM).await;
    quick_add(&ctx, 1, &[("size", "L"), ("quantity", "2")]).await;

    let (_, badge) = text(&ctx, "/cart/count").await;
    assert!(badge.contains(">4<"));

    let (status, cart) = text(&ctx, "/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart.matches("<tr>").count(), 3); // header + (1, M) + (1, L)
    assert!(cart.contains("LKR 1600.00")); // 2 x sale price
    assert!(cart.contains("LKR 3200.00")); // subtotal

    assert!(ctx.cart_calls().is_empty());
}

#[tokio::test]
async fn test_quick_add_rejects_insufficient_stock() {
    let ctx = context().await;

    // Notices answer 200 so htmx swaps them into #notices
    let (status, body) = quick_add(&ctx, 3, EMPTY_FORM).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("notice--warning"));
    assert!(body.contains("Sorry, only 0 items available in stock."));

    let (status, body) = quick_add(&ctx, 2, &[("quantity", "4")]).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Sorry, only 3 items available in stock."));

    let (_, badge) = text(&ctx, "/cart/count").await;
    assert!(!badge.contains("cart-count"));
    assert!(ctx.cart_calls().is_empty());
}

#[tokio::test]
async fn test_quick_add_reports_bad_requests_as_notices() {
    let ctx = context().await;

    let (status, body) = quick_add(&ctx, 1, &[("quantity", "0")]).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("quantity must be a positive integer, got 0"));

    let (status, body) = quick_add(&ctx, 99, EMPTY_FORM).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("This product is no longer available."));

    let (_, badge) = text(&ctx, "/cart/count").await;
    assert!(!badge.contains("cart-count"));
}

#[tokio::test]
async fn test_clear_cart() {
    let ctx = context().await;

    quick_add(&ctx, 2, EMPTY_FORM).await;
    let resp = ctx
        .client
        .post(ctx.url("/cart/clear"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("HX-Trigger").and_then(|v| v.to_str().ok()),
        Some("cart-updated")
    );

    let (_, cart) = text(&ctx, "/cart").await;
    assert!(cart.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_carts_are_per_session() {
    let ctx = context().await;
    quick_add(&ctx, 2, EMPTY_FORM).await;

    let other = reqwest::Client::new();
    let badge = other
        .get(ctx.url("/cart/count"))
        .send()
        .await
        .expect("Request failed")
        .text()
        .await
        .expect("Failed to read body");

    assert!(!badge.contains("cart-count"));
}

// ============================================================================
// Signed-in quick-add
// ============================================================================

#[tokio::test]
async fn test_authenticated_quick_add_posts_to_remote_cart() {
    let ctx = context().await;

    let resp = ctx
        .client
        .post(ctx.url("/products/2/quick-add"))
        .bearer_auth("shopper-token")
        .form(EMPTY_FORM)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.text()
            .await
            .expect("Failed to read body")
            .contains("Product added to cart!")
    );

    let calls = ctx.cart_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer shopper-token"));
    assert_eq!(calls[0].query.get("productId").map(String::as_str), Some("2"));
    assert_eq!(calls[0].query.get("quantity").map(String::as_str), Some("1"));
    assert_eq!(calls[0].query.get("size").map(String::as_str), Some("M"));

    // The local cart is untouched
    let (_, badge) = text(&ctx, "/cart/count").await;
    assert!(!badge.contains("cart-count"));
}

#[tokio::test]
async fn test_remote_cart_failure_is_reported() {
    let ctx = context().await;

    let resp = ctx
        .client
        .post(ctx.url("/products/1/quick-add"))
        .bearer_auth(REJECTED_TOKEN)
        .form(EMPTY_FORM)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("HX-Trigger").is_none());
    assert!(
        resp.text()
            .await
            .expect("Failed to read body")
            .contains("Failed to add product to cart. Please try again.")
    );

    assert_eq!(ctx.cart_calls().len(), 1);
    let (_, badge) = text(&ctx, "/cart/count").await;
    assert!(!badge.contains("cart-count"));
}
