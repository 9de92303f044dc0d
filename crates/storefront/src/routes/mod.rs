//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//!
//! # Products
//! GET  /products                  - Product listing (q, category, min, max, sort)
//! POST /products/{id}/quick-add   - Quick-add (notice fragment, triggers cart-updated)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                      - Cart page
//! GET  /cart/count                - Cart count badge (fragment)
//! POST /cart/clear                - Empty the cart (notice fragment, triggers cart-updated)
//! ```

pub mod cart;
pub mod home;
pub mod products;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    routing::{get, post},
};

use crate::services::Notice;
use crate::state::AppState;

/// Notice fragment returned by cart actions (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/notice.html")]
pub struct NoticeTemplate {
    pub kind: &'static str,
    pub message: String,
}

impl From<Notice> for NoticeTemplate {
    fn from(notice: Notice) -> Self {
        Self {
            kind: notice.kind.as_str(),
            message: notice.message,
        }
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}/quick-add", post(products::quick_add_to_cart))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/clear", post(cart::clear))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
}

#[cfg(test)]
mod tests {
    use crate::services::NoticeKind;

    use super::*;

    #[test]
    fn test_notice_fragment_carries_kind() {
        let html = NoticeTemplate::from(Notice::new(NoticeKind::Warning, "Sorry"))
            .render()
            .unwrap_or_default();

        assert!(html.contains("notice--warning"));
        assert!(html.contains("Sorry"));
    }
}
