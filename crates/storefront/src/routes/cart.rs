//! Cart route handlers.
//!
//! These views cover the anonymous shopper's session cart. Signed-in
//! shoppers' carts live behind the API and are not mirrored here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use glemora_core::{Cart, CartLine, CurrencyCode, Price};
use tower_sessions::Session;
use tracing::instrument;

use crate::cart::{CartAggregator, CartError, SessionCartStore};
use crate::error::AppError;
use crate::filters;
use crate::routes::NoticeTemplate;
use crate::services::{Notice, NoticeKind};
use crate::state::AppState;

/// Shown when the stored cart cannot be read.
pub const UNREADABLE_CART_MESSAGE: &str =
    "Your saved cart could not be read. Clear it to start over.";

const CLEAR_FAILED_MESSAGE: &str = "Your cart could not be cleared. Please try again.";

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub size: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: Option<String>,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty(currency: CurrencyCode) -> Self {
        Self::new(&Cart::new(), currency)
    }

    #[must_use]
    pub fn new(cart: &Cart, currency: CurrencyCode) -> Self {
        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| CartItemView::new(line, currency))
                .collect(),
            subtotal: Price::new(cart.subtotal(), currency).to_string(),
            item_count: cart.item_count(),
        }
    }
}

impl CartItemView {
    fn new(line: &CartLine, currency: CurrencyCode) -> Self {
        Self {
            product_id: line.product_id.to_string(),
            name: line.name.clone(),
            size: line.size.clone(),
            quantity: line.quantity.get(),
            price: Price::new(line.price, currency).to_string(),
            line_price: Price::new(line.line_total(), currency).to_string(),
            image: line.image.clone(),
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub notice: Option<Notice>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

fn session_cart(session: Session) -> CartAggregator<SessionCartStore> {
    CartAggregator::new(SessionCartStore::new(session))
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let currency = state.config().currency;

    let page = match session_cart(session).load().await {
        Ok(cart) => CartShowTemplate {
            cart: CartView::new(&cart, currency),
            notice: None,
        },
        Err(CartError::MalformedStoredCart(_)) => CartShowTemplate {
            cart: CartView::empty(currency),
            notice: Some(Notice::new(NoticeKind::Error, UNREADABLE_CART_MESSAGE)),
        },
        Err(e) => return Err(e.into()),
    };

    Ok(page.into_response())
}

/// Get cart count badge (HTMX).
///
/// An unreadable cart counts as zero items.
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let count = session_cart(session)
        .load()
        .await
        .map(|cart| cart.item_count())
        .unwrap_or(0);

    CartCountTemplate { count }
}

/// Empty the session cart (HTMX).
///
/// Answers `200 OK` with a notice either way so htmx swaps it in.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Response {
    let _guard = match session.id() {
        Some(session_id) => Some(state.cart_locks().acquire(&session_id.to_string()).await),
        None => None,
    };

    match session_cart(session).clear().await {
        Ok(()) => {
            tracing::info!("Cart cleared");
            (
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                NoticeTemplate::from(Notice::new(NoticeKind::Success, "Cart cleared.")),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Error clearing cart");
            NoticeTemplate::from(Notice::new(NoticeKind::Error, CLEAR_FAILED_MESSAGE))
                .into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glemora_core::{Product, ProductId, Quantity};
    use rust_decimal::Decimal;

    use super::*;

    fn cart() -> Cart {
        let product = Product {
            id: ProductId::new(5),
            name: "Shirt".to_string(),
            description: None,
            price: Decimal::new(2000, 0),
            sale_price: None,
            sale: false,
            image: None,
            category: None,
            stock_quantity: 9,
        };
        let mut cart = Cart::new();
        cart.add(&product, "L", Quantity::new(2).unwrap()).unwrap();
        cart
    }

    #[test]
    fn test_cart_view_totals() {
        let view = CartView::new(&cart(), CurrencyCode::LKR);

        assert_eq!(view.item_count, 2);
        assert_eq!(view.subtotal, "LKR 4000.00");
        assert_eq!(view.items[0].price, "LKR 2000.00");
        assert_eq!(view.items[0].line_price, "LKR 4000.00");
        assert_eq!(view.items[0].size, "L");
    }

    #[test]
    fn test_cart_page_renders_lines() {
        let html = CartShowTemplate {
            cart: CartView::new(&cart(), CurrencyCode::LKR),
            notice: None,
        }
        .render()
        .unwrap();

        assert!(html.contains("Shirt"));
        assert!(html.contains("LKR 4000.00"));
    }

    #[test]
    fn test_unreadable_cart_page_offers_clear() {
        let html = CartShowTemplate {
            cart: CartView::empty(CurrencyCode::LKR),
            notice: Some(Notice::new(NoticeKind::Error, UNREADABLE_CART_MESSAGE)),
        }
        .render()
        .unwrap();

        assert!(html.contains("could not be read"));
        assert!(html.contains("/cart/clear"));
    }
}
