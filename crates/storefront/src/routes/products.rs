//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Response},
};
use glemora_core::{Category, CurrencyCode, Price, Product, ProductId, Quantity};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::cart::{CartAggregator, SessionCartStore};
use crate::catalog::{CatalogFilter, ProductCatalog, SortKey};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::CurrentShopper;
use crate::routes::NoticeTemplate;
use crate::services::quick_add::FAILED_MESSAGE;
use crate::services::{Notice, NoticeKind, quick_add};
use crate::state::AppState;

/// Message shown when the catalog cannot be loaded.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load products. Please try again later.";

/// Product card data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: ProductId,
    pub name: String,
    /// What the shopper pays now.
    pub price: String,
    /// Regular price, shown struck through while on sale.
    pub regular_price: Option<String>,
    pub image: Option<String>,
    pub in_stock: bool,
}

impl ProductCardView {
    fn new(product: &Product, currency: CurrencyCode) -> Self {
        let unit_price = product.unit_price();
        Self {
            id: product.id,
            name: product.name.clone(),
            price: Price::new(unit_price, currency).to_string(),
            regular_price: (unit_price != product.price)
                .then(|| Price::new(product.price, currency).to_string()),
            image: product.image.clone(),
            in_stock: product.stock_quantity > 0,
        }
    }

    #[must_use]
    pub const fn on_sale(&self) -> bool {
        self.regular_price.is_some()
    }
}

/// Category checkbox data for templates.
#[derive(Clone)]
pub struct CategoryOptionView {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// Sort menu entry for templates.
#[derive(Clone)]
pub struct SortOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCardView>,
    pub categories: Vec<CategoryOptionView>,
    pub sort_options: Vec<SortOptionView>,
    pub search: String,
    pub min_price: String,
    pub max_price: String,
    pub error: Option<String>,
}

impl ProductsIndexTemplate {
    fn new(catalog: &ProductCatalog, filter: &CatalogFilter, currency: CurrencyCode) -> Self {
        Self {
            products: catalog
                .view(filter)
                .iter()
                .map(|p| ProductCardView::new(p, currency))
                .collect(),
            categories: category_options(catalog.categories(), filter),
            error: None,
            ..Self::form_only(filter)
        }
    }

    fn failed(filter: &CatalogFilter) -> Self {
        Self {
            error: Some(LOAD_FAILED_MESSAGE.to_string()),
            ..Self::form_only(filter)
        }
    }

    fn form_only(filter: &CatalogFilter) -> Self {
        Self {
            products: Vec::new(),
            categories: Vec::new(),
            sort_options: SortKey::ALL
                .into_iter()
                .map(|key| SortOptionView {
                    value: key.as_str(),
                    label: key.label(),
                    selected: key == filter.sort,
                })
                .collect(),
            search: filter.search.clone(),
            min_price: filter.price_range.min.normalize().to_string(),
            max_price: filter.price_range.max.normalize().to_string(),
            error: None,
        }
    }
}

fn category_options(categories: &[Category], filter: &CatalogFilter) -> Vec<CategoryOptionView> {
    categories
        .iter()
        .map(|c| CategoryOptionView {
            id: c.id.to_string(),
            name: c.name.clone(),
            selected: filter.is_selected(c.id),
        })
        .collect()
}

/// Display product listing page.
///
/// Query parameters: `q`, `category` (repeatable), `min`, `max`, `sort`.
#[instrument(skip(state, pairs))]
pub async fn index(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let filter = CatalogFilter::from_query_pairs(pairs);

    match ProductCatalog::load(state.api()).await {
        Ok(catalog) => {
            ProductsIndexTemplate::new(&catalog, &filter, state.config().currency).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Error fetching catalog");
            (StatusCode::BAD_GATEWAY, ProductsIndexTemplate::failed(&filter)).into_response()
        }
    }
}

/// Quick-add form data.
#[derive(Debug, Deserialize)]
pub struct QuickAddForm {
    pub size: Option<String>,
    pub quantity: Option<i64>,
}

/// Shown when the posted product id no longer exists.
const UNKNOWN_PRODUCT_MESSAGE: &str = "This product is no longer available.";

/// Add a product to the shopper's cart from the product grid (HTMX).
///
/// Every outcome is a notice fragment answered with `200 OK`, since htmx
/// only swaps successful responses into `#notices`. Success also triggers
/// `cart-updated`.
#[instrument(skip(state, session, shopper))]
pub async fn quick_add_to_cart(
    State(state): State<AppState>,
    session: Session,
    CurrentShopper(shopper): CurrentShopper,
    Path(id): Path<ProductId>,
    Form(form): Form<QuickAddForm>,
) -> Response {
    let quantity = match Quantity::new(form.quantity.unwrap_or(1)) {
        Ok(quantity) => quantity,
        Err(e) => return notice(NoticeKind::Warning, e.to_string()),
    };
    let size = form
        .size
        .unwrap_or_else(|| state.config().quick_add_size.clone());

    let product = match state.api().find_product(id).await {
        Ok(Some(product)) => product,
        Ok(None) => return notice(NoticeKind::Warning, UNKNOWN_PRODUCT_MESSAGE),
        Err(e) => {
            tracing::error!(error = %e, "Error fetching product for quick-add");
            return notice(NoticeKind::Error, FAILED_MESSAGE);
        }
    };

    let product_id = id.to_string();
    add_breadcrumb(
        "cart",
        "Quick-add",
        Some(&[("product_id", product_id.as_str()), ("size", size.as_str())]),
    );

    // Serialize read-modify-write of this session's cart
    let _guard = match session.id() {
        Some(session_id) if !shopper.is_authenticated() => {
            Some(state.cart_locks().acquire(&session_id.to_string()).await)
        }
        _ => None,
    };

    let local = CartAggregator::new(SessionCartStore::new(session));
    match quick_add(state.api(), &local, &shopper, &product, &size, quantity).await {
        Ok(outcome) => (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            NoticeTemplate::from(outcome.notice()),
        )
            .into_response(),
        Err(err) => NoticeTemplate::from(err.notice()).into_response(),
    }
}

fn notice(kind: NoticeKind, message: impl Into<String>) -> Response {
    NoticeTemplate::from(Notice::new(kind, message)).into_response()
}

#[cfg(test)]
mod tests {
    use glemora_core::CategoryId;
    use rust_decimal::Decimal;

    use super::*;

    fn catalog() -> ProductCatalog {
        ProductCatalog::new(
            vec![
                Product {
                    id: ProductId::new(1),
                    name: "Red Dress".to_string(),
                    description: None,
                    price: Decimal::new(1000, 0),
                    sale_price: Some(Decimal::new(800, 0)),
                    sale: true,
                    image: Some("https://cdn.glemora.lk/red.jpg".to_string()),
                    category: Some(Category {
                        id: CategoryId::new(2),
                        name: "Dresses".to_string(),
                    }),
                    stock_quantity: 0,
                },
                Product {
                    id: ProductId::new(2),
                    name: "Linen Shirt".to_string(),
                    description: None,
                    price: Decimal::new(2500, 0),
                    sale_price: None,
                    sale: false,
                    image: None,
                    category: None,
                    stock_quantity: 3,
                },
            ],
            vec![Category {
                id: CategoryId::new(2),
                name: "Dresses".to_string(),
            }],
        )
    }

    #[test]
    fn test_product_card_shows_sale_price() {
        let card = ProductCardView::new(&catalog().products()[0], CurrencyCode::LKR);

        assert_eq!(card.price, "LKR 800.00");
        assert_eq!(card.regular_price.as_deref(), Some("LKR 1000.00"));
        assert!(card.on_sale());
        assert!(!card.in_stock);
    }

    #[test]
    fn test_index_template_renders_filtered_grid() {
        let filter = CatalogFilter::from_query_pairs([("q", "dress"), ("category", "2")]);
        let html = ProductsIndexTemplate::new(&catalog(), &filter, CurrencyCode::LKR)
            .render()
            .unwrap_or_default();

        assert!(html.contains("Red Dress"));
        assert!(!html.contains("Linen Shirt"));
        assert!(html.contains("/products/1/quick-add"));
        assert!(html.contains("SALE"));
    }

    #[test]
    fn test_index_template_renders_empty_state() {
        let filter = CatalogFilter::from_query_pairs([("q", "tuxedo")]);
        let html = ProductsIndexTemplate::new(&catalog(), &filter, CurrencyCode::LKR)
            .render()
            .unwrap_or_default();

        assert!(html.contains("No products found matching your criteria."));
    }

    #[test]
    fn test_failed_template_shows_only_error() {
        let html = ProductsIndexTemplate::failed(&CatalogFilter::default())
            .render()
            .unwrap_or_default();

        assert!(html.contains(LOAD_FAILED_MESSAGE));
        assert!(!html.contains("quick-add"));
    }
}
