//! Catalog entities as served by the Glemora REST API.
//!
//! Products and categories are owned by the backend and fetched read-only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A product listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Regular unit price.
    pub price: Decimal,
    /// Discounted unit price, only meaningful while `sale` is set.
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub sale: bool,
    /// URL of the product image.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub stock_quantity: u32,
}

impl Product {
    /// The price a shopper pays per unit right now.
    ///
    /// The sale price applies when the product is on sale; a sale without a
    /// sale price falls back to the regular price.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        match (self.sale, self.sale_price) {
            (true, Some(sale_price)) => sale_price,
            _ => self.price,
        }
    }

    /// Returns the category ID, if the product is categorized.
    #[must_use]
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category.as_ref().map(|c| c.id)
    }

    /// Whether at least `quantity` units are in stock.
    #[must_use]
    pub const fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock_quantity >= quantity
    }
}
