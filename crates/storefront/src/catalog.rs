//! Product catalog loading and client-side derivation.
//!
//! The whole catalog is fetched once per page view and filtered/sorted in
//! memory; there is no server-side search or pagination.

use std::cmp::{Ordering, Reverse};
use std::str::FromStr;

use feruca::Collator;
use glemora_core::{Category, CategoryId, Product};
use rust_decimal::Decimal;
use tracing::instrument;

use crate::api::{ApiClient, ApiError};

/// Default upper bound of the price filter.
pub const DEFAULT_MAX_PRICE: Decimal = Decimal::from_parts(200_000, 0, 0, false, 0);

// =============================================================================
// Filter Parameters
// =============================================================================

/// Sort order for the product grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Keep the catalog order.
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortKey {
    /// All options in the order they appear in the sort menu.
    pub const ALL: [Self; 5] = [
        Self::Default,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::NameAsc,
        Self::NameDesc,
    ];

    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::PriceAsc => "priceAsc",
            Self::PriceDesc => "priceDesc",
            Self::NameAsc => "nameAsc",
            Self::NameDesc => "nameDesc",
        }
    }

    /// Human-readable label for the sort menu.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Default => "Sort By",
            Self::PriceAsc => "Price: Low to High",
            Self::PriceDesc => "Price: High to Low",
            Self::NameAsc => "Name: A to Z",
            Self::NameDesc => "Name: Z to A",
        }
    }

    /// Sort `products` in place. Every ordering is stable.
    pub fn apply(self, products: &mut [Product]) {
        match self {
            Self::Default => {}
            Self::PriceAsc => products.sort_by_key(|p| p.price),
            Self::PriceDesc => products.sort_by_key(|p| Reverse(p.price)),
            Self::NameAsc => sort_by_name(products, Ordering::Less),
            Self::NameDesc => sort_by_name(products, Ordering::Greater),
        }
    }
}

/// Stable name sort under the Unicode collation algorithm, with code-point
/// order as the tie break. `first` is what "a before b" maps to.
fn sort_by_name(products: &mut [Product], first: Ordering) {
    let mut collator = Collator::default();
    products.sort_by(|a, b| {
        let order = collator
            .collate(a.name.as_str(), b.name.as_str())
            .then_with(|| a.name.cmp(&b.name));
        if first == Ordering::Less {
            order
        } else {
            order.reverse()
        }
    });
}

impl FromStr for SortKey {
    type Err = std::convert::Infallible;

    /// Unrecognized values fall back to [`SortKey::Default`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .unwrap_or_default())
    }
}

/// Inclusive price bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceRange {
    #[must_use]
    pub const fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    /// Whether `price` lies within `[min, max]`.
    #[must_use]
    pub fn contains(&self, price: Decimal) -> bool {
        self.min <= price && price <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::new(Decimal::ZERO, DEFAULT_MAX_PRICE)
    }
}

/// Search, filter and sort parameters for the product grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Case-insensitive substring matched against product names.
    pub search: String,
    /// Selected categories; empty selects all.
    pub categories: Vec<CategoryId>,
    pub price_range: PriceRange,
    pub sort: SortKey,
}

impl CatalogFilter {
    /// Build a filter from decoded query-string pairs.
    ///
    /// Recognized keys: `q`, `category` (repeatable or comma-separated),
    /// `min`, `max`, `sort`. Unparseable values are ignored. The search term
    /// is kept verbatim; only numeric and key values are trimmed.
    #[must_use]
    pub fn from_query_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Self::default();

        for (key, value) in pairs {
            let raw = value.as_ref();
            let value = raw.trim();
            match key.as_ref() {
                "q" => raw.clone_into(&mut filter.search),
                "category" => {
                    for id in value.split(',').filter_map(|s| s.trim().parse().ok()) {
                        if !filter.categories.contains(&id) {
                            filter.categories.push(id);
                        }
                    }
                }
                "min" => {
                    if let Ok(min) = value.parse() {
                        filter.price_range.min = min;
                    }
                }
                "max" => {
                    if let Ok(max) = value.parse() {
                        filter.price_range.max = max;
                    }
                }
                "sort" => {
                    let Ok(sort) = value.parse();
                    filter.sort = sort;
                }
                _ => {}
            }
        }

        filter
    }

    /// Whether `product` passes the search, category and price predicates.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let matches_search = product
            .name
            .to_lowercase()
            .contains(&self.search.to_lowercase());
        let matches_category = self.categories.is_empty()
            || product
                .category_id()
                .is_some_and(|id| self.categories.contains(&id));
        let matches_price = self.price_range.contains(product.price);

        matches_search && matches_category && matches_price
    }

    /// Whether `id` is currently selected.
    #[must_use]
    pub fn is_selected(&self, id: CategoryId) -> bool {
        self.categories.contains(&id)
    }
}

/// Select `id` if it is not selected, deselect it otherwise.
pub fn toggle_category(selected: &mut Vec<CategoryId>, id: CategoryId) {
    if let Some(index) = selected.iter().position(|c| *c == id) {
        selected.remove(index);
    } else {
        selected.push(id);
    }
}

/// Filter and sort `products` without touching the input.
#[must_use]
pub fn derive_view(products: &[Product], filter: &CatalogFilter) -> Vec<Product> {
    let mut view: Vec<Product> = products
        .iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect();
    filter.sort.apply(&mut view);
    view
}

// =============================================================================
// Loaded Catalog
// =============================================================================

/// Products and categories held in memory for one page view.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: Vec<Product>,
    categories: Vec<Category>,
}

impl ProductCatalog {
    #[must_use]
    pub const fn new(products: Vec<Product>, categories: Vec<Category>) -> Self {
        Self {
            products,
            categories,
        }
    }

    /// Fetch products and categories from the API.
    ///
    /// # Errors
    ///
    /// Returns an error if either listing cannot be fetched; no partial
    /// catalog is produced.
    #[instrument(skip(api))]
    pub async fn load(api: &ApiClient) -> Result<Self, ApiError> {
        let (products, categories) = api.get_catalog().await?;
        Ok(Self::new(products, categories))
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// The filtered, sorted product grid.
    #[must_use]
    pub fn view(&self, filter: &CatalogFilter) -> Vec<Product> {
        derive_view(&self.products, filter)
    }
}
