//! Catalog listing commands.

use glemora_core::{CategoryId, CurrencyCode, Price, Product};
use glemora_storefront::catalog::{CatalogFilter, PriceRange, ProductCatalog, SortKey};
use rust_decimal::Decimal;

use super::{CliError, api_client};

/// Build a filter from command-line arguments.
///
/// Missing bounds keep the default price range.
pub fn filter(
    search: String,
    categories: Vec<CategoryId>,
    min: Option<Decimal>,
    max: Option<Decimal>,
    sort: SortKey,
) -> CatalogFilter {
    let defaults = PriceRange::default();
    CatalogFilter {
        search,
        categories,
        price_range: PriceRange {
            min: min.unwrap_or(defaults.min),
            max: max.unwrap_or(defaults.max),
        },
        sort,
    }
}

/// One line of product output.
fn product_line(product: &Product, currency: CurrencyCode) -> String {
    let mut line = format!(
        "#{} {} - {}",
        product.id,
        product.name,
        Price::new(product.unit_price(), currency)
    );
    if product.unit_price() != product.price {
        line.push_str(" (SALE)");
    }
    if let Some(category) = &product.category {
        line.push_str(&format!(" [{}]", category.name));
    }
    if product.stock_quantity == 0 {
        line.push_str(" out of stock");
    } else {
        line.push_str(&format!(" {} in stock", product.stock_quantity));
    }
    line
}

/// List products matching `filter`.
pub async fn products(
    api_url: &str,
    filter: &CatalogFilter,
    currency: CurrencyCode,
) -> Result<(), CliError> {
    let catalog = ProductCatalog::load(&api_client(api_url)?).await?;
    let view = catalog.view(filter);

    if view.is_empty() {
        tracing::info!("No products found matching your criteria.");
        return Ok(());
    }

    for product in &view {
        tracing::info!("{}", product_line(product, currency));
    }
    tracing::info!("{} of {} products", view.len(), catalog.products().len());
    Ok(())
}

/// List categories.
pub async fn categories(api_url: &str) -> Result<(), CliError> {
    let categories = api_client(api_url)?.get_categories().await?;

    for category in &categories {
        tracing::info!("#{} {}", category.id, category.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use glemora_core::{Category, ProductId};

    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new(7),
            name: "Floral Maxi Dress".to_string(),
            description: None,
            price: Decimal::new(4500, 0),
            sale_price: Some(Decimal::new(3590, 0)),
            sale: true,
            image: None,
            category: Some(Category {
                id: CategoryId::new(1),
                name: "Dresses".to_string(),
            }),
            stock_quantity: 4,
        }
    }

    #[test]
    fn test_filter_keeps_default_bounds() {
        let filter = filter(String::new(), Vec::new(), Some(Decimal::new(100, 0)), None, SortKey::NameAsc);

        assert_eq!(filter.price_range.min, Decimal::new(100, 0));
        assert_eq!(filter.price_range.max, PriceRange::default().max);
        assert_eq!(filter.sort, SortKey::NameAsc);
    }

    #[test]
    fn test_product_line() {
        assert_eq!(
            product_line(&product(), CurrencyCode::LKR),
            "#7 Floral Maxi Dress - LKR 3590.00 (SALE) [Dresses] 4 in stock"
        );
    }

    #[test]
    fn test_product_line_out_of_stock() {
        let product = Product {
            sale: false,
            category: None,
            stock_quantity: 0,
            ..product()
        };

        assert_eq!(
            product_line(&product, CurrencyCode::USD),
            "#7 Floral Maxi Dress - USD 4500.00 out of stock"
        );
    }
}
