//! Cart commands.
//!
//! Without a token the cart lives in a JSON file, the same array the
//! storefront keeps in the session.

use std::path::Path;

use glemora_core::{Cart, CurrencyCode, Price, ProductId, Quantity};
use glemora_storefront::cart::{CartAggregator, FileCartStore};
use glemora_storefront::services::{QuickAddOutcome, Shopper, quick_add};
use secrecy::SecretString;

use super::{CliError, api_client, report};

fn file_cart(path: &Path) -> CartAggregator<FileCartStore> {
    CartAggregator::new(FileCartStore::new(path))
}

/// Add a product via the quick-add flow.
pub async fn add(
    api_url: &str,
    cart_file: &Path,
    product_id: ProductId,
    size: &str,
    quantity: i64,
    token: Option<String>,
) -> Result<(), CliError> {
    let quantity = Quantity::new(quantity)?;
    let api = api_client(api_url)?;
    let product = api
        .find_product(product_id)
        .await?
        .ok_or(CliError::ProductNotFound(product_id))?;

    let shopper = token.map_or(Shopper::Anonymous, |t| {
        Shopper::Authenticated(SecretString::from(t))
    });
    let local = file_cart(cart_file);

    match quick_add(&api, &local, &shopper, &product, size, quantity).await {
        Ok(outcome) => {
            report(&outcome.notice());
            if let QuickAddOutcome::Local(cart) = outcome {
                tracing::info!(
                    "{} items in {}",
                    cart.item_count(),
                    cart_file.display()
                );
            }
            Ok(())
        }
        Err(e) => {
            report(&e.notice());
            Err(e.into())
        }
    }
}

/// Lines describing `cart`, one per cart line plus a subtotal.
fn cart_lines(cart: &Cart, currency: CurrencyCode) -> Vec<String> {
    let mut lines: Vec<String> = cart
        .lines()
        .iter()
        .map(|line| {
            let size = if line.size.is_empty() {
                String::new()
            } else {
                format!(" ({})", line.size)
            };
            format!(
                "#{} {}{} x{} @ {} = {}",
                line.product_id,
                line.name,
                size,
                line.quantity,
                Price::new(line.price, currency),
                Price::new(line.line_total(), currency)
            )
        })
        .collect();
    lines.push(format!(
        "Subtotal: {}",
        Price::new(cart.subtotal(), currency)
    ));
    lines
}

/// Print the local cart.
pub async fn show(cart_file: &Path, currency: CurrencyCode) -> Result<(), CliError> {
    let cart = file_cart(cart_file).load().await?;

    if cart.is_empty() {
        tracing::info!("Your cart is empty.");
        return Ok(());
    }

    for line in cart_lines(&cart, currency) {
        tracing::info!("{line}");
    }
    Ok(())
}

/// Empty the local cart.
pub async fn clear(cart_file: &Path) -> Result<(), CliError> {
    file_cart(cart_file).clear().await?;
    tracing::info!("Cart cleared.");
    Ok(())
}
