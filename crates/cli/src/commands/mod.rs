//! CLI command implementations.

pub mod cart;
pub mod catalog;

use glemora_core::{CartLineError, ProductId};
use glemora_storefront::api::{ApiClient, ApiError};
use glemora_storefront::cart::CartError;
use glemora_storefront::config::{ApiConfig, parse_api_url};
use glemora_storefront::services::{Notice, NoticeKind, QuickAddError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The API URL is unusable.
    #[error("Invalid API URL: {0}")]
    InvalidApiUrl(String),

    /// Catalog request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Reading or writing the cart file failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Quantity was zero, negative or too large.
    #[error("{0}")]
    Quantity(#[from] CartLineError),

    /// No such product in the catalog.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// The quick-add was refused or failed.
    #[error("{0}")]
    QuickAdd(#[from] QuickAddError),
}

/// Build an API client for `api_url`.
fn api_client(api_url: &str) -> Result<ApiClient, CliError> {
    let base_url = parse_api_url(api_url).map_err(CliError::InvalidApiUrl)?;
    Ok(ApiClient::new(&ApiConfig::new(base_url))?)
}

/// Log a notice at the level matching its kind.
fn report(notice: &Notice) {
    match notice.kind {
        NoticeKind::Success => tracing::info!("{notice}"),
        NoticeKind::Warning => tracing::warn!("{notice}"),
        NoticeKind::Error => tracing::error!("{notice}"),
    }
}
