//! Glemora REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP via `reqwest`
//! - The API is the source of truth for products, categories and the carts
//!   of signed-in shoppers; nothing is synced locally
//! - Product and category listings are cached in memory via `moka` for the
//!   configured TTL
//!
//! # Endpoints
//!
//! - `GET  /products`   - full product list
//! - `GET  /categories` - full category list
//! - `POST /cart?productId=&quantity=&size=` - add a line to the signed-in shopper's cart
//!
//! # Example
//!
//! ```rust,ignore
//! use glemora_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let products = client.get_products().await?;
//! client.add_to_cart(&token, products[0].id, Quantity::ONE, "M").await?;
//! ```

mod cache;

use std::sync::Arc;

use glemora_core::{Category, Product, ProductId, Quantity};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ApiConfig;

use cache::{CacheKey, CacheValue};

/// Number of bytes of an error body kept for diagnostics.
const ERROR_BODY_PREVIEW: usize = 200;

/// Errors that can occur when talking to the Glemora API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Glemora REST API.
///
/// Cheap to clone; clones share the connection pool and the catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// A zero `catalog_cache_ttl` disables caching.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let cache = (!config.catalog_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(16)
                .time_to_live(config.catalog_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Execute a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let response = self.inner.client.get(url).send().await?;
        let body = read_success_body(response).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                path,
                body = %preview(&body),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the payload is malformed.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cached(CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(products.as_ref().clone());
        }

        let products: Vec<Product> = self.get_json("products").await?;
        debug!(count = products.len(), "Fetched products");

        self.store(
            CacheKey::Products,
            CacheValue::Products(Arc::new(products.clone())),
        )
        .await;

        Ok(products)
    }

    /// Get every product category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the payload is malformed.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) = self.cached(CacheKey::Categories).await {
            debug!("Cache hit for categories");
            return Ok(categories.as_ref().clone());
        }

        let categories: Vec<Category> = self.get_json("categories").await?;
        debug!(count = categories.len(), "Fetched categories");

        self.store(
            CacheKey::Categories,
            CacheValue::Categories(Arc::new(categories.clone())),
        )
        .await;

        Ok(categories)
    }

    /// Get products and categories together.
    ///
    /// Either failure fails the whole load; there is no partial catalog.
    ///
    /// # Errors
    ///
    /// Returns the first error from either request.
    pub async fn get_catalog(&self) -> Result<(Vec<Product>, Vec<Category>), ApiError> {
        tokio::try_join!(self.get_products(), self.get_categories())
    }

    /// Look up a single product in the catalog listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the product listing cannot be fetched.
    pub async fn find_product(&self, id: ProductId) -> Result<Option<Product>, ApiError> {
        Ok(self.get_products().await?.into_iter().find(|p| p.id == id))
    }

    /// Check that the products endpoint answers, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the API is unreachable or answers with a failure.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), ApiError> {
        let url = self.endpoint("products")?;
        let response = self.inner.client.get(url).send().await?;
        read_success_body(response).await.map(drop)
    }

    async fn cached(&self, key: CacheKey) -> Option<CacheValue> {
        match &self.inner.cache {
            Some(cache) => cache.get(&key).await,
            None => None,
        }
    }

    async fn store(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Add a line to a signed-in shopper's remote cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    #[instrument(skip(self, token))]
    pub async fn add_to_cart(
        &self,
        token: &SecretString,
        product_id: ProductId,
        quantity: Quantity,
        size: &str,
    ) -> Result<(), ApiError> {
        let url = self.endpoint("cart")?;
        let response = self
            .inner
            .client
            .post(url)
            .bearer_auth(token.expose_secret())
            .query(&[
                ("productId", product_id.to_string()),
                ("quantity", quantity.to_string()),
                ("size", size.to_owned()),
            ])
            .send()
            .await?;

        read_success_body(response).await?;
        debug!("Added line to remote cart");
        Ok(())
    }
}

/// Read the body of a response, turning non-success statuses into errors.
async fn read_success_body(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(ApiError::RateLimited(retry_after));
    }

    let body = response.text().await?;

    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %preview(&body),
            "Glemora API returned non-success status"
        );
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: preview(&body),
        });
    }

    Ok(body)
}

fn preview(body: &str) -> String {
    body.chars().take(ERROR_BODY_PREVIEW).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::{
        Json, Router,
        extract::Query,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };
    use serde_json::json;

    use super::*;

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/api/")).unwrap()
    }

    fn client(base_url: Url, ttl: Duration) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url,
            timeout: Duration::from_secs(5),
            catalog_cache_ttl: ttl,
        })
        .unwrap()
    }

    fn catalog_router() -> Router {
        Router::new()
            .route(
                "/api/products",
                get(|| async {
                    Json(json!([
                        {"id": 1, "name": "Red Dress", "price": 1000, "sale": false, "stockQuantity": 3},
                        {"id": 2, "name": "Linen Shirt", "price": 2500, "salePrice": 2000, "sale": true,
                         "category": {"id": 7, "name": "Shirts"}, "stockQuantity": 0}
                    ]))
                }),
            )
            .route(
                "/api/categories",
                get(|| async { Json(json!([{"id": 7, "name": "Shirts"}])) }),
            )
    }

    #[tokio::test]
    async fn test_get_catalog() {
        let api = client(serve(catalog_router()).await, Duration::ZERO);

        let (products, categories) = api.get_catalog().await.unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[1].unit_price(), rust_decimal::Decimal::new(2000, 0));
        assert_eq!(categories[0].name, "Shirts");
    }

    #[tokio::test]
    async fn test_find_product() {
        let api = client(serve(catalog_router()).await, Duration::from_secs(60));

        let found = api.find_product(ProductId::new(2)).await.unwrap();
        assert_eq!(found.unwrap().name, "Linen Shirt");
        assert!(api.find_product(ProductId::new(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let router = Router::new().route(
            "/api/products",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
        let api = client(serve(router).await, Duration::ZERO);

        let err = api.get_products().await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 503, ref body } if body == "maintenance"));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_a_parse_error() {
        let router = Router::new().route("/api/categories", get(|| async { "{not json" }));
        let api = client(serve(router).await, Duration::ZERO);

        let err = api.get_categories().await.unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let router = Router::new().route(
            "/api/products",
            get(|| async { (StatusCode::TOO_MANY_REQUESTS, [("Retry-After", "30")], "") }),
        );
        let api = client(serve(router).await, Duration::ZERO);

        let err = api.get_products().await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited(30)));
    }

    #[tokio::test]
    async fn test_add_to_cart_sends_query_and_token() {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Params {
            product_id: i64,
            quantity: u32,
            size: String,
        }

        let router = Router::new().route(
            "/api/cart",
            post(|headers: HeaderMap, Query(params): Query<Params>| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer shopper-token");
                if authorized && params.product_id == 5 && params.quantity == 2 && params.size == "L"
                {
                    StatusCode::OK
                } else {
                    StatusCode::BAD_REQUEST
                }
            }),
        );
        let api = client(serve(router).await, Duration::ZERO);
        let token = SecretString::from("shopper-token");

        api.add_to_cart(&token, ProductId::new(5), Quantity::new(2).unwrap(), "L")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_to_cart_failure_surfaces_status() {
        let router = Router::new().route(
            "/api/cart",
            post(|| async { (StatusCode::UNAUTHORIZED, "token expired") }),
        );
        let api = client(serve(router).await, Duration::ZERO);
        let token = SecretString::from("stale");

        let err = api
            .add_to_cart(&token, ProductId::new(5), Quantity::ONE, "M")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 401, .. }));
    }
}
