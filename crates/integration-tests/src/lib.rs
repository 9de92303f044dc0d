//! Integration test harness for the Glemora storefront.
//!
//! [`TestContext::new`] starts two servers on ephemeral ports:
//!
//! - a stub Glemora API serving a fixed catalog and recording cart calls
//! - the storefront itself, pointed at the stub
//!
//! Tests talk to the storefront through a cookie-keeping `reqwest` client,
//! so anonymous carts persist across requests the way they do in a browser.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p glemora-integration-tests
//! ```

use std::collections::HashMap;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::{get, post},
};
use glemora_storefront::{config::StorefrontConfig, state::AppState};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Bearer token the stub API refuses.
pub const REJECTED_TOKEN: &str = "rejected-token";

/// A `POST /cart` call received by the stub API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartCall {
    pub authorization: Option<String>,
    pub query: HashMap<String, String>,
}

#[derive(Clone, Default)]
struct StubApi {
    cart_calls: Arc<Mutex<Vec<CartCall>>>,
}

/// The fixed catalog served by the stub API.
#[must_use]
pub fn stub_products() -> Value {
    json!([
        {
            "id": 1,
            "name": "Red Dress",
            "price": 1000,
            "salePrice": 800,
            "sale": true,
            "image": "https://cdn.glemora.lk/red-dress.jpg",
            "category": { "id": 2, "name": "Dresses" },
            "stockQuantity": 5
        },
        {
            "id": 2,
            "name": "Linen Shirt",
            "price": 2500,
            "sale": false,
            "category": { "id": 3, "name": "Tops" },
            "stockQuantity": 3
        },
        {
            "id": 3,
            "name": "Pleated Skirt",
            "price": 1500,
            "sale": false,
            "category": { "id": 4, "name": "Skirts" },
            "stockQuantity": 0
        }
    ])
}

/// The fixed category list served by the stub API.
#[must_use]
pub fn stub_categories() -> Value {
    json!([
        { "id": 2, "name": "Dresses" },
        { "id": 3, "name": "Tops" },
        { "id": 4, "name": "Skirts" }
    ])
}

async fn products() -> Json<Value> {
    Json(stub_products())
}

async fn categories() -> Json<Value> {
    Json(stub_categories())
}

async fn add_to_cart(
    State(api): State<StubApi>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> StatusCode {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let rejected =
        authorization.as_deref() == Some(format!("Bearer {REJECTED_TOKEN}").as_str());

    api.cart_calls
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(CartCall {
            authorization,
            query,
        });

    if rejected {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::CREATED
    }
}

async fn spawn(router: Router) -> Result<SocketAddr, Box<dyn Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(addr)
}

/// A running storefront plus the stub API behind it.
pub struct TestContext {
    pub client: reqwest::Client,
    pub storefront_url: String,
    api: StubApi,
}

impl TestContext {
    /// Start the stub API and a storefront pointed at it.
    ///
    /// # Errors
    ///
    /// Returns an error if either server cannot start.
    pub async fn new() -> Result<Self, Box<dyn Error>> {
        let api = StubApi::default();
        let api_router = Router::new()
            .route("/api/products", get(products))
            .route("/api/categories", get(categories))
            .route("/api/cart", post(add_to_cart))
            .with_state(api.clone());
        let api_addr = spawn(api_router).await?;

        let config = StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_BASE_URL" => Some("http://localhost".to_string()),
            "STOREFRONT_API_URL" => Some(format!("http://{api_addr}/api")),
            "STOREFRONT_API_TIMEOUT_SECS" => Some("5".to_string()),
            "STOREFRONT_CATALOG_CACHE_SECS" => Some("0".to_string()),
            _ => None,
        })?;
        let state = AppState::new(config)?;
        let storefront_addr = spawn(glemora_storefront::app(state, "static")).await?;

        let client = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(Self {
            client,
            storefront_url: format!("http://{storefront_addr}"),
            api,
        })
    }

    /// Absolute storefront URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    /// Cart calls the stub API has received so far.
    #[must_use]
    pub fn cart_calls(&self) -> Vec<CartCall> {
        self.api
            .cart_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
