//! Shopper-local cart persistence.
//!
//! Anonymous shoppers keep their cart as a JSON array under a single key
//! (`"cart"`) in a [`CartStore`]. The store is injected, so the same
//! [`CartAggregator`] runs against a tower-sessions session in the storefront,
//! a JSON file in the CLI, and an in-memory slot in tests.
//!
//! Every write replaces the whole snapshot; there is no incremental append.

mod lock;
mod store;

pub use lock::CartLocks;
pub use store::{FileCartLock, FileCartStore, MemoryCartStore, SessionCartStore};

use std::future::Future;

use glemora_core::{Cart, CartLineError, Product, Quantity};
use thiserror::Error;
use tracing::instrument;

/// The single key the cart snapshot lives under.
pub const CART_KEY: &str = "cart";

/// Errors raised while reading or writing the shopper-local cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// The stored snapshot is not a valid cart; it is left untouched.
    #[error("stored cart is malformed: {0}")]
    MalformedStoredCart(#[source] serde_json::Error),

    /// The cart could not be serialized.
    #[error("failed to serialize cart: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Quantity arithmetic failed.
    #[error(transparent)]
    Line(#[from] CartLineError),

    /// The backing store failed.
    #[error("cart store error: {0}")]
    Store(String),
}

/// Get/set access to one serialized cart snapshot.
///
/// Implementations only move opaque strings; parsing and merging belong to
/// [`CartAggregator`].
pub trait CartStore: Send + Sync {
    /// Held for the duration of one read-modify-write cycle.
    type Guard: Send;

    /// Wait for exclusive access to the snapshot.
    ///
    /// Stores shared between processes must lock here; stores already
    /// serialized by their owner may return a no-op guard.
    fn lock(&self) -> impl Future<Output = Result<Self::Guard, CartError>> + Send;

    /// Read the stored snapshot, or `None` when nothing has been saved.
    fn load(&self) -> impl Future<Output = Result<Option<String>, CartError>> + Send;

    /// Replace the stored snapshot.
    fn save(&self, blob: String) -> impl Future<Output = Result<(), CartError>> + Send;

    /// Remove the stored snapshot.
    fn clear(&self) -> impl Future<Output = Result<(), CartError>> + Send;
}

/// Merges lines into the cart held by a [`CartStore`].
#[derive(Debug, Clone)]
pub struct CartAggregator<S> {
    store: S,
}

impl<S: CartStore> CartAggregator<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Read the current cart; an absent snapshot is an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::MalformedStoredCart` if the snapshot does not
    /// parse, or a store error.
    pub async fn load(&self) -> Result<Cart, CartError> {
        match self.store.load().await? {
            Some(blob) => serde_json::from_str(&blob).map_err(|e| {
                tracing::warn!(error = %e, "Stored cart is malformed");
                CartError::MalformedStoredCart(e)
            }),
            None => Ok(Cart::new()),
        }
    }

    /// Merge `quantity` units of `product` in `size` and persist the result.
    ///
    /// Returns the full updated cart.
    ///
    /// # Errors
    ///
    /// Fails without writing anything if the stored cart is malformed or the
    /// merged quantity overflows; also propagates store errors.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(
        &self,
        product: &Product,
        size: &str,
        quantity: Quantity,
    ) -> Result<Cart, CartError> {
        let _guard = self.store.lock().await?;
        let mut cart = self.load().await?;
        cart.add(product, size, quantity)?;

        let blob = serde_json::to_string(&cart).map_err(CartError::Serialize)?;
        self.store.save(blob).await?;

        tracing::debug!(lines = cart.len(), "Cart saved");
        Ok(cart)
    }

    /// Empty the cart, discarding whatever is stored (including a malformed
    /// snapshot).
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn clear(&self) -> Result<(), CartError> {
        let _guard = self.store.lock().await?;
        self.store.clear().await
    }

    /// Get a reference to the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }
}
