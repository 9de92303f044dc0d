//! One-click add-to-cart from the product grid.
//!
//! 1. Reject the request when stock is short, without touching any cart.
//! 2. Signed-in shoppers: send the line to the remote cart endpoint.
//! 3. Anonymous shoppers: merge the line into the shopper-local cart.
//!
//! Either way the shopper gets exactly one [`Notice`]; nothing is retried.

use std::fmt;
use std::future::Future;

use glemora_core::{Cart, Product, ProductId, Quantity};
use secrecy::SecretString;
use thiserror::Error;
use tracing::instrument;

use crate::api::{ApiClient, ApiError};
use crate::cart::{CartAggregator, CartError, CartStore};

/// Notice shown after a successful add.
pub const ADDED_MESSAGE: &str = "Product added to cart!";

/// Notice shown when the add fails.
pub const FAILED_MESSAGE: &str = "Failed to add product to cart. Please try again.";

/// Who is shopping.
#[derive(Debug, Clone)]
pub enum Shopper {
    /// Signed in; carries the bearer token for the remote cart.
    Authenticated(SecretString),
    /// No token; the cart lives in the shopper-local store.
    Anonymous,
}

impl Shopper {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Remote cart mutation for signed-in shoppers.
pub trait RemoteCart: Send + Sync {
    fn add_line(
        &self,
        token: &SecretString,
        product_id: ProductId,
        quantity: Quantity,
        size: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl RemoteCart for ApiClient {
    async fn add_line(
        &self,
        token: &SecretString,
        product_id: ProductId,
        quantity: Quantity,
        size: &str,
    ) -> Result<(), ApiError> {
        self.add_to_cart(token, product_id, quantity, size).await
    }
}

// =============================================================================
// Notices
// =============================================================================

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

impl NoticeKind {
    /// CSS modifier used by the notice template.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A user-facing acknowledgment of a cart action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// =============================================================================
// Flow
// =============================================================================

/// Why a quick-add did not happen.
#[derive(Debug, Error)]
pub enum QuickAddError {
    /// Fewer units in stock than requested.
    #[error("only {available} items available in stock")]
    StockInsufficient { available: u32 },

    /// The remote cart rejected the line or could not be reached.
    #[error("remote cart update failed: {0}")]
    Remote(#[source] ApiError),

    /// The shopper-local cart could not be updated.
    #[error("local cart update failed: {0}")]
    Local(#[source] CartError),
}

impl QuickAddError {
    /// The notice to show the shopper.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::StockInsufficient { available } => Notice::new(
                NoticeKind::Warning,
                format!("Sorry, only {available} items available in stock."),
            ),
            Self::Remote(_) | Self::Local(_) => Notice::new(NoticeKind::Error, FAILED_MESSAGE),
        }
    }
}

/// Where a successful quick-add put the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickAddOutcome {
    /// Accepted by the remote cart.
    Remote,
    /// Merged into the shopper-local cart; carries the updated cart.
    Local(Cart),
}

impl QuickAddOutcome {
    #[must_use]
    pub fn notice(&self) -> Notice {
        Notice::new(NoticeKind::Success, ADDED_MESSAGE)
    }
}

/// Add `quantity` units of `product` in `size` to the shopper's cart.
///
/// # Errors
///
/// - `StockInsufficient` when `product.stock_quantity < quantity`; no cart
///   is touched.
/// - `Remote` when the signed-in shopper's remote cart fails; the local cart
///   is not touched either.
/// - `Local` when the anonymous shopper's stored cart cannot be updated.
#[instrument(skip(remote, local, shopper, product), fields(product_id = %product.id, authenticated = shopper.is_authenticated()))]
pub async fn quick_add<R, S>(
    remote: &R,
    local: &CartAggregator<S>,
    shopper: &Shopper,
    product: &Product,
    size: &str,
    quantity: Quantity,
) -> Result<QuickAddOutcome, QuickAddError>
where
    R: RemoteCart,
    S: CartStore,
{
    if !product.has_stock_for(quantity.get()) {
        tracing::info!(
            available = product.stock_quantity,
            requested = quantity.get(),
            "Quick-add rejected: insufficient stock"
        );
        return Err(QuickAddError::StockInsufficient {
            available: product.stock_quantity,
        });
    }

    match shopper {
        Shopper::Authenticated(token) => {
            remote
                .add_line(token, product.id, quantity, size)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Error adding to remote cart");
                    QuickAddError::Remote(e)
                })?;
            Ok(QuickAddOutcome::Remote)
        }
        Shopper::Anonymous => {
            let cart = local
                .add_to_cart(product, size, quantity)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Error adding to local cart");
                    QuickAddError::Local(e)
                })?;
            Ok(QuickAddOutcome::Local(cart))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use rust_decimal::Decimal;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::cart::MemoryCartStore;

    /// Records remote calls; fails every call when `fail` is set.
    #[derive(Default)]
    struct FakeRemote {
        fail: bool,
        calls: Mutex<Vec<(String, ProductId, u32, String)>>,
    }

    impl RemoteCart for FakeRemote {
        async fn add_line(
            &self,
            token: &SecretString,
            product_id: ProductId,
            quantity: Quantity,
            size: &str,
        ) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push((
                token.expose_secret().to_string(),
                product_id,
                quantity.get(),
                size.to_string(),
            ));
            if self.fail {
                Err(ApiError::Status {
                    status: 500,
                    body: "boom".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn product(stock: u32) -> Product {
        Product {
            id: ProductId::new(9),
            name: "Silk Scarf".to_string(),
            description: None,
            price: Decimal::new(1200, 0),
            sale_price: Some(Decimal::new(900, 0)),
            sale: true,
            image: None,
            category: None,
            stock_quantity: stock,
        }
    }

    fn token() -> Shopper {
        Shopper::Authenticated(SecretString::from("tok"))
    }

    #[tokio::test]
    async fn test_out_of_stock_is_rejected_without_mutation() {
        let remote = FakeRemote::default();
        let local = CartAggregator::new(MemoryCartStore::default());

        for shopper in [Shopper::Anonymous, token()] {
            let err = quick_add(&remote, &local, &shopper, &product(0), "M", Quantity::ONE)
                .await
                .unwrap_err();

            assert!(matches!(err, QuickAddError::StockInsufficient { available: 0 }));
            assert_eq!(
                err.notice(),
                Notice::new(
                    NoticeKind::Warning,
                    "Sorry, only 0 items available in stock."
                )
            );
        }
        assert!(remote.calls.lock().unwrap().is_empty());
        assert!(local.store().snapshot().is_none());
    }

    #[tokio::test]
    async fn test_anonymous_merges_into_local_cart() {
        let remote = FakeRemote::default();
        let local = CartAggregator::new(MemoryCartStore::default());

        quick_add(&remote, &local, &Shopper::Anonymous, &product(5), "M", Quantity::ONE)
            .await
            .unwrap();
        let outcome = quick_add(&remote, &local, &Shopper::Anonymous, &product(5), "M", Quantity::ONE)
            .await
            .unwrap();

        let QuickAddOutcome::Local(cart) = &outcome else {
            panic!("expected local outcome");
        };
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity.get(), 2);
        assert_eq!(cart.lines()[0].price, Decimal::new(900, 0));
        assert_eq!(outcome.notice().message, ADDED_MESSAGE);
        assert!(remote.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_authenticated_uses_remote_cart() {
        let remote = FakeRemote::default();
        let local = CartAggregator::new(MemoryCartStore::default());

        let outcome = quick_add(&remote, &local, &token(), &product(5), "M", Quantity::ONE)
            .await
            .unwrap();

        assert_eq!(outcome, QuickAddOutcome::Remote);
        assert_eq!(
            remote.calls.lock().unwrap().as_slice(),
            &[("tok".to_string(), ProductId::new(9), 1, "M".to_string())]
        );
        assert!(local.store().snapshot().is_none());
    }

    #[tokio::test]
    async fn test_remote_failure_leaves_local_cart_alone() {
        let remote = FakeRemote {
            fail: true,
            ..Default::default()
        };
        let local = CartAggregator::new(MemoryCartStore::default());

        let err = quick_add(&remote, &local, &token(), &product(5), "M", Quantity::ONE)
            .await
            .unwrap_err();

        assert!(matches!(err, QuickAddError::Remote(_)));
        assert_eq!(err.notice(), Notice::new(NoticeKind::Error, FAILED_MESSAGE));
        assert!(local.store().snapshot().is_none());
    }

    #[tokio::test]
    async fn test_requested_quantity_is_checked_against_stock() {
        let remote = FakeRemote::default();
        let local = CartAggregator::new(MemoryCartStore::default());

        let err = quick_add(
            &remote,
            &local,
            &Shopper::Anonymous,
            &product(2),
            "L",
            Quantity::new(3).unwrap(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, QuickAddError::StockInsufficient { available: 2 }));
    }

    #[tokio::test]
    async fn test_malformed_local_cart_reports_failure() {
        let remote = FakeRemote::default();
        let local = CartAggregator::new(MemoryCartStore::with_snapshot("nope"));

        let err = quick_add(&remote, &local, &Shopper::Anonymous, &product(5), "M", Quantity::ONE)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            QuickAddError::Local(CartError::MalformedStoredCart(_))
        ));
        assert_eq!(err.notice().kind, NoticeKind::Error);
    }
}
