//! Shopper cart lines and the merge rule that keeps them unique.
//!
//! A cart line is identified by the `(product_id, size)` pair: the same
//! product in two sizes is two lines, the same product and size is one line
//! with an accumulated quantity.

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::Product;
use super::id::ProductId;

/// Errors produced by cart arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartLineError {
    /// Quantities must be at least one.
    #[error("quantity must be a positive integer, got {0}")]
    InvalidQuantity(i64),

    /// Merging would exceed the largest representable quantity.
    #[error("quantity for product {product_id} would exceed {max}", max = u32::MAX)]
    QuantityOverflow { product_id: ProductId },
}

/// A strictly positive item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity, rejecting zero and negative values.
    ///
    /// # Errors
    ///
    /// Returns `CartLineError::InvalidQuantity` if `value < 1` or it does not
    /// fit in a `u32`.
    pub fn new(value: i64) -> Result<Self, CartLineError> {
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(CartLineError::InvalidQuantity(value))
    }

    /// Get the underlying count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<i64> for Quantity {
    type Error = CartLineError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One `(product, size)` entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price captured when the line was first added.
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
    /// Size label; empty when the product has no sizes.
    #[serde(default)]
    pub size: String,
    pub quantity: Quantity,
}

impl CartLine {
    /// Build a fresh line for `product` at its current unit price.
    #[must_use]
    pub fn for_product(product: &Product, size: &str, quantity: Quantity) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.unit_price(),
            image: product.image.clone(),
            size: size.to_owned(),
            quantity,
        }
    }

    /// Whether this line is the `(product_id, size)` entry.
    #[must_use]
    pub fn matches(&self, product_id: ProductId, size: &str) -> bool {
        self.product_id == product_id && self.size == size
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity.get())
    }
}

/// An ordered list of cart lines, serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Merge `quantity` units of `product` in `size` into the cart.
    ///
    /// An existing `(product_id, size)` line has its quantity increased in
    /// place; otherwise a new line is appended at the product's current unit
    /// price. Returns the index of the affected line.
    ///
    /// # Errors
    ///
    /// Returns `CartLineError::QuantityOverflow` if the merged quantity does
    /// not fit; the cart is left unchanged.
    pub fn add(
        &mut self,
        product: &Product,
        size: &str,
        quantity: Quantity,
    ) -> Result<usize, CartLineError> {
        if let Some((index, line)) = self
            .lines
            .iter_mut()
            .enumerate()
            .find(|(_, l)| l.matches(product.id, size))
        {
            let merged = line
                .quantity
                .0
                .checked_add(quantity.get())
                .ok_or(CartLineError::QuantityOverflow {
                    product_id: product.id,
                })?;
            line.quantity = Quantity(merged);
            return Ok(index);
        }

        self.lines
            .push(CartLine::for_product(product, size, quantity));
        Ok(self.lines.len() - 1)
    }

    /// The `(product_id, size)` line, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId, size: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(product_id, size))
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity.get())).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}
