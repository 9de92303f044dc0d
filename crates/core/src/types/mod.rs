//! Core types for the Glemora storefront.
//!
//! This module provides type-safe wrappers for catalog and cart concepts.

pub mod cart;
pub mod catalog;
pub mod id;
pub mod price;

pub use cart::{Cart, CartLine, CartLineError, Quantity};
pub use catalog::{Category, Product};
pub use id::*;
pub use price::{CurrencyCode, Price, UnknownCurrency};
