//! Glemora Core - Shared types library.
//!
//! This crate provides common types used across all Glemora components:
//! - `storefront` - Public-facing catalog and cart site
//! - `cli` - Command-line client for browsing the catalog and managing a local cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, catalog entities, and cart lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
