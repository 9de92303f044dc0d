//! Session-related types.

/// Session keys used by the storefront.
pub mod keys {
    /// Key for the anonymous shopper's serialized cart.
    pub const CART: &str = crate::cart::CART_KEY;

    /// Key for the signed-in shopper's API bearer token.
    ///
    /// Written by the account login flow; the storefront only reads it.
    pub const API_TOKEN: &str = "api_token";
}
