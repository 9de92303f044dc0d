//! Types stored in the shopper session.

pub mod session;

pub use session::keys as session_keys;
