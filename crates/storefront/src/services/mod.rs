//! Storefront business flows that combine the API client and cart storage.

pub mod quick_add;

pub use quick_add::{
    Notice, NoticeKind, QuickAddError, QuickAddOutcome, RemoteCart, Shopper, quick_add,
};
