//! Interceptors shipped with the library.
//!
//! Both are registered in a [`Catalog`](crate::scanner::Catalog) with
//! `catalog.interceptor::<T>()` and installed when their package is scanned.

mod auth;
mod tracing;

pub use self::auth::{ApiKeyGuard, DEFAULT_API_KEY_HEADER, GUARD_ORDER};
pub use self::tracing::{RequestLogger, RequestStart};
