//! # Router Module
//!
//! Ordered route table and path matching.
//!
//! ## Overview
//!
//! Unlike a classic "first match wins" router, the table offers a request to
//! *every* entry whose verb and path pattern accept it, in ascending order
//! (ties keep registration order). Entries decide for themselves whether to
//! act: controller routes skip requests that are already handled, guards
//! installed by interceptors run ahead of them at a lower order.
//!
//! ## Path patterns
//!
//! Patterns are compiled to anchored regexes at registration time:
//!
//! - `{name}` captures one segment (`/pets/{id}` matches `/pets/7`)
//! - a trailing `/*` matches the prefix and anything below it
//! - `*` on its own, or no path at all, matches every request
//!
//! Trailing slashes on request paths are ignored, so `/pets/` reaches a
//! route registered as `/pets`.

mod core;
#[cfg(test)]
mod tests;

pub use self::core::{
    handler_fn, ParamVec, PathPattern, RouteBuilder, RouteEntry, RouteHandler, Router,
    MAX_INLINE_PARAMS,
};
