//! Route-mapping markers.
//!
//! [`RequestMapping`] is attached to a handler method and [`ControllerMapping`]
//! to the controller type. The effective route path is the controller prefix
//! followed by the method path, joined by plain concatenation.

use http::Method;
use std::time::Duration;

/// Priority given to a route when none is declared.
pub const DEFAULT_ORDER: i32 = 100;

/// Method-level mapping: path, verb, priority and optional timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMapping {
    pub path: String,
    pub method: Method,
    /// Lower values run first.
    pub order: i32,
    /// Overrides the dispatcher-wide handler timeout for this route.
    pub timeout: Option<Duration>,
}

impl Default for RequestMapping {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            method: Method::GET,
            order: DEFAULT_ORDER,
            timeout: None,
        }
    }
}

impl RequestMapping {
    /// GET mapping for `path` with the default priority.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(path).method(Method::POST)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(path).method(Method::PUT)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(path).method(Method::PATCH)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(path).method(Method::DELETE)
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Type-level mapping. Only the path prefix is meaningful at this level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerMapping {
    pub prefix: String,
}

impl ControllerMapping {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Effective path of `mapping` under this controller.
    #[must_use]
    pub fn join(&self, mapping: &RequestMapping) -> String {
        join_path(&self.prefix, &mapping.path)
    }
}

/// Concatenate a class-level prefix and a method-level path.
///
/// No separator is inserted or removed: `"/users" + "/{id}"` gives
/// `"/users/{id}"`, `"" + "/health"` gives `"/health"`.
#[must_use]
pub fn join_path(prefix: &str, path: &str) -> String {
    let mut full = String::with_capacity(prefix.len() + path.len());
    full.push_str(prefix);
    full.push_str(path);
    full
}
