use crate::context::RequestContext;
use crate::controller::Interceptor;
use crate::dispatcher::normalize;
use crate::error::{ConfigError, HttpError};
use crate::router::{RouteHandler, Router};
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Order of the guard route; runs ahead of every default-order route.
pub const GUARD_ORDER: i32 = -1000;

/// Header checked when none is configured.
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

/// Rejects requests under a path pattern unless they carry a known API key.
///
/// Rejected requests get 401 `{"message":"Unauthorized"}` and are marked
/// handled, so no controller route runs for them.
#[derive(Debug, Clone)]
pub struct ApiKeyGuard {
    pattern: String,
    header: String,
    keys: HashSet<String>,
}

impl ApiKeyGuard {
    pub fn new<I, S>(pattern: impl Into<String>, header: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pattern: pattern.into(),
            header: header.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn accepts(&self, ctx: &RequestContext) -> bool {
        ctx.request()
            .header(&self.header)
            .is_some_and(|key| self.keys.contains(key))
    }
}

impl Interceptor for ApiKeyGuard {
    fn configure(self: Arc<Self>, router: &mut Router) -> Result<(), ConfigError> {
        let pattern = self.pattern.clone();
        router
            .route(pattern)
            .order(GUARD_ORDER)
            .name("ApiKeyGuard")
            .handler(GuardRoute { guard: self })
    }
}

struct GuardRoute {
    guard: Arc<ApiKeyGuard>,
}

impl RouteHandler for GuardRoute {
    fn handle<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()> {
        if !ctx.is_handled() && !self.guard.accepts(ctx) {
            debug!(
                request_id = %ctx.request_id(),
                header = %self.guard.header,
                "API key missing or unknown"
            );
            normalize(ctx, Err(HttpError::unauthorized("Unauthorized").into()));
        }
        Box::pin(futures::future::ready(()))
    }
}
