use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::context::RequestContext;
use crate::controller::Interceptor;
use crate::error::ConfigError;
use crate::router::{handler_fn, Router};

/// Arrival time stashed in the request extensions by [`RequestLogger`].
#[derive(Debug, Clone, Copy)]
pub struct RequestStart(pub Instant);

/// Logs every request on arrival and once all routes have run.
///
/// Installs two catch-all routes, one at the lowest order and one at the
/// highest. The second one logs before the terminal step, so unhandled
/// requests are reported as `handled = false` rather than with their 404.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogger;

impl Interceptor for RequestLogger {
    fn configure(self: Arc<Self>, router: &mut Router) -> Result<(), ConfigError> {
        router
            .any()
            .order(i32::MIN)
            .name("RequestLogger::start")
            .handler(handler_fn(on_start))?;
        router
            .any()
            .order(i32::MAX)
            .name("RequestLogger::finish")
            .handler(handler_fn(on_finish))
    }
}

fn on_start(ctx: &mut RequestContext) {
    ctx.extensions_mut().insert(RequestStart(Instant::now()));
    info!(
        request_id = %ctx.request_id(),
        method = %ctx.request().method(),
        path = %ctx.request().path(),
        "Request received"
    );
}

fn on_finish(ctx: &mut RequestContext) {
    let latency_ms = ctx
        .extensions()
        .get::<RequestStart>()
        .map(|s| s.0.elapsed().as_millis() as u64);
    info!(
        request_id = %ctx.request_id(),
        handled = ctx.is_handled(),
        state = %ctx.state(),
        status = ctx.response().status().as_u16(),
        latency_ms,
        "Request routed"
    );
}
