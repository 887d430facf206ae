use super::normalize::normalize;
use crate::context::{LifecycleState, RequestContext};
use crate::router::Router;
use crate::server::RawRequest;
use bytes::Bytes;
use futures::FutureExt;
use http::StatusCode;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};

/// Drives one request through the route table.
///
/// Every request passes an entry step (unhandled, `Unmatched`), is offered to
/// each matching route in order, and ends in a terminal step that finalizes
/// the response: 404 if nothing handled it, otherwise whatever was written.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Dispatch one request and return the finished response.
    ///
    /// Never fails: every request gets exactly one response.
    pub async fn dispatch(&self, request: RawRequest) -> http::Response<Bytes> {
        let mut ctx = RequestContext::new(request);
        let span = info_span!(
            "request",
            request_id = %ctx.request_id(),
            method = %ctx.request().method(),
            path = %ctx.request().path(),
        );
        self.run(&mut ctx).instrument(span).await;
        ctx.response().to_http()
    }

    /// Run the full lifecycle on an existing context.
    pub async fn run(&self, ctx: &mut RequestContext) {
        let started = Instant::now();

        // entry
        ctx.set_handled(false);
        ctx.transition(LifecycleState::Unmatched);

        let request = Arc::clone(ctx.request());
        let mut offered = 0usize;
        for (entry, params) in self.router.matching(request.method(), request.path()) {
            offered += 1;
            debug!(route = %entry, handled = ctx.is_handled(), "Offering request to route");
            ctx.set_path_params(params);
            // handlers may panic before returning their future
            let handler = entry.handler();
            let outcome = AssertUnwindSafe(async { handler.handle(ctx).await })
                .catch_unwind()
                .await;
            if outcome.is_err() && !ctx.response().is_ended() {
                normalize(
                    ctx,
                    Err(anyhow::anyhow!("route {} panicked", entry.name())),
                );
            }
        }

        // terminal
        let res = ctx.response();
        if !res.is_ended() {
            if !ctx.is_handled() {
                res.set_status(StatusCode::NOT_FOUND);
                debug!(routes_offered = offered, "No route handled request");
            }
            res.end();
        }
        let status = res.status();
        ctx.transition(LifecycleState::Terminated);

        info!(
            status = status.as_u16(),
            handled = ctx.is_handled(),
            routes_offered = offered,
            duration_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
    }
}
