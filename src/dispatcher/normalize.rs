use crate::context::{LifecycleState, RequestContext};
use crate::error::HttpError;
use crate::server::{write_json, HttpResponse};
use http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error};

/// Message sent for every failure that is not an [`HttpError`].
pub const GENERIC_ERROR_MESSAGE: &str = "An Error Occurred";

/// What a handler produced, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// 200 with the value as JSON body.
    Value(Value),
    /// Status and optional body chosen by the handler.
    Response(HttpResponse),
    /// Nothing to write; see [`NoContent`].
    NoContent,
}

/// Handler return value meaning "I wrote nothing through the normal path".
///
/// If the handler ended the response itself through the raw handle, the
/// request counts as handled. Otherwise dispatch moves on to the next
/// matching route, and ends in a 404 if none handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoContent;

/// Conversion of a handler's success value into a [`Reply`].
pub trait IntoReply {
    fn into_reply(self) -> anyhow::Result<Reply>;
}

impl<T: Serialize> IntoReply for T {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Value(serde_json::to_value(self)?))
    }
}

impl IntoReply for HttpResponse {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Response(self))
    }
}

impl IntoReply for NoContent {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::NoContent)
    }
}

impl IntoReply for Reply {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(self)
    }
}

/// Write the outcome of a handler invocation to the response.
///
/// Every path except an unended [`Reply::NoContent`] writes one JSON response,
/// ends it and marks the request handled.
pub fn normalize(ctx: &mut RequestContext, outcome: anyhow::Result<Reply>) {
    let res = ctx.response().clone();
    match outcome {
        Ok(Reply::Value(value)) => {
            write_json(&res, StatusCode::OK, Some(&value));
            finish(ctx, LifecycleState::Handled);
        }
        Ok(Reply::Response(response)) => {
            write_json(&res, response.status, response.body.as_ref());
            finish(ctx, LifecycleState::Handled);
        }
        Ok(Reply::NoContent) => {
            if res.is_ended() {
                ctx.set_handled(true);
                ctx.transition(LifecycleState::Handled);
            } else {
                debug!(
                    request_id = %ctx.request_id(),
                    "Handler returned no content; passing request on"
                );
                ctx.transition(LifecycleState::Unmatched);
            }
        }
        Err(err) => {
            match err.downcast_ref::<HttpError>() {
                Some(http_err) => {
                    debug!(
                        request_id = %ctx.request_id(),
                        status = http_err.status().as_u16(),
                        message = %http_err.message(),
                        "Handler failed with HTTP error"
                    );
                    write_json(
                        &res,
                        http_err.status(),
                        Some(&json!({ "message": http_err.message() })),
                    );
                }
                None => {
                    error!(
                        request_id = %ctx.request_id(),
                        method = %ctx.request().method(),
                        path = %ctx.request().path(),
                        error = ?err,
                        "Handler failed"
                    );
                    write_json(
                        &res,
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Some(&json!({ "message": GENERIC_ERROR_MESSAGE })),
                    );
                }
            }
            finish(ctx, LifecycleState::Failed);
        }
    }
}

fn finish(ctx: &mut RequestContext, state: LifecycleState) {
    ctx.response().end();
    ctx.set_handled(true);
    ctx.transition(state);
}
