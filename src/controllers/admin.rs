use crate::binding::ParamSpec;
use crate::controller::{Controller, HandlerTable};
use crate::dispatcher::NoContent;
use crate::mapping::{ControllerMapping, RequestMapping};
use crate::server::{RawRequest, ResponseHandle};
use crate::worker_pool::BlockingPool;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Operator endpoints under `/admin`, guarded by the API-key interceptor.
pub struct AdminController {
    pool: BlockingPool,
}

impl AdminController {
    pub fn new(pool: BlockingPool) -> Self {
        Self { pool }
    }
}

impl Controller for AdminController {
    fn mapping() -> ControllerMapping {
        ControllerMapping::prefix("/admin")
    }

    fn handlers(table: &mut HandlerTable<Self>) {
        table
            .route(
                "echo",
                RequestMapping::get("/echo"),
                vec![
                    ParamSpec::request(),
                    ParamSpec::query_map::<BTreeMap<String, String>>(),
                ],
                |_me, mut args| async move {
                    let request = args.require::<Arc<RawRequest>>(0)?;
                    let query = args.take::<BTreeMap<String, String>>(1).unwrap_or_default();
                    Ok(json!({
                        "method": request.method().as_str(),
                        "path": request.path(),
                        "query": query,
                        "headers": request.headers().len(),
                    }))
                },
            )
            .route(
                "stats",
                RequestMapping::get("/stats"),
                Vec::new(),
                |me, _args| async move {
                    let metrics = me.pool.metrics();
                    Ok(json!({
                        "pool": me.pool.name(),
                        "workers": me.pool.config().num_workers,
                        "dispatched": metrics.get_dispatched_count(),
                        "completed": metrics.get_completed_count(),
                        "failed": metrics.get_failed_count(),
                        "in_flight": metrics.get_queue_depth(),
                    }))
                },
            )
            // writes through the raw handle and returns no content
            .route(
                "raw",
                RequestMapping::post("/raw"),
                vec![ParamSpec::response(), ParamSpec::body::<Option<String>>()],
                |_me, mut args| async move {
                    let res = args.require::<ResponseHandle>(0)?;
                    let note = args.take::<Option<String>>(1).flatten();
                    res.set_status(StatusCode::ACCEPTED);
                    res.put_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
                    res.write(b"accepted");
                    if let Some(note) = note {
                        res.write(b": ");
                        res.write(note.as_bytes());
                    }
                    res.end();
                    Ok(NoContent)
                },
            );
    }
}
