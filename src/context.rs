//! Per-request dispatch state.

use crate::router::ParamVec;
use crate::server::{RawRequest, ResponseHandle};
use http::Extensions;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use ulid::Ulid;

/// Where a request is in the dispatch lifecycle.
///
/// `Unstarted → Unmatched → Matching → Handled | Failed → Terminated`.
/// A request that no route handles goes straight from `Unmatched` to
/// `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Unstarted,
    Unmatched,
    Matching,
    Handled,
    Failed,
    Terminated,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Unstarted => "unstarted",
            LifecycleState::Unmatched => "unmatched",
            LifecycleState::Matching => "matching",
            LifecycleState::Handled => "handled",
            LifecycleState::Failed => "failed",
            LifecycleState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// State owned by one in-flight request.
///
/// The dispatcher creates exactly one per request and passes it by `&mut` to
/// every matching route in turn. Interceptors that need to leave a signal for
/// later routes use [`RequestContext::extensions_mut`].
pub struct RequestContext {
    request_id: Ulid,
    request: Arc<RawRequest>,
    response: ResponseHandle,
    handled: bool,
    state: LifecycleState,
    path_params: ParamVec,
    extensions: Extensions,
}

impl RequestContext {
    #[must_use]
    pub fn new(request: RawRequest) -> Self {
        Self {
            request_id: Ulid::new(),
            request: Arc::new(request),
            response: ResponseHandle::new(),
            handled: false,
            state: LifecycleState::Unstarted,
            path_params: ParamVec::new(),
            extensions: Extensions::new(),
        }
    }

    #[must_use]
    pub fn request_id(&self) -> Ulid {
        self.request_id
    }

    #[must_use]
    pub fn request(&self) -> &Arc<RawRequest> {
        &self.request
    }

    #[must_use]
    pub fn response(&self) -> &ResponseHandle {
        &self.response
    }

    /// Whether some route already produced the response for this request.
    #[must_use]
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    pub fn set_handled(&mut self, handled: bool) {
        self.handled = handled;
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn transition(&mut self, next: LifecycleState) {
        debug!(
            request_id = %self.request_id,
            from = %self.state,
            to = %next,
            "Request lifecycle transition"
        );
        self.state = next;
    }

    /// Path parameters captured by the route currently being offered the request.
    #[must_use]
    pub fn path_params(&self) -> &ParamVec {
        &self.path_params
    }

    pub(crate) fn set_path_params(&mut self, params: ParamVec) {
        self.path_params = params;
    }

    /// Percent-decoded path parameter. Duplicate names resolve to the last one.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<Cow<'_, str>> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| urlencoding::decode(v).unwrap_or(Cow::Borrowed(v.as_str())))
    }

    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("method", self.request.method())
            .field("path", &self.request.path())
            .field("handled", &self.handled)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
