use bytes::{Bytes, BytesMut};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
struct Pending {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    ended: bool,
}

impl Default for Pending {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            ended: false,
        }
    }
}

/// Raw outbound response shared between the pipeline and handlers.
///
/// Cloning the handle shares the same response. Status, headers and body can
/// be changed until [`ResponseHandle::end`] is called; afterwards every
/// mutation is dropped with a warning, so a request is finalized once.
#[derive(Debug, Clone, Default)]
pub struct ResponseHandle {
    inner: Arc<Mutex<Pending>>,
}

impl ResponseHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.lock().status
    }

    /// Returns `false` if the response already ended.
    pub fn set_status(&self, status: StatusCode) -> bool {
        let mut pending = self.inner.lock();
        if pending.ended {
            warn!(status = status.as_u16(), "Status change after response ended ignored");
            return false;
        }
        pending.status = status;
        true
    }

    /// Insert (replace) a header. Returns `false` if the response already ended.
    pub fn put_header(&self, name: HeaderName, value: HeaderValue) -> bool {
        let mut pending = self.inner.lock();
        if pending.ended {
            warn!(header = %name, "Header change after response ended ignored");
            return false;
        }
        pending.headers.insert(name, value);
        true
    }

    #[must_use]
    pub fn header(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.inner.lock().headers.get(name).cloned()
    }

    /// Append to the body. Returns `false` if the response already ended.
    pub fn write(&self, chunk: &[u8]) -> bool {
        let mut pending = self.inner.lock();
        if pending.ended {
            warn!(bytes = chunk.len(), "Body write after response ended ignored");
            return false;
        }
        pending.body.extend_from_slice(chunk);
        true
    }

    /// Finalize the response. Only the first call has an effect; it returns
    /// `true`, later calls return `false`.
    pub fn end(&self) -> bool {
        let mut pending = self.inner.lock();
        if pending.ended {
            return false;
        }
        pending.ended = true;
        true
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.inner.lock().ended
    }

    /// Snapshot of the response in `http` form.
    #[must_use]
    pub fn to_http(&self) -> http::Response<Bytes> {
        let pending = self.inner.lock();
        let mut response = http::Response::new(Bytes::copy_from_slice(&pending.body));
        *response.status_mut() = pending.status;
        *response.headers_mut() = pending.headers.clone();
        response
    }
}

/// Structured response a handler can return to pick its own status code.
///
/// When `body` is `None` only the status is written.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl HttpResponse {
    /// Status-only response.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    #[must_use]
    pub fn with_body(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    /// Serialize `body` into a response with `status`.
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> serde_json::Result<Self> {
        Ok(Self::with_body(status, serde_json::to_value(body)?))
    }

    #[must_use]
    pub fn created(body: Value) -> Self {
        Self::with_body(StatusCode::CREATED, body)
    }

    #[must_use]
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }
}

/// Write a JSON response: status, `Content-Type: application/json`, and the
/// serialized body when present.
///
/// Returns `false` without touching the response if it already ended.
pub fn write_json(res: &ResponseHandle, status: StatusCode, body: Option<&Value>) -> bool {
    if res.is_ended() {
        warn!(
            status = status.as_u16(),
            "Response already ended; dropping second write"
        );
        return false;
    }
    res.set_status(status);
    res.put_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(body) = body {
        match serde_json::to_vec(body) {
            Ok(bytes) => {
                res.write(&bytes);
            }
            Err(err) => {
                // Value always serializes; keep the status and skip the body.
                warn!(error = %err, "Failed to encode response body");
            }
        }
    }
    true
}
