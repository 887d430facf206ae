use bytes::Bytes;
use http::{HeaderMap, Method};
use std::collections::HashMap;
use tracing::debug;

/// Raw inbound request handed to the dispatcher by the HTTP server.
///
/// The query string is decoded once up front; everything else is kept as the
/// server delivered it.
#[derive(Debug, Clone)]
pub struct RawRequest {
    method: Method,
    path: String,
    query: Option<String>,
    query_params: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
}

impl RawRequest {
    /// Build a request from a method, a request target (`/path?query`) and a body.
    pub fn new(method: Method, target: &str, body: impl Into<Bytes>) -> Self {
        let (path, query) = split_target(target);
        Self::from_parts(method, path, query, HeaderMap::new(), body.into())
    }

    /// Convert an `http::Request` as produced by most server crates.
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        let path = parts.uri.path().to_string();
        let query = parts.uri.query().map(str::to_string);
        Self::from_parts(parts.method, path, query, parts.headers, body)
    }

    fn from_parts(
        method: Method,
        path: String,
        query: Option<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        let query_params = query.as_deref().map(parse_query).unwrap_or_default();
        debug!(
            method = %method,
            path = %path,
            param_count = query_params.len(),
            body_size_bytes = body.len(),
            "HTTP request parsed"
        );
        Self {
            method,
            path,
            query,
            query_params,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Undecoded query string, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text; non-UTF-8 values are ignored.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decoded query pairs in arrival order, duplicates included.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query_params
    }

    /// Query parameter by name. The last occurrence wins.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_params.iter().any(|(k, _)| k == name)
    }

    /// Query parameters collapsed into a map (last occurrence wins).
    #[must_use]
    pub fn query_map(&self) -> HashMap<String, String> {
        self.query_params.iter().cloned().collect()
    }
}

fn split_target(target: &str) -> (String, Option<String>) {
    match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (target.to_string(), None),
    }
}

/// Decode an `application/x-www-form-urlencoded` query string.
#[must_use]
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
