#![allow(dead_code)]

use bounce::{Bounce, Catalog, Container, RawRequest};
use bytes::Bytes;
use http::{HeaderName, HeaderValue, Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;

/// Routes tracing output through the test harness for the current test.
pub fn test_tracing() -> tracing::subscriber::DefaultGuard {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}

/// Build an application scanning `packages` over `catalog`.
pub fn build_app(packages: &[&str], catalog: Catalog, container: Container) -> Bounce {
    Bounce::builder()
        .packages(packages.iter().copied())
        .catalog(catalog)
        .resolver(Arc::new(container))
        .build()
        .expect("application builds")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: http::HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn message(&self) -> String {
        self.json()["message"]
            .as_str()
            .expect("message field")
            .to_string()
    }
}

pub async fn send(app: &Bounce, request: RawRequest) -> TestResponse {
    let response = app.dispatch(request).await;
    let (parts, body) = response.into_parts();
    TestResponse {
        status: parts.status,
        headers: parts.headers,
        body,
    }
}

pub async fn get(app: &Bounce, target: &str) -> TestResponse {
    send(app, RawRequest::new(Method::GET, target, Bytes::new())).await
}

pub async fn post_json(app: &Bounce, target: &str, body: &str) -> TestResponse {
    let request = RawRequest::new(Method::POST, target, body.to_string()).with_header(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    send(app, request).await
}

pub async fn request_with_header(
    app: &Bounce,
    method: Method,
    target: &str,
    name: &'static str,
    value: &str,
) -> TestResponse {
    let request = RawRequest::new(method, target, Bytes::new()).with_header(
        HeaderName::from_static(name),
        HeaderValue::from_str(value).expect("header value"),
    );
    send(app, request).await
}
