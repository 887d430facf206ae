//! Wire boundary between an HTTP server and the dispatch pipeline.
//!
//! The server owns sockets and HTTP parsing. It hands each request over as a
//! [`RawRequest`] and receives the finished `http::Response<Bytes>` back; in
//! between, handlers may touch the [`ResponseHandle`] directly.

pub mod request;
pub mod response;

pub use request::{parse_query, RawRequest};
pub use response::{write_json, HttpResponse, ResponseHandle};
