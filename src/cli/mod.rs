//! # CLI Module
//!
//! Command-line interface for inspecting and exercising the demo application
//! without an HTTP server in front of it.
//!
//! ## Commands
//!
//! - `routes` - Build the application and print the route table in
//!   evaluation order
//! - `call` - Dispatch a single request and print the status, headers and body
//!
//! Both commands accept `--config` pointing at a YAML or JSON
//! [`AppConfig`](crate::config::AppConfig) file. `BOUNCE_*` environment
//! variables are applied on top.
//!
//! ## Usage
//!
//! ```bash
//! bounce routes
//! bounce call GET '/pets?page=0&size=2&order=name'
//! bounce call POST /pets --body '{"name":"Kit","species":"cat"}'
//! BOUNCE_API_KEYS=secret bounce call GET /admin/stats --header x-api-key:secret
//! ```

mod commands;


pub use commands::{parse_header, run_cli, Cli, Commands};
