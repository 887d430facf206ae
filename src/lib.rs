//! # bounce
//!
//! **bounce** routes HTTP requests to controller methods. Controllers declare
//! their routes with a path prefix and per-method [`RequestMapping`]s; the
//! framework binds path variables, query parameters, paging and JSON bodies to
//! each method's declared parameters and turns whatever the method returns
//! (or fails with) into a JSON response.
//!
//! ## Overview
//!
//! A request travels through a single ordered chain of routes:
//!
//! 1. The [`Dispatcher`](dispatcher::Dispatcher) resets the request context.
//! 2. Every [`RouteEntry`](router::RouteEntry) whose method and path pattern
//!    match runs in ascending `order`; ties keep registration order.
//! 3. Interceptors (auth guards, request logging) are ordinary routes
//!    installed with low or high orders.
//! 4. A terminal step ends the response, answering `404` with an empty body
//!    when no route handled the request.
//!
//! Once a response has been written it can not be written again; later routes
//! see `is_handled()` and step aside.
//!
//! ## Architecture
//!
//! - **[`router`]** - Path patterns, route entries and the ordered route table
//! - **[`dispatcher`]** - The per-request chain and response normalization
//! - **[`binding`]** - Parameter specs and binding from the request context
//! - **[`controller`]** - The [`Controller`] and [`Interceptor`] traits
//! - **[`scanner`]** - The [`Catalog`] of known types and package-prefix scanning
//! - **[`container`]** - Instance resolution for scanned types
//! - **[`app`]** - Wiring everything into a [`Bounce`] application
//! - **[`middleware`]** - The API-key guard and request logger interceptors
//! - **[`repository`]** - An in-memory repository with paging
//! - **[`server`]** - Request and response types at the HTTP boundary
//! - **[`config`]** / **[`logging`]** - File and environment configuration,
//!   `tracing` subscriber setup
//!
//! ## Example
//!
//! ```rust,ignore
//! use bounce::{Bounce, Catalog, Container, Controller, ControllerMapping, HandlerTable,
//!     ParamSpec, RequestMapping};
//! use std::sync::Arc;
//!
//! struct Hello;
//!
//! impl Controller for Hello {
//!     fn mapping() -> ControllerMapping {
//!         ControllerMapping::prefix("/hello")
//!     }
//!
//!     fn handlers(table: &mut HandlerTable<Self>) {
//!         table.route(
//!             "greet",
//!             RequestMapping::get("/{name}"),
//!             vec![ParamSpec::path::<String>("name")],
//!             |_me, mut args| async move {
//!                 let name = args.require::<String>(0)?;
//!                 Ok(serde_json::json!({ "greeting": format!("hello {name}") }))
//!             },
//!         );
//!     }
//! }
//!
//! let mut catalog = Catalog::new();
//! catalog.controller::<Hello>();
//! let container = Container::new();
//! container.instance(Hello);
//!
//! let app = Bounce::builder()
//!     .packages(["my_app"])
//!     .catalog(catalog)
//!     .resolver(Arc::new(container))
//!     .build()?;
//! let response = app.handle(request).await;
//! ```
//!
//! ## Binary
//!
//! The `bounce` binary wraps the demo application in [`controllers`]; see
//! [`cli`] for its commands.

pub mod app;
pub mod binding;
pub mod cli;
pub mod config;
pub mod container;
pub mod context;
pub mod controller;
pub mod controllers;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod middleware;
pub mod pagination;
pub mod repository;
pub mod router;
pub mod scanner;
pub mod server;
pub mod worker_pool;

pub use app::{Bounce, BounceBuilder};
pub use binding::{Args, ParamSpec};
pub use config::AppConfig;
pub use container::{Container, InstanceResolver};
pub use context::{LifecycleState, RequestContext};
pub use controller::{Controller, HandlerTable, Interceptor};
pub use dispatcher::{Dispatcher, IntoReply, NoContent, Reply};
pub use error::{ConfigError, HttpError, ResolveError};
pub use mapping::{ControllerMapping, RequestMapping};
pub use pagination::{Page, Pageable, Sort};
pub use router::{RouteHandler, Router};
pub use scanner::Catalog;
pub use server::{HttpResponse, RawRequest, ResponseHandle};
