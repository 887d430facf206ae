//! Route table construction and application bootstrap.
//!
//! [`build_routes`] runs once at startup: interceptors found in the scanned
//! packages are installed first, then every mapped method of every scanned
//! controller becomes one route. [`Bounce`] ties the finished table to a
//! [`Dispatcher`] and is what an HTTP server calls per request.

use crate::config::AppConfig;
use crate::container::{Container, InstanceResolver};
use crate::controller::ControllerRoute;
use crate::dispatcher::Dispatcher;
use crate::error::ConfigError;
use crate::router::Router;
use crate::scanner::{has_request_mapping, is_controller, is_interceptor, Catalog};
use crate::server::RawRequest;
use crate::worker_pool::BlockingPool;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, warn};

/// Populate `router` from the types in `catalog` under `prefixes`.
///
/// Any resolution failure or invalid route aborts the build.
pub fn build_routes<S: AsRef<str>>(
    prefixes: &[S],
    catalog: &Catalog,
    router: &mut Router,
    resolver: &dyn InstanceResolver,
    config: &AppConfig,
) -> Result<(), ConfigError> {
    if prefixes.is_empty() {
        return Err(ConfigError::NoPackages);
    }

    for candidate in catalog.scan(prefixes, is_interceptor())? {
        let type_name = candidate.type_name();
        let Some(install) = candidate.interceptor() else {
            continue;
        };
        let instance = resolver
            .resolve_any(candidate.type_id(), type_name)
            .map_err(|e| ConfigError::from((type_name, e)))?;
        info!(interceptor = type_name, "Mapping [INTERCEPTOR] {type_name}");
        install(instance, router)?;
    }

    let default_timeout = config.dispatch.handler_timeout();
    for candidate in catalog.scan(prefixes, is_controller())? {
        let type_name = candidate.type_name();
        let Some(info) = candidate.controller() else {
            continue;
        };
        let instance = resolver
            .resolve_any(candidate.type_id(), type_name)
            .map_err(|e| ConfigError::from((type_name, e)))?;

        for method in candidate.methods(has_request_mapping()) {
            let (Some(mapping), Some(invoker)) = (method.mapping(), method.invoker()) else {
                warn!(
                    controller = type_name,
                    method = method.name(),
                    "Mapped method has no invoker; skipping"
                );
                continue;
            };
            let path = info.mapping.join(mapping);
            let handler = format!("{}::{}", short_name(type_name), method.name());
            let timeout = mapping.timeout.unwrap_or(default_timeout);

            router
                .route(path.as_str())
                .method(mapping.method.clone())
                .order(mapping.order)
                .name(handler.as_str())
                .handler(ControllerRoute::new(
                    handler.clone(),
                    method.params().to_vec(),
                    Arc::clone(&instance),
                    Arc::clone(invoker),
                    timeout,
                ))?;

            info!(
                method = %mapping.method,
                path = %path,
                order = mapping.order,
                handler = %handler,
                timeout_ms = timeout.as_millis() as u64,
                "Mapping route"
            );
        }
    }

    info!(routes_count = router.len(), "Route table built");
    Ok(())
}

/// Last path segment of a type name, `crate::mod::Type` -> `Type`.
fn short_name(type_name: &str) -> &str {
    type_name.rsplit("::").next().unwrap_or(type_name)
}

/// A built application: the route table plus its dispatcher.
#[derive(Debug, Clone)]
pub struct Bounce {
    dispatcher: Dispatcher,
    config: Arc<AppConfig>,
}

impl Bounce {
    #[must_use]
    pub fn builder() -> BounceBuilder {
        BounceBuilder::default()
    }

    /// Server entry point.
    pub async fn handle(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
        self.dispatcher.dispatch(RawRequest::from_http(request)).await
    }

    pub async fn dispatch(&self, request: RawRequest) -> http::Response<Bytes> {
        self.dispatcher.dispatch(request).await
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        self.dispatcher.router()
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Builder for [`Bounce`].
#[derive(Default)]
pub struct BounceBuilder {
    config: AppConfig,
    packages: Option<Vec<String>>,
    catalog: Catalog,
    resolver: Option<Arc<dyn InstanceResolver>>,
}

impl BounceBuilder {
    #[must_use]
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Scan prefixes. Takes precedence over `packages` in the config.
    #[must_use]
    pub fn packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages = Some(packages.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Resolver for scanned types. Defaults to an empty [`Container`].
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn InstanceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Build the route table on the current thread.
    pub fn build(self) -> Result<Bounce, ConfigError> {
        let packages = self.packages.unwrap_or_else(|| self.config.packages.clone());
        if packages.is_empty() {
            return Err(ConfigError::NoPackages);
        }
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(Container::new()));

        let mut router = Router::new();
        build_routes(
            &packages,
            &self.catalog,
            &mut router,
            resolver.as_ref(),
            &self.config,
        )?;

        let mut config = self.config;
        config.packages = packages;
        Ok(Bounce {
            dispatcher: Dispatcher::new(Arc::new(router)),
            config: Arc::new(config),
        })
    }

    /// Build the route table on the blocking pool.
    pub async fn build_async(self, pool: &BlockingPool) -> Result<Bounce, ConfigError> {
        pool.run(move || self.build().map_err(anyhow::Error::from))
            .await
            .map_err(|err| match err.downcast::<ConfigError>() {
                Ok(config_err) => config_err,
                Err(other) => ConfigError::Startup {
                    reason: other.to_string(),
                },
            })
    }
}
