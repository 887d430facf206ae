use crate::context::RequestContext;
use crate::error::ConfigError;
use crate::mapping::DEFAULT_ORDER;
use futures::future::BoxFuture;
use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Captured path parameters. Names are shared with the compiled pattern,
/// values are raw (still percent-encoded) segments.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Something the router can offer a request to.
///
/// Handlers receive the request context mutably and decide for themselves
/// whether to act; the router calls every matching handler in priority order.
pub trait RouteHandler: Send + Sync {
    fn handle<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()>;
}

struct FnHandler<F>(F);

impl<F> RouteHandler for FnHandler<F>
where
    F: Fn(&mut RequestContext) + Send + Sync,
{
    fn handle<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()> {
        (self.0)(ctx);
        Box::pin(futures::future::ready(()))
    }
}

/// Wrap a synchronous closure as a [`RouteHandler`].
pub fn handler_fn<F>(f: F) -> impl RouteHandler
where
    F: Fn(&mut RequestContext) + Send + Sync,
{
    FnHandler(f)
}

/// Compiled `{name}` path pattern.
///
/// A trailing `/*` segment turns the pattern into a prefix match: `/admin/*`
/// matches `/admin` and everything below it. A lone `*` matches every path.
#[derive(Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    params: Vec<Arc<str>>,
}

impl PathPattern {
    pub fn compile(path: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidRoute {
            path: path.to_string(),
            reason,
        };

        let mut pattern = String::with_capacity(path.len() + 8);
        pattern.push('^');
        let mut params = Vec::with_capacity(path.matches('{').count());

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        for (i, segment) in segments.iter().enumerate() {
            let last = i + 1 == segments.len();
            if *segment == "*" {
                if !last {
                    return Err(invalid("'*' is only allowed as the last segment".into()));
                }
                pattern.push_str("(?:/.*)?");
            } else if let Some(name) = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
            {
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(invalid(format!("bad placeholder '{segment}'")));
                }
                pattern.push_str("/([^/]+)");
                params.push(Arc::from(name));
            } else if segment.contains(['{', '}']) {
                return Err(invalid(format!("unbalanced placeholder in '{segment}'")));
            } else {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }

        if segments.is_empty() {
            pattern.push('/');
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| invalid(e.to_string()))?;
        Ok(Self {
            source: path.to_string(),
            regex,
            params,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.params
    }

    /// Match a request path. Trailing slashes are ignored except on `/`.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<ParamVec> {
        let path = normalize_path(path);
        let caps = self.regex.captures(path)?;
        let mut out = ParamVec::new();
        for (name, value) in self.params.iter().zip(caps.iter().skip(1)) {
            if let Some(value) = value {
                out.push((Arc::clone(name), value.as_str().to_string()));
            }
        }
        Some(out)
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPattern")
            .field("source", &self.source)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// One entry of the route table.
pub struct RouteEntry {
    seq: u64,
    method: Option<Method>,
    pattern: Option<PathPattern>,
    order: i32,
    name: String,
    handler: Arc<dyn RouteHandler>,
}

impl RouteEntry {
    /// `None` means any verb.
    #[must_use]
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// `None` means any path.
    #[must_use]
    pub fn pattern(&self) -> Option<&PathPattern> {
        self.pattern.as_ref()
    }

    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Registration sequence number; breaks ties between equal orders.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn handler(&self) -> &Arc<dyn RouteHandler> {
        &self.handler
    }

    /// Path parameters if this entry accepts `method` and `path`.
    #[must_use]
    pub fn accepts(&self, method: &Method, path: &str) -> Option<ParamVec> {
        if let Some(m) = &self.method {
            if m != method {
                return None;
            }
        }
        match &self.pattern {
            Some(p) => p.matches(path),
            None => Some(ParamVec::new()),
        }
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("seq", &self.seq)
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_ref().map(PathPattern::as_str))
            .field("order", &self.order)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = self.method.as_ref().map_or("*", Method::as_str);
        let path = self.pattern.as_ref().map_or("*", PathPattern::as_str);
        write!(f, "{method} {path} (order {}) -> {}", self.order, self.name)
    }
}

/// Ordered route table.
///
/// Entries are kept sorted by ascending order; entries with the same order
/// stay in registration order. The table is built once at startup and then
/// shared read-only.
#[derive(Default)]
pub struct Router {
    entries: Vec<RouteEntry>,
    next_seq: u64,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start registering a route on `path`.
    pub fn route(&mut self, path: impl Into<String>) -> RouteBuilder<'_> {
        RouteBuilder {
            router: self,
            path: Some(path.into()),
            method: None,
            order: DEFAULT_ORDER,
            name: None,
        }
    }

    /// Start registering a route that matches every path.
    pub fn any(&mut self) -> RouteBuilder<'_> {
        RouteBuilder {
            router: self,
            path: None,
            method: None,
            order: DEFAULT_ORDER,
            name: None,
        }
    }

    fn insert(&mut self, mut entry: RouteEntry) {
        entry.seq = self.next_seq;
        self.next_seq += 1;
        let at = self.entries.partition_point(|e| e.order <= entry.order);
        debug!(
            route = %entry,
            position = at,
            "Route inserted"
        );
        self.entries.insert(at, entry);
    }

    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries accepting the request, in the order they must be offered it.
    pub fn matching<'a>(
        &'a self,
        method: &'a Method,
        path: &'a str,
    ) -> impl Iterator<Item = (&'a RouteEntry, ParamVec)> + 'a {
        self.entries
            .iter()
            .filter_map(move |e| e.accepts(method, path).map(|params| (e, params)))
    }

    /// Log the route table, one record per entry.
    pub fn dump_routes(&self) {
        info!(routes_count = self.entries.len(), "Route table");
        for entry in &self.entries {
            info!(
                method = entry.method.as_ref().map_or("*", Method::as_str),
                path = entry.pattern.as_ref().map_or("*", PathPattern::as_str),
                order = entry.order,
                handler = %entry.name,
                "Route"
            );
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("entries", &self.entries)
            .finish()
    }
}

/// Builder returned by [`Router::route`] and [`Router::any`].
#[must_use = "a route is only registered once `handler` is called"]
pub struct RouteBuilder<'r> {
    router: &'r mut Router,
    path: Option<String>,
    method: Option<Method>,
    order: i32,
    name: Option<String>,
}

impl RouteBuilder<'_> {
    /// Restrict the route to one verb. Without this, every verb matches.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Label used in logs and route dumps.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Compile the path and register the route.
    pub fn handler<H>(self, handler: H) -> Result<(), ConfigError>
    where
        H: RouteHandler + 'static,
    {
        self.handler_arc(Arc::new(handler))
    }

    pub fn handler_arc(self, handler: Arc<dyn RouteHandler>) -> Result<(), ConfigError> {
        let pattern = match &self.path {
            Some(p) if p.as_str() != "*" => Some(PathPattern::compile(p)?),
            _ => None,
        };
        let name = self
            .name
            .or_else(|| self.path.clone())
            .unwrap_or_else(|| "*".to_string());
        self.router.insert(RouteEntry {
            seq: 0,
            method: self.method,
            pattern,
            order: self.order,
            name,
            handler,
        });
        Ok(())
    }
}
