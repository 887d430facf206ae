//! Controller and interceptor contracts.
//!
//! A controller declares its handler methods in a [`HandlerTable`]: name,
//! optional [`RequestMapping`], parameter specs and an async function taking
//! the controller instance and the bound [`Args`]. An interceptor is a
//! one-shot installer that adds routes of its own to the [`Router`].

use crate::binding::{bind, Args, ParamSpec};
use crate::context::{LifecycleState, RequestContext};
use crate::dispatcher::{normalize, IntoReply, Reply};
use crate::error::ConfigError;
use crate::mapping::{ControllerMapping, RequestMapping};
use crate::router::{RouteHandler, Router};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A type whose mapped methods become routes.
pub trait Controller: Send + Sync + 'static {
    /// Class-level mapping. The default has an empty prefix.
    fn mapping() -> ControllerMapping
    where
        Self: Sized,
    {
        ControllerMapping::default()
    }

    /// Declare the handler methods.
    fn handlers(table: &mut HandlerTable<Self>)
    where
        Self: Sized;
}

/// A type that installs cross-cutting routes once at startup.
pub trait Interceptor: Send + Sync + 'static {
    fn configure(self: Arc<Self>, router: &mut Router) -> Result<(), ConfigError>;
}

/// Type-erased instance as produced by the resolver.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Type-erased handler invocation.
pub type Invoker =
    Arc<dyn Fn(Instance, Args) -> BoxFuture<'static, anyhow::Result<Reply>> + Send + Sync>;

/// One declared handler method.
#[derive(Clone)]
pub struct MethodDescriptor {
    name: &'static str,
    mapping: Option<RequestMapping>,
    params: Vec<ParamSpec>,
    invoker: Option<Invoker>,
}

impl MethodDescriptor {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn mapping(&self) -> Option<&RequestMapping> {
        self.mapping.as_ref()
    }

    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    #[must_use]
    pub fn invoker(&self) -> Option<&Invoker> {
        self.invoker.as_ref()
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("mapping", &self.mapping)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Method declarations of a controller `C`.
pub struct HandlerTable<C> {
    methods: Vec<MethodDescriptor>,
    _controller: PhantomData<fn() -> C>,
}

impl<C: Controller> HandlerTable<C> {
    pub(crate) fn collect() -> Vec<MethodDescriptor> {
        let mut table = Self {
            methods: Vec::new(),
            _controller: PhantomData,
        };
        C::handlers(&mut table);
        table.methods
    }

    /// Declare a mapped handler method.
    pub fn route<F, Fut, R>(
        &mut self,
        name: &'static str,
        mapping: RequestMapping,
        params: Vec<ParamSpec>,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: IntoReply + Send + 'static,
    {
        let invoker: Invoker = Arc::new(move |instance: Instance, args: Args| {
            match instance.downcast::<C>() {
                Ok(controller) => {
                    let fut = handler(controller, args);
                    async move { fut.await?.into_reply() }.boxed()
                }
                Err(_) => futures::future::ready(Err(anyhow::anyhow!(
                    "resolved instance is not a {}",
                    std::any::type_name::<C>()
                )))
                .boxed(),
            }
        });
        self.methods.push(MethodDescriptor {
            name,
            mapping: Some(mapping),
            params,
            invoker: Some(invoker),
        });
        self
    }

    /// Declare a method without a mapping. It is visible to the scanner but
    /// never routed.
    pub fn declare(&mut self, name: &'static str) -> &mut Self {
        self.methods.push(MethodDescriptor {
            name,
            mapping: None,
            params: Vec::new(),
            invoker: None,
        });
        self
    }
}

/// Route table entry invoking one controller method.
pub(crate) struct ControllerRoute {
    handler: String,
    params: Vec<ParamSpec>,
    instance: Instance,
    invoker: Invoker,
    timeout: Duration,
}

impl ControllerRoute {
    pub(crate) fn new(
        handler: String,
        params: Vec<ParamSpec>,
        instance: Instance,
        invoker: Invoker,
        timeout: Duration,
    ) -> Self {
        Self {
            handler,
            params,
            instance,
            invoker,
            timeout,
        }
    }

    async fn invoke(&self, ctx: &mut RequestContext) {
        if ctx.is_handled() {
            debug!(handler = %self.handler, "Request already handled; skipping route");
            return;
        }
        ctx.transition(LifecycleState::Matching);

        let args = match bind(ctx, &self.params) {
            Ok(args) => args,
            Err(err) => {
                normalize(ctx, Err(err.into()));
                return;
            }
        };

        let call = (self.invoker)(Arc::clone(&self.instance), args);
        let guarded = AssertUnwindSafe(call).catch_unwind();
        let outcome = match tokio::time::timeout(self.timeout, guarded).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(anyhow::anyhow!(
                "handler {} panicked: {}",
                self.handler,
                panic_message(panic.as_ref())
            )),
            Err(_) => Err(anyhow::anyhow!(
                "handler {} timed out after {:?}",
                self.handler,
                self.timeout
            )),
        };
        normalize(ctx, outcome);
    }
}

impl RouteHandler for ControllerRoute {
    fn handle<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()> {
        self.invoke(ctx).boxed()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeter;

    impl Controller for Greeter {
        fn mapping() -> ControllerMapping {
            ControllerMapping::prefix("/greet")
        }

        fn handlers(table: &mut HandlerTable<Self>) {
            table
                .route(
                    "hello",
                    RequestMapping::get("/{name}"),
                    vec![ParamSpec::path::<String>("name")],
                    |_me, mut args| async move {
                        let name = args.require::<String>(0)?;
                        Ok(format!("hello {name}"))
                    },
                )
                .declare("helper");
        }
    }

    #[test]
    fn test_handler_table_collects_declarations() {
        let methods = HandlerTable::<Greeter>::collect();
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].name(), "hello");
        assert_eq!(methods[0].mapping().map(|m| m.path.as_str()), Some("/{name}"));
        assert_eq!(methods[0].params().len(), 1);
        assert!(methods[1].mapping().is_none());
        assert!(methods[1].invoker().is_none());
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
