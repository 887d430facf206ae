//! Metadata scanning over an explicit registration table.
//!
//! Types are registered in a [`Catalog`] with the capabilities they carry.
//! [`Catalog::scan`] then selects the registered types whose fully qualified
//! Rust path (`std::any::type_name`) starts with one of the given package
//! prefixes and that satisfy a predicate.

use crate::controller::{Controller, HandlerTable, Instance, Interceptor, MethodDescriptor};
use crate::error::ConfigError;
use crate::mapping::ControllerMapping;
use crate::router::Router;
use std::any::TypeId;
use std::fmt;
use tracing::debug;

/// Installs an interceptor instance into the router.
pub type InstallFn = fn(Instance, &mut Router) -> Result<(), ConfigError>;

fn install<I: Interceptor>(instance: Instance, router: &mut Router) -> Result<(), ConfigError> {
    let interceptor = instance
        .downcast::<I>()
        .map_err(|_| ConfigError::Resolve {
            type_name: std::any::type_name::<I>(),
            reason: "resolved instance has a different type".to_string(),
        })?;
    interceptor.configure(router)
}

/// Controller capability of a candidate.
#[derive(Debug, Clone)]
pub struct ControllerInfo {
    pub mapping: ControllerMapping,
    pub methods: Vec<MethodDescriptor>,
}

/// A registered type and the capabilities it declares.
#[derive(Clone)]
pub struct CandidateType {
    type_name: &'static str,
    type_id: TypeId,
    controller: Option<ControllerInfo>,
    interceptor: Option<InstallFn>,
}

impl CandidateType {
    fn new(type_name: &'static str, type_id: TypeId) -> Self {
        Self {
            type_name,
            type_id,
            controller: None,
            interceptor: None,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub fn controller(&self) -> Option<&ControllerInfo> {
        self.controller.as_ref()
    }

    #[must_use]
    pub fn interceptor(&self) -> Option<InstallFn> {
        self.interceptor
    }

    /// Declared handler methods accepted by `predicate`, in declaration order.
    pub fn methods<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a MethodDescriptor>
    where
        P: Fn(&MethodDescriptor) -> bool + 'a,
    {
        self.controller
            .iter()
            .flat_map(|c| c.methods.iter())
            .filter(move |m| predicate(m))
    }
}

impl fmt::Debug for CandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateType")
            .field("type_name", &self.type_name)
            .field("controller", &self.controller.is_some())
            .field("interceptor", &self.interceptor.is_some())
            .finish()
    }
}

/// Type predicate: carries the controller marker.
#[must_use]
pub fn is_controller() -> impl Fn(&CandidateType) -> bool {
    |c| c.controller.is_some()
}

/// Type predicate: carries the interceptor capability.
#[must_use]
pub fn is_interceptor() -> impl Fn(&CandidateType) -> bool {
    |c| c.interceptor.is_some()
}

/// Method predicate: carries a request mapping.
#[must_use]
pub fn has_request_mapping() -> impl Fn(&MethodDescriptor) -> bool {
    |m| m.mapping().is_some()
}

/// Registration table of candidate types.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    types: Vec<CandidateType>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry<T: 'static>(&mut self) -> &mut CandidateType {
        let id = TypeId::of::<T>();
        let at = match self.types.iter().position(|c| c.type_id == id) {
            Some(at) => at,
            None => {
                self.types
                    .push(CandidateType::new(std::any::type_name::<T>(), id));
                self.types.len() - 1
            }
        };
        &mut self.types[at]
    }

    /// Register `C` as a controller.
    pub fn controller<C: Controller>(&mut self) -> &mut Self {
        let info = ControllerInfo {
            mapping: C::mapping(),
            methods: HandlerTable::<C>::collect(),
        };
        debug!(
            type_name = std::any::type_name::<C>(),
            methods = info.methods.len(),
            "Controller registered"
        );
        self.entry::<C>().controller = Some(info);
        self
    }

    /// Register `I` as an interceptor.
    pub fn interceptor<I: Interceptor>(&mut self) -> &mut Self {
        debug!(type_name = std::any::type_name::<I>(), "Interceptor registered");
        self.entry::<I>().interceptor = Some(install::<I>);
        self
    }

    /// Every registered type, in registration order.
    #[must_use]
    pub fn types(&self) -> &[CandidateType] {
        &self.types
    }

    /// Registered types under any of `prefixes` accepted by `predicate`.
    ///
    /// An empty prefix list is an error; an empty result is not.
    pub fn scan<S, P>(&self, prefixes: &[S], predicate: P) -> Result<Vec<&CandidateType>, ConfigError>
    where
        S: AsRef<str>,
        P: Fn(&CandidateType) -> bool,
    {
        if prefixes.is_empty() {
            return Err(ConfigError::NoPackages);
        }
        let found: Vec<&CandidateType> = self
            .types
            .iter()
            .filter(|c| prefixes.iter().any(|p| c.type_name.starts_with(p.as_ref())))
            .filter(|c| predicate(c))
            .collect();
        debug!(
            prefixes = ?prefixes.iter().map(AsRef::as_ref).collect::<Vec<&str>>(),
            found = found.len(),
            "Package scan complete"
        );
        Ok(found)
    }
}
