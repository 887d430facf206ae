//! Instance resolution.
//!
//! Route building asks an [`InstanceResolver`] for one instance of every
//! scanned controller and interceptor. [`Container`] is a small type-keyed
//! implementation: ready instances or provider closures, resolved once and
//! cached as singletons.

use crate::error::ResolveError;
use parking_lot::{Mutex, RwLock};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::debug;

/// Source of instances for scanned types.
pub trait InstanceResolver: Send + Sync {
    fn resolve_any(
        &self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Arc<dyn Any + Send + Sync>, ResolveError>;
}

type Provider =
    Arc<dyn Fn(&Container) -> anyhow::Result<Arc<dyn Any + Send + Sync>> + Send + Sync>;

/// Type-keyed singleton container.
#[derive(Default)]
pub struct Container {
    providers: RwLock<HashMap<TypeId, Provider>>,
    singletons: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    resolving: Mutex<Vec<(ThreadId, TypeId)>>,
}

impl Container {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ready-made instance.
    pub fn instance<T: Send + Sync + 'static>(&self, value: T) -> &Self {
        self.singletons
            .write()
            .insert(TypeId::of::<T>(), Arc::new(value));
        self
    }

    /// Register a shared instance.
    pub fn shared<T: Send + Sync + 'static>(&self, value: Arc<T>) -> &Self {
        self.singletons.write().insert(TypeId::of::<T>(), value);
        self
    }

    /// Register a provider. It runs at most once; the result is cached.
    pub fn provide<T, F>(&self, provider: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let provider: Provider = Arc::new(move |c: &Container| {
            let value = provider(c)?;
            Ok(Arc::new(value) as Arc<dyn Any + Send + Sync>)
        });
        self.providers.write().insert(TypeId::of::<T>(), provider);
        self
    }

    /// Register `T::default()` as the provider for `T`.
    pub fn provide_default<T: Default + Send + Sync + 'static>(&self) -> &Self {
        self.provide(|_| Ok(T::default()))
    }

    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        let type_name = std::any::type_name::<T>();
        self.resolve_any(TypeId::of::<T>(), type_name)?
            .downcast::<T>()
            .map_err(|_| ResolveError::TypeMismatch { type_name })
    }

    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.singletons.read().contains_key(&id) || self.providers.read().contains_key(&id)
    }
}

impl InstanceResolver for Container {
    fn resolve_any(
        &self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Arc<dyn Any + Send + Sync>, ResolveError> {
        if let Some(existing) = self.singletons.read().get(&type_id) {
            return Ok(Arc::clone(existing));
        }
        let provider = self
            .providers
            .read()
            .get(&type_id)
            .cloned()
            .ok_or(ResolveError::Missing { type_name })?;

        let key = (thread::current().id(), type_id);
        {
            let mut resolving = self.resolving.lock();
            if resolving.contains(&key) {
                return Err(ResolveError::Cycle { type_name });
            }
            resolving.push(key);
        }

        debug!(type_name, "Running provider");
        let result = provider(self);

        {
            let mut resolving = self.resolving.lock();
            if let Some(pos) = resolving.iter().rposition(|k| *k == key) {
                resolving.remove(pos);
            }
        }

        let value = result.map_err(|source| ResolveError::Provider { type_name, source })?;
        let mut singletons = self.singletons.write();
        Ok(Arc::clone(singletons.entry(type_id).or_insert(value)))
    }
}
