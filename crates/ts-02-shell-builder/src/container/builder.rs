//! # Container Builder
//!
//! Collects registrations from feature modules.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::{erase, Disposable, ScopedFactory, Service, ShellContainer};

/// Mutable registration surface handed to each feature module.
pub struct ContainerBuilder {
    tenant: String,
    services: HashMap<TypeId, Service>,
    scoped: HashMap<TypeId, ScopedFactory>,
    disposables: Vec<Arc<dyn Disposable>>,
}

impl ContainerBuilder {
    pub fn new(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            services: HashMap::new(),
            scoped: HashMap::new(),
            disposables: Vec::new(),
        }
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Register a shared service. A later registration replaces an earlier one.
    pub fn add_singleton<T: ?Sized + Send + Sync + 'static>(&mut self, service: Arc<T>) -> &mut Self {
        if self.services.insert(TypeId::of::<T>(), erase(service)).is_some() {
            warn!(tenant = %self.tenant, service = type_name::<T>(), "Service registration replaced");
        }
        self
    }

    /// Register a shared service whose release is owned by the container.
    pub fn add_owned_singleton<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        service: Arc<T>,
        resource: Arc<dyn Disposable>,
    ) -> &mut Self {
        self.disposables.push(resource);
        self.add_singleton::<T>(service)
    }

    /// Register a service instantiated once per `ServiceScope`.
    pub fn add_scoped<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ShellContainer) -> Arc<T> + Send + Sync + 'static,
    {
        let factory: ScopedFactory = Arc::new(move |container: &ShellContainer| {
            (erase(factory(container)), None::<Arc<dyn Disposable>>)
        });
        self.scoped.insert(TypeId::of::<T>(), factory);
        self
    }

    /// Register a scoped service that is released when its scope ends.
    pub fn add_scoped_disposable<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ShellContainer) -> (Arc<T>, Arc<dyn Disposable>) + Send + Sync + 'static,
    {
        let factory: ScopedFactory = Arc::new(move |container: &ShellContainer| {
            let (instance, resource) = factory(container);
            (erase(instance), Some(resource))
        });
        self.scoped.insert(TypeId::of::<T>(), factory);
        self
    }

    /// Hand a resource to the container so it is released on disposal.
    pub fn add_disposable(&mut self, resource: Arc<dyn Disposable>) -> &mut Self {
        self.disposables.push(resource);
        self
    }

    pub fn build(self) -> ShellContainer {
        ShellContainer::new(self.tenant, self.services, self.scoped, self.disposables)
    }
}
