//! # Shell Container
//!
//! Capability-keyed service registry resolved once at build time.
//!
//! ## Lifetime Rules
//!
//! - Services are registered by feature modules into a `ContainerBuilder`
//! - The built `ShellContainer` owns every registered `Disposable`
//! - `dispose()` releases them in reverse registration order, exactly once
//! - A `ServiceScope` owns the scoped services it created; dropping the scope
//!   releases them without touching the shared container

mod builder;
mod scope;

pub use builder::ContainerBuilder;
pub use scope::ServiceScope;

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::domain::errors::ShellError;

/// A resource released when its owning container or scope is disposed.
pub trait Disposable: Send + Sync {
    fn dispose(&self);
}

/// Type-erased service. Stored as `Arc<Arc<T>>` so `T` may be unsized.
pub(crate) type Service = Arc<dyn Any + Send + Sync>;

/// Factory creating one instance of a scoped service per `ServiceScope`.
pub(crate) type ScopedFactory =
    Arc<dyn Fn(&ShellContainer) -> (Service, Option<Arc<dyn Disposable>>) + Send + Sync>;

pub(crate) fn erase<T: ?Sized + Send + Sync + 'static>(service: Arc<T>) -> Service {
    Arc::new(service)
}

pub(crate) fn unerase<T: ?Sized + Send + Sync + 'static>(service: &Service) -> Option<Arc<T>> {
    service.downcast_ref::<Arc<T>>().cloned()
}

/// The service resolver of one tenant's shell.
pub struct ShellContainer {
    tenant: String,
    services: HashMap<TypeId, Service>,
    scoped: HashMap<TypeId, ScopedFactory>,
    disposables: Mutex<Vec<Arc<dyn Disposable>>>,
    disposed: AtomicBool,
}

impl ShellContainer {
    pub(crate) fn new(
        tenant: String,
        services: HashMap<TypeId, Service>,
        scoped: HashMap<TypeId, ScopedFactory>,
        disposables: Vec<Arc<dyn Disposable>>,
    ) -> Self {
        Self {
            tenant,
            services,
            scoped,
            disposables: Mutex::new(disposables),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Resolve a singleton service.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services.get(&TypeId::of::<T>()).and_then(unerase::<T>)
    }

    /// Resolve a singleton service or report which one is missing.
    pub fn require<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ShellError> {
        self.resolve::<T>().ok_or_else(|| ShellError::MissingService {
            tenant: self.tenant.clone(),
            service: type_name::<T>(),
        })
    }

    /// Whether a singleton or scoped registration exists for `T`.
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.services.contains_key(&id) || self.scoped.contains_key(&id)
    }

    pub(crate) fn scoped_factory(&self, id: &TypeId) -> Option<ScopedFactory> {
        self.scoped.get(id).cloned()
    }

    /// Open an isolated nested resolution scope.
    pub fn create_scope(self: &Arc<Self>) -> ServiceScope {
        ServiceScope::new(Arc::clone(self))
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Release every owned resource. Later calls do nothing.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let disposables = std::mem::take(&mut *self.disposables.lock());
        debug!(tenant = %self.tenant, count = disposables.len(), "Disposing shell container");
        for disposable in disposables.iter().rev() {
            disposable.dispose();
        }
    }
}

impl Drop for ShellContainer {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    pub(crate) struct CountingResource {
        pub(crate) label: &'static str,
        pub(crate) disposals: AtomicUsize,
        pub(crate) log: Option<Arc<Mutex<Vec<&'static str>>>>,
    }

    impl CountingResource {
        pub(crate) fn new(label: &'static str) -> Arc<Self> {
            Arc::new(Self {
                label,
                disposals: AtomicUsize::new(0),
                log: None,
            })
        }

        pub(crate) fn logged(label: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> Arc<Self> {
            Arc::new(Self {
                label,
                disposals: AtomicUsize::new(0),
                log: Some(log),
            })
        }

        pub(crate) fn count(&self) -> usize {
            self.disposals.load(Ordering::SeqCst)
        }
    }

    impl Disposable for CountingResource {
        fn dispose(&self) {
            self.disposals.fetch_add(1, Ordering::SeqCst);
            if let Some(log) = &self.log {
                log.lock().push(self.label);
            }
        }
    }

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_resolve_trait_object() {
        let mut builder = ContainerBuilder::new("alpha");
        builder.add_singleton::<dyn Greeter>(Arc::new(English));
        let container = builder.build();

        let greeter = container.resolve::<dyn Greeter>().unwrap();
        assert_eq!(greeter.greet(), "hello");
        assert!(container.resolve::<String>().is_none());
    }

    #[test]
    fn test_require_names_missing_service() {
        let container = ContainerBuilder::new("alpha").build();
        let err = container.require::<dyn Greeter>().err().unwrap();

        assert!(matches!(err, ShellError::MissingService { ref tenant, .. } if tenant == "alpha"));
    }

    #[test]
    fn test_dispose_reverse_order_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = CountingResource::logged("first", Arc::clone(&log));
        let second = CountingResource::logged("second", Arc::clone(&log));

        let mut builder = ContainerBuilder::new("alpha");
        builder.add_disposable(first.clone());
        builder.add_disposable(second.clone());
        let container = builder.build();

        container.dispose();
        container.dispose();
        drop(container);

        assert_eq!(*log.lock(), vec!["second", "first"]);
        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 1);
    }

    #[test]
    fn test_drop_disposes_as_safety_net() {
        let resource = CountingResource::new("resource");
        let mut builder = ContainerBuilder::new("alpha");
        builder.add_disposable(resource.clone());

        drop(builder.build());

        assert_eq!(resource.count(), 1);
    }
}
