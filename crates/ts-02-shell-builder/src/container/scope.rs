//! # Service Scope
//!
//! An isolated nested resolution scope over a shared container, e.g. for
//! one recipe execution. Scoped services are created lazily on first
//! resolution and released when the scope is dropped.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{erase, unerase, Disposable, Service, ShellContainer};
use crate::domain::errors::ShellError;

pub struct ServiceScope {
    container: Arc<ShellContainer>,
    locals: Mutex<HashMap<TypeId, Service>>,
    disposables: Mutex<Vec<Arc<dyn Disposable>>>,
}

impl ServiceScope {
    pub(crate) fn new(container: Arc<ShellContainer>) -> Self {
        Self {
            container,
            locals: Mutex::new(HashMap::new()),
            disposables: Mutex::new(Vec::new()),
        }
    }

    /// The shared container this scope reads through to.
    pub fn container(&self) -> &Arc<ShellContainer> {
        &self.container
    }

    /// Resolve a scope-local, scoped, or shared service, in that order.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let id = TypeId::of::<T>();

        if let Some(found) = self.locals.lock().get(&id).and_then(unerase::<T>) {
            return Some(found);
        }

        if let Some(factory) = self.container.scoped_factory(&id) {
            let (service, disposable) = factory(self.container.as_ref());
            if let Some(disposable) = disposable {
                self.disposables.lock().push(disposable);
            }
            let mut locals = self.locals.lock();
            let stored = locals.entry(id).or_insert(service);
            return unerase::<T>(stored);
        }

        self.container.resolve::<T>()
    }

    pub fn require<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ShellError> {
        self.resolve::<T>().ok_or_else(|| ShellError::MissingService {
            tenant: self.container.tenant().to_string(),
            service: type_name::<T>(),
        })
    }

    /// Override a service for the lifetime of this scope only.
    pub fn insert<T: ?Sized + Send + Sync + 'static>(&self, service: Arc<T>) {
        self.locals.lock().insert(TypeId::of::<T>(), erase(service));
    }

    /// Tie a resource's release to the end of this scope.
    pub fn add_disposable(&self, resource: Arc<dyn Disposable>) {
        self.disposables.lock().push(resource);
    }
}

impl Drop for ServiceScope {
    fn drop(&mut self) {
        let disposables = std::mem::take(&mut *self.disposables.lock());
        for disposable in disposables.iter().rev() {
            disposable.dispose();
        }
    }
}
