//! # Restart Queue
//!
//! Tenants flagged for rebuild during one logical unit of work.
//!
//! The queue is ambient: `RestartQueue::scope` installs it as a task-local for
//! the duration of a future, and `ShellHost::spawn_in_scope` carries it into
//! spawned tasks. Concurrent units of work each see their own queue.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::ShellSettings;
use tokio::task::futures::TaskLocalFuture;

tokio::task_local! {
    static RESTART_QUEUE: RestartQueue;
}

/// Ordered set of tenant settings pending rebuild, unique by tenant name.
#[derive(Debug, Clone, Default)]
pub struct RestartQueue {
    pending: Arc<Mutex<VecDeque<ShellSettings>>>,
}

impl RestartQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue of the current unit of work, if one is in scope.
    pub fn current() -> Option<RestartQueue> {
        RESTART_QUEUE.try_with(|queue| queue.clone()).ok()
    }

    /// Run `future` with this queue as the ambient restart queue.
    pub fn scope<F: Future>(self, future: F) -> TaskLocalFuture<RestartQueue, F> {
        RESTART_QUEUE.scope(self, future)
    }

    /// Add `settings` unless its tenant is already queued.
    pub fn enqueue(&self, settings: ShellSettings) -> bool {
        let mut pending = self.pending.lock();
        if pending.iter().any(|s| s.name() == settings.name()) {
            return false;
        }
        pending.push_back(settings);
        true
    }

    /// Take the oldest pending entry.
    pub fn pop(&self) -> Option<ShellSettings> {
        self.pending.lock().pop_front()
    }

    pub fn contains(&self, tenant: &str) -> bool {
        self.pending.lock().iter().any(|s| s.name() == tenant)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::TenantState;

    fn running(name: &str) -> ShellSettings {
        ShellSettings::new(name, TenantState::Running).unwrap()
    }

    #[test]
    fn test_enqueue_deduplicates_by_name() {
        let queue = RestartQueue::new();

        assert!(queue.enqueue(running("alpha")));
        assert!(!queue.enqueue(running("alpha")));
        assert!(queue.enqueue(running("beta")));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap().name(), "alpha");
        assert_eq!(queue.pop().unwrap().name(), "beta");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_popped_tenant_can_be_queued_again() {
        let queue = RestartQueue::new();
        queue.enqueue(running("alpha"));
        queue.enqueue(running("beta"));

        assert_eq!(queue.pop().unwrap().name(), "alpha");
        assert!(queue.enqueue(running("alpha")));
        assert_eq!(queue.pop().unwrap().name(), "beta");
        assert_eq!(queue.pop().unwrap().name(), "alpha");
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_no_queue_outside_scope() {
        assert!(RestartQueue::current().is_none());
    }

    #[tokio::test]
    async fn test_scope_is_visible_to_awaited_work() {
        let queue = RestartQueue::new();

        queue
            .clone()
            .scope(async {
                tokio::task::yield_now().await;
                RestartQueue::current().unwrap().enqueue(running("alpha"));
            })
            .await;

        assert!(queue.contains("alpha"));
    }

    #[tokio::test]
    async fn test_sibling_scopes_are_isolated() {
        let first = RestartQueue::new();
        let second = RestartQueue::new();

        let a = first.clone().scope(async {
            RestartQueue::current().unwrap().enqueue(running("alpha"));
        });
        let b = second.clone().scope(async {
            RestartQueue::current().unwrap().enqueue(running("beta"));
        });
        tokio::join!(a, b);

        assert!(first.contains("alpha") && !first.contains("beta"));
        assert!(second.contains("beta") && !second.contains("alpha"));
    }
}
