//! # Event Publisher
//!
//! Defines the publishing side of the bus.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error};

use crate::events::{EventTopic, HostEvent};
use crate::subscriber::{HandlerError, HandlerFn, HandlerTable, Subscription};

/// Outcome of one publish call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Handlers that completed successfully.
    pub delivered: usize,
    /// Handlers that failed or panicked.
    pub failed: usize,
}

/// Trait for publishing events to the bus.
pub trait EventPublisher: Send + Sync {
    /// Invoke every handler registered for the event's topic.
    ///
    /// Handler failures are isolated: they are logged and counted, never
    /// returned to the publisher.
    fn publish(&self, event: HostEvent) -> PublishReport;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-process implementation of the bus.
#[derive(Default)]
pub struct InMemoryEventBus {
    table: Arc<HandlerTable>,
    events_published: AtomicU64,
    handler_failures: AtomicU64,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a topic.
    ///
    /// Handlers for the same topic run in registration order.
    #[must_use]
    pub fn subscribe<F>(&self, topic: EventTopic, name: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&HostEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(topic = topic.as_str(), handler = %name, "New subscription created");
        let handler: Arc<HandlerFn> = Arc::new(handler);
        let id = self.table.insert(topic, name, handler);
        Subscription::new(id, topic, Arc::downgrade(&self.table))
    }

    /// Number of handlers registered for a topic.
    #[must_use]
    pub fn subscriber_count(&self, topic: EventTopic) -> usize {
        self.table.count(topic)
    }

    /// Total handler failures since creation.
    #[must_use]
    pub fn handler_failures(&self) -> u64 {
        self.handler_failures.load(Ordering::Relaxed)
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: HostEvent) -> PublishReport {
        let topic = event.topic();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let mut report = PublishReport::default();
        for registered in self.table.snapshot(topic) {
            let outcome = catch_unwind(AssertUnwindSafe(|| (registered.handler)(&event)))
                .unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(payload))));

            match outcome {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    self.handler_failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        topic = topic.as_str(),
                        tenant = event.tenant(),
                        handler = %registered.name,
                        error = %e,
                        "Event handler failed"
                    );
                }
            }
        }

        debug!(
            topic = topic.as_str(),
            tenant = event.tenant(),
            delivered = report.delivered,
            failed = report.failed,
            "Event published"
        );
        report
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use shared_types::ShellDescriptor;

    fn changed(tenant: &str) -> HostEvent {
        HostEvent::DescriptorChanged {
            tenant: tenant.to_string(),
            descriptor: ShellDescriptor::default(),
        }
    }

    #[test]
    fn test_publish_no_subscribers() {
        let bus = InMemoryEventBus::new();
        let report = bus.publish(changed("alpha"));

        assert_eq!(report, PublishReport::default());
        assert_eq!(bus.events_published(), 1);
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let bus = InMemoryEventBus::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&calls);
        let _a = bus.subscribe(EventTopic::DescriptorChanged, "first", move |e| {
            first.lock().push(format!("first:{}", e.tenant()));
            Ok(())
        });
        let second = Arc::clone(&calls);
        let _b = bus.subscribe(EventTopic::DescriptorChanged, "second", move |e| {
            second.lock().push(format!("second:{}", e.tenant()));
            Ok(())
        });

        let report = bus.publish(changed("alpha"));

        assert_eq!(report.delivered, 2);
        assert_eq!(*calls.lock(), vec!["first:alpha", "second:alpha"]);
    }

    #[test]
    fn test_failing_handler_does_not_stop_others() {
        let bus = InMemoryEventBus::new();
        let reached = Arc::new(Mutex::new(false));

        let _a = bus.subscribe(EventTopic::DescriptorChanged, "broken", |_| {
            Err(HandlerError::Failed("boom".into()))
        });
        let _b = bus.subscribe(EventTopic::DescriptorChanged, "panicking", |_| {
            panic!("handler blew up")
        });
        let flag = Arc::clone(&reached);
        let _c = bus.subscribe(EventTopic::DescriptorChanged, "healthy", move |_| {
            *flag.lock() = true;
            Ok(())
        });

        let report = bus.publish(changed("alpha"));

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 2);
        assert!(*reached.lock());
        assert_eq!(bus.handler_failures(), 2);
    }

    #[test]
    fn test_topics_are_isolated() {
        let bus = InMemoryEventBus::new();
        let _sub = bus.subscribe(EventTopic::SettingsSaved, "saved", |_| Ok(()));

        let report = bus.publish(changed("alpha"));

        assert_eq!(report.delivered, 0);
        assert_eq!(bus.subscriber_count(EventTopic::SettingsSaved), 1);
        assert_eq!(bus.subscriber_count(EventTopic::DescriptorChanged), 0);
    }

    #[test]
    fn test_drop_unsubscribes_and_detach_keeps() {
        let bus = InMemoryEventBus::new();

        let sub = bus.subscribe(EventTopic::DescriptorChanged, "temporary", |_| Ok(()));
        assert_eq!(bus.subscriber_count(EventTopic::DescriptorChanged), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(EventTopic::DescriptorChanged), 0);

        bus.subscribe(EventTopic::DescriptorChanged, "permanent", |_| Ok(()))
            .detach();
        assert_eq!(bus.subscriber_count(EventTopic::DescriptorChanged), 1);
    }

    #[test]
    fn test_handler_may_subscribe_during_dispatch() {
        let bus = Arc::new(InMemoryEventBus::new());
        let inner_bus = Arc::clone(&bus);

        let _sub = bus.subscribe(EventTopic::DescriptorChanged, "reentrant", move |_| {
            inner_bus
                .subscribe(EventTopic::SettingsSaved, "late", |_| Ok(()))
                .detach();
            Ok(())
        });

        let report = bus.publish(changed("alpha"));
        assert_eq!(report.delivered, 1);
        assert_eq!(bus.subscriber_count(EventTopic::SettingsSaved), 1);
    }
}
