//! # Host Event Wiring
//!
//! Connects bus notifications to the shell host.
//!
//! ```text
//! DescriptorStore ──DescriptorChanged──┐
//!                                      ├──→ Event Bus ──→ ShellHost ──→ RestartQueue
//! SettingsManager ──SettingsSaved──────┘
//! ```
//!
//! Handlers hold a weak reference to the host, so the bus never keeps a host
//! alive. Dropping `HostSubscriptions` disconnects them.

use std::sync::{Arc, Weak};

use shared_bus::{EventTopic, HostEvent, InMemoryEventBus, Subscription};
use tracing::debug;

use crate::host::ShellHost;

/// Live subscriptions of one host.
pub struct HostSubscriptions {
    _descriptor_changed: Subscription,
    _settings_saved: Subscription,
}

/// Subscribe `host` to descriptor and settings notifications on `bus`.
pub fn wire_host_events(bus: &InMemoryEventBus, host: &Arc<ShellHost>) -> HostSubscriptions {
    let weak: Weak<ShellHost> = Arc::downgrade(host);
    let descriptor_changed = bus.subscribe(
        EventTopic::DescriptorChanged,
        "shell-host.descriptor-changed",
        move |event| {
            if let (Some(host), HostEvent::DescriptorChanged { tenant, descriptor }) =
                (weak.upgrade(), event)
            {
                debug!(tenant = %tenant, serial = descriptor.serial_number, "Descriptor change received");
                host.on_descriptor_changed(tenant);
            }
            Ok(())
        },
    );

    let weak: Weak<ShellHost> = Arc::downgrade(host);
    let settings_saved = bus.subscribe(
        EventTopic::SettingsSaved,
        "shell-host.settings-saved",
        move |event| {
            if let (Some(host), HostEvent::SettingsSaved { settings }) = (weak.upgrade(), event) {
                host.on_settings_saved(settings);
            }
            Ok(())
        },
    );

    HostSubscriptions {
        _descriptor_changed: descriptor_changed,
        _settings_saved: settings_saved,
    }
}
