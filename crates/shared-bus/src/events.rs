//! # Host Events
//!
//! Notifications raised by configuration changes.

use shared_types::{ShellDescriptor, ShellSettings};

/// Topic tag used to route an event to its handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    /// A tenant's descriptor was updated.
    DescriptorChanged,
    /// A tenant's settings were saved.
    SettingsSaved,
}

impl EventTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DescriptorChanged => "descriptor.changed",
            Self::SettingsSaved => "settings.saved",
        }
    }
}

/// Events published on the host bus.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// Emitted after a descriptor update has been persisted.
    DescriptorChanged {
        tenant: String,
        descriptor: ShellDescriptor,
    },
    /// Emitted after tenant settings have been persisted.
    SettingsSaved { settings: ShellSettings },
}

impl HostEvent {
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::DescriptorChanged { .. } => EventTopic::DescriptorChanged,
            Self::SettingsSaved { .. } => EventTopic::SettingsSaved,
        }
    }

    /// Tenant the event is about.
    pub fn tenant(&self) -> &str {
        match self {
            Self::DescriptorChanged { tenant, .. } => tenant,
            Self::SettingsSaved { settings } => settings.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::TenantState;

    #[test]
    fn test_topic_and_tenant() {
        let changed = HostEvent::DescriptorChanged {
            tenant: "alpha".into(),
            descriptor: ShellDescriptor::default(),
        };
        assert_eq!(changed.topic(), EventTopic::DescriptorChanged);
        assert_eq!(changed.tenant(), "alpha");

        let saved = HostEvent::SettingsSaved {
            settings: ShellSettings::new("beta", TenantState::Running).unwrap(),
        };
        assert_eq!(saved.topic(), EventTopic::SettingsSaved);
        assert_eq!(saved.tenant(), "beta");
    }
}
