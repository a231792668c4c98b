//! Per-user, per-event channel preferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::event::EventType;
use super::notification::DeliveryChannel;

/// Channel switches for one event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPreference {
    pub in_app: bool,
    pub email: bool,
}

impl Default for ChannelPreference {
    fn default() -> Self {
        Self {
            in_app: true,
            email: true,
        }
    }
}

impl ChannelPreference {
    pub const MUTED: ChannelPreference = ChannelPreference {
        in_app: false,
        email: false,
    };

    /// Both channels are off.
    pub fn is_muted(&self) -> bool {
        !self.in_app && !self.email
    }

    pub fn allows(&self, channel: DeliveryChannel) -> bool {
        match channel {
            DeliveryChannel::InApp => self.in_app,
            DeliveryChannel::Email => self.email,
        }
    }
}

/// A user's preference record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub user_id: Uuid,
    pub events: BTreeMap<EventType, ChannelPreference>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreferences {
    /// All-enabled defaults for the given event types.
    pub fn defaults(user_id: Uuid, event_types: &[EventType], now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            events: event_types
                .iter()
                .map(|event| (*event, ChannelPreference::default()))
                .collect(),
            updated_at: now,
        }
    }

    /// Effective switches for an event. Event types added after the record
    /// was created resolve to all-enabled.
    pub fn for_event(&self, event_type: EventType) -> ChannelPreference {
        self.events.get(&event_type).copied().unwrap_or_default()
    }

    pub fn set(&mut self, event_type: EventType, preference: ChannelPreference, now: DateTime<Utc>) {
        self.events.insert(event_type, preference);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_everything() {
        let prefs = NotificationPreferences::defaults(Uuid::nil(), &EventType::ALL, Utc::now());
        assert_eq!(prefs.events.len(), EventType::ALL.len());
        assert!(prefs.events.values().all(|p| p.in_app && p.email));
    }

    #[test]
    fn test_missing_event_resolves_to_enabled() {
        let prefs =
            NotificationPreferences::defaults(Uuid::nil(), &[EventType::LeadCreated], Utc::now());
        assert_eq!(prefs.for_event(EventType::InvoiceOverdue), ChannelPreference::default());
    }

    #[test]
    fn test_set_overrides_single_event() {
        let mut prefs = NotificationPreferences::defaults(Uuid::nil(), &EventType::ALL, Utc::now());
        prefs.set(EventType::LeadUpdated, ChannelPreference::MUTED, Utc::now());

        assert!(prefs.for_event(EventType::LeadUpdated).is_muted());
        assert!(!prefs.for_event(EventType::LeadCreated).is_muted());
    }

    #[test]
    fn test_allows() {
        let email_only = ChannelPreference {
            in_app: false,
            email: true,
        };
        assert!(!email_only.allows(DeliveryChannel::InApp));
        assert!(email_only.allows(DeliveryChannel::Email));
        assert!(!email_only.is_muted());
    }

    #[test]
    fn test_serializes_event_keys_as_identifiers() {
        let prefs =
            NotificationPreferences::defaults(Uuid::nil(), &[EventType::HazardReported], Utc::now());
        let json = serde_json::to_value(&prefs).unwrap();
        assert_eq!(json["events"]["hazard_reported"]["inApp"], true);
    }
}
