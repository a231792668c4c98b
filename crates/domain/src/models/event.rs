//! Domain event identifiers that can trigger notifications.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Event type enumeration.
///
/// The wire identifier (`as_str`) is what callers pass to
/// `trigger_notification` and what preference records are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    LeadCreated,
    LeadUpdated,
    LeadHot,
    UserCreated,
    HazardReported,
    TaskAssigned,
    ProjectStatusChanged,
    InvoiceOverdue,
    SettingsChanged,
    /// Generic category used by broadcasts.
    System,
}

/// Raised when an identifier does not name a known event type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl EventType {
    /// Every event type, in declaration order.
    pub const ALL: [EventType; 10] = [
        EventType::LeadCreated,
        EventType::LeadUpdated,
        EventType::LeadHot,
        EventType::UserCreated,
        EventType::HazardReported,
        EventType::TaskAssigned,
        EventType::ProjectStatusChanged,
        EventType::InvoiceOverdue,
        EventType::SettingsChanged,
        EventType::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::LeadCreated => "lead_created",
            EventType::LeadUpdated => "lead_updated",
            EventType::LeadHot => "lead_hot",
            EventType::UserCreated => "user_created",
            EventType::HazardReported => "hazard_reported",
            EventType::TaskAssigned => "task_assigned",
            EventType::ProjectStatusChanged => "project_status_changed",
            EventType::InvoiceOverdue => "invoice_overdue",
            EventType::SettingsChanged => "settings_changed",
            EventType::System => "system",
        }
    }

    /// Human readable label, used as the default notification title.
    pub fn label(&self) -> &'static str {
        match self {
            EventType::LeadCreated => "New lead",
            EventType::LeadUpdated => "Lead updated",
            EventType::LeadHot => "Lead is hot",
            EventType::UserCreated => "New user",
            EventType::HazardReported => "Hazard reported",
            EventType::TaskAssigned => "Task assigned",
            EventType::ProjectStatusChanged => "Project status changed",
            EventType::InvoiceOverdue => "Invoice overdue",
            EventType::SettingsChanged => "Settings changed",
            EventType::System => "System notice",
        }
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        EventType::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == normalized)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_from_str() {
        assert_eq!(
            EventType::from_str("lead_created").unwrap(),
            EventType::LeadCreated
        );
        assert_eq!(
            EventType::from_str(" Hazard_Reported ").unwrap(),
            EventType::HazardReported
        );
        assert_eq!(
            EventType::from_str("nonexistent_event").unwrap_err(),
            UnknownEventType("nonexistent_event".into())
        );
    }

    #[test]
    fn test_event_type_identifiers_are_unique() {
        for (i, a) in EventType::ALL.iter().enumerate() {
            for b in &EventType::ALL[i + 1..] {
                assert_ne!(a.as_str(), b.as_str());
            }
            assert_eq!(EventType::from_str(a.as_str()).unwrap(), *a);
        }
    }

    #[test]
    fn test_event_type_serde_matches_display() {
        let json = serde_json::to_string(&EventType::ProjectStatusChanged).unwrap();
        assert_eq!(json, "\"project_status_changed\"");
        assert_eq!(EventType::ProjectStatusChanged.to_string(), "project_status_changed");
    }
}
