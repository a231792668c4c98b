//! Notification records and real-time payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::event::EventType;
use super::system_settings::{MaintenanceWindow, SystemSettings};

/// Delivery medium for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    InApp,
    Email,
}

impl DeliveryChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryChannel::InApp => "in_app",
            DeliveryChannel::Email => "email",
        }
    }
}

impl FromStr for DeliveryChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_app" | "inApp" => Ok(DeliveryChannel::InApp),
            "email" => Ok(DeliveryChannel::Email),
            _ => Err(format!("Invalid delivery channel: {}", s)),
        }
    }
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Normal => "normal",
            NotificationPriority::High => "high",
            NotificationPriority::Urgent => "urgent",
        }
    }
}

impl FromStr for NotificationPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(NotificationPriority::Low),
            "normal" | "medium" => Ok(NotificationPriority::Normal),
            "high" => Ok(NotificationPriority::High),
            "urgent" | "critical" => Ok(NotificationPriority::Urgent),
            _ => Err(format!("Invalid notification priority: {}", s)),
        }
    }
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-supplied payload for a trigger or broadcast. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub title: Option<String>,
    pub message: Option<String>,
    pub priority: Option<NotificationPriority>,
    pub metadata: Option<serde_json::Value>,
}

impl NotificationRequest {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Fill defaults for a concrete recipient and event.
    pub fn to_new_notification(&self, recipient_id: Uuid, event_type: EventType) -> NewNotification {
        NewNotification {
            id: Uuid::new_v4(),
            recipient_id,
            title: self
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| event_type.label().to_string()),
            message: self.message.clone().unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            event_type,
            metadata: self
                .metadata
                .clone()
                .unwrap_or_else(|| serde_json::json!({})),
            channels_sent: vec![DeliveryChannel::InApp],
        }
    }
}

/// A notification about to be persisted. The id is assigned by the caller so
/// later channel updates can target this exact record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub event_type: EventType,
    pub metadata: serde_json::Value,
    pub channels_sent: Vec<DeliveryChannel>,
}

impl NewNotification {
    pub fn into_notification(self, created_at: DateTime<Utc>) -> Notification {
        Notification {
            id: self.id,
            recipient_id: self.recipient_id,
            title: self.title,
            message: self.message,
            priority: self.priority,
            event_type: self.event_type,
            metadata: self.metadata,
            channels_sent: self.channels_sent,
            is_read: false,
            read_at: None,
            created_at,
        }
    }
}

/// A persisted notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub event_type: EventType,
    pub metadata: serde_json::Value,
    pub channels_sent: Vec<DeliveryChannel>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Record a channel as sent. `channels_sent` only grows; returns false when
    /// the channel was already present.
    pub fn append_channel(&mut self, channel: DeliveryChannel) -> bool {
        if self.channels_sent.contains(&channel) {
            return false;
        }
        self.channels_sent.push(channel);
        true
    }

    pub fn mark_read(&mut self, now: DateTime<Utc>) {
        if !self.is_read {
            self.is_read = true;
            self.read_at = Some(now);
        }
    }
}

/// Message pushed over the real-time transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeMessage {
    /// A new notification for the receiving user.
    Notification { notification: Notification },
    /// Global settings changed; clients should refetch.
    #[serde(rename_all = "camelCase")]
    SettingsChanged {
        maintenance_mode: bool,
        maintenance_window: Option<MaintenanceWindow>,
        changed_at: DateTime<Utc>,
    },
}

impl RealtimeMessage {
    pub fn settings_changed(settings: &SystemSettings) -> Self {
        RealtimeMessage::SettingsChanged {
            maintenance_mode: settings.maintenance_mode,
            maintenance_window: settings.maintenance_window.clone(),
            changed_at: settings.updated_at,
        }
    }
}
