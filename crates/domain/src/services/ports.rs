//! Collaborator contracts consumed by the dispatcher and maintenance service.
//!
//! Postgres implementations live in the persistence crate; email and
//! real-time implementations live in the api crate; in-memory versions live
//! in `services::in_memory` behind the `test-util` feature.

use chrono::{DateTime, Utc};
use shared::pagination::{Cursor, Page};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    DeliveryChannel, EventType, NewNotification, Notification, NotificationPreferences,
    RealtimeMessage, Role, SystemSettings, User,
};

/// Read access to platform users.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Users holding any of the given roles.
    async fn find_by_roles(&self, roles: &[Role]) -> Result<Vec<User>, StoreError>;

    /// Users whose status is Active.
    async fn find_active(&self) -> Result<Vec<User>, StoreError>;
}

/// Per-user notification preferences.
#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Result<Option<NotificationPreferences>, StoreError>;

    /// Create all-enabled defaults for `event_types`. Must behave as an
    /// atomic upsert: when a record set already exists it is returned
    /// unchanged, so concurrent first dispatches converge on one record.
    async fn create_default(
        &self,
        user_id: Uuid,
        event_types: &[EventType],
    ) -> Result<NotificationPreferences, StoreError>;
}

/// Persisted notifications.
#[async_trait::async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, notification: NewNotification) -> Result<Notification, StoreError>;

    /// Append a channel to exactly the identified record.
    async fn append_channel(
        &self,
        notification_id: Uuid,
        channel: DeliveryChannel,
    ) -> Result<Notification, StoreError>;

    /// Newest-first inbox listing.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        cursor: Option<Cursor>,
        limit: u32,
    ) -> Result<Page<Notification>, StoreError>;

    async fn mark_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<Notification, StoreError>;
}

/// Best-effort, at-most-once push to connected clients.
#[async_trait::async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Push to the recipient's dedicated channel.
    async fn push_to_user(&self, user_id: Uuid, message: RealtimeMessage) -> Result<(), StoreError>;

    /// Push to every connected client.
    async fn broadcast(&self, message: RealtimeMessage) -> Result<(), StoreError>;
}

/// Email to be handed to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Provider verdict for one email.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailReceipt {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl EmailReceipt {
    pub fn delivered(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Outbound email provider. Failures are reported in the receipt.
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> EmailReceipt;
}

/// Singleton system settings.
#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self) -> Result<SystemSettings, StoreError>;

    async fn save(&self, settings: &SystemSettings) -> Result<(), StoreError>;

    /// Compare-and-set maintenance off. Succeeds only when the stored record
    /// is still due for auto-resolution at `now` (active, auto-disable on,
    /// window ended); returns the updated settings to that single caller.
    async fn clear_maintenance(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<SystemSettings>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_receipt_constructors() {
        let ok = EmailReceipt::delivered(Some("msg-1".into()));
        assert!(ok.success);
        assert_eq!(ok.message_id.as_deref(), Some("msg-1"));
        assert!(ok.error.is_none());

        let failed = EmailReceipt::failed("mailbox full");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("mailbox full"));
    }
}
