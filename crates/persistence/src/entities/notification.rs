//! Notification entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{DeliveryChannel, EventType, Notification, NotificationPriority};
use domain::StoreError;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the notifications table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub priority: String,
    pub event_type: String,
    pub metadata: serde_json::Value,
    pub channels_sent: Vec<String>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationEntity> for Notification {
    type Error = StoreError;

    fn try_from(entity: NotificationEntity) -> Result<Self, Self::Error> {
        let priority =
            NotificationPriority::from_str(&entity.priority).map_err(StoreError::InvalidData)?;
        let event_type = EventType::from_str(&entity.event_type)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        let channels_sent = entity
            .channels_sent
            .iter()
            .map(|c| DeliveryChannel::from_str(c))
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::InvalidData)?;

        Ok(Self {
            id: entity.id,
            recipient_id: entity.recipient_id,
            title: entity.title,
            message: entity.message,
            priority,
            event_type,
            metadata: entity.metadata,
            channels_sent,
            is_read: entity.is_read,
            read_at: entity.read_at,
            created_at: entity.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> NotificationEntity {
        NotificationEntity {
            id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            title: "Invoice overdue".into(),
            message: "INV-204".into(),
            priority: "high".into(),
            event_type: "invoice_overdue".into(),
            metadata: serde_json::json!({ "invoiceId": "INV-204" }),
            channels_sent: vec!["in_app".into(), "email".into()],
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_converts_to_domain() {
        let notification = Notification::try_from(entity()).unwrap();
        assert_eq!(notification.event_type, EventType::InvoiceOverdue);
        assert_eq!(notification.priority, NotificationPriority::High);
        assert_eq!(
            notification.channels_sent,
            vec![DeliveryChannel::InApp, DeliveryChannel::Email]
        );
    }

    #[test]
    fn test_unknown_channel_is_invalid_data() {
        let mut row = entity();
        row.channels_sent.push("sms".into());
        assert!(matches!(
            Notification::try_from(row),
            Err(StoreError::InvalidData(_))
        ));
    }
}
