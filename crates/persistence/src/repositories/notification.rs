//! Notification repository.

use async_trait::async_trait;
use domain::models::{DeliveryChannel, NewNotification, Notification};
use domain::services::NotificationStore;
use domain::StoreError;
use shared::pagination::{Cursor, Page};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::NotificationEntity;
use crate::metrics::QueryTimer;

const COLUMNS: &str = "id, recipient_id, title, message, priority, event_type, metadata, \
                       channels_sent, is_read, read_at, created_at";

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn create(&self, notification: NewNotification) -> Result<Notification, StoreError> {
        let channels: Vec<String> = notification
            .channels_sent
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();

        let timer = QueryTimer::new("create_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            INSERT INTO notifications
                (id, recipient_id, title, message, priority, event_type, metadata, channels_sent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(notification.id)
        .bind(notification.recipient_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.priority.as_str())
        .bind(notification.event_type.as_str())
        .bind(&notification.metadata)
        .bind(&channels)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result?.try_into()
    }

    async fn append_channel(
        &self,
        notification_id: Uuid,
        channel: DeliveryChannel,
    ) -> Result<Notification, StoreError> {
        let timer = QueryTimer::new("append_notification_channel");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            UPDATE notifications
            SET channels_sent = CASE
                WHEN $2 = ANY(channels_sent) THEN channels_sent
                ELSE array_append(channels_sent, $2)
            END
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(notification_id)
        .bind(channel.as_str())
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result?
            .ok_or_else(|| StoreError::NotFound(format!("notification {}", notification_id)))?
            .try_into()
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        cursor: Option<Cursor>,
        limit: u32,
    ) -> Result<Page<Notification>, StoreError> {
        let (cursor_at, cursor_id) = match cursor {
            Some(c) => (Some(c.created_at), Some(c.id)),
            None => (None, None),
        };

        let timer = QueryTimer::new("list_notifications_for_user");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM notifications
            WHERE recipient_id = $1
              AND ($2::TIMESTAMPTZ IS NULL OR (created_at, id) < ($2, $3::UUID))
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            "#
        ))
        .bind(user_id)
        .bind(cursor_at)
        .bind(cursor_id)
        .bind(i64::from(limit) + 1)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        let items = result?
            .into_iter()
            .map(Notification::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::from_overfetch(items, limit, |n| {
            Cursor::new(n.created_at, n.id)
        }))
    }

    async fn mark_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<Notification, StoreError> {
        let timer = QueryTimer::new("mark_notification_read");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND recipient_id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result?
            .ok_or_else(|| StoreError::NotFound(format!("notification {}", notification_id)))?
            .try_into()
    }
}
