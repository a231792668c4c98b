//! Notification preference repository.

use async_trait::async_trait;
use domain::models::{EventType, NotificationPreferences};
use domain::services::PreferenceStore;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::notification_preference::collect_preferences;
use crate::entities::NotificationPreferenceEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct NotificationPreferenceRepository {
    pool: PgPool,
}

impl NotificationPreferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_rows(&self, user_id: Uuid) -> Result<Vec<NotificationPreferenceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("get_notification_preferences");
        let result = sqlx::query_as::<_, NotificationPreferenceEntity>(
            r#"
            SELECT user_id, event_type, in_app, email, updated_at
            FROM notification_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[async_trait]
impl PreferenceStore for NotificationPreferenceRepository {
    async fn get(&self, user_id: Uuid) -> Result<Option<NotificationPreferences>, StoreError> {
        let rows = self.fetch_rows(user_id).await?;
        Ok(collect_preferences(user_id, rows))
    }

    /// Inserts missing rows only; concurrent callers converge on the same set.
    async fn create_default(
        &self,
        user_id: Uuid,
        event_types: &[EventType],
    ) -> Result<NotificationPreferences, StoreError> {
        let keys: Vec<String> = event_types.iter().map(|e| e.as_str().to_string()).collect();

        let timer = QueryTimer::new("create_default_notification_preferences");
        let result = sqlx::query(
            r#"
            INSERT INTO notification_preferences (user_id, event_type, in_app, email)
            SELECT $1, event_type, TRUE, TRUE
            FROM UNNEST($2::TEXT[]) AS event_type
            ON CONFLICT (user_id, event_type) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(&keys)
        .execute(&self.pool)
        .await;
        timer.record();
        result?;

        let rows = self.fetch_rows(user_id).await?;
        collect_preferences(user_id, rows).ok_or_else(|| {
            StoreError::NotFound(format!("notification preferences for user {}", user_id))
        })
    }
}
