//! System settings repository (singleton row, id = 1).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::SystemSettings;
use domain::services::SettingsStore;
use domain::StoreError;
use sqlx::PgPool;

use crate::entities::SystemSettingsEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct SystemSettingsRepository {
    pool: PgPool,
}

impl SystemSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for SystemSettingsRepository {
    async fn get(&self) -> Result<SystemSettings, StoreError> {
        let timer = QueryTimer::new("get_system_settings");
        let result = sqlx::query_as::<_, SystemSettingsEntity>(
            r#"
            SELECT maintenance_mode, window_start, window_end, window_message,
                   auto_disable_maintenance, updated_by, updated_at
            FROM system_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        Ok(result?
            .map(SystemSettings::from)
            .unwrap_or_else(|| SystemSettings::initial(Utc::now())))
    }

    async fn save(&self, settings: &SystemSettings) -> Result<(), StoreError> {
        let window = settings.maintenance_window.as_ref();

        let timer = QueryTimer::new("save_system_settings");
        let result = sqlx::query(
            r#"
            INSERT INTO system_settings
                (id, maintenance_mode, window_start, window_end, window_message,
                 auto_disable_maintenance, updated_by, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                maintenance_mode = EXCLUDED.maintenance_mode,
                window_start = EXCLUDED.window_start,
                window_end = EXCLUDED.window_end,
                window_message = EXCLUDED.window_message,
                auto_disable_maintenance = EXCLUDED.auto_disable_maintenance,
                updated_by = EXCLUDED.updated_by,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(settings.maintenance_mode)
        .bind(window.map(|w| w.start))
        .bind(window.map(|w| w.end))
        .bind(window.and_then(|w| w.message.clone()))
        .bind(settings.auto_disable_maintenance)
        .bind(settings.updated_by)
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await;
        timer.record();

        result?;
        Ok(())
    }

    /// Only the caller whose UPDATE still finds the row due for
    /// auto-resolution gets `Some`.
    async fn clear_maintenance(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<SystemSettings>, StoreError> {
        let timer = QueryTimer::new("clear_maintenance_mode");
        let result = sqlx::query_as::<_, SystemSettingsEntity>(
            r#"
            UPDATE system_settings
            SET maintenance_mode = FALSE, updated_by = NULL, updated_at = $1
            WHERE id = 1
              AND maintenance_mode = TRUE
              AND auto_disable_maintenance = TRUE
              AND window_end IS NOT NULL
              AND window_end <= $1
            RETURNING maintenance_mode, window_start, window_end, window_message,
                      auto_disable_maintenance, updated_by, updated_at
            "#,
        )
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        Ok(result?.map(SystemSettings::from))
    }
}
