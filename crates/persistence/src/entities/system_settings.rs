//! System settings entity (singleton row).

use chrono::{DateTime, Utc};
use domain::models::{MaintenanceWindow, SystemSettings};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the system_settings table.
#[derive(Debug, Clone, FromRow)]
pub struct SystemSettingsEntity {
    pub maintenance_mode: bool,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    pub window_message: Option<String>,
    pub auto_disable_maintenance: bool,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl From<SystemSettingsEntity> for SystemSettings {
    fn from(entity: SystemSettingsEntity) -> Self {
        let maintenance_window = match (entity.window_start, entity.window_end) {
            (Some(start), Some(end)) => Some(MaintenanceWindow {
                start,
                end,
                message: entity.window_message,
            }),
            _ => None,
        };

        Self {
            maintenance_mode: entity.maintenance_mode,
            maintenance_window,
            auto_disable_maintenance: entity.auto_disable_maintenance,
            updated_by: entity.updated_by,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_partial_window_is_dropped() {
        let entity = SystemSettingsEntity {
            maintenance_mode: true,
            window_start: Some(Utc::now()),
            window_end: None,
            window_message: Some("half".into()),
            auto_disable_maintenance: true,
            updated_by: None,
            updated_at: Utc::now(),
        };
        assert!(SystemSettings::from(entity).maintenance_window.is_none());
    }

    #[test]
    fn test_full_window_is_kept() {
        let start = Utc::now();
        let entity = SystemSettingsEntity {
            maintenance_mode: true,
            window_start: Some(start),
            window_end: Some(start + Duration::hours(1)),
            window_message: Some("Patching".into()),
            auto_disable_maintenance: false,
            updated_by: None,
            updated_at: start,
        };
        let settings = SystemSettings::from(entity);
        let window = settings.maintenance_window.unwrap();
        assert_eq!(window.message.as_deref(), Some("Patching"));
        assert!(!settings.auto_disable_maintenance);
    }
}
