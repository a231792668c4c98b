//! Global system settings governing maintenance mode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Scheduled maintenance time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub message: Option<String>,
}

impl MaintenanceWindow {
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.end
    }
}

/// The two states of the maintenance machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenancePhase {
    Normal,
    MaintenanceActive,
}

/// Singleton settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSettings {
    pub maintenance_mode: bool,
    pub maintenance_window: Option<MaintenanceWindow>,
    pub auto_disable_maintenance: bool,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl SystemSettings {
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            maintenance_mode: false,
            maintenance_window: None,
            auto_disable_maintenance: true,
            updated_by: None,
            updated_at: now,
        }
    }

    pub fn phase(&self) -> MaintenancePhase {
        if self.maintenance_mode {
            MaintenancePhase::MaintenanceActive
        } else {
            MaintenancePhase::Normal
        }
    }

    /// True when the periodic check should flip maintenance off.
    pub fn auto_resolve_due(&self, now: DateTime<Utc>) -> bool {
        self.maintenance_mode
            && self.auto_disable_maintenance
            && self
                .maintenance_window
                .as_ref()
                .is_some_and(|window| window.has_ended(now))
    }

    /// Apply an admin update. Returns the phase before the update.
    pub fn apply(&mut self, update: &MaintenanceUpdate, now: DateTime<Utc>) -> MaintenancePhase {
        let before = self.phase();

        if let Some(mode) = update.maintenance_mode {
            self.maintenance_mode = mode;
        }
        if let Some(auto) = update.auto_disable_maintenance {
            self.auto_disable_maintenance = auto;
        }
        if update.clear_window {
            self.maintenance_window = None;
        } else if let (Some(start), Some(end)) = (update.window_start, update.window_end) {
            self.maintenance_window = Some(MaintenanceWindow {
                start,
                end,
                message: update.message.clone(),
            });
        } else if let (Some(message), Some(window)) =
            (update.message.as_ref(), self.maintenance_window.as_mut())
        {
            window.message = Some(message.clone());
        }

        self.updated_by = update.updated_by;
        self.updated_at = now;
        before
    }
}

/// Explicit admin change to the maintenance settings.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_window"))]
pub struct MaintenanceUpdate {
    pub maintenance_mode: Option<bool>,
    pub auto_disable_maintenance: Option<bool>,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    #[validate(length(max = 500, message = "Maintenance message is too long"))]
    pub message: Option<String>,
    #[serde(default)]
    pub clear_window: bool,
    pub updated_by: Option<Uuid>,
}

fn validate_update_window(update: &MaintenanceUpdate) -> Result<(), ValidationError> {
    match (update.window_start, update.window_end) {
        (Some(start), Some(end)) => shared::validation::validate_maintenance_window(start, end),
        (None, None) => Ok(()),
        _ => {
            let mut err = ValidationError::new("window_incomplete");
            err.message = Some("Maintenance window needs both start and end".into());
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    fn active_until(end: DateTime<Utc>) -> SystemSettings {
        SystemSettings {
            maintenance_mode: true,
            maintenance_window: Some(MaintenanceWindow {
                start: end - Duration::hours(2),
                end,
                message: None,
            }),
            auto_disable_maintenance: true,
            updated_by: None,
            updated_at: at(0),
        }
    }

    #[test]
    fn test_auto_resolve_due_only_after_end() {
        let settings = active_until(at(12));
        assert!(!settings.auto_resolve_due(at(11)));
        assert!(settings.auto_resolve_due(at(12)));
        assert!(settings.auto_resolve_due(at(13)));
    }

    #[test]
    fn test_auto_resolve_requires_flag_and_window() {
        let mut settings = active_until(at(12));
        settings.auto_disable_maintenance = false;
        assert!(!settings.auto_resolve_due(at(13)));

        let mut settings = active_until(at(12));
        settings.maintenance_window = None;
        assert!(!settings.auto_resolve_due(at(13)));

        let mut settings = active_until(at(12));
        settings.maintenance_mode = false;
        assert!(!settings.auto_resolve_due(at(13)));
    }

    #[test]
    fn test_apply_enable_with_window() {
        let mut settings = SystemSettings::initial(at(0));
        let update = MaintenanceUpdate {
            maintenance_mode: Some(true),
            window_start: Some(at(22)),
            window_end: Some(at(23)),
            message: Some("Database upgrade".into()),
            ..Default::default()
        };

        let before = settings.apply(&update, at(21));

        assert_eq!(before, MaintenancePhase::Normal);
        assert_eq!(settings.phase(), MaintenancePhase::MaintenanceActive);
        let window = settings.maintenance_window.as_ref().unwrap();
        assert_eq!(window.end, at(23));
        assert_eq!(window.message.as_deref(), Some("Database upgrade"));
        assert_eq!(settings.updated_at, at(21));
    }

    #[test]
    fn test_apply_message_only_keeps_window() {
        let mut settings = active_until(at(12));
        let update = MaintenanceUpdate {
            message: Some("Extended by ops".into()),
            ..Default::default()
        };
        settings.apply(&update, at(11));
        let window = settings.maintenance_window.as_ref().unwrap();
        assert_eq!(window.end, at(12));
        assert_eq!(window.message.as_deref(), Some("Extended by ops"));
    }

    #[test]
    fn test_apply_clear_window() {
        let mut settings = active_until(at(12));
        let update = MaintenanceUpdate {
            maintenance_mode: Some(false),
            clear_window: true,
            ..Default::default()
        };
        let before = settings.apply(&update, at(11));
        assert_eq!(before, MaintenancePhase::MaintenanceActive);
        assert_eq!(settings.phase(), MaintenancePhase::Normal);
        assert!(settings.maintenance_window.is_none());
    }

    #[test]
    fn test_update_validation() {
        let valid = MaintenanceUpdate {
            window_start: Some(at(1)),
            window_end: Some(at(2)),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        let half = MaintenanceUpdate {
            window_start: Some(at(1)),
            ..Default::default()
        };
        assert!(half.validate().is_err());

        let inverted = MaintenanceUpdate {
            window_start: Some(at(2)),
            window_end: Some(at(1)),
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let verbose = MaintenanceUpdate {
            message: Some("x".repeat(501)),
            ..Default::default()
        };
        assert!(verbose.validate().is_err());
    }
}
