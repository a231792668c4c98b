//! Maintenance mode state machine.
//!
//! `Normal <-> MaintenanceActive` over the singleton [`SystemSettings`].
//! Explicit admin updates go through [`MaintenanceService::update_settings`];
//! the periodic job calls [`MaintenanceService::tick`] to switch maintenance
//! off once its window has ended.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use thiserror::Error;
use tracing::{debug, info};
use validator::{Validate, ValidationErrors};

use super::dispatcher::NotificationDispatcher;
use super::ports::SettingsStore;
use crate::error::StoreError;
use crate::models::{
    MaintenancePhase, MaintenanceUpdate, NotificationPriority, NotificationRequest,
    SystemSettings,
};

pub const MAINTENANCE_STARTED_TITLE: &str = "Scheduled maintenance started";
pub const SERVICE_RESTORED_TITLE: &str = "Service restored";

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("Invalid maintenance update: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of one periodic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Maintenance is off.
    Idle,
    /// Maintenance is on and not yet due for auto-resolution.
    StillActive,
    /// This instance switched maintenance off.
    Resolved,
    /// Another instance switched maintenance off first.
    LostRace,
}

pub struct MaintenanceService {
    settings: Arc<dyn SettingsStore>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl MaintenanceService {
    pub fn new(settings: Arc<dyn SettingsStore>, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self {
            settings,
            dispatcher,
        }
    }

    pub async fn current(&self) -> Result<SystemSettings, StoreError> {
        self.settings.get().await
    }

    /// Apply an explicit admin change and announce phase transitions.
    pub async fn update_settings(
        &self,
        update: MaintenanceUpdate,
    ) -> Result<SystemSettings, MaintenanceError> {
        update.validate()?;

        let now = Utc::now();
        let mut settings = self.settings.get().await?;
        let before = settings.apply(&update, now);
        self.settings.save(&settings).await?;

        let after = settings.phase();
        info!(
            from = ?before,
            to = ?after,
            updated_by = ?settings.updated_by,
            "System settings updated"
        );

        match (before, after) {
            (MaintenancePhase::Normal, MaintenancePhase::MaintenanceActive) => {
                self.dispatcher
                    .broadcast_notification(maintenance_started(&settings))
                    .await;
            }
            (MaintenancePhase::MaintenanceActive, MaintenancePhase::Normal) => {
                self.dispatcher
                    .broadcast_notification(service_restored())
                    .await;
            }
            _ => {}
        }

        self.dispatcher.signal_settings_changed(&settings).await;
        Ok(settings)
    }

    /// Switch maintenance off when its window has ended and auto-disable is on.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickOutcome, StoreError> {
        let settings = self.settings.get().await?;

        if settings.phase() == MaintenancePhase::Normal {
            return Ok(TickOutcome::Idle);
        }
        if !settings.auto_resolve_due(now) {
            return Ok(TickOutcome::StillActive);
        }

        let Some(resolved) = self.settings.clear_maintenance(now).await? else {
            debug!("Maintenance already resolved by another instance");
            return Ok(TickOutcome::LostRace);
        };

        counter!("maintenance_auto_resolved_total").increment(1);
        info!(
            window_end = ?resolved.maintenance_window.as_ref().map(|w| w.end),
            "Maintenance window ended, maintenance mode disabled"
        );

        self.dispatcher
            .broadcast_notification(service_restored())
            .await;
        self.dispatcher.signal_settings_changed(&resolved).await;

        Ok(TickOutcome::Resolved)
    }
}

fn maintenance_started(settings: &SystemSettings) -> NotificationRequest {
    let window = settings.maintenance_window.as_ref();
    let mut message = match window {
        Some(w) => format!(
            "The platform is in maintenance until {}.",
            w.end.format("%Y-%m-%d %H:%M UTC")
        ),
        None => "The platform is in maintenance.".to_string(),
    };
    if let Some(note) = window.and_then(|w| w.message.as_deref()) {
        message.push(' ');
        message.push_str(note);
    }

    NotificationRequest::new(MAINTENANCE_STARTED_TITLE, message)
        .with_priority(NotificationPriority::High)
        .with_metadata(serde_json::json!({
            "maintenanceMode": true,
            "windowEnd": window.map(|w| w.end),
        }))
}

fn service_restored() -> NotificationRequest {
    NotificationRequest::new(
        SERVICE_RESTORED_TITLE,
        "Maintenance is complete and the platform is fully available.",
    )
    .with_metadata(serde_json::json!({ "maintenanceMode": false }))
}
