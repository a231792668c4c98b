//! Periodic maintenance auto-resolution.

use chrono::Utc;
use domain::services::{MaintenanceService, TickOutcome};
use std::sync::Arc;
use tracing::info;

use super::scheduler::{Job, JobFrequency};

/// Turns maintenance mode off once the scheduled window has ended.
pub struct MaintenanceAutoResolveJob {
    service: Arc<MaintenanceService>,
    interval_secs: u64,
}

impl MaintenanceAutoResolveJob {
    pub fn new(service: Arc<MaintenanceService>, interval_secs: u64) -> Self {
        Self {
            service,
            interval_secs,
        }
    }
}

#[async_trait::async_trait]
impl Job for MaintenanceAutoResolveJob {
    fn name(&self) -> &'static str {
        "maintenance_auto_resolve"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    // A restart after the window closed should not wait a full period.
    fn run_on_start(&self) -> bool {
        true
    }

    async fn execute(&self) -> Result<(), String> {
        match self.service.tick(Utc::now()).await {
            Ok(TickOutcome::Resolved) => {
                info!("Maintenance auto-resolved");
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) => Err(format!("Failed to check maintenance window: {}", e)),
        }
    }
}
