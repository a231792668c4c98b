//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub notifications: NotificationsHealth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_mode: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Dispatcher wiring as seen by operators.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct NotificationsHealth {
    pub realtime_attached: bool,
    pub connected_users: usize,
    pub email_enabled: bool,
    pub email_provider: String,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Full health report: database, notification wiring and maintenance mode.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let start = std::time::Instant::now();
    let db_connected = persistence::db::ping(&state.pool).await.is_ok();
    let latency_ms = start.elapsed().as_millis() as u64;

    let maintenance_mode = if db_connected {
        match state.maintenance.current().await {
            Ok(settings) => Some(settings.maintenance_mode),
            Err(e) => {
                warn!(error = %e, "Failed to read system settings for health check");
                None
            }
        }
    } else {
        None
    };

    let notifications = NotificationsHealth {
        realtime_attached: state.dispatcher.has_realtime(),
        connected_users: state.realtime.connected_users().await,
        email_enabled: state.config.email.enabled,
        email_provider: state.config.email.provider.clone(),
    };

    let response = HealthResponse {
        status: if db_connected { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth {
            connected: db_connected,
            latency_ms: db_connected.then_some(latency_ms),
        },
        notifications,
        maintenance_mode,
    };

    if db_connected {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// Liveness probe: the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe: the database answers and the realtime hub is wired.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    let db_connected = persistence::db::ping(&state.pool).await.is_ok();

    if db_connected && state.dispatcher.has_realtime() {
        Ok(Json(StatusResponse {
            status: "ready".to_string(),
        }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
