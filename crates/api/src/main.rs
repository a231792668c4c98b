use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use buildops_api::app::{self, AppState};
use buildops_api::config::Config;
use buildops_api::jobs::{JobScheduler, MaintenanceAutoResolveJob};
use buildops_api::middleware;
use buildops_api::services::{EmailService, RealtimeHub};
use domain::services::{MaintenanceService, NotificationDispatcher};
use persistence::repositories::{
    NotificationPreferenceRepository, NotificationRepository, SystemSettingsRepository,
    UserRepository,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics()?;

    info!("Starting Builder Ops notification service v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database.pool_config())
        .await
        .context("failed to connect to database")?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;

    let email = EmailService::new(config.email.clone());
    info!(
        provider = email.provider(),
        enabled = email.is_enabled(),
        "Email delivery configured"
    );

    let dispatcher = Arc::new(
        NotificationDispatcher::new(
            Arc::new(UserRepository::new(pool.clone())),
            Arc::new(NotificationPreferenceRepository::new(pool.clone())),
            Arc::new(NotificationRepository::new(pool.clone())),
            Arc::new(email),
        )
        .with_config(config.notifications.dispatcher_config()),
    );

    let realtime = Arc::new(RealtimeHub::new());
    dispatcher.attach_realtime(realtime.clone())?;

    let maintenance = Arc::new(MaintenanceService::new(
        Arc::new(SystemSettingsRepository::new(pool.clone())),
        dispatcher.clone(),
    ));

    let mut scheduler = JobScheduler::new();
    if config.maintenance.auto_resolve_enabled {
        scheduler.register(MaintenanceAutoResolveJob::new(
            maintenance.clone(),
            config.maintenance.check_interval_secs,
        ));
    } else {
        info!("Maintenance auto-resolution disabled");
    }
    scheduler.start();

    let addr = config.socket_addr().context("invalid server address")?;
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);

    let state = AppState {
        pool,
        config: Arc::new(config),
        dispatcher,
        realtime,
        maintenance,
    };
    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(shutdown_timeout).await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
