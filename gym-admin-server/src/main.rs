//! Gym Admin Server - HTTP server for the gym administration service
//!
//! Loads the TOML configuration, opens the database, keeps the organization
//! settings cache fresh, and serves the admin router plus `/healthz` until
//! Ctrl+C or SIGTERM.
//!
//! # Environment Variables
//!
//! - `GYM_ADMIN_CONFIG`: configuration file (default: `gym-admin.toml`)
//! - `GYM_ADMIN_BIND`: overrides `server.bind`
//! - `LOG_FORMAT`: `json` or `pretty` (default: `pretty`)
//! - `RUST_LOG`: log level filter (default: `info`)

mod observability;

use std::{
    process::ExitCode,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use gym_admin::{
    AdminError, Result, app::App, config::AppConfig, settings::SettingsCache, store::Store,
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};

use crate::observability::{
    HealthCheck, HealthReport, HealthStatus, LogFormat, init_observability,
};

const CONFIG_ENV: &str = "GYM_ADMIN_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "gym-admin.toml";

#[tokio::main]
async fn main() -> ExitCode {
    init_observability(LogFormat::from_env());

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
    info!(path = %path, "loading configuration");
    let mut config = AppConfig::from_file(&path)?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    config.validate()?;

    std::fs::create_dir_all(&config.storage.root)?;
    let addr = config.bind_addr()?;
    let refresh = Duration::from_secs(config.settings.refresh_secs);

    let app = tokio::task::spawn_blocking(move || App::bootstrap(config))
        .await
        .map_err(|e| AdminError::Internal(format!("bootstrap aborted: {e}")))??;

    tokio::spawn(refresh_settings(app.settings(), app.state().service.store().clone(), refresh));

    let router = app.router().merge(health_router(&app));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "gym admin server listening");

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server shut down");
    Ok(())
}

fn health_router(app: &App) -> Router {
    let store = app.state().service.store().clone();
    let settings = app.settings();
    let storage_root = app.config().storage.root.clone();
    let started = Instant::now();

    Router::new().route(
        "/healthz",
        get(move || {
            let store = store.clone();
            let settings = Arc::clone(&settings);
            let storage_root = storage_root.clone();
            async move {
                let report = tokio::task::spawn_blocking(move || {
                    let snapshot = settings.snapshot();
                    HealthReport::new(
                        snapshot.name(),
                        started.elapsed().as_secs(),
                        vec![
                            HealthCheck::database(&store),
                            HealthCheck::storage(&storage_root),
                            HealthCheck::settings(&snapshot),
                        ],
                    )
                })
                .await;
                match report {
                    Ok(report) => {
                        let status = if report.status == HealthStatus::Unhealthy {
                            StatusCode::SERVICE_UNAVAILABLE
                        } else {
                            StatusCode::OK
                        };
                        (status, Json(report.to_json())).into_response()
                    }
                    Err(e) => {
                        error!(error = %e, "health check aborted");
                        StatusCode::INTERNAL_SERVER_ERROR.into_response()
                    }
                }
            }
        }),
    )
}

/// Reloads organization settings every `period`.
async fn refresh_settings(cache: Arc<SettingsCache>, store: Store, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await;
    loop {
        interval.tick().await;
        let cache = Arc::clone(&cache);
        let store = store.clone();
        match tokio::task::spawn_blocking(move || cache.refresh(&store)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(error = %e, "settings refresh failed"),
            Err(e) => warn!(error = %e, "settings refresh aborted"),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
