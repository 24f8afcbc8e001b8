//! Observability infrastructure for the gym admin server.
//!
//! Provides structured logging and the `/healthz` report.

use std::{io, path::Path};

use gym_admin::{settings::OrgSettings, store::Store};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Log format configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format for development.
    Pretty,
    /// JSON format for production log aggregation.
    Json,
}

impl LogFormat {
    /// Determines log format from environment.
    ///
    /// Checks the `LOG_FORMAT` environment variable:
    /// - `json` => JSON format
    /// - `pretty` or unset => Pretty format
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or_default().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Initializes structured logging.
///
/// Configures tracing-subscriber with:
/// - Configurable output format (pretty for dev, JSON for production)
/// - Environment-based log level filtering (`RUST_LOG`, default `info`)
/// - Span close events, so handler spans report their duration
///
/// Audit events are emitted on the `audit` target and can be filtered
/// separately, e.g. `RUST_LOG=info,audit=info`.
pub fn init_observability(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_writer(io::stderr),
                )
                .init();
        }
        LogFormat::Json => {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_writer(io::stderr),
                )
                .init();
        }
    }
}

/// Health check status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// System is healthy and operational.
    Healthy,
    /// System is degraded but operational.
    Degraded,
    /// System is unhealthy and not operational.
    Unhealthy,
}

impl HealthStatus {
    /// Returns string representation for JSON serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

/// Individual health check result.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Check name.
    pub name: String,
    /// Check status.
    pub status: HealthCheckStatus,
    /// Optional message with details.
    pub message: Option<String>,
}

/// Health check status for individual checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthCheckStatus {
    /// Check passed.
    Pass,
    /// Check failed.
    Fail,
    /// Check warning (degraded but operational).
    Warn,
}

impl HealthCheckStatus {
    /// Returns string representation for JSON serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Warn => "warn",
        }
    }
}

impl HealthCheck {
    /// Creates a passing health check.
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self { name: name.into(), status: HealthCheckStatus::Pass, message: None }
    }

    /// Creates a passing health check with a message.
    #[must_use]
    pub fn pass_with_message(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), status: HealthCheckStatus::Pass, message: Some(message.into()) }
    }

    /// Creates a warning health check.
    #[must_use]
    pub fn warn(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), status: HealthCheckStatus::Warn, message: Some(message.into()) }
    }

    /// Creates a failing health check with error message.
    #[must_use]
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), status: HealthCheckStatus::Fail, message: Some(message.into()) }
    }

    /// Database answers a trivial query.
    #[must_use]
    pub fn database(store: &Store) -> Self {
        match store.ping() {
            Ok(()) => Self::pass("database"),
            Err(e) => Self::fail("database", e.to_string()),
        }
    }

    /// Artifact root exists.
    #[must_use]
    pub fn storage(root: &Path) -> Self {
        if root.is_dir() {
            Self::pass("storage")
        } else {
            Self::fail("storage", format!("{} is not a directory", root.display()))
        }
    }

    /// A configured logo was loaded.
    #[must_use]
    pub fn settings(settings: &OrgSettings) -> Self {
        match (&settings.logo_path, &settings.logo) {
            (Some(path), None) if !path.trim().is_empty() => {
                Self::warn("settings", format!("logo '{path}' not loaded"))
            }
            _ => Self::pass_with_message("settings", settings.name()),
        }
    }
}

/// Overall health report for the system.
#[derive(Debug, Clone)]
pub struct HealthReport {
    /// Overall system status.
    pub status: HealthStatus,
    /// Server version.
    pub version: String,
    /// Organization name.
    pub organization: String,
    /// Uptime in seconds.
    pub uptime_secs: u64,
    /// Individual health checks.
    pub checks: Vec<HealthCheck>,
}

impl HealthReport {
    /// Builds a report whose status is derived from `checks`.
    #[must_use]
    pub fn new(organization: impl Into<String>, uptime_secs: u64, checks: Vec<HealthCheck>) -> Self {
        Self {
            status: Self::compute_status(&checks),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            organization: organization.into(),
            uptime_secs,
            checks,
        }
    }

    /// Serializes health report to JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status.as_str(),
            "version": self.version,
            "organization": self.organization,
            "uptime_secs": self.uptime_secs,
            "checks": self.checks.iter().map(|c| {
                let mut obj = serde_json::json!({
                    "name": c.name,
                    "status": c.status.as_str(),
                });
                if let Some(msg) = &c.message {
                    obj["message"] = serde_json::Value::String(msg.clone());
                }
                obj
            }).collect::<Vec<_>>(),
        })
    }

    /// Determines overall health status from individual checks.
    #[must_use]
    pub fn compute_status(checks: &[HealthCheck]) -> HealthStatus {
        if checks.iter().any(|c| c.status == HealthCheckStatus::Fail) {
            HealthStatus::Unhealthy
        } else if checks.iter().any(|c| c.status == HealthCheckStatus::Warn) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}
