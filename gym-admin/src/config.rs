//! Application configuration.
//!
//! This module defines the TOML-deserializable configuration of a gym admin
//! deployment. Every section has defaults except the operator list, so a
//! minimal file only declares who may log in:
//!
//! ```
//! use gym_admin::config::AppConfig;
//!
//! let config = AppConfig::from_toml(
//!     r#"
//!     [[operators]]
//!     name = "admin"
//!     token = "change-me"
//!     permissions = ["*"]
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.server.bind, "127.0.0.1:8080");
//! ```

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use secrecy::SecretString;
use serde::Deserialize;

use crate::{
    error::{AdminError, Result},
    security::{Operator, OperatorRegistry},
    settings::OrgSettings,
    subscriptions::{DEFAULT_RENEWAL_REMINDER_DAYS, PlanCatalog, SubscriptionPlan},
};

/// Environment variable overriding [`ServerConfig::bind`].
pub const BIND_ENV: &str = "GYM_ADMIN_BIND";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// HTTP listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite database.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Artifact and asset directories.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Organization settings seeded into the database when absent.
    #[serde(default)]
    pub organization: OrgSettings,

    /// Settings cache behaviour.
    #[serde(default)]
    pub settings: SettingsConfig,

    /// Subscription engine parameters.
    #[serde(default)]
    pub subscriptions: SubscriptionsConfig,

    /// Locker registry.
    #[serde(default)]
    pub lockers: LockersConfig,

    /// Accepted payment methods. Empty accepts any method.
    #[serde(default)]
    pub payment_gateways: Vec<String>,

    /// Plan catalog.
    #[serde(default)]
    pub plans: Vec<SubscriptionPlan>,

    /// Back-office operators.
    #[serde(default)]
    pub operators: Vec<OperatorConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to listen on (default: `127.0.0.1:8080`).
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Public base URL prefixed to artifact locators
    /// (default: `http://localhost:8080`).
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind(), public_base_url: default_public_base_url() }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_owned()
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_owned()
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite file (default: `gym-admin.sqlite`).
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_database_path() }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("gym-admin.sqlite")
}

/// Storage directories.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Root of published artifacts, served under `/storage` (default: `storage`).
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,

    /// Directory the logo path is resolved against (default: `public`).
    #[serde(default = "default_assets_root")]
    pub assets_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { root: default_storage_root(), assets_root: default_assets_root() }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("storage")
}

fn default_assets_root() -> PathBuf {
    PathBuf::from("public")
}

/// Settings cache configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsConfig {
    /// Seconds between settings reloads (default: 300).
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self { refresh_secs: default_refresh_secs() }
    }
}

const fn default_refresh_secs() -> u64 {
    300
}

/// Subscription engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionsConfig {
    /// Days before the end date on which renewal is due (default: 7).
    #[serde(default = "default_reminder_days")]
    pub renewal_reminder_days: u32,
}

impl Default for SubscriptionsConfig {
    fn default() -> Self {
        Self { renewal_reminder_days: default_reminder_days() }
    }
}

const fn default_reminder_days() -> u32 {
    DEFAULT_RENEWAL_REMINDER_DAYS
}

/// Locker registry configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockersConfig {
    /// Lockers numbered `1..=count` are created at startup if missing.
    #[serde(default)]
    pub count: u32,
}

/// One back-office operator.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorConfig {
    /// Display name used in logs.
    pub name: String,

    /// Bearer token, redacted in `Debug` output.
    pub token: SecretString,

    /// Capability strings; `*` grants all.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl AppConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] on syntax errors or unknown keys.
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| AdminError::Config(e.to_string()))
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| AdminError::Config(format!("cannot read '{}': {e}", path.display())))?;
        Self::from_toml(&source)
    }

    /// Applies environment overrides through `lookup`.
    ///
    /// Only [`BIND_ENV`] is recognized.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = lookup(BIND_ENV).filter(|v| !v.trim().is_empty()) {
            self.server.bind = bind;
        }
    }

    /// Validates the configuration.
    ///
    /// This method checks for:
    /// - a parseable bind address and an `http(s)` public base URL
    /// - a positive settings refresh interval
    /// - plans with unique ids and positive durations
    /// - at least one operator, with valid permissions and distinct tokens
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        let base = &self.server.public_base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(AdminError::Config(format!(
                "public_base_url must be an http(s) URL, got: {base}"
            )));
        }

        if self.settings.refresh_secs == 0 {
            return Err(AdminError::Config("settings.refresh_secs must be positive".to_owned()));
        }

        if let Some(plan) = self.plans.iter().find(|plan| plan.duration.count == 0) {
            return Err(AdminError::Config(format!("plan '{}' has a zero duration", plan.id)));
        }
        if let Some(gateway) = self.payment_gateways.iter().find(|g| g.trim().is_empty()) {
            return Err(AdminError::Config(format!("blank payment gateway '{gateway}'")));
        }
        self.plan_catalog()?;

        if self.operators.is_empty() {
            return Err(AdminError::Config("at least one operator is required".to_owned()));
        }
        self.operator_registry()?;

        Ok(())
    }

    /// Parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] if the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind.parse().map_err(|e| {
            AdminError::Config(format!("invalid bind address '{}': {e}", self.server.bind))
        })
    }

    /// Builds the plan catalog.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] on duplicate plan ids.
    pub fn plan_catalog(&self) -> Result<PlanCatalog> {
        PlanCatalog::new(self.plans.clone()).map_err(|e| AdminError::Config(e.to_string()))
    }

    /// Builds the operator registry.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] on unknown permissions or reused tokens.
    pub fn operator_registry(&self) -> Result<OperatorRegistry> {
        let mut registry = OperatorRegistry::new();
        for entry in &self.operators {
            let operator =
                Operator::new(entry.name.as_str(), entry.permissions.iter().map(String::as_str))?;
            registry.insert(entry.token.clone(), operator)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::security::Capability;

    const MINIMAL: &str = r#"
        [[operators]]
        name = "admin"
        token = "s3cret"
        permissions = ["*"]
    "#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = AppConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.database.path, PathBuf::from("gym-admin.sqlite"));
        assert_eq!(config.storage.root, PathBuf::from("storage"));
        assert_eq!(config.settings.refresh_secs, 300);
        assert_eq!(config.subscriptions.renewal_reminder_days, 7);
        assert_eq!(config.lockers.count, 0);
        assert!(config.plans.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_complete_config() {
        let toml = r#"
            payment_gateways = ["Cash", "Stripe"]

            [server]
            bind = "0.0.0.0:9000"
            public_base_url = "https://gym.example.com"

            [database]
            path = "/var/lib/gym/gym.sqlite"

            [organization]
            name = "Iron Temple"
            currency_symbol = "€"

            [lockers]
            count = 40

            [[plans]]
            id = "gold"
            name = "Gold"
            price = "100.00"
            offered = true
            duration = { count = 1, unit = "month" }

            [[plans]]
            id = "annual"
            name = "Annual"
            price = "900"
            type = "Yearly Pass"
            offered = false
            duration = { count = 1, unit = "year" }

            [[operators]]
            name = "front-desk"
            token = "desk-token"
            permissions = ["member.list", "locker.assign"]

            [[operators]]
            name = "manager"
            token = "manager-token"
            permissions = ["*"]
        "#;

        let config = AppConfig::from_toml(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.organization.name.as_deref(), Some("Iron Temple"));
        assert_eq!(config.lockers.count, 40);

        let catalog = config.plan_catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.offered().count(), 1);
        assert_eq!(config.plans[0].price, Decimal::from(100));
        assert_eq!(config.plans[1].subscription_type(), "Yearly Pass");

        let registry = config.operator_registry().unwrap();
        let desk = registry.authenticate(Some("desk-token")).unwrap();
        assert!(desk.can(Capability::LockerAssign));
        assert!(!desk.can(Capability::MemberDelete));
    }

    #[test]
    fn test_invalid_toml_syntax() {
        assert!(matches!(AppConfig::from_toml("[server"), Err(AdminError::Config(_))));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let toml = format!("{MINIMAL}\n[server]\nport = 80\n");
        assert!(AppConfig::from_toml(&toml).is_err());
    }

    #[test]
    fn test_validate_requires_operator() {
        let config = AppConfig::from_toml("").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_bind() {
        let mut config = AppConfig::from_toml(MINIMAL).unwrap();
        config.server.bind = "localhost".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_base_url_scheme() {
        let mut config = AppConfig::from_toml(MINIMAL).unwrap();
        config.server.public_base_url = "ftp://gym".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_duplicate_plans() {
        let toml = format!(
            "{MINIMAL}
            [[plans]]
            id = \"gold\"
            name = \"Gold\"
            price = \"100\"
            offered = true
            duration = {{ count = 1, unit = \"month\" }}

            [[plans]]
            id = \"gold\"
            name = \"Gold again\"
            price = \"120\"
            offered = true
            duration = {{ count = 1, unit = \"month\" }}
            "
        );
        let config = AppConfig::from_toml(&toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_duration() {
        let toml = format!(
            "{MINIMAL}
            [[plans]]
            id = \"free\"
            name = \"Free\"
            price = \"0\"
            offered = true
            duration = {{ count = 0, unit = \"day\" }}
            "
        );
        let config = AppConfig::from_toml(&toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_permission() {
        let toml = r#"
            [[operators]]
            name = "x"
            token = "t"
            permissions = ["member.fly"]
        "#;
        let config = AppConfig::from_toml(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override_bind() {
        let mut config = AppConfig::from_toml(MINIMAL).unwrap();
        config.apply_env_overrides(|key| (key == BIND_ENV).then(|| "0.0.0.0:1234".to_owned()));
        assert_eq!(config.server.bind, "0.0.0.0:1234");

        config.apply_env_overrides(|_| Some("  ".to_owned()));
        assert_eq!(config.server.bind, "0.0.0.0:1234");
    }

    #[test]
    fn test_operator_debug_redacts_token() {
        let config = AppConfig::from_toml(MINIMAL).unwrap();
        let debug = format!("{:?}", config.operators);
        assert!(!debug.contains("s3cret"));
    }
}
