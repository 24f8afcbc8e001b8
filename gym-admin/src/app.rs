//! Wiring of a configured application.

use std::sync::Arc;

use axum::Router;
use tracing::info;

use crate::{
    admin::AdminService,
    artifacts::LocalArtifactStore,
    clock::{Clock, SystemClock},
    config::AppConfig,
    error::Result,
    http::{self, AppState},
    invoice::InvoiceGenerator,
    settings::SettingsCache,
    store::Store,
    subscriptions::SubscriptionEngine,
};

/// A bootstrapped application.
#[derive(Debug, Clone)]
pub struct App {
    state: AppState,
    settings: Arc<SettingsCache>,
    config: AppConfig,
}

impl App {
    /// Opens the database and wires every component using the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`](crate::error::AdminError::Config) for an
    /// invalid configuration, or a store error.
    pub fn bootstrap(config: AppConfig) -> Result<Self> {
        let store = Store::open(&config.database.path)?;
        Self::with_store(config, store, Arc::new(SystemClock))
    }

    /// Wires every component around an already opened store.
    ///
    /// Lockers and organization settings from the configuration are created
    /// when missing; existing rows are kept.
    ///
    /// # Errors
    ///
    /// Same as [`bootstrap`](Self::bootstrap).
    pub fn with_store(config: AppConfig, store: Store, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let lockers = config.lockers.count;
        store.transaction(|tx| {
            tx.seed_lockers(lockers)?;
            tx.seed_settings(config.organization.to_pairs())
        })?;

        let settings = Arc::new(SettingsCache::new(&config.storage.assets_root));
        settings.refresh(&store)?;

        let engine = SubscriptionEngine::new(
            config.plan_catalog()?,
            config.payment_gateways.clone(),
            config.subscriptions.renewal_reminder_days,
        );
        let artifacts =
            LocalArtifactStore::new(&config.storage.root, config.server.public_base_url.as_str());
        let service = AdminService::new(
            store,
            Arc::new(engine),
            InvoiceGenerator::default(),
            Arc::new(artifacts),
            Arc::clone(&settings),
            clock,
        );
        let state = AppState { service, operators: Arc::new(config.operator_registry()?) };

        info!(
            plans = config.plans.len(),
            lockers,
            operators = config.operators.len(),
            "application bootstrapped"
        );
        Ok(Self { state, settings, config })
    }

    /// Admin router serving the configured storage root.
    #[must_use]
    pub fn router(&self) -> Router {
        http::router(self.state.clone(), &self.config.storage.root)
    }

    /// Shared router state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Settings cache, for periodic refreshes.
    #[must_use]
    pub fn settings(&self) -> Arc<SettingsCache> {
        Arc::clone(&self.settings)
    }

    /// Loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }
}
