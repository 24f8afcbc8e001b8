//! Admin request handling.
//!
//! [`AdminService`] is the orchestration layer behind every back-office
//! action. Each operation:
//!
//! 1. checks the operator's [`Capability`] (denials return
//!    [`AdminError::Forbidden`] and are audit-logged),
//! 2. runs its reads and writes in one store transaction,
//! 3. answers with an [`AdminResponse`] whose message comes from
//!    [`failure_message`] on failure.
//!
//! Only authorization failures surface as `Err`; every other failure is
//! folded into the response.

mod lockers;
mod members;
mod response;
mod subscriptions;

use std::sync::Arc;

pub use lockers::LockerForm;
pub use members::{CreateForm, EditForm, MemberList, MemberProfile, StatusForm};
pub use response::{
    Ack, AdminResponse, AlertType, Flash, GENERIC_FAILURE, RedirectTarget, failure_message,
};
pub use subscriptions::SubscriptionForm;
use uuid::Uuid;

use crate::{
    artifacts::ArtifactStore,
    audit,
    clock::Clock,
    error::{AdminError, Result},
    invoice::InvoiceGenerator,
    membership::MemberId,
    security::{Capability, Operator, audit::AuditEventType},
    settings::SettingsCache,
    store::Store,
    subscriptions::SubscriptionEngine,
};

/// Back-office operations over members, lockers and subscriptions.
#[derive(Debug, Clone)]
pub struct AdminService {
    store: Store,
    engine: Arc<SubscriptionEngine>,
    invoices: InvoiceGenerator,
    artifacts: Arc<dyn ArtifactStore>,
    settings: Arc<SettingsCache>,
    clock: Arc<dyn Clock>,
}

impl AdminService {
    /// Wires the service to its collaborators.
    #[must_use]
    pub fn new(
        store: Store,
        engine: Arc<SubscriptionEngine>,
        invoices: InvoiceGenerator,
        artifacts: Arc<dyn ArtifactStore>,
        settings: Arc<SettingsCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, engine, invoices, artifacts, settings, clock }
    }

    /// Underlying store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Settings cache.
    #[must_use]
    pub fn settings(&self) -> &SettingsCache {
        &self.settings
    }
}

/// Checks `capability`, audit-logging a denial.
fn authorize(operator: &Operator, capability: Capability, request_id: Uuid) -> Result<()> {
    operator.require(capability).inspect_err(|_| {
        audit!(
            AuditEventType::PermissionDenied,
            operator.name(),
            request_id,
            with_capability(capability.as_str()),
        );
    })
}

/// Parses a member id taken from a URL or form; malformed ids read as unknown.
fn parse_member_id(raw: &str) -> Result<MemberId> {
    MemberId::new(raw.trim()).map_err(|_| AdminError::MemberNotFound(raw.to_owned()))
}
