//! Assign and renew subscriptions with their invoices.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    AdminService, authorize, parse_member_id,
    response::{AdminResponse, Flash, GENERIC_FAILURE, RedirectTarget, failure_message},
};
use crate::{
    artifacts::invoice_artifact_path,
    audit,
    error::Result,
    security::{Capability, Operator, audit::AuditEventType},
    subscriptions::models::{Adjustment, PaymentDetails, PlanSelection, SubscriptionRecord},
};

/// Assign/renew form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionForm {
    /// Public member id.
    pub member_id: String,
    /// Plan identifier.
    pub plan_id: String,
    /// Payment method or gateway.
    pub payment_method: String,
    /// Payment status, e.g. `paid`.
    pub payment_status: String,
    /// Gateway transaction reference.
    #[serde(default)]
    pub transaction: Option<String>,
    /// Amounts added to the plan price.
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
}

impl SubscriptionForm {
    fn selection(&self) -> PlanSelection {
        PlanSelection { plan_id: self.plan_id.clone() }
    }

    fn payment(&self) -> PaymentDetails {
        PaymentDetails {
            method: self.payment_method.clone(),
            status: self.payment_status.clone(),
            transaction: self.transaction.clone(),
            adjustments: self.adjustments.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IssueKind {
    Assign,
    Renew,
}

impl IssueKind {
    const fn success_message(self) -> &'static str {
        match self {
            Self::Assign => "Subscription assigned and invoice generated.",
            Self::Renew => "Subscription renewed and invoice generated.",
        }
    }

    const fn audit_event(self) -> AuditEventType {
        match self {
            Self::Assign => AuditEventType::SubscriptionAssigned,
            Self::Renew => AuditEventType::SubscriptionRenewed,
        }
    }
}

/// Progress of one issue request; the last stage reached is logged on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IssueStage {
    Authorized,
    MemberLoaded,
    SubscriptionComputed,
    InvoiceRendered,
    ArtifactPersisted,
}

struct Issued {
    record: SubscriptionRecord,
    path: String,
    locator: String,
}

impl AdminService {
    /// Assigns a subscription to a member and generates its invoice.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Forbidden`](crate::error::AdminError::Forbidden)
    /// without the `subscription.assign` capability. Every other failure is
    /// reported in the response.
    pub fn assign_subscription(
        &self,
        operator: &Operator,
        form: &SubscriptionForm,
    ) -> Result<AdminResponse> {
        self.issue_subscription(operator, form, IssueKind::Assign)
    }

    /// Renews a member's subscription and generates its invoice.
    ///
    /// # Errors
    ///
    /// Same as [`assign_subscription`](Self::assign_subscription).
    pub fn renew_subscription(
        &self,
        operator: &Operator,
        form: &SubscriptionForm,
    ) -> Result<AdminResponse> {
        self.issue_subscription(operator, form, IssueKind::Renew)
    }

    #[instrument(skip(self, operator, form), fields(operator = operator.name(), member_id = %form.member_id))]
    fn issue_subscription(
        &self,
        operator: &Operator,
        form: &SubscriptionForm,
        kind: IssueKind,
    ) -> Result<AdminResponse> {
        let request_id = Uuid::new_v4();
        authorize(operator, Capability::SubscriptionAssign, request_id)?;
        let started = Instant::now();
        let settings = self.settings.snapshot();
        let now = self.clock.now();

        let mut stage = IssueStage::Authorized;
        let mut written: Option<String> = None;
        let outcome = self.store.transaction(|tx| {
            let member_id = parse_member_id(&form.member_id)?;
            let member = tx.member(&member_id)?;
            stage = IssueStage::MemberLoaded;

            let record =
                self.engine.assign_or_renew(tx, &member_id, &form.selection(), &form.payment(), now)?;
            stage = IssueStage::SubscriptionComputed;

            let bytes = self.invoices.render(&member, &record, &settings)?;
            stage = IssueStage::InvoiceRendered;

            let path = invoice_artifact_path();
            let locator = self.artifacts.put(&path, &bytes)?;
            written = Some(path.clone());
            tx.set_invoice_path(record.id, &path)?;
            stage = IssueStage::ArtifactPersisted;

            Ok(Issued { record, path, locator })
        });

        match outcome {
            Ok(issued) => {
                info!(
                    subscription_id = issued.record.id,
                    invoice = %issued.record.invoice_id(),
                    path = %issued.path,
                    "subscription issued"
                );
                audit!(
                    kind.audit_event(),
                    operator.name(),
                    request_id,
                    with_member_id(issued.record.member_id.as_str()),
                    with_subscription_id(issued.record.id),
                    with_invoice_path(issued.path.as_str()),
                    with_duration(started.elapsed()),
                );
                Ok(AdminResponse::redirect(
                    RedirectTarget::Back,
                    Flash::success(kind.success_message()).with_invoice_url(issued.locator),
                ))
            }
            Err(err) => {
                if let Some(path) = written {
                    if let Err(cleanup) = self.artifacts.remove(&path) {
                        warn!(path = %path, error = %cleanup, "orphaned invoice not removed");
                    }
                }
                warn!(stage = ?stage, "subscription not issued");
                audit!(
                    AuditEventType::SubscriptionFailed,
                    operator.name(),
                    request_id,
                    with_member_id(form.member_id.as_str()),
                    with_error(err.to_string()),
                    with_duration(started.elapsed()),
                );
                Ok(AdminResponse::redirect(
                    RedirectTarget::MembersIndex,
                    Flash::error(failure_message(&err, GENERIC_FAILURE)),
                ))
            }
        }
    }
}
