//! Subscription data models.
//!
//! Plans are read-only reference data loaded from configuration; a
//! [`SubscriptionRecord`] is the persisted result of assigning or renewing a
//! plan for a member.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AdminError, Result},
    membership::MemberId,
};

/// Unique identifier for a subscription plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

impl PlanId {
    /// Creates a new plan ID after validation.
    ///
    /// # Errors
    ///
    /// Returns error if ID is empty, exceeds 64 characters, or contains invalid characters.
    /// Only alphanumeric characters, hyphens, and underscores are allowed.
    pub fn new<S: Into<String>>(id: S) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(AdminError::validation("plan_id cannot be empty"));
        }
        if id.len() > 64 {
            return Err(AdminError::validation("plan_id must be 64 characters or less"));
        }
        if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(AdminError::validation(
                "plan_id can only contain alphanumeric characters, hyphens, and underscores",
            ));
        }
        Ok(Self(id))
    }

    /// Returns the inner string reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calendar unit of a plan duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    /// Calendar days.
    Day,
    /// Seven-day weeks.
    Week,
    /// Calendar months; the day of month clamps to the month's last day.
    Month,
    /// Calendar years.
    Year,
}

impl DurationUnit {
    const fn singular(self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::Week => "Week",
            Self::Month => "Month",
            Self::Year => "Year",
        }
    }

    const fn periodic(self) -> &'static str {
        match self {
            Self::Day => "Daily",
            Self::Week => "Weekly",
            Self::Month => "Monthly",
            Self::Year => "Yearly",
        }
    }
}

/// How long one purchase of a plan lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDuration {
    /// Number of units; always at least one.
    pub count: u32,
    /// Calendar unit.
    pub unit: DurationUnit,
}

impl PlanDuration {
    /// Creates a duration of `count` units.
    ///
    /// # Errors
    ///
    /// Returns error if `count` is zero.
    pub fn new(count: u32, unit: DurationUnit) -> Result<Self> {
        if count == 0 {
            return Err(AdminError::validation("plan duration must be at least one unit"));
        }
        Ok(Self { count, unit })
    }

    /// Human-readable type label, e.g. `Monthly` or `3 Months`.
    #[must_use]
    pub fn type_label(&self) -> String {
        if self.count == 1 {
            self.unit.periodic().to_owned()
        } else {
            format!("{} {}s", self.count, self.unit.singular())
        }
    }
}

/// Subscription plan offered by the gym.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    /// Unique plan identifier.
    pub id: PlanId,
    /// Display name.
    pub name: String,
    /// Price of one period.
    pub price: Decimal,
    /// Length of one period.
    pub duration: PlanDuration,
    /// Explicit type label; derived from the duration when absent.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<String>,
    /// Whether the plan is available for new subscriptions.
    pub offered: bool,
}

impl SubscriptionPlan {
    /// Type label recorded on subscriptions of this plan.
    #[must_use]
    pub fn subscription_type(&self) -> String {
        self.plan_type.clone().unwrap_or_else(|| self.duration.type_label())
    }
}

/// Read-only plan catalog.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanCatalog {
    plans: Vec<SubscriptionPlan>,
}

impl PlanCatalog {
    /// Builds a catalog.
    ///
    /// # Errors
    ///
    /// Returns error if two plans share an id.
    pub fn new(plans: Vec<SubscriptionPlan>) -> Result<Self> {
        for (index, plan) in plans.iter().enumerate() {
            if plans[..index].iter().any(|other| other.id == plan.id) {
                return Err(AdminError::Config(format!("duplicate plan id '{}'", plan.id)));
            }
        }
        Ok(Self { plans })
    }

    /// Looks a plan up by id.
    #[must_use]
    pub fn get(&self, id: &PlanId) -> Option<&SubscriptionPlan> {
        self.plans.iter().find(|plan| &plan.id == id)
    }

    /// Plans currently offered for new subscriptions.
    pub fn offered(&self) -> impl Iterator<Item = &SubscriptionPlan> {
        self.plans.iter().filter(|plan| plan.offered)
    }

    /// Number of plans, offered or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Returns true if the catalog holds no plans.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

/// Which plan the operator picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSelection {
    /// Plan identifier from the catalog.
    pub plan_id: String,
}

/// Signed amount added to the plan price (negative for discounts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    /// What the adjustment is for, e.g. `Admission fee`.
    pub label: String,
    /// Amount added to the total.
    pub amount: Decimal,
}

/// Payment captured with a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    /// Payment method or gateway name, e.g. `cash`.
    pub method: String,
    /// Free-form payment status, e.g. `paid` or `pending`.
    pub status: String,
    /// Gateway transaction reference.
    #[serde(default)]
    pub transaction: Option<String>,
    /// Amount breakdown beyond the plan price.
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
}

/// Lifecycle status of a subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid and running.
    Active,
    /// Superseded by a newer record or past its end date.
    Expired,
    /// Terminated early.
    Cancelled,
}

impl SubscriptionStatus {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses the storage representation.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(Self::Active),
            "expired" => Some(Self::Expired),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Subscription computed by the engine but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    /// Subscribing member.
    pub member_id: MemberId,
    /// Plan identifier snapshot.
    pub plan_id: PlanId,
    /// Plan name snapshot.
    pub plan_name: String,
    /// Plan price snapshot.
    pub plan_price: Decimal,
    /// Type label snapshot.
    pub subscription_type: String,
    /// First day covered.
    pub start_date: NaiveDate,
    /// Day the subscription ends.
    pub end_date: NaiveDate,
    /// Day a renewal reminder is due.
    pub renewal_date: NaiveDate,
    /// Initial status.
    pub status: SubscriptionStatus,
    /// Payment method.
    pub payment_method: String,
    /// Payment status.
    pub payment_status: String,
    /// Transaction reference.
    pub transaction: Option<String>,
    /// Amount breakdown beyond the plan price.
    pub adjustments: Vec<Adjustment>,
    /// Plan price plus adjustments.
    pub total_amount: Decimal,
}

/// Persisted subscription ("make subscription") record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Row identifier.
    pub id: i64,
    /// Subscribing member.
    pub member_id: MemberId,
    /// Plan identifier snapshot.
    pub plan_id: PlanId,
    /// Plan name snapshot.
    pub plan_name: String,
    /// Plan price snapshot.
    pub plan_price: Decimal,
    /// Type label snapshot.
    pub subscription_type: String,
    /// First day covered.
    pub start_date: NaiveDate,
    /// Day the subscription ends.
    pub end_date: NaiveDate,
    /// Day a renewal reminder is due.
    pub renewal_date: NaiveDate,
    /// Lifecycle status.
    pub status: SubscriptionStatus,
    /// Payment method.
    pub payment_method: String,
    /// Payment status.
    pub payment_status: String,
    /// Transaction reference.
    pub transaction: Option<String>,
    /// Amount breakdown beyond the plan price.
    pub adjustments: Vec<Adjustment>,
    /// Plan price plus adjustments.
    pub total_amount: Decimal,
    /// Why the subscription was cancelled, if it was.
    pub cancellation_reason: Option<String>,
    /// Artifact path of the generated invoice; set exactly once.
    pub invoice_pdf: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    /// Invoice identifier printed on the document.
    #[must_use]
    pub fn invoice_id(&self) -> String {
        format!("INV-{:06}", self.id)
    }

    /// True once the invoice artifact path has been written.
    #[must_use]
    pub fn is_issued(&self) -> bool {
        self.invoice_pdf.as_deref().is_some_and(|path| !path.is_empty())
    }

    /// True if the record is active and still running on `date`.
    ///
    /// Periods are half-open: the end date is the first day of the next
    /// period, so a record no longer covers its own end date.
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.status == SubscriptionStatus::Active && self.end_date > date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(id: &str, offered: bool) -> SubscriptionPlan {
        SubscriptionPlan {
            id: PlanId::new(id).unwrap(),
            name: id.to_uppercase(),
            price: Decimal::new(100, 0),
            duration: PlanDuration::new(1, DurationUnit::Month).unwrap(),
            plan_type: None,
            offered,
        }
    }

    #[test]
    fn test_plan_id_valid() {
        let id = PlanId::new("gold-monthly").unwrap();
        assert_eq!(id.as_str(), "gold-monthly");
    }

    #[test]
    fn test_plan_id_rejects_invalid() {
        assert!(PlanId::new("").is_err());
        assert!(PlanId::new("a".repeat(65)).is_err());
        assert!(PlanId::new("../etc/passwd").is_err());
        assert!(PlanId::new("plan 1").is_err());
    }

    #[test]
    fn test_duration_rejects_zero() {
        assert!(PlanDuration::new(0, DurationUnit::Month).is_err());
    }

    #[test]
    fn test_duration_type_labels() {
        assert_eq!(PlanDuration::new(1, DurationUnit::Month).unwrap().type_label(), "Monthly");
        assert_eq!(PlanDuration::new(1, DurationUnit::Year).unwrap().type_label(), "Yearly");
        assert_eq!(PlanDuration::new(3, DurationUnit::Month).unwrap().type_label(), "3 Months");
        assert_eq!(PlanDuration::new(2, DurationUnit::Week).unwrap().type_label(), "2 Weeks");
    }

    #[test]
    fn test_explicit_plan_type_wins() {
        let mut gold = plan("gold", true);
        assert_eq!(gold.subscription_type(), "Monthly");
        gold.plan_type = Some("Premium".into());
        assert_eq!(gold.subscription_type(), "Premium");
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let result = PlanCatalog::new(vec![plan("gold", true), plan("gold", false)]);
        assert!(matches!(result, Err(AdminError::Config(_))));
    }

    #[test]
    fn test_catalog_offered_filter() {
        let catalog = PlanCatalog::new(vec![plan("gold", true), plan("legacy", false)]).unwrap();
        let offered: Vec<_> = catalog.offered().map(|p| p.id.as_str().to_owned()).collect();
        assert_eq!(offered, vec!["gold"]);
        assert!(catalog.get(&PlanId::new("legacy").unwrap()).is_some());
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_subscription_status_storage_roundtrip() {
        for status in
            [SubscriptionStatus::Active, SubscriptionStatus::Expired, SubscriptionStatus::Cancelled]
        {
            assert_eq!(SubscriptionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SubscriptionStatus::parse("paused"), None);
    }

    #[test]
    fn test_payment_details_defaults() {
        let json = r#"{"method":"cash","status":"paid"}"#;
        let payment: PaymentDetails = serde_json::from_str(json).unwrap();
        assert!(payment.transaction.is_none());
        assert!(payment.adjustments.is_empty());
    }

    #[test]
    fn test_duration_unit_serialization() {
        let json = serde_json::to_string(&DurationUnit::Month).unwrap();
        assert_eq!(json, "\"month\"");
    }
}
