//! Subscription engine.
//!
//! Turns a member, a plan selection and payment details into a persisted
//! [`SubscriptionRecord`]. [`SubscriptionEngine::quote`] holds every rule and
//! touches no storage; [`SubscriptionEngine::assign_or_renew`] loads the
//! member and writes the quote inside the caller's transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use super::{
    models::{
        NewSubscription, PaymentDetails, PlanCatalog, PlanId, PlanSelection, SubscriptionRecord,
        SubscriptionStatus,
    },
    schedule,
};
use crate::{
    error::{AdminError, Result},
    membership::{Member, MemberId},
    store::StoreTx,
};

/// Default number of days before the end date a renewal reminder is due.
pub const DEFAULT_RENEWAL_REMINDER_DAYS: u32 = 7;

/// Creates and renews member subscriptions.
#[derive(Debug, Clone)]
pub struct SubscriptionEngine {
    catalog: PlanCatalog,
    payment_gateways: Vec<String>,
    renewal_reminder_days: u32,
}

impl SubscriptionEngine {
    /// Creates an engine.
    ///
    /// An empty `payment_gateways` list accepts any non-empty payment method.
    #[must_use]
    pub fn new(
        catalog: PlanCatalog,
        payment_gateways: Vec<String>,
        renewal_reminder_days: u32,
    ) -> Self {
        Self { catalog, payment_gateways, renewal_reminder_days }
    }

    /// Plan catalog.
    #[must_use]
    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// Accepted payment gateways.
    #[must_use]
    pub fn payment_gateways(&self) -> &[String] {
        &self.payment_gateways
    }

    /// Computes the subscription `member` would get today.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the plan is unknown or not offered, the
    /// payment method is missing or not accepted, the total is negative, or the
    /// end date is out of range.
    pub fn quote(
        &self,
        member: &Member,
        selection: &PlanSelection,
        payment: &PaymentDetails,
        today: NaiveDate,
    ) -> Result<NewSubscription> {
        let plan_id = PlanId::new(selection.plan_id.trim())
            .map_err(|_| AdminError::PlanNotFound(selection.plan_id.clone()))?;
        let plan =
            self.catalog.get(&plan_id).ok_or_else(|| AdminError::PlanNotFound(plan_id.to_string()))?;
        if !plan.offered {
            return Err(AdminError::PlanNotOffered(plan.name.clone()));
        }

        let method = self.payment_method(&payment.method)?;
        let payment_status = payment.status.trim();
        if payment_status.is_empty() {
            return Err(AdminError::validation("The payment status field is required."));
        }

        let total_amount = total(plan.price, payment)?;
        let start_date = schedule::start_date(today, member.current_subscription.as_ref());
        let end_date = schedule::end_date(start_date, plan.duration)?;
        let renewal_date = schedule::renewal_date(start_date, end_date, self.renewal_reminder_days);

        Ok(NewSubscription {
            member_id: member.member_id.clone(),
            plan_id: plan.id.clone(),
            plan_name: plan.name.clone(),
            plan_price: plan.price,
            subscription_type: plan.subscription_type(),
            start_date,
            end_date,
            renewal_date,
            status: SubscriptionStatus::Active,
            payment_method: method,
            payment_status: payment_status.to_owned(),
            transaction: payment
                .transaction
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned),
            adjustments: payment.adjustments.clone(),
            total_amount,
        })
    }

    /// Assigns or renews a subscription for `member_id` and persists it.
    ///
    /// The previous current subscription is marked expired. The invoice is
    /// not generated here.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::MemberNotFound`] for unknown or deleted members,
    /// any error of [`quote`](Self::quote), or a database error.
    pub fn assign_or_renew(
        &self,
        tx: &StoreTx<'_>,
        member_id: &MemberId,
        selection: &PlanSelection,
        payment: &PaymentDetails,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionRecord> {
        let member = tx.member(member_id)?;
        let quote = self.quote(&member, selection, payment, now.date_naive())?;
        let record = tx.insert_subscription(&quote, now)?;
        debug!(
            member_id = %member_id,
            subscription_id = record.id,
            start = %record.start_date,
            end = %record.end_date,
            "subscription persisted"
        );
        Ok(record)
    }

    fn payment_method(&self, raw: &str) -> Result<String> {
        let method = raw.trim();
        if method.is_empty() {
            return Err(AdminError::validation("The payment method field is required."));
        }
        if self.payment_gateways.is_empty() {
            return Ok(method.to_owned());
        }
        self.payment_gateways
            .iter()
            .find(|gateway| gateway.eq_ignore_ascii_case(method))
            .cloned()
            .ok_or_else(|| AdminError::validation("The selected payment method is invalid."))
    }
}

fn total(price: Decimal, payment: &PaymentDetails) -> Result<Decimal> {
    let total = payment
        .adjustments
        .iter()
        .try_fold(price, |acc, adjustment| acc.checked_add(adjustment.amount))
        .ok_or_else(|| AdminError::validation("Total amount is out of range"))?;
    if total < Decimal::ZERO {
        return Err(AdminError::validation("Total amount cannot be negative"));
    }
    Ok(total)
}
