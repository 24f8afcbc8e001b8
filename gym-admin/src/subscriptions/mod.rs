//! Subscription plans, records and the engine that issues them.
//!
//! - [`models`]: plan catalog, payment details and subscription records
//! - [`schedule`]: start, end and renewal date arithmetic
//! - [`engine`]: the assign/renew operation

pub mod engine;
pub mod models;
pub mod schedule;

pub use engine::{DEFAULT_RENEWAL_REMINDER_DAYS, SubscriptionEngine};
pub use models::{
    Adjustment, DurationUnit, NewSubscription, PaymentDetails, PlanCatalog, PlanDuration, PlanId,
    PlanSelection, SubscriptionPlan, SubscriptionRecord, SubscriptionStatus,
};
