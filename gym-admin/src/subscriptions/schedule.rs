//! Subscription date arithmetic.
//!
//! All functions here are pure and operate on calendar dates. Month and year
//! steps follow calendar semantics: the day of month clamps to the last valid
//! day of the target month (January 31 + 1 month = February 29 in a leap year).

use chrono::{Days, Months, NaiveDate};

use super::models::{DurationUnit, PlanDuration, SubscriptionRecord};
use crate::error::{AdminError, Result};

/// Calculates the start date of a new subscription period.
///
/// A member whose current subscription still covers `today` (see
/// [`SubscriptionRecord::covers`]) continues from that subscription's end
/// date; everyone else starts today.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use gym_admin::subscriptions::schedule::start_date;
///
/// let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// assert_eq!(start_date(today, None), today);
/// ```
#[must_use]
pub fn start_date(today: NaiveDate, current: Option<&SubscriptionRecord>) -> NaiveDate {
    match current {
        Some(record) if record.covers(today) => record.end_date,
        _ => today,
    }
}

/// Calculates the end date of a period starting on `start`.
///
/// # Errors
///
/// Returns [`AdminError::Validation`] if the result falls outside the
/// representable date range.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use gym_admin::subscriptions::{
///     models::{DurationUnit, PlanDuration},
///     schedule::end_date,
/// };
///
/// # fn example() -> gym_admin::error::Result<()> {
/// let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
/// let duration = PlanDuration::new(1, DurationUnit::Month)?;
/// assert_eq!(end_date(start, duration)?, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
/// # Ok(())
/// # }
/// ```
pub fn end_date(start: NaiveDate, duration: PlanDuration) -> Result<NaiveDate> {
    let count = duration.count;
    let end = match duration.unit {
        DurationUnit::Day => start.checked_add_days(Days::new(u64::from(count))),
        DurationUnit::Week => start.checked_add_days(Days::new(u64::from(count) * 7)),
        DurationUnit::Month => start.checked_add_months(Months::new(count)),
        DurationUnit::Year => {
            count.checked_mul(12).and_then(|months| start.checked_add_months(Months::new(months)))
        }
    };
    end.ok_or_else(|| AdminError::validation("Subscription end date is out of range"))
}

/// Calculates the day a renewal reminder is due.
///
/// The reminder falls `reminder_days` before `end`, but never before `start`.
#[must_use]
pub fn renewal_date(start: NaiveDate, end: NaiveDate, reminder_days: u32) -> NaiveDate {
    end.checked_sub_days(Days::new(u64::from(reminder_days)))
        .map_or(start, |date| date.max(start))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        membership::MemberId,
        subscriptions::models::{PlanId, SubscriptionStatus},
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record_ending(end: NaiveDate) -> SubscriptionRecord {
        SubscriptionRecord {
            id: 1,
            member_id: MemberId::new("MEM-000001").unwrap(),
            plan_id: PlanId::new("gold").unwrap(),
            plan_name: "Gold".into(),
            plan_price: Decimal::new(100, 0),
            subscription_type: "Monthly".into(),
            start_date: date(2023, 12, 1),
            end_date: end,
            renewal_date: end,
            status: SubscriptionStatus::Active,
            payment_method: "cash".into(),
            payment_status: "paid".into(),
            transaction: None,
            adjustments: Vec::new(),
            total_amount: Decimal::new(100, 0),
            cancellation_reason: None,
            invoice_pdf: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_start_today_without_subscription() {
        assert_eq!(start_date(date(2024, 1, 1), None), date(2024, 1, 1));
    }

    #[test]
    fn test_start_continues_running_subscription() {
        let current = record_ending(date(2024, 1, 20));
        assert_eq!(start_date(date(2024, 1, 1), Some(&current)), date(2024, 1, 20));
    }

    #[test]
    fn test_start_today_when_subscription_lapsed() {
        let current = record_ending(date(2023, 12, 20));
        assert_eq!(start_date(date(2024, 1, 1), Some(&current)), date(2024, 1, 1));

        let ends_today = record_ending(date(2024, 1, 1));
        assert_eq!(start_date(date(2024, 1, 1), Some(&ends_today)), date(2024, 1, 1));
    }

    #[test]
    fn test_last_day_rule_matches_coverage() {
        let current = record_ending(date(2024, 2, 1));

        let day_before = date(2024, 1, 31);
        assert!(current.covers(day_before));
        assert_eq!(start_date(day_before, Some(&current)), date(2024, 2, 1));

        let end_day = date(2024, 2, 1);
        assert!(!current.covers(end_day));
        assert_eq!(start_date(end_day, Some(&current)), end_day);
    }

    #[test]
    fn test_cancelled_subscription_does_not_continue() {
        let mut current = record_ending(date(2024, 1, 20));
        current.status = SubscriptionStatus::Cancelled;
        assert_eq!(start_date(date(2024, 1, 1), Some(&current)), date(2024, 1, 1));
    }

    #[test]
    fn test_end_date_one_month() {
        let duration = PlanDuration::new(1, DurationUnit::Month).unwrap();
        assert_eq!(end_date(date(2024, 1, 1), duration).unwrap(), date(2024, 2, 1));
    }

    #[test]
    fn test_end_date_month_clamps() {
        let duration = PlanDuration::new(1, DurationUnit::Month).unwrap();
        assert_eq!(end_date(date(2023, 1, 31), duration).unwrap(), date(2023, 2, 28));
    }

    #[test]
    fn test_end_date_other_units() {
        let start = date(2024, 2, 29);
        let days = PlanDuration::new(10, DurationUnit::Day).unwrap();
        let weeks = PlanDuration::new(2, DurationUnit::Week).unwrap();
        let year = PlanDuration::new(1, DurationUnit::Year).unwrap();
        assert_eq!(end_date(start, days).unwrap(), date(2024, 3, 10));
        assert_eq!(end_date(start, weeks).unwrap(), date(2024, 3, 14));
        assert_eq!(end_date(start, year).unwrap(), date(2025, 2, 28));
    }

    #[test]
    fn test_end_date_out_of_range() {
        let duration = PlanDuration::new(u32::MAX, DurationUnit::Year).unwrap();
        let result = end_date(date(2024, 1, 1), duration);
        assert!(matches!(result, Err(AdminError::Validation(_))));
    }

    #[test]
    fn test_renewal_date_reminder_window() {
        assert_eq!(renewal_date(date(2024, 1, 1), date(2024, 2, 1), 7), date(2024, 1, 25));
    }

    #[test]
    fn test_renewal_date_clamped_to_start() {
        assert_eq!(renewal_date(date(2024, 1, 1), date(2024, 1, 4), 7), date(2024, 1, 1));
        assert_eq!(renewal_date(date(2024, 1, 1), date(2024, 1, 4), 0), date(2024, 1, 4));
    }
}
