//! Subscription record rows.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use super::{StoreTx, columns};
use crate::{
    error::{AdminError, Result},
    membership::MemberId,
    subscriptions::models::{NewSubscription, SubscriptionRecord, SubscriptionStatus},
};

const SUBSCRIPTION_SELECT: &str = "
SELECT id, member_id, plan_id, plan_name, plan_price, subscription_type,
       start_date, end_date, renewal_date, status, payment_method, payment_status,
       transaction_ref, adjustments, total_amount, cancellation_reason, invoice_pdf, created_at
FROM subscriptions";

fn subscription_row(row: &Row<'_>) -> rusqlite::Result<SubscriptionRecord> {
    Ok(SubscriptionRecord {
        id: row.get(0)?,
        member_id: row.get(1)?,
        plan_id: row.get(2)?,
        plan_name: row.get(3)?,
        plan_price: columns::decimal(row, 4)?,
        subscription_type: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        renewal_date: row.get(8)?,
        status: row.get(9)?,
        payment_method: row.get(10)?,
        payment_status: row.get(11)?,
        transaction: row.get(12)?,
        adjustments: columns::adjustments(row, 13)?,
        total_amount: columns::decimal(row, 14)?,
        cancellation_reason: row.get(15)?,
        invoice_pdf: row.get(16)?,
        created_at: row.get(17)?,
    })
}

impl StoreTx<'_> {
    /// Persists a new subscription as the member's current one.
    ///
    /// Any active record of the member is marked expired first.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`] on write failure.
    pub fn insert_subscription(
        &self,
        new: &NewSubscription,
        created_at: DateTime<Utc>,
    ) -> Result<SubscriptionRecord> {
        self.conn.execute(
            "UPDATE subscriptions SET status = ?1 WHERE member_id = ?2 AND status = ?3",
            params![SubscriptionStatus::Expired, new.member_id, SubscriptionStatus::Active],
        )?;
        self.conn.execute(
            "INSERT INTO subscriptions (
                member_id, plan_id, plan_name, plan_price, subscription_type,
                start_date, end_date, renewal_date, status, payment_method, payment_status,
                transaction_ref, adjustments, total_amount, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                new.member_id,
                new.plan_id,
                new.plan_name,
                new.plan_price.to_string(),
                new.subscription_type,
                new.start_date,
                new.end_date,
                new.renewal_date,
                new.status,
                new.payment_method,
                new.payment_status,
                new.transaction,
                columns::adjustments_json(&new.adjustments)?,
                new.total_amount.to_string(),
                created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.set_current_subscription(&new.member_id, id)?;
        self.subscription(id)
    }

    /// Loads a subscription record by id.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Internal`] if the id is unknown.
    pub fn subscription(&self, id: i64) -> Result<SubscriptionRecord> {
        self.find_subscription(id)?
            .ok_or_else(|| AdminError::Internal(format!("subscription {id} not found")))
    }

    pub(super) fn find_subscription(&self, id: i64) -> Result<Option<SubscriptionRecord>> {
        let sql = format!("{SUBSCRIPTION_SELECT} WHERE id = ?1");
        Ok(self.conn.query_row(&sql, params![id], subscription_row).optional()?)
    }

    /// Lists a member's subscription history, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`] on query failure.
    pub fn subscriptions_of(&self, member_id: &MemberId) -> Result<Vec<SubscriptionRecord>> {
        let sql = format!("{SUBSCRIPTION_SELECT} WHERE member_id = ?1 ORDER BY id DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let records =
            stmt.query_map(params![member_id], subscription_row)?.collect::<rusqlite::Result<_>>()?;
        Ok(records)
    }

    /// Records the invoice artifact path of a subscription.
    ///
    /// The path is written once; later calls fail.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvoiceAlreadyIssued`] if a path is already set.
    pub fn set_invoice_path(&self, id: i64, path: &str) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE subscriptions SET invoice_pdf = ?1
             WHERE id = ?2 AND (invoice_pdf IS NULL OR invoice_pdf = '')",
            params![path, id],
        )?;
        if changed == 0 {
            let record = self.subscription(id)?;
            return Err(AdminError::InvoiceAlreadyIssued(record.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        membership::NewMember,
        store::Store,
        subscriptions::models::{Adjustment, PlanId},
    };

    fn new_subscription(member_id: &MemberId, start: NaiveDate) -> NewSubscription {
        NewSubscription {
            member_id: member_id.clone(),
            plan_id: PlanId::new("gold").unwrap(),
            plan_name: "Gold".into(),
            plan_price: Decimal::new(10000, 2),
            subscription_type: "Monthly".into(),
            start_date: start,
            end_date: start + chrono::Days::new(31),
            renewal_date: start + chrono::Days::new(24),
            status: SubscriptionStatus::Active,
            payment_method: "cash".into(),
            payment_status: "paid".into(),
            transaction: Some("TX-1".into()),
            adjustments: vec![Adjustment { label: "Admission".into(), amount: Decimal::new(15, 0) }],
            total_amount: Decimal::new(11500, 2),
        }
    }

    fn setup() -> (Store, MemberId) {
        let store = Store::open_in_memory().unwrap();
        let id = MemberId::new("MEM-000007").unwrap();
        let form = NewMember { name: "Ana".into(), ..NewMember::default() };
        store.transaction(|tx| tx.insert_member(&id, &form, Utc::now())).unwrap();
        (store, id)
    }

    #[test]
    fn test_insert_sets_current_and_roundtrips_amounts() {
        let (store, id) = setup();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let record = store
            .transaction(|tx| tx.insert_subscription(&new_subscription(&id, start), Utc::now()))
            .unwrap();
        assert_eq!(record.total_amount, Decimal::new(11500, 2));
        assert_eq!(record.adjustments.len(), 1);
        assert_eq!(record.transaction.as_deref(), Some("TX-1"));
        assert!(!record.is_issued());

        let member = store.read(|tx| tx.member(&id)).unwrap();
        assert_eq!(member.current_subscription.map(|s| s.id), Some(record.id));
    }

    #[test]
    fn test_new_subscription_expires_previous() {
        let (store, id) = setup();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let first = store
            .transaction(|tx| tx.insert_subscription(&new_subscription(&id, start), Utc::now()))
            .unwrap();
        let second = store
            .transaction(|tx| tx.insert_subscription(&new_subscription(&id, start), Utc::now()))
            .unwrap();

        let history = store.read(|tx| tx.subscriptions_of(&id)).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.id);
        assert_eq!(history[0].status, SubscriptionStatus::Active);
        assert_eq!(history[1].id, first.id);
        assert_eq!(history[1].status, SubscriptionStatus::Expired);
    }

    #[test]
    fn test_invoice_path_written_once() {
        let (store, id) = setup();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let record = store
            .transaction(|tx| tx.insert_subscription(&new_subscription(&id, start), Utc::now()))
            .unwrap();

        store.transaction(|tx| tx.set_invoice_path(record.id, "invoices/invoice_a.pdf")).unwrap();
        let second = store.transaction(|tx| tx.set_invoice_path(record.id, "invoices/invoice_b.pdf"));
        assert!(matches!(second, Err(AdminError::InvoiceAlreadyIssued(_))));

        let stored = store.read(|tx| tx.subscription(record.id)).unwrap();
        assert_eq!(stored.invoice_pdf.as_deref(), Some("invoices/invoice_a.pdf"));
        assert_eq!(stored.invoice_id(), format!("INV-{:06}", record.id));
    }
}
