//! Invoice document model.
//!
//! [`InvoiceLayout::build`] is a pure function of its inputs: the same member,
//! record and settings always produce an equal layout. Renderers only place
//! what the layout contains.

use super::{badge::StatusBadge, format};
use crate::{
    membership::Member,
    settings::{LogoImage, OrgSettings},
    subscriptions::models::SubscriptionRecord,
};

/// Value cell of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Plain text.
    Text(String),
    /// Coloured status badge.
    Badge(StatusBadge),
}

/// One line of a section, optionally labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Label such as `Start Date:`; billing lines have none.
    pub label: Option<String>,
    /// Value cell.
    pub value: Cell,
}

impl Row {
    fn labelled(label: &str, value: impl Into<String>) -> Self {
        Self { label: Some(format!("{label}:")), value: Cell::Text(value.into()) }
    }

    fn bare(value: impl Into<String>) -> Self {
        Self { label: None, value: Cell::Text(value.into()) }
    }
}

/// Titled block of rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading, e.g. `Gym Information:`.
    pub title: String,
    /// Rows in display order.
    pub rows: Vec<Row>,
}

/// Top band of the invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Organization logo.
    pub logo: Option<LogoImage>,
    /// Plan name, or `Subscription`.
    pub title: String,
    /// `Invoice #<id>`.
    pub invoice_number: String,
}

/// Complete invoice document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLayout {
    /// Logo and titles.
    pub header: Header,
    /// Gym information (left) and subscription details (right).
    pub upper: [Section; 2],
    /// Billing information (left) and payment information (right),
    /// printed below a divider.
    pub lower: [Section; 2],
}

impl InvoiceLayout {
    /// Lays out the invoice of `record` for `member`.
    #[must_use]
    pub fn build(member: &Member, record: &SubscriptionRecord, settings: &OrgSettings) -> Self {
        let user = &member.user;
        let currency = settings.currency_symbol();
        let plan_name = Some(record.plan_name.as_str());

        let header = Header {
            logo: settings.logo.clone(),
            title: plan_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or("Subscription")
                .to_owned(),
            invoice_number: format!("Invoice #{}", record.invoice_id()),
        };

        let gym = Section {
            title: "Gym Information:".to_owned(),
            rows: vec![
                Row::labelled("Name", settings.name()),
                Row::labelled("Address", settings.address()),
                Row::labelled("Email", settings.email()),
                Row::labelled("Phone", settings.phone()),
            ],
        };

        let details = Section {
            title: "Subscription Details:".to_owned(),
            rows: vec![
                Row::labelled("Subscription", format::text_or_missing(plan_name)),
                Row::labelled("Type", format::text_or_missing(Some(record.subscription_type.as_str()))),
                Row::labelled("Start Date", format::date(record.start_date)),
                Row::labelled("End Date", format::date(record.end_date)),
                Row::labelled("Renewal Date", format::date(record.renewal_date)),
                Row::labelled(
                    "Cancellation Reason",
                    format::text_or_missing(record.cancellation_reason.as_deref()),
                ),
                Row::labelled("Amount", format::money(currency, record.plan_price)),
                Row::labelled("Total Amount", format::money(currency, record.total_amount)),
            ],
        };

        let billing = Section {
            title: "Billing Information:".to_owned(),
            rows: vec![
                Row::bare(format::text_or_missing(Some(user.name.as_str()))),
                Row::bare(format::text_or_missing(user.phone.as_deref())),
                Row::bare(format::text_or_missing(user.address.as_deref())),
            ],
        };

        let payment = Section {
            title: "Payment Information:".to_owned(),
            rows: vec![
                Row::labelled("Method", format::text_or_missing(Some(record.payment_method.as_str()))),
                Row {
                    label: Some("Status:".to_owned()),
                    value: Cell::Badge(StatusBadge::for_status(&record.payment_status)),
                },
                Row::labelled("Transaction", format::text_or_missing(record.transaction.as_deref())),
            ],
        };

        Self { header, upper: [gym, details], lower: [billing, payment] }
    }

    /// All sections in reading order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.upper.iter().chain(self.lower.iter())
    }

    /// Looks up the value text of a labelled row, e.g. `value_of("Total Amount")`.
    #[must_use]
    pub fn value_of(&self, label: &str) -> Option<&str> {
        let wanted = format!("{label}:");
        self.sections().flat_map(|s| s.rows.iter()).find_map(|row| {
            match (&row.label, &row.value) {
                (Some(l), Cell::Text(text)) if *l == wanted => Some(text.as_str()),
                (Some(l), Cell::Badge(badge)) if *l == wanted => Some(badge.label.as_str()),
                _ => None,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        invoice::badge::BadgeTone,
        membership::{MemberId, MemberStatus, User},
        subscriptions::models::{PlanId, SubscriptionStatus},
    };

    fn member() -> Member {
        Member {
            id: 1,
            member_id: MemberId::new("MEM-000042").unwrap(),
            user: User {
                id: 1,
                name: "Ana Lima".into(),
                email: Some("ana@example.com".into()),
                phone: Some("+1 555 0100".into()),
                address: None,
                image: None,
                date_of_birth: None,
            },
            status: MemberStatus::Active,
            locker_no: None,
            current_subscription: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn record() -> SubscriptionRecord {
        SubscriptionRecord {
            id: 12,
            member_id: MemberId::new("MEM-000042").unwrap(),
            plan_id: PlanId::new("gold").unwrap(),
            plan_name: "Gold".into(),
            plan_price: Decimal::new(100, 0),
            subscription_type: "Monthly".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            renewal_date: NaiveDate::from_ymd_opt(2024, 1, 25).unwrap(),
            status: SubscriptionStatus::Active,
            payment_method: "Cash".into(),
            payment_status: "pending".into(),
            transaction: None,
            adjustments: Vec::new(),
            total_amount: Decimal::new(100, 0),
            cancellation_reason: None,
            invoice_pdf: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_header() {
        let layout = InvoiceLayout::build(&member(), &record(), &OrgSettings::default());
        assert_eq!(layout.header.title, "Gold");
        assert_eq!(layout.header.invoice_number, "Invoice #INV-000012");
        assert!(layout.header.logo.is_none());
    }

    #[test]
    fn test_blank_plan_name_titles_subscription() {
        let mut record = record();
        record.plan_name = String::new();
        let layout = InvoiceLayout::build(&member(), &record, &OrgSettings::default());
        assert_eq!(layout.header.title, "Subscription");
        assert_eq!(layout.value_of("Subscription"), Some("-"));
    }

    #[test]
    fn test_gym_defaults_and_overrides() {
        let layout = InvoiceLayout::build(&member(), &record(), &OrgSettings::default());
        assert_eq!(layout.value_of("Name"), Some("Your Gym Name"));
        assert_eq!(layout.value_of("Address"), Some("123 Gym Street, City"));

        let settings = OrgSettings {
            name: Some("Iron Temple".into()),
            currency_symbol: Some("€".into()),
            ..OrgSettings::default()
        };
        let layout = InvoiceLayout::build(&member(), &record(), &settings);
        assert_eq!(layout.value_of("Name"), Some("Iron Temple"));
        assert_eq!(layout.value_of("Total Amount"), Some("€100.00"));
    }

    #[test]
    fn test_subscription_details() {
        let layout = InvoiceLayout::build(&member(), &record(), &OrgSettings::default());
        assert_eq!(layout.value_of("Start Date"), Some("01 January, 2024"));
        assert_eq!(layout.value_of("End Date"), Some("01 February, 2024"));
        assert_eq!(layout.value_of("Renewal Date"), Some("25 January, 2024"));
        assert_eq!(layout.value_of("Cancellation Reason"), Some("-"));
        assert_eq!(layout.value_of("Amount"), Some("$100.00"));
        assert_eq!(layout.value_of("Type"), Some("Monthly"));
    }

    #[test]
    fn test_billing_and_payment() {
        let layout = InvoiceLayout::build(&member(), &record(), &OrgSettings::default());
        let billing: Vec<_> = layout.lower[0]
            .rows
            .iter()
            .map(|row| match &row.value {
                Cell::Text(text) => text.as_str(),
                Cell::Badge(_) => "badge",
            })
            .collect();
        assert_eq!(billing, vec!["Ana Lima", "+1 555 0100", "-"]);

        assert_eq!(layout.value_of("Method"), Some("Cash"));
        assert_eq!(layout.value_of("Transaction"), Some("-"));
        let status = &layout.lower[1].rows[1];
        assert!(matches!(&status.value, Cell::Badge(b) if b.tone == BadgeTone::Pending));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let settings = OrgSettings { phone: Some("+44 20 7946 0000".into()), ..OrgSettings::default() };
        let first = InvoiceLayout::build(&member(), &record(), &settings);
        let second = InvoiceLayout::build(&member(), &record(), &settings);
        assert_eq!(first, second);
    }
}
