//! Audit logging for administrative actions.
//!
//! Every state-changing admin operation and every denied request emits one
//! structured event on the `audit` tracing target, tagged with the operator
//! and a per-request correlation id.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Types of auditable events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A new subscription was issued with its invoice.
    SubscriptionAssigned,
    /// A running subscription was renewed with its invoice.
    SubscriptionRenewed,
    /// Issuing a subscription failed; nothing was persisted.
    SubscriptionFailed,
    /// A locker was given to a member.
    LockerAssigned,
    /// A member was registered.
    MemberRegistered,
    /// A member profile was updated.
    MemberUpdated,
    /// A member was soft-deleted.
    MemberDeleted,
    /// A member was activated or deactivated.
    MemberStatusChanged,
    /// A known operator lacked a capability.
    PermissionDenied,
    /// A request carried no valid operator credentials.
    AuthenticationFailed,
}

/// Details for audit log entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditDetails {
    /// Member the action applied to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    /// Capability that was checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    /// Subscription record involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<i64>,
    /// Stored invoice path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_path: Option<String>,
    /// Locker number involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locker_no: Option<u32>,
    /// Error message, with payment data redacted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Duration of the operation in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Audit log entry.
///
/// # Examples
///
/// ```
/// use gym_admin::security::audit::{AuditEvent, AuditEventType, audit_log};
/// use uuid::Uuid;
///
/// let event = AuditEvent::new(AuditEventType::LockerAssigned, "front-desk", Uuid::new_v4())
///     .with_member_id("MEM-000042")
///     .with_locker_no(12);
///
/// audit_log(&event);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// When the event occurred.
    pub timestamp: SystemTime,
    /// What happened.
    pub event_type: AuditEventType,
    /// Operator who acted, or `anonymous`.
    pub operator: String,
    /// Request correlation ID.
    pub request_id: Uuid,
    /// Contextual information.
    pub details: AuditDetails,
}

impl AuditEvent {
    /// Creates a new audit event.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn new(event_type: AuditEventType, operator: impl Into<String>, request_id: Uuid) -> Self {
        Self {
            timestamp: SystemTime::now(),
            event_type,
            operator: operator.into(),
            request_id,
            details: AuditDetails::default(),
        }
    }

    /// Adds the member id.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_member_id(mut self, member_id: impl Into<String>) -> Self {
        self.details.member_id = Some(member_id.into());
        self
    }

    /// Adds the checked capability.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.details.capability = Some(capability.into());
        self
    }

    /// Adds the subscription record id.
    #[must_use]
    pub const fn with_subscription_id(mut self, id: i64) -> Self {
        self.details.subscription_id = Some(id);
        self
    }

    /// Adds the stored invoice path.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_invoice_path(mut self, path: impl Into<String>) -> Self {
        self.details.invoice_path = Some(path.into());
        self
    }

    /// Adds the locker number.
    #[must_use]
    pub const fn with_locker_no(mut self, locker_no: u32) -> Self {
        self.details.locker_no = Some(locker_no);
        self
    }

    /// Adds an error message, redacting payment data first.
    ///
    /// # Examples
    ///
    /// ```
    /// use gym_admin::security::audit::{AuditEvent, AuditEventType};
    /// use uuid::Uuid;
    ///
    /// let event = AuditEvent::new(AuditEventType::SubscriptionFailed, "desk", Uuid::new_v4())
    ///     .with_error("card 4111 1111 1111 1111 declined");
    /// assert_eq!(event.details.error.as_deref(), Some("card XXXX-XXXX-XXXX-XXXX declined"));
    /// ```
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.details.error = Some(redact_sensitive(&error.into()));
        self
    }

    /// Adds the operation duration.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "duration in ms fits u64 for practical values"
    )]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.details.duration_ms = Some(duration.as_millis() as u64);
        self
    }
}

/// Logs an audit event to tracing with target `audit`.
pub fn audit_log(event: &AuditEvent) {
    tracing::info!(
        target: "audit",
        timestamp = ?event.timestamp,
        event_type = ?event.event_type,
        operator = %event.operator,
        request_id = %event.request_id,
        details = ?event.details,
        "AUDIT"
    );
}

const CARD_MASK: &str = "XXXX-XXXX-XXXX-XXXX";
const CARD_MIN_DIGITS: usize = 13;
const CARD_MAX_DIGITS: usize = 19;
const CVV_KEYWORDS: [&str; 3] = ["cvv2", "cvv", "cvc"];

/// Redacts payment card numbers and security codes from free text.
///
/// - A run of 13 to 19 digits, optionally grouped by single spaces or
///   hyphens, becomes `XXXX-XXXX-XXXX-XXXX`.
/// - Three or four digits after `cvv`, `cvv2` or `cvc` (any case, followed by
///   `:`, `=` or whitespace) become `XXX`.
///
/// # Examples
///
/// ```
/// use gym_admin::security::audit::redact_sensitive;
///
/// assert_eq!(redact_sensitive("card 1234-5678-9012-3456"), "card XXXX-XXXX-XXXX-XXXX");
/// assert_eq!(redact_sensitive("CVV: 123"), "CVV: XXX");
/// assert_eq!(redact_sensitive("Invoice INV-000012"), "Invoice INV-000012");
/// ```
#[must_use]
pub fn redact_sensitive(input: &str) -> String {
    redact_security_codes(&redact_card_numbers(input))
}

fn redact_card_numbers(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        // Extend over digits and single separators between digits.
        let start = i;
        let mut end = i;
        let mut digits = 0;
        while end < chars.len() {
            if chars[end].is_ascii_digit() {
                digits += 1;
                end += 1;
            } else if matches!(chars[end], ' ' | '-')
                && chars.get(end + 1).is_some_and(char::is_ascii_digit)
            {
                end += 1;
            } else {
                break;
            }
        }
        if (CARD_MIN_DIGITS..=CARD_MAX_DIGITS).contains(&digits) {
            out.push_str(CARD_MASK);
        } else {
            out.extend(&chars[start..end]);
        }
        i = end;
    }
    out
}

fn redact_security_codes(input: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let lower = lower.as_bytes();
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        let keyword = CVV_KEYWORDS.iter().find(|k| lower[i..].starts_with(k.as_bytes()));
        let Some(keyword) = keyword else {
            i += 1;
            continue;
        };
        let mut j = i + keyword.len();
        let sep_start = j;
        while j < bytes.len() && matches!(bytes[j], b':' | b'=' | b' ' | b'\t') {
            j += 1;
        }
        let digits_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        let digits = j - digits_start;
        let boundary = j == bytes.len() || !bytes[j].is_ascii_alphanumeric();
        if digits_start > sep_start && (3..=4).contains(&digits) && boundary {
            out.push_str(&input[copied..digits_start]);
            out.push_str("XXX");
            copied = j;
        }
        i = j.max(i + keyword.len());
    }
    out.push_str(&input[copied..]);
    out
}

/// Convenience macro for audit logging.
///
/// # Examples
///
/// ```
/// use gym_admin::{audit, security::audit::AuditEventType};
/// use uuid::Uuid;
///
/// audit!(AuditEventType::AuthenticationFailed, "anonymous", Uuid::new_v4());
///
/// audit!(
///     AuditEventType::MemberDeleted,
///     "manager",
///     Uuid::new_v4(),
///     with_member_id("MEM-000042"),
/// );
/// ```
#[macro_export]
macro_rules! audit {
    ($event_type:expr, $operator:expr, $request_id:expr) => {
        $crate::security::audit::audit_log(
            &$crate::security::audit::AuditEvent::new($event_type, $operator, $request_id)
        )
    };
    ($event_type:expr, $operator:expr, $request_id:expr, $($method:ident($arg:expr)),+ $(,)?) => {
        $crate::security::audit::audit_log(
            &$crate::security::audit::AuditEvent::new($event_type, $operator, $request_id)
                $(.$method($arg))+
        )
    };
}

#[cfg(test)]
#[allow(
    clippy::str_to_string,
    reason = "test code uses this pattern for readability"
)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_card_formats() {
        let inputs = [
            ("Card: 1234-5678-9012-3456", "Card: XXXX-XXXX-XXXX-XXXX"),
            ("Card: 1234 5678 9012 3456", "Card: XXXX-XXXX-XXXX-XXXX"),
            ("Card: 1234567890123456", "Card: XXXX-XXXX-XXXX-XXXX"),
            ("Amex 3782 822463 10005 ok", "Amex XXXX-XXXX-XXXX-XXXX ok"),
        ];
        for (input, expected) in &inputs {
            assert_eq!(&redact_sensitive(input), expected, "Failed to redact: {input}");
        }
    }

    #[test]
    fn test_redact_security_code() {
        assert_eq!(redact_sensitive("CVV: 123"), "CVV: XXX");
        assert_eq!(redact_sensitive("cvc=4567 rejected"), "cvc=XXX rejected");
        assert_eq!(redact_sensitive("cvv2 999"), "cvv2 XXX");
        assert_eq!(redact_sensitive("cvv:12"), "cvv:12");
    }

    #[test]
    fn test_redact_preserves_safe_data() {
        let input = "Member MEM-000042, total $114.50, phone +1 555 0100, on 2024-01-15";
        assert_eq!(redact_sensitive(input), input);
        assert_eq!(redact_sensitive(""), "");
    }

    #[test]
    fn test_redact_multiple() {
        let result =
            redact_sensitive("cards 1234-5678-9012-3456 and 9876543210987654, CVV: 321");
        assert_eq!(result, "cards XXXX-XXXX-XXXX-XXXX and XXXX-XXXX-XXXX-XXXX, CVV: XXX");
    }

    #[test]
    fn test_audit_event_builder() {
        let request_id = Uuid::new_v4();
        let event = AuditEvent::new(AuditEventType::SubscriptionAssigned, "front-desk", request_id)
            .with_member_id("MEM-000042")
            .with_subscription_id(7)
            .with_invoice_path("invoices/invoice_AbCdEfGhIj.pdf")
            .with_duration(Duration::from_millis(1500));

        assert_eq!(event.operator, "front-desk");
        assert_eq!(event.request_id, request_id);
        assert_eq!(event.details.member_id, Some("MEM-000042".to_string()));
        assert_eq!(event.details.subscription_id, Some(7));
        assert_eq!(event.details.duration_ms, Some(1500));
    }

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::new(AuditEventType::PermissionDenied, "trainer", Uuid::new_v4())
            .with_capability("member.delete");

        let json = serde_json::to_string(&event).expect("Should serialize");
        assert!(json.contains("permission_denied"));
        assert!(json.contains("trainer"));
        assert!(json.contains("member.delete"));
        assert!(!json.contains("locker_no"));
    }
}
