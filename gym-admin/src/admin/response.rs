//! Outcomes of admin operations and the user-facing failure translator.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    error::{AdminError, ErrorClass},
    membership::MemberId,
};

/// Message shown for any operational failure.
pub const GENERIC_FAILURE: &str = "Something Went Wrong";

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
}

/// One-shot message attached to a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    /// Text shown to the operator.
    pub message: String,
    /// Success or error styling.
    pub alert_type: AlertType,
    /// Public locator of a freshly generated invoice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_url: Option<String>,
}

impl Flash {
    /// Success flash.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self { message: message.into(), alert_type: AlertType::Success, invoice_url: None }
    }

    /// Error flash.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self { message: message.into(), alert_type: AlertType::Error, invoice_url: None }
    }

    /// Attaches an invoice locator.
    #[must_use]
    pub fn with_invoice_url(mut self, url: impl Into<String>) -> Self {
        self.invoice_url = Some(url.into());
        self
    }
}

/// Where a redirect leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// The page the request came from.
    Back,
    /// Member listing.
    MembersIndex,
    /// Edit page of one member.
    EditMember(MemberId),
}

impl RedirectTarget {
    /// Path of the target; `None` for [`RedirectTarget::Back`].
    #[must_use]
    pub fn path(&self) -> Option<String> {
        match self {
            Self::Back => None,
            Self::MembersIndex => Some("/admin/members".to_owned()),
            Self::EditMember(id) => Some(format!("/admin/members/{id}/edit")),
        }
    }
}

/// JSON acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Text shown to the operator.
    pub message: String,
    /// Whether the operation took effect.
    pub success: bool,
}

/// Response of a state-changing admin operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminResponse {
    /// Redirect carrying a flash message.
    Redirect {
        /// Destination.
        target: RedirectTarget,
        /// Message for the next page.
        flash: Flash,
    },
    /// JSON acknowledgement.
    Ack(Ack),
}

impl AdminResponse {
    /// Redirect with a flash.
    #[must_use]
    pub const fn redirect(target: RedirectTarget, flash: Flash) -> Self {
        Self::Redirect { target, flash }
    }

    /// Flash carried by a redirect.
    #[must_use]
    pub const fn flash(&self) -> Option<&Flash> {
        match self {
            Self::Redirect { flash, .. } => Some(flash),
            Self::Ack(_) => None,
        }
    }

    /// True if the operation succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            Self::Redirect { flash, .. } => flash.alert_type == AlertType::Success,
            Self::Ack(ack) => ack.success,
        }
    }
}

/// Translates an error into the message shown to the operator.
///
/// Validation errors carry their own message and are logged at `info`.
/// Operational errors are logged with full detail at `error` and replaced by
/// `fallback`.
#[must_use]
pub fn failure_message(err: &AdminError, fallback: &str) -> String {
    match err.class() {
        ErrorClass::Validation => {
            info!(error = %err, "request rejected");
            err.to_string()
        }
        ErrorClass::Operational => {
            error!(error = %err, "admin operation failed");
            fallback.to_owned()
        }
        ErrorClass::Authorization => fallback.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_shown() {
        let message = failure_message(&AdminError::NoActiveSubscription, GENERIC_FAILURE);
        assert_eq!(message, "Member has no subscription");
    }

    #[test]
    fn test_operational_message_is_generic() {
        let err = AdminError::Render("font table corrupt".into());
        assert_eq!(failure_message(&err, GENERIC_FAILURE), "Something Went Wrong");
        let err = AdminError::Database(rusqlite::Error::InvalidQuery);
        assert_eq!(failure_message(&err, "Member Update failed"), "Member Update failed");
    }

    #[test]
    fn test_redirect_paths() {
        let id = MemberId::new("MEM-000042").unwrap();
        assert_eq!(RedirectTarget::Back.path(), None);
        assert_eq!(RedirectTarget::MembersIndex.path().as_deref(), Some("/admin/members"));
        assert_eq!(
            RedirectTarget::EditMember(id).path().as_deref(),
            Some("/admin/members/MEM-000042/edit")
        );
    }

    #[test]
    fn test_flash_serialization() {
        let flash = Flash::success("ok").with_invoice_url("http://gym.test/storage/x.pdf");
        let json = serde_json::to_value(&flash).unwrap();
        assert_eq!(json["alert_type"], "success");
        assert_eq!(json["invoice_url"], "http://gym.test/storage/x.pdf");

        let json = serde_json::to_value(Flash::error("nope")).unwrap();
        assert!(json.get("invoice_url").is_none());
    }
}
