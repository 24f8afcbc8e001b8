//! Error types for the gym administration core.
//!
//! Every fallible operation in this crate returns [`Result<T>`], built on a
//! single [`AdminError`] enum. Variants fall into three classes (see
//! [`ErrorClass`]):
//!
//! - **Authorization** ([`AdminError::Unauthenticated`], [`AdminError::Forbidden`]):
//!   the request is rejected before anything is read or written.
//! - **Validation** (unknown member, unavailable locker, bad form input, ...):
//!   rejected before any mutation, shown to the operator verbatim.
//! - **Operational** (database, rendering, storage, internal): logged with full
//!   detail and shown to the operator as a generic failure message.
//!
//! # Examples
//!
//! ```
//! use gym_admin::error::{AdminError, ErrorClass};
//!
//! let err = AdminError::LockerUnavailable(12);
//! assert_eq!(err.class(), ErrorClass::Validation);
//! assert_eq!(err.to_string(), "Locker 12 is not available");
//! ```

use thiserror::Error;

/// Result type alias for admin operations.
pub type Result<T> = std::result::Result<T, AdminError>;

/// Coarse classification used at the response boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller is unknown or lacks a capability.
    Authorization,
    /// Input or state does not allow the operation; safe to show.
    Validation,
    /// Infrastructure failure; details stay in the server log.
    Operational,
}

/// Errors that can occur while handling an admin action.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum AdminError {
    /// No operator token, or a token that matches no configured operator.
    #[error("Missing or unknown operator credentials")]
    Unauthenticated,

    /// Operator is known but lacks the named capability.
    #[error("Operator '{operator}' lacks the '{capability}' permission")]
    Forbidden {
        /// Operator display name.
        operator: String,
        /// Capability string that was required.
        capability: String,
    },

    /// Member id is unknown or the member was deleted.
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// Locker number is not registered.
    #[error("Locker not found: {0}")]
    LockerNotFound(u32),

    /// Locker is held by another member.
    #[error("Locker {0} is not available")]
    LockerUnavailable(u32),

    /// Member has no running subscription.
    #[error("Member has no subscription")]
    NoActiveSubscription,

    /// Plan id is not in the catalog.
    #[error("Subscription plan not found: {0}")]
    PlanNotFound(String),

    /// Plan exists but is not offered for new subscriptions.
    #[error("Subscription plan '{0}' is not currently offered")]
    PlanNotOffered(String),

    /// Form input failed validation. The message is operator-facing.
    #[error("{0}")]
    Validation(String),

    /// The invoice path of a subscription was already written.
    #[error("Invoice already issued for subscription {0}")]
    InvoiceAlreadyIssued(i64),

    /// `SQLite` failure.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// PDF rendering failure.
    #[error("Invoice rendering failed: {0}")]
    Render(String),

    /// Artifact storage failure.
    #[error("Artifact storage failed: {0}")]
    Storage(#[from] std::io::Error),

    /// Configuration could not be parsed or is inconsistent.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Anything else that should never reach an operator.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdminError {
    /// Returns the boundary class of this error.
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Unauthenticated | Self::Forbidden { .. } => ErrorClass::Authorization,
            Self::MemberNotFound(_)
            | Self::LockerNotFound(_)
            | Self::LockerUnavailable(_)
            | Self::NoActiveSubscription
            | Self::PlanNotFound(_)
            | Self::PlanNotOffered(_)
            | Self::Validation(_) => ErrorClass::Validation,
            Self::InvoiceAlreadyIssued(_)
            | Self::Database(_)
            | Self::Render(_)
            | Self::Storage(_)
            | Self::Config(_)
            | Self::Internal(_) => ErrorClass::Operational,
        }
    }

    /// Returns true for infrastructure failures.
    #[must_use]
    pub const fn is_operational(&self) -> bool {
        matches!(self.class(), ErrorClass::Operational)
    }

    /// Shorthand for a [`AdminError::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
