//! Access control and audit logging for admin operations.
//!
//! # Authorization
//!
//! Each operation names one [`Capability`]; the calling [`Operator`] must
//! hold it before anything is read or written:
//!
//! ```rust
//! use gym_admin::security::{Capability, Operator};
//!
//! # fn example() -> gym_admin::error::Result<()> {
//! let desk = Operator::new("front-desk", ["member.list", "locker.assign"])?;
//! desk.require(Capability::LockerAssign)?;
//! assert!(desk.require(Capability::MemberDelete).is_err());
//! # Ok(())
//! # }
//! ```
//!
//! # Audit Logging
//!
//! Structured events go to the `audit` tracing target with payment data
//! redacted:
//!
//! ```rust
//! use gym_admin::{audit, security::audit::AuditEventType};
//! use uuid::Uuid;
//!
//! audit!(
//!     AuditEventType::MemberStatusChanged,
//!     "manager",
//!     Uuid::new_v4(),
//!     with_member_id("MEM-000042")
//! );
//! ```

pub mod audit;
mod authz;

pub use audit::{AuditDetails, AuditEvent, AuditEventType, audit_log, redact_sensitive};
pub use authz::{Capability, Operator, OperatorRegistry};
