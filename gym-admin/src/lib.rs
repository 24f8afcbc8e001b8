//! Gym Admin: back-office core for a gym or fitness club
//!
//! A Rust library for running the administrative side of a gym: member
//! records, locker assignment, subscription plans and the PDF invoices
//! issued with every subscription.
//!
//! # What does it do?
//!
//! - **Members**: registration with validated profiles, edits, soft deletion
//!   and an active/inactive toggle
//! - **Lockers**: assignment gated on a running subscription
//! - **Subscriptions**: start/end/renewal date arithmetic over a configured
//!   plan catalog, price adjustments and payment details
//! - **Invoices**: a fixed layout rendered to PDF and published through an
//!   artifact store
//! - **Access control**: bearer-token operators with per-operation
//!   capabilities and structured audit logging
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐
//! │   HTTP router     │  axum, bearer token → Operator
//! └─────────┬─────────┘
//!           │ spawn_blocking
//! ┌─────────▼───────────────────────────────────────────┐
//! │                   AdminService                      │
//! │  authorize → load member → SubscriptionEngine       │
//! │           → InvoiceGenerator → ArtifactStore        │
//! │           → record invoice path → respond           │
//! └─────────┬─────────────────────────────┬─────────────┘
//!           │ one transaction             │ bytes
//! ┌─────────▼─────────┐         ┌─────────▼─────────┐
//! │  Store (SQLite)   │         │ LocalArtifactStore│
//! └───────────────────┘         └───────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use chrono::NaiveDate;
//! use gym_admin::{
//!     admin::SubscriptionForm,
//!     app::App,
//!     clock::FixedClock,
//!     config::AppConfig,
//!     membership::NewMember,
//!     store::Store,
//! };
//!
//! # fn example() -> gym_admin::Result<()> {
//! # let dir = tempfile::tempdir().unwrap();
//! # let root = dir.path().display().to_string().replace('\\', "/");
//! let config = AppConfig::from_toml(&format!(
//!     r#"
//!     payment_gateways = ["Cash"]
//!
//!     [storage]
//!     root = "{root}"
//!     assets_root = "{root}"
//!
//!     [[plans]]
//!     id = "gold"
//!     name = "Gold"
//!     price = "100"
//!     offered = true
//!     duration = {{ count = 1, unit = "month" }}
//!
//!     [[operators]]
//!     name = "admin"
//!     token = "s3cret"
//!     permissions = ["*"]
//!     "#
//! ))?;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let app = App::with_store(config, Store::open_in_memory()?, Arc::new(FixedClock::on(today)))?;
//! let service = &app.state().service;
//! let admin = app.state().operators.authenticate(Some("s3cret"))?;
//!
//! let registered = service.store_member(admin, &NewMember {
//!     name: "Ada Lovelace".into(),
//!     ..NewMember::default()
//! })?;
//! assert!(registered.is_success());
//! let member_id = service.list_members(admin)?.members[0].member_id.to_string();
//!
//! let issued = service.assign_subscription(admin, &SubscriptionForm {
//!     member_id,
//!     plan_id: "gold".into(),
//!     payment_method: "cash".into(),
//!     payment_status: "paid".into(),
//!     transaction: None,
//!     adjustments: Vec::new(),
//! })?;
//! assert!(issued.is_success());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! # Module Organization
//!
//! - [`admin`]: request handlers behind every back-office action
//! - [`subscriptions`]: plan catalog, date arithmetic and the assign/renew engine
//! - [`invoice`]: invoice layout and PDF rendering
//! - [`membership`]: members, user profiles and lockers
//! - [`store`]: SQLite persistence with transactional access
//! - [`artifacts`]: storage of generated documents
//! - [`settings`]: organization settings and their cache
//! - [`security`]: operator capabilities and audit logging
//! - [`http`]: axum router
//! - [`config`]: TOML configuration
//! - [`error`]: error type and its classification
//!
//! # Error Handling
//!
//! All operations return [`Result<T, AdminError>`](error::Result). Handlers
//! only surface authorization failures as `Err`; everything else is folded
//! into the response with an operator-facing message:
//!
//! ```rust
//! use gym_admin::{AdminError, admin::{GENERIC_FAILURE, failure_message}};
//!
//! let shown = failure_message(&AdminError::LockerUnavailable(3), GENERIC_FAILURE);
//! assert_eq!(shown, "Locker 3 is not available");
//!
//! let shown = failure_message(&AdminError::Render("font".into()), GENERIC_FAILURE);
//! assert_eq!(shown, "Something Went Wrong");
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod admin;
pub mod app;
pub mod artifacts;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod invoice;
pub mod membership;
pub mod security;
pub mod settings;
pub mod store;
pub mod subscriptions;

pub use error::{AdminError, Result};
