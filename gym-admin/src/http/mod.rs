//! HTTP surface of the admin service.
//!
//! Handlers authenticate the bearer token, hand the admin operation to
//! [`tokio::task::spawn_blocking`], and translate the outcome:
//!
//! - views are returned as JSON,
//! - redirects become `303 See Other` with a `flash` cookie,
//! - acknowledgements are returned as JSON `{message, success}`.

mod handlers;
mod reply;

use std::{path::Path, sync::Arc};

use axum::{
    Router,
    http::{HeaderMap, header},
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use uuid::Uuid;

pub use reply::{FLASH_COOKIE, decode_flash, encode_flash};

use crate::{
    admin::AdminService,
    audit,
    error::Result,
    security::{Operator, OperatorRegistry, audit::AuditEventType},
};

/// Shared state of the admin router.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Admin operations.
    pub service: AdminService,
    /// Token to operator lookup.
    pub operators: Arc<OperatorRegistry>,
}

impl AppState {
    /// Resolves the operator behind the request's bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Unauthenticated`](crate::error::AdminError::Unauthenticated)
    /// for a missing or unknown token; the attempt is audit-logged.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Operator> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        self.operators.authenticate(token).cloned().inspect_err(|_| {
            audit!(AuditEventType::AuthenticationFailed, "anonymous", Uuid::new_v4());
        })
    }
}

/// Builds the admin router.
///
/// Published artifacts under `storage_root` are served at `/storage`.
pub fn router(state: AppState, storage_root: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/admin/members", get(handlers::list_members).post(handlers::store_member))
        .route("/admin/members/create", get(handlers::create_member))
        .route("/admin/members/status", post(handlers::change_status))
        .route(
            "/admin/members/:id",
            get(handlers::show_member)
                .put(handlers::update_member)
                .delete(handlers::destroy_member),
        )
        .route("/admin/members/:id/edit", get(handlers::edit_member))
        .route("/admin/subscriptions/assign", post(handlers::assign_subscription))
        .route("/admin/subscriptions/renew", post(handlers::renew_subscription))
        .route("/admin/lockers/assign", post(handlers::assign_locker))
        .nest_service("/storage", ServeDir::new(storage_root.as_ref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
