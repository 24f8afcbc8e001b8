use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
};
use tracing::error;

use super::{AppState, reply};
use crate::{
    admin::{
        AdminService, CreateForm, EditForm, LockerForm, MemberList, MemberProfile, StatusForm,
        SubscriptionForm,
    },
    error::{AdminError, Result},
    membership::{MemberUpdate, NewMember},
};

/// Runs a blocking admin operation off the async runtime.
async fn blocking<T, F>(state: &AppState, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&AdminService) -> Result<T> + Send + 'static,
{
    let service = state.service.clone();
    tokio::task::spawn_blocking(move || op(&service)).await.map_err(|e| {
        error!(error = %e, "admin task aborted");
        AdminError::Internal(format!("admin task aborted: {e}"))
    })?
}

pub(super) async fn list_members(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MemberList>> {
    let operator = state.authenticate(&headers)?;
    blocking(&state, move |service| service.list_members(&operator)).await.map(Json)
}

pub(super) async fn create_member(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CreateForm>> {
    let operator = state.authenticate(&headers)?;
    blocking(&state, move |service| service.create_form(&operator)).await.map(Json)
}

pub(super) async fn store_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<NewMember>,
) -> Result<Response> {
    let operator = state.authenticate(&headers)?;
    let outcome = blocking(&state, move |service| service.store_member(&operator, &form)).await?;
    Ok(reply::respond(outcome, &headers))
}

pub(super) async fn show_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<MemberProfile>> {
    let operator = state.authenticate(&headers)?;
    blocking(&state, move |service| service.show_member(&operator, &id)).await.map(Json)
}

pub(super) async fn edit_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<EditForm>> {
    let operator = state.authenticate(&headers)?;
    blocking(&state, move |service| service.edit_member(&operator, &id)).await.map(Json)
}

pub(super) async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(form): Json<MemberUpdate>,
) -> Result<Response> {
    let operator = state.authenticate(&headers)?;
    let outcome =
        blocking(&state, move |service| service.update_member(&operator, &id, &form)).await?;
    Ok(reply::respond(outcome, &headers))
}

pub(super) async fn destroy_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    let operator = state.authenticate(&headers)?;
    let outcome = blocking(&state, move |service| service.destroy_member(&operator, &id)).await?;
    Ok(reply::respond(outcome, &headers))
}

pub(super) async fn change_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<StatusForm>,
) -> Result<Response> {
    let operator = state.authenticate(&headers)?;
    let outcome = blocking(&state, move |service| service.change_status(&operator, &form)).await?;
    Ok(reply::respond(outcome, &headers))
}

pub(super) async fn assign_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<SubscriptionForm>,
) -> Result<Response> {
    let operator = state.authenticate(&headers)?;
    let outcome =
        blocking(&state, move |service| service.assign_subscription(&operator, &form)).await?;
    Ok(reply::respond(outcome, &headers))
}

pub(super) async fn renew_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<SubscriptionForm>,
) -> Result<Response> {
    let operator = state.authenticate(&headers)?;
    let outcome =
        blocking(&state, move |service| service.renew_subscription(&operator, &form)).await?;
    Ok(reply::respond(outcome, &headers))
}

pub(super) async fn assign_locker(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<LockerForm>,
) -> Result<Response> {
    let operator = state.authenticate(&headers)?;
    let outcome = blocking(&state, move |service| service.assign_locker(&operator, &form)).await?;
    Ok(reply::respond(outcome, &headers))
}
