//! Translation of admin outcomes and errors into HTTP responses.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::json;
use tracing::error;

use crate::{
    admin::{AdminResponse, Flash, GENERIC_FAILURE},
    error::{AdminError, ErrorClass},
};

/// Name of the cookie carrying the flash message to the next page.
pub const FLASH_COOKIE: &str = "flash";

const FALLBACK_BACK: &str = "/admin/members";

/// Encodes a flash as base64url JSON for the cookie value.
#[must_use]
pub fn encode_flash(flash: &Flash) -> String {
    let json = serde_json::to_vec(flash).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decodes a cookie value written by [`encode_flash`].
#[must_use]
pub fn decode_flash(value: &str) -> Option<Flash> {
    let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Builds the HTTP response of an admin operation.
pub(super) fn respond(outcome: AdminResponse, request: &HeaderMap) -> Response {
    match outcome {
        AdminResponse::Ack(ack) => Json(ack).into_response(),
        AdminResponse::Redirect { target, flash } => {
            let location = target.path().unwrap_or_else(|| back(request));
            let cookie = format!("{FLASH_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", encode_flash(&flash));
            let mut response = (StatusCode::SEE_OTHER, Json(flash)).into_response();
            let headers = response.headers_mut();
            match HeaderValue::from_str(&location) {
                Ok(value) => {
                    headers.insert(header::LOCATION, value);
                }
                Err(_) => {
                    headers.insert(header::LOCATION, HeaderValue::from_static(FALLBACK_BACK));
                }
            }
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                headers.insert(header::SET_COOKIE, value);
            }
            response
        }
    }
}

/// Page the request came from, falling back to the members index.
///
/// Only a referer on this host is followed; the redirect is always a local path.
fn back(request: &HeaderMap) -> String {
    request
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|referer| local_path(referer, request.get(header::HOST)))
        .unwrap_or_else(|| FALLBACK_BACK.to_owned())
}

fn local_path(referer: &str, host: Option<&HeaderValue>) -> Option<String> {
    let uri: Uri = referer.parse().ok()?;
    match (uri.scheme_str(), uri.authority()) {
        (None, None) => {}
        (Some("http" | "https"), Some(authority)) => {
            let host = host?.to_str().ok()?;
            if !authority.as_str().eq_ignore_ascii_case(host) {
                return None;
            }
        }
        _ => return None,
    }
    let path = match uri.query() {
        Some(query) => format!("{}?{query}", uri.path()),
        None => uri.path().to_owned(),
    };
    (path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')).then_some(path)
}

impl AdminError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::MemberNotFound(_) | Self::LockerNotFound(_) | Self::PlanNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            _ if self.class() == ErrorClass::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.is_operational() {
            error!(error = %self, "request failed");
            GENERIC_FAILURE.to_owned()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
