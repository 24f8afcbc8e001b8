//! Integration tests for the admin HTTP router.
//!
//! Builds an [`App`] from TOML against an in-memory store and drives the
//! router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::NaiveDate;
use gym_admin::{
    admin::AlertType,
    app::App,
    clock::FixedClock,
    config::AppConfig,
    http::{FLASH_COOKIE, decode_flash},
    store::Store,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const ADMIN: &str = "admin-token";
const DESK: &str = "desk-token";

struct TestApp {
    router: Router,
    _storage: TempDir,
}

fn app() -> TestApp {
    let storage = tempfile::tempdir().unwrap();
    let root = storage.path().display().to_string().replace('\\', "/");
    let config = AppConfig::from_toml(&format!(
        r#"
        payment_gateways = ["Cash", "Stripe"]

        [server]
        public_base_url = "http://gym.test"

        [storage]
        root = "{root}"
        assets_root = "{root}"

        [organization]
        name = "Iron Temple"
        currency_symbol = "€"

        [lockers]
        count = 10

        [[plans]]
        id = "gold"
        name = "Gold"
        price = "100"
        offered = true
        duration = {{ count = 1, unit = "month" }}

        [[operators]]
        name = "manager"
        token = "{ADMIN}"
        permissions = ["*"]

        [[operators]]
        name = "front-desk"
        token = "{DESK}"
        permissions = ["member.list", "member.view", "locker.assign"]
        "#
    ))
    .unwrap();
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let app = App::with_store(config, Store::open_in_memory().unwrap(), Arc::new(FixedClock::on(today)))
        .unwrap();
    TestApp { router: app.router(), _storage: storage }
}

async fn send(router: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    router.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn register(router: &Router, name: &str) -> String {
    let response =
        send(router, "POST", "/admin/members", Some(ADMIN), Some(json!({ "name": name }))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response).to_owned();
    let id = target
        .strip_prefix("/admin/members/")
        .and_then(|rest| rest.strip_suffix("/edit"))
        .unwrap()
        .to_owned();
    let body = json_body(response).await;
    assert_eq!(body["message"], "Member Registered successfully");
    id
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = app();
    let response = send(&app.router, "GET", "/admin/members", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app.router, "GET", "/admin/members", Some("wrong"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_capability_is_forbidden() {
    let app = app();
    let response = send(
        &app.router,
        "POST",
        "/admin/members",
        Some(DESK),
        Some(json!({ "name": "Grace Hopper" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app.router, "GET", "/admin/members", Some(DESK), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["members"], json!([]));
}

#[tokio::test]
async fn test_create_form_lists_plans_and_lockers() {
    let app = app();
    let response = send(&app.router, "GET", "/admin/members/create", Some(ADMIN), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["member_id"].as_str().unwrap().starts_with("MEM-"));
    assert_eq!(body["lockers"].as_array().unwrap().len(), 10);
    assert_eq!(body["payment_gateways"], json!(["Cash", "Stripe"]));
    assert_eq!(body["plans"][0]["id"], "gold");
}

#[tokio::test]
async fn test_register_and_show_member() {
    let app = app();
    let id = register(&app.router, "Ada Lovelace").await;

    let response = send(&app.router, "GET", &format!("/admin/members/{id}"), Some(ADMIN), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["member"]["member_id"], id.as_str());
    assert_eq!(body["member"]["user"]["name"], "Ada Lovelace");
    assert_eq!(body["member"]["status"], "active");
    assert_eq!(body["subscriptions"], json!([]));

    let response =
        send(&app.router, "GET", &format!("/admin/members/{id}/edit"), Some(ADMIN), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_member_is_not_found() {
    let app = app();
    let response =
        send(&app.router, "GET", "/admin/members/MEM-000000", Some(ADMIN), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Member not found: MEM-000000");
}

#[tokio::test]
async fn test_assign_subscription_publishes_invoice() {
    let app = app();
    let id = register(&app.router, "Ada Lovelace").await;

    let request = Request::builder()
        .method("POST")
        .uri("/admin/subscriptions/assign")
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN}"))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::REFERER, format!("/admin/members/{id}"))
        .body(Body::from(
            json!({
                "member_id": id,
                "plan_id": "gold",
                "payment_method": "stripe",
                "payment_status": "paid",
                "transaction": "pi_123",
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/admin/members/{id}"));

    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_owned();
    let value = cookie
        .strip_prefix(&format!("{FLASH_COOKIE}="))
        .and_then(|rest| rest.split(';').next())
        .unwrap();
    let flash = decode_flash(value).unwrap();
    assert_eq!(flash.alert_type, AlertType::Success);
    assert_eq!(flash.message, "Subscription assigned and invoice generated.");

    let url = flash.invoice_url.unwrap();
    let path = url.strip_prefix("http://gym.test").unwrap();
    assert!(path.starts_with("/storage/invoices/invoice_"));

    let response = send(&app.router, "GET", path, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF-"));

    let response = send(&app.router, "GET", &format!("/admin/members/{id}"), Some(ADMIN), None).await;
    let body = json_body(response).await;
    let record = &body["member"]["current_subscription"];
    assert_eq!(record["start_date"], "2024-01-01");
    assert_eq!(record["end_date"], "2024-02-01");
    assert_eq!(record["payment_method"], "Stripe");
}

#[tokio::test]
async fn test_failed_assignment_redirects_to_index() {
    let app = app();
    let id = register(&app.router, "Ada Lovelace").await;
    let response = send(
        &app.router,
        "POST",
        "/admin/subscriptions/assign",
        Some(ADMIN),
        Some(json!({
            "member_id": id,
            "plan_id": "platinum",
            "payment_method": "cash",
            "payment_status": "paid",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/members");
    let body = json_body(response).await;
    assert_eq!(body["alert_type"], "error");
    assert_eq!(body["message"], "Subscription plan not found: platinum");
}

#[tokio::test]
async fn test_locker_requires_subscription() {
    let app = app();
    let id = register(&app.router, "Ada Lovelace").await;
    let response = send(
        &app.router,
        "POST",
        "/admin/lockers/assign",
        Some(DESK),
        Some(json!({ "member_id": id, "locker_no": 4 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Member has no subscription");

    let response = send(&app.router, "GET", "/admin/members/create", Some(ADMIN), None).await;
    let body = json_body(response).await;
    let free = body["lockers"].as_array().unwrap();
    assert!(free.iter().any(|locker| locker["number"] == 4));
}

#[tokio::test]
async fn test_change_status_acknowledges() {
    let app = app();
    let id = register(&app.router, "Ada Lovelace").await;

    let response = send(
        &app.router,
        "POST",
        "/admin/members/status",
        Some(ADMIN),
        Some(json!({ "id": id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body, json!({ "message": "Member Status changed successfully", "success": true }));

    let response = send(
        &app.router,
        "POST",
        "/admin/members/status",
        Some(ADMIN),
        Some(json!({ "id": "MEM-000000" })),
    )
    .await;
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_update_and_delete_member() {
    let app = app();
    let id = register(&app.router, "Ada Lovelace").await;

    let response = send(
        &app.router,
        "PUT",
        &format!("/admin/members/{id}"),
        Some(ADMIN),
        Some(json!({ "dob": "2023-12-01" })),
    )
    .await;
    let body = json_body(response).await;
    assert_eq!(body["message"], "The date must be a date before or equal to 2021-01-28");

    let response = send(
        &app.router,
        "PUT",
        &format!("/admin/members/{id}"),
        Some(ADMIN),
        Some(json!({ "name": "Ada King", "dob": "1990-12-10" })),
    )
    .await;
    assert_eq!(location(&response), "/admin/members");
    let body = json_body(response).await;
    assert_eq!(body["message"], "Member Updated successfully");

    let response =
        send(&app.router, "DELETE", &format!("/admin/members/{id}"), Some(ADMIN), None).await;
    let body = json_body(response).await;
    assert_eq!(body["message"], "Member Deleted successfully");

    let response = send(&app.router, "GET", &format!("/admin/members/{id}"), Some(ADMIN), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
