//! Route tests against the sample data backend.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use rentdesk_client::ReportBackend;
use rentdesk_core::reports::MockReportClient;
use rentdesk_shared::AppConfig;
use rstest::rstest;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{AppState, create_router};

fn state() -> AppState {
    let mut config = AppConfig::default();
    config.generator.tick_interval_ms = 5;
    config.generator.reset_delay_ms = 10;
    config.share.public_base_url = "https://app.rentdesk.test".to_string();
    AppState::new(&config, ReportBackend::Mock(MockReportClient::new())).unwrap()
}

fn january() -> Value {
    json!({ "propertyId": "p1", "startDate": "2024-01-01", "endDate": "2024-01-31" })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn generate(app: &Router, report_type: &str) -> (StatusCode, Value) {
    send_json(
        app,
        Method::POST,
        "/api/v1/reports/generate",
        Some(json!({ "reportType": report_type, "filters": january() })),
    )
    .await
}

#[tokio::test]
async fn test_health() {
    let app = create_router(state());
    let (status, body) = send_json(&app, Method::GET, "/api/v1/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["reportBackend"], "mock");
}

#[tokio::test]
async fn test_generate_commits_report() {
    let app = create_router(state());

    let (status, body) = generate(&app, "financial").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "committed");
    assert_eq!(body["report"]["reportType"], "financial");
    assert_eq!(body["report"]["incomeBreakdown"][0]["propertyId"], "p1");

    let (_, snapshot) = send_json(&app, Method::GET, "/api/v1/reports", None).await;
    assert_eq!(snapshot["lastGeneratedReport"], "financial");
    assert_eq!(snapshot["reportHistory"].as_array().unwrap().len(), 1);
    assert_eq!(snapshot["isLoading"], false);
}

#[tokio::test]
async fn test_generate_body_carries_cached_report_with_short_history() {
    let mut config = AppConfig::default();
    config.store.history_capacity = 1;
    config.share.public_base_url = "https://app.rentdesk.test".to_string();
    let app = create_router(
        AppState::new(&config, ReportBackend::Mock(MockReportClient::new())).unwrap(),
    );

    generate(&app, "financial").await;
    let (status, body) = generate(&app, "occupancy").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["report"]["reportType"], "occupancy");

    let (_, snapshot) = send_json(&app, Method::GET, "/api/v1/reports", None).await;
    assert_eq!(
        body["report"]["summary"],
        snapshot["occupancyReport"]["summary"]
    );
    assert_eq!(snapshot["reportHistory"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_generate_rejects_missing_dates() {
    let app = create_router(state());

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/reports/generate",
        Some(json!({ "reportType": "occupancy" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "Start date is required");
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);

    let (_, snapshot) = send_json(&app, Method::GET, "/api/v1/reports", None).await;
    assert!(snapshot["reportHistory"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_preview_echoes_selection() {
    let app = create_router(state());

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/reports/preview",
        Some(json!({ "reportType": "maintenance", "filters": january() })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reportType"], "maintenance");
    assert_eq!(body["filters"]["propertyId"], "p1");

    let (_, snapshot) = send_json(&app, Method::GET, "/api/v1/reports", None).await;
    assert!(snapshot["maintenanceReport"].is_null());
}

#[tokio::test]
async fn test_generator_status() {
    let app = create_router(state());
    generate(&app, "occupancy").await;

    let (status, body) = send_json(&app, Method::GET, "/api/v1/reports/generator", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "idle");
    assert_eq!(body["form"]["reportType"], "occupancy");
    assert_eq!(body["isGenerating"], false);
}

#[tokio::test]
async fn test_clear_reports_keeps_history() {
    let app = create_router(state());
    generate(&app, "financial").await;

    let (status, _) = send(&app, Method::DELETE, "/api/v1/reports", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, snapshot) = send_json(&app, Method::GET, "/api/v1/reports", None).await;
    assert!(snapshot["financialReport"].is_null());
    assert!(snapshot["lastGeneratedReport"].is_null());
    assert_eq!(snapshot["reportHistory"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_history_filters_by_type() {
    let app = create_router(state());
    generate(&app, "financial").await;
    generate(&app, "occupancy").await;
    generate(&app, "financial").await;

    let (status, body) = send_json(
        &app,
        Method::GET,
        "/api/v1/reports/history?reportType=financial&page=1&perPage=1",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["type"], "financial");
    assert_eq!(body["meta"]["total"], 2);
}

#[rstest]
#[case("/api/v1/reports/history?reportType=tax")]
#[case("/api/v1/reports/tax/view")]
#[tokio::test]
async fn test_unknown_report_type(#[case] uri: &str) {
    let app = create_router(state());
    let (status, body) = send_json(&app, Method::GET, uri, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_view_before_and_after_generation() {
    let app = create_router(state());

    let (_, body) = send_json(&app, Method::GET, "/api/v1/reports/maintenance/view", None).await;
    assert_eq!(body["state"], "empty");

    generate(&app, "maintenance").await;
    let (_, body) = send_json(&app, Method::GET, "/api/v1/reports/maintenance/view", None).await;
    assert_eq!(body["state"], "breakdown");
    assert_eq!(body["title"], "Maintenance Report");
}

#[tokio::test]
async fn test_export_csv_download() {
    let app = create_router(state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/reports/occupancy/export?format=csv&startDate=2024-01-01&endDate=2024-01-31")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"occupancy-report-"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).starts_with("Occupancy Report"));
}

#[tokio::test]
async fn test_export_json_without_report_is_not_found() {
    let app = create_router(state());
    let (status, body) = send_json(
        &app,
        Method::GET,
        "/api/v1/reports/financial/export?format=json",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not found: No financial report has been generated");
}

#[tokio::test]
async fn test_share_link() {
    let app = create_router(state());
    let (status, body) = send_json(
        &app,
        Method::GET,
        "/api/v1/reports/financial/share?method=link&propertyId=p2",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "copyToClipboard");
    assert_eq!(
        body["url"],
        "https://app.rentdesk.test/reports/financial?propertyId=p2"
    );
}

#[tokio::test]
async fn test_print_returns_html() {
    let app = create_router(state());
    generate(&app, "occupancy").await;

    let (status, body) = send(&app, Method::GET, "/api/v1/reports/occupancy/print", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("<h1>Occupancy Report</h1>"));
}

#[tokio::test]
async fn test_schedule_lifecycle() {
    let app = create_router(state());

    let (status, created) = send_json(
        &app,
        Method::POST,
        "/api/v1/scheduled-reports",
        Some(json!({
            "name": "Weekly Occ",
            "reportType": "occupancy",
            "frequency": "weekly",
            "email": "a@b.com",
            "isActive": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["nextRun"].is_string());
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = send_json(
        &app,
        Method::PATCH,
        &format!("/api/v1/scheduled-reports/{id}"),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["isActive"], false);
    assert!(updated["nextRun"].is_null());

    let (_, list) = send_json(&app, Method::GET, "/api/v1/scheduled-reports", None).await;
    assert_eq!(list["meta"]["total"], 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/scheduled-reports/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) =
        send_json(&app, Method::DELETE, &format!("/api/v1/scheduled-reports/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");

    let (status, body) = send_json(
        &app,
        Method::PATCH,
        &format!("/api/v1/scheduled-reports/{id}"),
        Some(json!({ "isActive": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("Not found: Scheduled report not found: {id}"));
}

#[tokio::test]
async fn test_invalid_schedule_is_rejected() {
    let app = create_router(state());
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/scheduled-reports",
        Some(json!({
            "name": "Monthly",
            "reportType": "financial",
            "frequency": "monthly",
            "email": "nope"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation error: A valid email address is required");
}
