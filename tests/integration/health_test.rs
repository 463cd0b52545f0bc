//! Health endpoint and request-id plumbing tests.

use http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn liveness_reports_ok_without_auth() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["status"], "ok");
    assert!(response.body["data"]["version"].is_string());
}

#[tokio::test]
async fn detailed_health_reports_each_dependency() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/health/detailed", None, None).await;

    // Status depends on whether a database is reachable; the payload
    // shape does not.
    assert!(
        response.status == StatusCode::OK || response.status == StatusCode::SERVICE_UNAVAILABLE,
        "Unexpected status {}",
        response.status
    );
    let data = &response.body["data"];
    assert!(data["database"].is_string());
    assert_eq!(data["cache"], "ok");
    assert_eq!(data["socketSessions"], 0);
    assert!(data["delivery"]["dispatched"].is_number());
}

#[tokio::test]
async fn request_id_is_minted_and_echoed() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;

    let header_id = response
        .headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .expect("No x-request-id header");
    assert_eq!(response.body["requestId"], header_id);
}

#[tokio::test]
async fn inbound_request_id_is_propagated() {
    let app = TestApp::new().await;

    let response = app
        .request_with_headers(
            "GET",
            "/api/health",
            None,
            &[("x-request-id", "trace-me-123")],
        )
        .await;

    assert_eq!(response.body["requestId"], "trace-me-123");
    assert_eq!(
        response
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("trace-me-123")
    );
}
