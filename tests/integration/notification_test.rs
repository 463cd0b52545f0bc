//! Notification API flow tests.

use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::helpers::{TEST_API_KEY, TEST_PRODUCER, TestApp};

#[tokio::test]
async fn create_requires_bearer_token() {
    let app = TestApp::new().await;

    let body = json!({ "title": "T", "message": "M", "type": "message" });
    let response = app
        .request("POST", "/api/notifications", Some(body), None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["code"], "UNAUTHORIZED");
    assert!(response.body["requestId"].is_string());
}

#[tokio::test]
async fn create_and_fetch_roundtrip() {
    let app = TestApp::new().await;
    let recipient = Uuid::new_v4();
    let token = app.token_for(recipient);

    let id = app.create_notification(&token, "Welcome").await;
    assert_eq!(app.store.get(id).title, "Welcome");

    let response = app
        .request("GET", &format!("/api/notifications/{id}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["title"], "Welcome");
    assert_eq!(response.body["data"]["message"], "body");
    assert_eq!(response.body["data"]["type"], "message");
    assert_eq!(response.body["data"]["read"], false);
    assert_eq!(
        response.body["data"]["recipientId"],
        recipient.to_string().as_str()
    );
}

#[tokio::test]
async fn idempotency_key_replay_returns_original() {
    let app = TestApp::new().await;
    let token = app.token_for(Uuid::new_v4());

    let body = json!({
        "title": "Once",
        "message": "M",
        "type": "like",
        "channels": ["inapp"],
        "idempotencyKey": "evt-42",
    });

    let first = app
        .request("POST", "/api/notifications", Some(body.clone()), Some(&token))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app
        .request("POST", "/api/notifications", Some(body), Some(&token))
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["data"]["id"], first.body["data"]["id"]);
}

#[tokio::test]
async fn idempotency_key_with_mismatched_payload_conflicts() {
    let app = TestApp::new().await;
    let token = app.token_for(Uuid::new_v4());

    let first = json!({
        "title": "Original",
        "message": "M",
        "type": "like",
        "channels": ["inapp"],
        "idempotencyKey": "evt-43",
    });
    let response = app
        .request("POST", "/api/notifications", Some(first), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let mismatched = json!({
        "title": "Different",
        "message": "M",
        "type": "like",
        "channels": ["inapp"],
        "idempotencyKey": "evt-43",
    });
    let response = app
        .request("POST", "/api/notifications", Some(mismatched), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["code"], "CONFLICT");
}

#[tokio::test]
async fn unknown_type_is_a_validation_error() {
    let app = TestApp::new().await;
    let token = app.token_for(Uuid::new_v4());

    let body = json!({ "title": "T", "message": "M", "type": "carrier-pigeon" });
    let response = app
        .request("POST", "/api/notifications", Some(body), Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn list_paginates_and_reports_totals() {
    let app = TestApp::new().await;
    let token = app.token_for(Uuid::new_v4());

    for i in 0..3 {
        app.create_notification(&token, &format!("N{i}")).await;
    }

    let response = app
        .request("GET", "/api/notifications?limit=2", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let data = &response.body["data"];
    assert_eq!(data["notifications"].as_array().unwrap().len(), 2);
    assert_eq!(data["pagination"]["total"], 3);
    assert_eq!(data["pagination"]["limit"], 2);
    assert_eq!(data["pagination"]["hasMore"], true);
}

#[tokio::test]
async fn unread_count_tracks_read_mutations() {
    let app = TestApp::new().await;
    let token = app.token_for(Uuid::new_v4());

    let id = app.create_notification(&token, "A").await;
    app.create_notification(&token, "B").await;

    let response = app
        .request("GET", "/api/notifications/unread-count", None, Some(&token))
        .await;
    assert_eq!(response.body["data"]["count"], 2);

    let response = app
        .request(
            "PATCH",
            &format!("/api/notifications/{id}/read"),
            Some(json!({ "read": true })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["read"], true);

    let response = app
        .request("GET", "/api/notifications/unread-count", None, Some(&token))
        .await;
    assert_eq!(response.body["data"]["count"], 1);
}

#[tokio::test]
async fn mark_read_can_be_reverted() {
    let app = TestApp::new().await;
    let token = app.token_for(Uuid::new_v4());
    let id = app.create_notification(&token, "A").await;

    let path = format!("/api/notifications/{id}/read");
    app.request("PATCH", &path, Some(json!({ "read": true })), Some(&token))
        .await;
    let response = app
        .request("PATCH", &path, Some(json!({ "read": false })), Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["read"], false);
    assert!(response.body["data"]["readAt"].is_null());
}

#[tokio::test]
async fn mark_all_read_reports_updated_rows() {
    let app = TestApp::new().await;
    let token = app.token_for(Uuid::new_v4());

    app.create_notification(&token, "A").await;
    app.create_notification(&token, "B").await;

    let response = app
        .request(
            "PATCH",
            "/api/notifications/mark-all-read",
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["updated"], 2);

    let response = app
        .request("GET", "/api/notifications/unread-count", None, Some(&token))
        .await;
    assert_eq!(response.body["data"]["count"], 0);
}

#[tokio::test]
async fn grouped_summary_counts_by_type() {
    let app = TestApp::new().await;
    let token = app.token_for(Uuid::new_v4());

    app.create_notification(&token, "A").await;
    app.create_notification(&token, "B").await;
    let like = json!({ "title": "L", "message": "M", "type": "like", "channels": ["inapp"] });
    app.request("POST", "/api/notifications", Some(like), Some(&token))
        .await;

    let response = app
        .request("GET", "/api/notifications/grouped", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let groups = response.body["data"]["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    let message_group = groups
        .iter()
        .find(|g| g["type"] == "message")
        .expect("No message group");
    assert_eq!(message_group["count"], 2);
    assert_eq!(message_group["unreadCount"], 2);
    assert_eq!(message_group["latest"]["title"], "B");
}

#[tokio::test]
async fn another_users_notification_is_indistinguishable_from_absent() {
    let app = TestApp::new().await;
    let owner_token = app.token_for(Uuid::new_v4());
    let id = app.create_notification(&owner_token, "Private").await;

    let other_token = app.token_for(Uuid::new_v4());
    let response = app
        .request(
            "GET",
            &format!("/api/notifications/{id}"),
            None,
            Some(&other_token),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn delete_removes_the_record() {
    let app = TestApp::new().await;
    let token = app.token_for(Uuid::new_v4());
    let id = app.create_notification(&token, "Gone").await;

    let path = format!("/api/notifications/{id}");
    let response = app.request("DELETE", &path, None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", &path, None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_by_type_only_returns_that_type() {
    let app = TestApp::new().await;
    let token = app.token_for(Uuid::new_v4());

    app.create_notification(&token, "Msg").await;
    let like = json!({ "title": "L", "message": "M", "type": "like", "channels": ["inapp"] });
    app.request("POST", "/api/notifications", Some(like), Some(&token))
        .await;

    let response = app
        .request("GET", "/api/notifications/types/like", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let items = response.body["data"]["notifications"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["type"], "like");
}

#[tokio::test]
async fn system_create_targets_the_named_user() {
    let app = TestApp::new().await;
    let recipient = Uuid::new_v4();

    let body = json!({
        "userId": recipient,
        "title": "Match found",
        "message": "M",
        "type": "match",
        "channels": ["inapp"],
    });
    let response = app
        .request_with_headers(
            "POST",
            "/api/system/notifications",
            Some(body),
            &[("x-api-key", TEST_API_KEY)],
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(
        response.body["data"]["recipientId"],
        recipient.to_string().as_str()
    );
    assert_eq!(response.body["data"]["producer"], TEST_PRODUCER);
}

#[tokio::test]
async fn system_create_rejects_unknown_api_key() {
    let app = TestApp::new().await;

    let body = json!({
        "userId": Uuid::new_v4(),
        "title": "T",
        "message": "M",
        "type": "match",
    });
    let response = app
        .request_with_headers(
            "POST",
            "/api/system/notifications",
            Some(body),
            &[("x-api-key", "mk_wrong")],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn rate_limit_returns_retry_hint() {
    let mut config = crate::helpers::test_config();
    config.server.rate_limit_burst = 2;
    config.server.rate_limit_per_second = 0.5;
    let app = TestApp::with_config(config).await;

    for _ in 0..2 {
        let response = app.request("GET", "/api/health", None, None).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.body["code"], "RATE_LIMITED");
    assert_eq!(response.body["retryAfter"], 2);
}
