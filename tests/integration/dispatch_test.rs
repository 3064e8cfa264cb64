//! Integration tests for bulk dispatch and its SSE progress stream.

use std::sync::atomic::Ordering;

use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::helpers;

#[tokio::test]
async fn dispatch_is_admin_only() {
    let app = helpers::TestApp::new().await;
    let user = app.create_test_user("plainuser", "user").await;
    let token = app.create_session(user).await;

    let response = app
        .request(
            "POST",
            "/api/dispatch",
            Some(json!({ "item_ids": [Uuid::new_v4()] })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "FORBIDDEN");
    assert_eq!(response.body["message"], "Bulk dispatch is admin-only");
}

#[tokio::test]
async fn empty_batches_are_rejected() {
    let app = helpers::TestApp::new().await;
    let admin = app.create_test_user("sender", "admin").await;
    let token = app.create_session(admin).await;

    let response = app
        .request(
            "POST",
            "/api/dispatch",
            Some(json!({ "item_ids": [] })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
    assert!(
        response.body["message"]
            .as_str()
            .expect("message")
            .contains("item_ids"),
    );
}

#[tokio::test]
async fn oversized_batches_are_rejected() {
    let app = helpers::TestApp::new().await;
    let admin = app.create_test_user("bulksender", "admin").await;
    let token = app.create_session(admin).await;
    let item_ids: Vec<String> = (0..501).map(|_| Uuid::new_v4().to_string()).collect();

    let response = app
        .request(
            "POST",
            "/api/dispatch",
            Some(json!({ "item_ids": item_ids })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["message"],
        "A dispatch batch is limited to 500 items"
    );
}

#[tokio::test]
async fn dispatch_streams_one_event_per_item_and_audits_each_attempt() {
    let app = helpers::TestApp::new().await;
    let admin = app.create_test_user("campaign", "admin").await;
    let token = app.create_session(admin).await;
    let first = app
        .seed_signature(admin, "Alpha One", "alpha@example.test")
        .await;
    let second = app
        .seed_signature(admin, "Bravo Two", "not-an-email")
        .await;
    let third = app
        .seed_signature(admin, "Carla Three", "carla@example.test")
        .await;

    let raw = app
        .request_raw(
            "POST",
            "/api/dispatch",
            Some(json!({ "item_ids": [first.id, second.id, third.id] })),
            Some(&token),
        )
        .await;

    assert_eq!(raw.status, StatusCode::OK);
    assert_eq!(
        raw.headers.get("content-type").expect("content type"),
        "text/event-stream"
    );

    let events = helpers::sse_events(&raw.body);
    assert_eq!(events.len(), 4, "events: {events:?}");

    assert_eq!(events[0]["status"], "success");
    assert_eq!(events[0]["message"], "Sent to alpha@example.test");
    assert_eq!(events[0]["progress"]["current"], 1);
    assert_eq!(events[0]["progress"]["total"], 3);

    assert_eq!(events[1]["status"], "error");
    assert_eq!(events[1]["message"], "Invalid email address: not-an-email");
    assert_eq!(events[1]["progress"]["current"], 2);

    assert_eq!(events[2]["status"], "success");
    assert_eq!(events[2]["message"], "Sent to carla@example.test");
    assert_eq!(events[2]["progress"]["current"], 3);

    assert_eq!(events[3]["status"], "finished");
    assert_eq!(events[3]["summary"], "Dispatch finished: 2 sent, 1 failed");
    assert_eq!(events[3]["progress"]["current"], 3);
    assert_eq!(events[3]["progress"]["total"], 3);

    // Two valid items actually reached the relay.
    assert_eq!(app.relay_hits.load(Ordering::SeqCst), 2);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dispatch_log")
        .fetch_one(&app.db_pool)
        .await
        .expect("count log rows");
    assert_eq!(total, 3);
    let errors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dispatch_log WHERE status = 'error'")
        .fetch_one(&app.db_pool)
        .await
        .expect("count error rows");
    assert_eq!(errors, 1);
    let failed_recipient: String =
        sqlx::query_scalar("SELECT recipient FROM dispatch_log WHERE status = 'error'")
            .fetch_one(&app.db_pool)
            .await
            .expect("failed recipient");
    assert_eq!(failed_recipient, "not-an-email");
}

#[tokio::test]
async fn unknown_items_produce_events_but_no_audit_rows() {
    let app = helpers::TestApp::new().await;
    let admin = app.create_test_user("vanished", "admin").await;
    let token = app.create_session(admin).await;

    let raw = app
        .request_raw(
            "POST",
            "/api/dispatch",
            Some(json!({ "item_ids": [Uuid::new_v4()] })),
            Some(&token),
        )
        .await;

    assert_eq!(raw.status, StatusCode::OK);
    let events = helpers::sse_events(&raw.body);
    assert_eq!(events.len(), 2, "events: {events:?}");
    assert_eq!(events[0]["status"], "error");
    assert!(
        events[0]["message"]
            .as_str()
            .expect("message")
            .contains("not found"),
    );
    assert_eq!(events[1]["status"], "finished");
    assert_eq!(events[1]["summary"], "Dispatch finished: 0 sent, 1 failed");

    assert_eq!(app.relay_hits.load(Ordering::SeqCst), 0);
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dispatch_log")
        .fetch_one(&app.db_pool)
        .await
        .expect("count log rows");
    assert_eq!(total, 0);
}
