//! Integration tests for session authentication.

use axum::body::Body;
use http::{Request, StatusCode};
use tower::ServiceExt;
use uuid::Uuid;

use signet_auth::token;

use crate::helpers;

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "GET",
            &format!("/api/signatures/count?user_id={}", Uuid::new_v4()),
            None,
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "UNAUTHORIZED");
    assert_eq!(response.body["message"], "Missing Authorization header");
}

#[tokio::test]
async fn malformed_tokens_are_rejected() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "GET",
            &format!("/api/signatures/count?user_id={}", Uuid::new_v4()),
            None,
            Some("not-a-token"),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Invalid session token");
}

#[tokio::test]
async fn well_formed_unknown_tokens_are_rejected() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "GET",
            &format!("/api/signatures/count?user_id={}", Uuid::new_v4()),
            None,
            Some(&token::mint()),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_sessions_are_rejected() {
    let app = helpers::TestApp::new().await;
    let user = app.create_test_user("sleeper", "user").await;
    let token = app.create_expired_session(user).await;

    let response = app
        .request(
            "GET",
            &format!("/api/signatures/count?user_id={user}"),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Session expired");
}

#[tokio::test]
async fn disabled_accounts_are_rejected() {
    let app = helpers::TestApp::new().await;
    let user = app.create_test_user("ghost", "user").await;
    let token = app.create_session(user).await;

    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(user)
        .execute(&app.db_pool)
        .await
        .expect("deactivate user");

    let response = app
        .request(
            "GET",
            &format!("/api/signatures/count?user_id={user}"),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Account is disabled");
}

#[tokio::test]
async fn non_bearer_authorization_is_rejected() {
    let app = helpers::TestApp::new().await;

    let req = Request::builder()
        .method("GET")
        .uri("/api/admin/dispatch-log")
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .expect("build request");
    let response = app.router.clone().oneshot(req).await.expect("send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["database"], "connected");
}
