//! Integration tests for per-signature endpoints.

use http::StatusCode;
use uuid::Uuid;

use crate::helpers;

#[tokio::test]
async fn count_reports_own_signatures() {
    let app = helpers::TestApp::new().await;
    let user = app.create_test_user("counter", "user").await;
    let token = app.create_session(user).await;
    app.seed_signature(user, "One", "one@example.test").await;
    app.seed_signature(user, "Two", "two@example.test").await;

    let response = app
        .request(
            "GET",
            &format!("/api/signatures/count?user_id={user}"),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["count"], 2);
    assert_eq!(response.body["data"]["user_id"], user.to_string());
}

#[tokio::test]
async fn count_is_scoped_to_the_caller() {
    let app = helpers::TestApp::new().await;
    let owner = app.create_test_user("countowner", "user").await;
    let rival = app.create_test_user("countrival", "user").await;
    let admin = app.create_test_user("countboss", "admin").await;
    app.seed_signature(owner, "Private", "private@example.test")
        .await;

    let rival_token = app.create_session(rival).await;
    let response = app
        .request(
            "GET",
            &format!("/api/signatures/count?user_id={owner}"),
            None,
            Some(&rival_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let admin_token = app.create_session(admin).await;
    let response = app
        .request(
            "GET",
            &format!("/api/signatures/count?user_id={owner}"),
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["count"], 1);
}

#[tokio::test]
async fn single_downloads_render_escaped_html() {
    let app = helpers::TestApp::new().await;
    let user = app.create_test_user("renderer", "user").await;
    let token = app.create_session(user).await;
    let signature = app
        .seed_signature(user, "Jane & Co <QA>", "jane@example.test")
        .await;

    let raw = app
        .request_raw(
            "GET",
            &format!("/api/signatures/{}/download", signature.id),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(raw.status, StatusCode::OK);
    assert_eq!(
        raw.headers.get("content-type").expect("content type"),
        "text/html; charset=utf-8"
    );
    assert_eq!(
        raw.headers.get("content-disposition").expect("disposition"),
        "attachment; filename=\"signature_jane_co_qa.html\""
    );

    let html = String::from_utf8(raw.body.to_vec()).expect("utf-8 html");
    assert!(html.contains("Jane &amp; Co &lt;QA&gt;"));
    assert!(!html.contains("<QA>"));
    assert!(html.contains("mailto:jane@example.test"));
    // The tel: link uses the digits-only phone form.
    assert!(html.contains("tel:+15550104477"));
    assert!(html.contains("+1 (555) 010-4477"));
    assert!(!html.contains("{{NAME}}"));
}

#[tokio::test]
async fn missing_signatures_are_not_found() {
    let app = helpers::TestApp::new().await;
    let user = app.create_test_user("seeker", "user").await;
    let token = app.create_session(user).await;

    let response = app
        .request(
            "GET",
            &format!("/api/signatures/{}/download", Uuid::new_v4()),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn downloads_are_denied_across_users() {
    let app = helpers::TestApp::new().await;
    let owner = app.create_test_user("sigowner", "user").await;
    let rival = app.create_test_user("sigrival", "user").await;
    let signature = app
        .seed_signature(owner, "Guarded", "guarded@example.test")
        .await;
    let rival_token = app.create_session(rival).await;

    let response = app
        .request(
            "GET",
            &format!("/api/signatures/{}/download", signature.id),
            None,
            Some(&rival_token),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}
