mod common;

use axum::http::StatusCode;
use common::{assert_error, body_string, test_config, TestApp};

#[tokio::test]
async fn login_page_renders() {
    let app = TestApp::new().await;
    let resp = app.get("/login", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Admin sign in"));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::new().await;
    let resp = app
        .request(
            axum::http::Request::builder()
                .uri("/login")
                .method("POST")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(axum::body::Body::from("password=nope"))
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let html = body_string(resp).await;
    assert!(html.contains("Invalid password"));
}

#[tokio::test]
async fn login_is_forbidden_without_configured_password() {
    let mut config = test_config();
    config.admin_password = None;
    let app = TestApp::with_config(config).await;

    let resp = app
        .request(
            axum::http::Request::builder()
                .uri("/login")
                .method("POST")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(axum::body::Body::from("password=anything"))
                .unwrap(),
        )
        .await;
    assert_error(resp, StatusCode::FORBIDDEN).await;
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let resp = app.get("/api/notes", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .request(
            axum::http::Request::builder()
                .uri("/logout")
                .method("POST")
                .header("cookie", &cookie)
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert!(resp.status().is_redirection());

    let resp = app.get("/api/notes", Some(&cookie)).await;
    assert_error(resp, StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
async fn health_check() {
    let app = TestApp::new().await;
    let resp = app.get("/health", None).await;
    assert_eq!(body_string(resp).await, "ok");
}
