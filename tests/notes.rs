mod common;

use axum::http::StatusCode;
use common::{assert_error, body_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn notes_are_private() {
    let app = TestApp::new().await;

    let resp = app.get("/api/notes", None).await;
    assert_error(resp, StatusCode::UNAUTHORIZED).await;

    let resp = app.post_json("/api/notes", json!({"content": "hi"}), None).await;
    assert_error(resp, StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
async fn note_lifecycle() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let resp = app
        .post_json("/api/notes", json!({"content": "Try the new model"}), Some(&cookie))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let note = body_json(resp).await;
    let id = note["id"].as_str().unwrap().to_string();
    assert!(note["created_at"].as_str().unwrap().ends_with("+00:00"));

    let resp = app
        .put_json(&format!("/api/notes/{id}"), json!({"content": "Tried it"}), Some(&cookie))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["content"], "Tried it");

    let notes = body_json(app.get("/api/notes", Some(&cookie)).await).await;
    assert_eq!(notes.as_array().unwrap().len(), 1);

    let resp = app.delete(&format!("/api/notes/{id}"), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(app.count("notes").await, 0);
}

#[tokio::test]
async fn empty_note_is_rejected() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let resp = app.post_json("/api/notes", json!({"content": "   "}), Some(&cookie)).await;
    let message = assert_error(resp, StatusCode::BAD_REQUEST).await;
    assert_eq!(message, "Missing required field: content");
}

#[tokio::test]
async fn updating_missing_note_is_a_server_error() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let resp = app
        .put_json("/api/notes/gone", json!({"content": "x"}), Some(&cookie))
        .await;
    let message = assert_error(resp, StatusCode::INTERNAL_SERVER_ERROR).await;
    assert_eq!(message, "Note not found");
}
