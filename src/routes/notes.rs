use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AdminUser;
use crate::error::AppError;
use crate::extract::{required, ApiJson};
use crate::models::Note;
use crate::AppState;

#[derive(Deserialize)]
pub struct NoteInput {
    content: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/notes/{id}", put(update_note).delete(delete_note))
}

pub async fn fetch_notes(db: &sqlx::SqlitePool) -> Result<Vec<Note>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM notes ORDER BY created_at DESC")
        .fetch_all(db)
        .await
}

async fn list_notes(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<Note>>, AppError> {
    Ok(Json(fetch_notes(&state.db).await?))
}

async fn create_note(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiJson(input): ApiJson<NoteInput>,
) -> Result<impl IntoResponse, AppError> {
    let content = required(input.content, "content")?;
    let now = chrono::Utc::now().to_rfc3339();
    let note = Note {
        id: uuid::Uuid::new_v4().to_string(),
        content,
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query("INSERT INTO notes (id, content, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(&note.id)
        .bind(&note.content)
        .bind(&note.created_at)
        .bind(&note.updated_at)
        .execute(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

async fn update_note(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NoteInput>,
) -> Result<Json<Note>, AppError> {
    let content = required(input.content, "content")?;
    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query("UPDATE notes SET content = ?, updated_at = ? WHERE id = ?")
        .bind(&content)
        .bind(&now)
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::RecordNotFound("Note"));
    }

    let note: Note = sqlx::query_as("SELECT * FROM notes WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;
    Ok(Json(note))
}

async fn delete_note(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM notes WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::RecordNotFound("Note"));
    }

    Ok(Json(json!({ "success": true })))
}
