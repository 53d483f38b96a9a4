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
use crate::models::{Prompt, PromptType};
use crate::AppState;

#[derive(Deserialize)]
pub struct PromptInput {
    title: Option<String>,
    content: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

fn parse_type(kind: Option<String>) -> Result<PromptType, AppError> {
    required(kind, "type")?
        .parse()
        .map_err(AppError::BadRequest)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/prompts", get(list_prompts).post(create_prompt))
        .route("/api/prompts/{id}", put(update_prompt).delete(delete_prompt))
}

async fn fetch_prompt(db: &sqlx::SqlitePool, id: &str) -> Result<Option<Prompt>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM prompts WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

async fn list_prompts(State(state): State<AppState>) -> Result<Json<Vec<Prompt>>, AppError> {
    let prompts: Vec<Prompt> = sqlx::query_as("SELECT * FROM prompts ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(prompts))
}

async fn create_prompt(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiJson(input): ApiJson<PromptInput>,
) -> Result<impl IntoResponse, AppError> {
    let title = required(input.title, "title")?;
    let content = required(input.content, "content")?;
    let kind = parse_type(input.kind)?;

    let now = chrono::Utc::now().to_rfc3339();
    let prompt = Prompt {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        content,
        kind,
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO prompts (id, title, content, type, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&prompt.id)
    .bind(&prompt.title)
    .bind(&prompt.content)
    .bind(prompt.kind)
    .bind(&prompt.created_at)
    .bind(&prompt.updated_at)
    .execute(&state.db)
    .await?;

    tracing::info!("Created {} prompt {}", prompt.kind, prompt.id);
    Ok((StatusCode::CREATED, Json(prompt)))
}

async fn update_prompt(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<PromptInput>,
) -> Result<Json<Prompt>, AppError> {
    let Some(mut prompt) = fetch_prompt(&state.db, &id).await? else {
        return Err(AppError::RecordNotFound("Prompt"));
    };

    if let Some(title) = input.title {
        prompt.title = required(Some(title), "title")?;
    }
    if let Some(content) = input.content {
        prompt.content = required(Some(content), "content")?;
    }
    if input.kind.is_some() {
        prompt.kind = parse_type(input.kind)?;
    }
    prompt.updated_at = chrono::Utc::now().to_rfc3339();

    sqlx::query("UPDATE prompts SET title = ?, content = ?, type = ?, updated_at = ? WHERE id = ?")
        .bind(&prompt.title)
        .bind(&prompt.content)
        .bind(prompt.kind)
        .bind(&prompt.updated_at)
        .bind(&id)
        .execute(&state.db)
        .await?;

    Ok(Json(prompt))
}

async fn delete_prompt(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM prompts WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::RecordNotFound("Prompt"));
    }

    Ok(Json(json!({ "success": true })))
}
