use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::AdminUser;
use crate::error::AppError;
use crate::extract::{optional, require_http_url, required, ApiJson};
use crate::models::media::{detect_media, youtube_embed_html, DetectedMedia};
use crate::models::{MediaItem, MediaType};
use crate::scrape::PageSummary;
use crate::AppState;

#[derive(Deserialize)]
pub struct MediaInput {
    url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    comment: Option<String>,
}

#[derive(Deserialize)]
pub struct UrlInput {
    url: Option<String>,
}

#[derive(Deserialize)]
pub struct SummarizeInput {
    url: Option<String>,
    title: Option<String>,
    content: Option<String>,
}

/// Metadata gathered for a URL before the curator saves it.
#[derive(Debug, Serialize)]
pub struct ProcessedMedia {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: MediaType,
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    #[serde(rename = "embedHtml")]
    pub embed_html: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/media", get(list_media).post(create_media))
        .route("/api/media/process", post(process_media))
        .route("/api/media/summarize", post(summarize_media))
        .route("/api/media/{id}", put(update_media).delete(delete_media))
}

fn parse_type(kind: Option<String>) -> Result<Option<MediaType>, AppError> {
    optional(kind)
        .map(|k| k.parse().map_err(AppError::BadRequest))
        .transpose()
}

/// Type and YouTube fields for a URL, honoring an explicit type override.
fn classify(url: &str, explicit: Option<MediaType>) -> DetectedMedia {
    let detected = detect_media(url);
    match explicit {
        Some(kind) if kind != MediaType::Youtube => DetectedMedia {
            kind,
            video_id: None,
        },
        Some(kind) => DetectedMedia {
            kind,
            video_id: detected.video_id,
        },
        None => detected,
    }
}

async fn fetch_media(db: &sqlx::SqlitePool, id: &str) -> Result<Option<MediaItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM media_items WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

async fn list_media(State(state): State<AppState>) -> Result<Json<Vec<MediaItem>>, AppError> {
    let items: Vec<MediaItem> = sqlx::query_as("SELECT * FROM media_items ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(items))
}

async fn create_media(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiJson(input): ApiJson<MediaInput>,
) -> Result<impl IntoResponse, AppError> {
    let url = required(input.url, "url")?;
    require_http_url(&url)?;
    let detected = classify(&url, parse_type(input.kind)?);

    let title = match optional(input.title) {
        Some(title) => title,
        None => detected
            .kind
            .default_title()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("Missing required field: title".to_string()))?,
    };

    let now = chrono::Utc::now().to_rfc3339();
    let item = MediaItem {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        embed_html: detected.embed_html(),
        url,
        description: optional(input.description),
        kind: detected.kind,
        video_id: detected.video_id,
        comment: optional(input.comment),
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO media_items (id, title, url, description, type, embed_html, video_id, comment, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.title)
    .bind(&item.url)
    .bind(&item.description)
    .bind(item.kind)
    .bind(&item.embed_html)
    .bind(&item.video_id)
    .bind(&item.comment)
    .bind(&item.created_at)
    .bind(&item.updated_at)
    .execute(&state.db)
    .await?;

    tracing::info!("Saved {} {}", item.kind, item.url);
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_media(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<MediaInput>,
) -> Result<Json<MediaItem>, AppError> {
    let Some(mut item) = fetch_media(&state.db, &id).await? else {
        return Err(AppError::RecordNotFound("Media item"));
    };

    let explicit = parse_type(input.kind)?;
    let url_changed = match input.url {
        Some(url) => {
            let url = required(Some(url), "url")?;
            require_http_url(&url)?;
            let changed = url != item.url;
            item.url = url;
            changed
        }
        None => false,
    };

    if url_changed || explicit.is_some() {
        let detected = classify(&item.url, explicit);
        item.kind = detected.kind;
        item.video_id = detected.video_id;
        item.embed_html = item.video_id.as_deref().map(youtube_embed_html);
    }

    if let Some(title) = input.title {
        item.title = required(Some(title), "title")?;
    }
    if input.description.is_some() {
        item.description = optional(input.description);
    }
    if input.comment.is_some() {
        item.comment = optional(input.comment);
    }
    item.updated_at = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE media_items
        SET title = ?, url = ?, description = ?, type = ?, embed_html = ?, video_id = ?, comment = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&item.title)
    .bind(&item.url)
    .bind(&item.description)
    .bind(item.kind)
    .bind(&item.embed_html)
    .bind(&item.video_id)
    .bind(&item.comment)
    .bind(&item.updated_at)
    .bind(&id)
    .execute(&state.db)
    .await?;

    Ok(Json(item))
}

async fn delete_media(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM media_items WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::RecordNotFound("Media item"));
    }

    Ok(Json(json!({ "success": true })))
}

/// Detect the media type and pull page metadata without saving anything.
async fn process_media(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiJson(input): ApiJson<UrlInput>,
) -> Result<Json<ProcessedMedia>, AppError> {
    let url = required(input.url, "url")?;
    require_http_url(&url)?;
    let detected = detect_media(&url);

    // Tweets render client-side and X serves no useful metadata to bots
    let (title, description) = match detected.kind {
        MediaType::Tweet => (None, None),
        _ => match state.fetcher.fetch_page(&url).await {
            Ok(page) => (page.title, page.description),
            Err(e) => {
                tracing::warn!("Metadata fetch for {url} failed: {e}");
                (None, None)
            }
        },
    };

    Ok(Json(ProcessedMedia {
        title: title.or_else(|| detected.kind.default_title().map(str::to_string)),
        description,
        kind: detected.kind,
        embed_html: detected.embed_html(),
        video_id: detected.video_id,
        url,
    }))
}

async fn summarize_media(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiJson(input): ApiJson<SummarizeInput>,
) -> Result<impl IntoResponse, AppError> {
    let client = state.assistants.openai()?;

    let page = match (optional(input.content), optional(input.url)) {
        (Some(content), url) => PageSummary {
            url: url.unwrap_or_default(),
            title: optional(input.title),
            description: None,
            content,
        },
        (None, Some(url)) => {
            require_http_url(&url)?;
            state.fetcher.fetch_page(&url).await?
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "Missing required field: url or content".to_string(),
            ))
        }
    };

    let summary = client.summarize(&page).await?;
    Ok(Json(json!({ "summary": summary })))
}
