use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::AdminUser;
use crate::error::AppError;
use crate::extract::{optional, require_http_url, required, ApiJson};
use crate::llm::{ToolPrompt, ToolSuggestion};
use crate::scrape::PageSummary;
use crate::AppState;

#[derive(Deserialize)]
pub struct UrlInput {
    url: Option<String>,
}

#[derive(Deserialize)]
pub struct DescribeInput {
    url: Option<String>,
    title: Option<String>,
    content: Option<String>,
}

/// LLM-drafted fields for a new tool. Never stored as-is; the curator edits and saves.
#[derive(Debug, Serialize)]
pub struct DraftTool {
    pub link: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl DraftTool {
    fn new(link: String, suggestion: ToolSuggestion) -> Self {
        Self {
            link,
            title: suggestion.title,
            description: suggestion.description,
            tags: suggestion.tags,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/fetch-webpage", post(fetch_webpage))
        .route("/api/generate-description", post(generate_description))
        .route("/api/fetch-and-describe", post(fetch_and_describe))
}

fn checked_url(url: Option<String>) -> Result<String, AppError> {
    let url = required(url, "url")?;
    require_http_url(&url)?;
    Ok(url)
}

async fn fetch_webpage(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiJson(input): ApiJson<UrlInput>,
) -> Result<Json<PageSummary>, AppError> {
    let url = checked_url(input.url)?;
    Ok(Json(state.fetcher.fetch_page(&url).await?))
}

/// Describe a tool from its URL alone, letting a browsing model do the research.
async fn generate_description(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiJson(input): ApiJson<DescribeInput>,
) -> Result<Json<DraftTool>, AppError> {
    let url = checked_url(input.url)?;
    let title = optional(input.title);
    let content = optional(input.content);
    let client = state.assistants.researcher()?;

    let prompt = ToolPrompt {
        url: &url,
        title: title.as_deref(),
        description: None,
        content: content.as_deref(),
    };
    let suggestion = client.describe_tool(&prompt).await?;
    tracing::info!("{} described {url} as {}", client.name(), suggestion.title);

    Ok(Json(DraftTool::new(url, suggestion)))
}

async fn fetch_and_describe(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiJson(input): ApiJson<UrlInput>,
) -> Result<Json<DraftTool>, AppError> {
    let url = checked_url(input.url)?;
    let client = state.assistants.openai()?;

    let page = state.fetcher.fetch_page(&url).await?;
    let mut suggestion = client.describe_tool(&ToolPrompt::from_page(&page)).await?;
    if suggestion.description.is_empty() {
        suggestion.description = page.description.unwrap_or_default();
    }

    Ok(Json(DraftTool::new(url, suggestion)))
}
