//! Meilisearch index for the Tools collection.

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::MeiliConfig;
use crate::error::AppError;
use crate::models::ToolWithTags;

pub const SEARCH_LIMIT: usize = 50;

/// The shape of a tool inside the search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDocument {
    pub id: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub tags: Vec<String>,
    pub is_personal_tool: bool,
}

impl From<&ToolWithTags> for ToolDocument {
    fn from(t: &ToolWithTags) -> Self {
        Self {
            id: t.tool.id.clone(),
            title: t.tool.title.clone(),
            link: t.tool.link.clone(),
            description: t.tool.description.clone(),
            tags: t.tags.clone(),
            is_personal_tool: t.tool.is_personal_tool,
        }
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    limit: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: Vec<ToolDocument>,
}

#[derive(Clone)]
pub struct SearchIndex {
    client: Client,
    config: MeiliConfig,
}

impl SearchIndex {
    pub fn new(config: MeiliConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        tracing::info!("Using Meilisearch at {} (index {})", config.url, config.index);
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/indexes/{}{}",
            self.config.url.trim_end_matches('/'),
            self.config.index,
            path
        )
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, AppError> {
        let resp = self
            .authorized(req)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Search request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Search index returned {status}: {body}"
            )));
        }
        Ok(resp)
    }

    /// Add or replace documents. Meilisearch applies the write asynchronously.
    pub async fn upsert(&self, documents: &[ToolDocument]) -> Result<(), AppError> {
        if documents.is_empty() {
            return Ok(());
        }
        let req = self
            .client
            .post(self.endpoint("/documents?primaryKey=id"))
            .json(documents);
        self.send(req).await?;
        tracing::debug!("Queued {} tool document(s) for indexing", documents.len());
        Ok(())
    }

    pub async fn remove(&self, id: &str) -> Result<(), AppError> {
        let req = self.client.delete(self.endpoint(&format!("/documents/{id}")));
        self.send(req).await?;
        Ok(())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<ToolDocument>, AppError> {
        let req = self.client.post(self.endpoint("/search")).json(&SearchRequest {
            q: query,
            limit: SEARCH_LIMIT,
        });
        let resp: SearchResponse = self
            .send(req)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid search response: {e}")))?;
        Ok(resp.hits)
    }
}

/// Push a tool to the index if one is configured. Failures are logged, not returned.
pub async fn sync_tool(index: Option<&SearchIndex>, tool: &ToolWithTags) {
    let Some(index) = index else { return };
    if let Err(e) = index.upsert(&[ToolDocument::from(tool)]).await {
        tracing::warn!("Failed to index tool {}: {e}", tool.tool.id);
    }
}

pub async fn unsync_tool(index: Option<&SearchIndex>, id: &str) {
    let Some(index) = index else { return };
    if let Err(e) = index.remove(id).await {
        tracing::warn!("Failed to remove tool {id} from index: {e}");
    }
}
