use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tool {
    pub id: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub is_personal_tool: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A tool as served over the API, with its tag names attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolWithTags {
    #[serde(flatten)]
    pub tool: Tool,
    pub tags: Vec<String>,
}
