use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Backup {
    pub id: String,
    /// JSON object keyed by table name, each holding that table's rows.
    pub data: String,
    /// JSON object keyed by table name, each holding a [`TableResult`].
    pub results: String,
    pub created_at: String,
}

/// Outcome of snapshotting a single table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableResult {
    pub success: bool,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TableResult {
    pub fn ok(count: usize) -> Self {
        Self {
            success: true,
            count,
            error: None,
        }
    }

    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            count: 0,
            error: Some(error.to_string()),
        }
    }
}
