//! Snapshots of every table into the `backups` table.

use serde::Serialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{Backup, MediaItem, Note, Prompt, TableResult};
use crate::routes::tools::fetch_tools;

#[derive(Debug, Clone, Serialize)]
pub struct TableResults {
    pub tools: TableResult,
    pub prompts: TableResult,
    pub media: TableResult,
    pub notes: TableResult,
}

impl TableResults {
    pub fn all_succeeded(&self) -> bool {
        [&self.tools, &self.prompts, &self.media, &self.notes]
            .iter()
            .all(|r| r.success)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    pub success: bool,
    #[serde(rename = "backupId")]
    pub backup_id: String,
    pub created_at: String,
    pub results: TableResults,
}

fn snapshot<T: Serialize>(
    name: &str,
    rows: Result<Vec<T>, sqlx::Error>,
) -> (Value, TableResult) {
    match rows {
        Ok(rows) => {
            let count = rows.len();
            match serde_json::to_value(rows) {
                Ok(value) => (value, TableResult::ok(count)),
                Err(e) => {
                    tracing::error!("Failed to serialize {name} for backup: {e}");
                    (Value::Null, TableResult::failed(e))
                }
            }
        }
        Err(e) => {
            tracing::error!("Failed to read {name} for backup: {e}");
            (Value::Null, TableResult::failed(e))
        }
    }
}

/// Read all tables concurrently and store them as one backup row.
///
/// A table that fails to read is recorded as failed; the others are still saved.
pub async fn run_backup(db: &SqlitePool) -> Result<BackupReport, sqlx::Error> {
    let (tools, prompts, media, notes) = tokio::join!(
        fetch_tools(db),
        sqlx::query_as::<_, Prompt>("SELECT * FROM prompts ORDER BY created_at").fetch_all(db),
        sqlx::query_as::<_, MediaItem>("SELECT * FROM media_items ORDER BY created_at").fetch_all(db),
        sqlx::query_as::<_, Note>("SELECT * FROM notes ORDER BY created_at").fetch_all(db),
    );

    let (tools_data, tools) = snapshot("tools", tools);
    let (prompts_data, prompts) = snapshot("prompts", prompts);
    let (media_data, media) = snapshot("media", media);
    let (notes_data, notes) = snapshot("notes", notes);

    let results = TableResults {
        tools,
        prompts,
        media,
        notes,
    };
    let data = json!({
        "tools": tools_data,
        "prompts": prompts_data,
        "media": media_data,
        "notes": notes_data,
    });

    let backup = Backup {
        id: Uuid::new_v4().to_string(),
        data: data.to_string(),
        results: serde_json::to_string(&results).unwrap_or_else(|_| "{}".to_string()),
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    sqlx::query("INSERT INTO backups (id, data, results, created_at) VALUES (?, ?, ?, ?)")
        .bind(&backup.id)
        .bind(&backup.data)
        .bind(&backup.results)
        .bind(&backup.created_at)
        .execute(db)
        .await?;

    tracing::info!(
        "Backup {} stored: tools={}, prompts={}, media={}, notes={}",
        backup.id,
        results.tools.count,
        results.prompts.count,
        results.media.count,
        results.notes.count
    );

    Ok(BackupReport {
        success: results.all_succeeded(),
        backup_id: backup.id,
        created_at: backup.created_at,
        results,
    })
}

pub async fn latest_backup(db: &SqlitePool) -> Result<Option<Backup>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM backups ORDER BY created_at DESC LIMIT 1")
        .fetch_optional(db)
        .await
}
