use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{HashMap, HashSet};

use crate::auth::AdminUser;
use crate::error::AppError;
use crate::extract::{optional, require_http_url, required, ApiJson};
use crate::models::tag::deserialize_tags;
use crate::models::{Tool, ToolWithTags};
use crate::search::{sync_tool, unsync_tool, ToolDocument};
use crate::AppState;

#[derive(Deserialize)]
pub struct ToolInput {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    tags: Option<Vec<String>>,
    #[serde(alias = "isPersonalTool")]
    is_personal_tool: Option<bool>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tools", get(list_tools).post(create_tool))
        .route("/api/tools/search", get(search_tools))
        .route("/api/tools/reindex", post(reindex_tools))
        .route("/api/tools/{id}", put(update_tool).delete(delete_tool))
}

fn attach_tags(tools: Vec<Tool>, pairs: Vec<(String, String)>) -> Vec<ToolWithTags> {
    let mut by_tool: HashMap<String, Vec<String>> = HashMap::new();
    for (tool_id, name) in pairs {
        by_tool.entry(tool_id).or_default().push(name);
    }
    tools
        .into_iter()
        .map(|tool| {
            let tags = by_tool.remove(&tool.id).unwrap_or_default();
            ToolWithTags { tool, tags }
        })
        .collect()
}

/// Every tool, newest first, with tags attached.
pub async fn fetch_tools(db: &SqlitePool) -> Result<Vec<ToolWithTags>, sqlx::Error> {
    let tools: Vec<Tool> = sqlx::query_as("SELECT * FROM tools ORDER BY created_at DESC")
        .fetch_all(db)
        .await?;

    let pairs: Vec<(String, String)> = sqlx::query_as(
        "SELECT tt.tool_id, t.name FROM tool_tags tt JOIN tags t ON t.id = tt.tag_id ORDER BY t.name",
    )
    .fetch_all(db)
    .await?;

    Ok(attach_tags(tools, pairs))
}

async fn fetch_tool(db: &SqlitePool, id: &str) -> Result<Option<ToolWithTags>, sqlx::Error> {
    let tool: Option<Tool> = sqlx::query_as("SELECT * FROM tools WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;

    let Some(tool) = tool else {
        return Ok(None);
    };

    let tags: Vec<(String,)> = sqlx::query_as(
        "SELECT t.name FROM tags t JOIN tool_tags tt ON tt.tag_id = t.id WHERE tt.tool_id = ? ORDER BY t.name",
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    Ok(Some(ToolWithTags {
        tool,
        tags: tags.into_iter().map(|(name,)| name).collect(),
    }))
}

/// Replace a tool's tags, creating tag rows that don't exist yet.
async fn replace_tags(
    conn: &mut SqliteConnection,
    tool_id: &str,
    tags: &[String],
    now: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM tool_tags WHERE tool_id = ?")
        .bind(tool_id)
        .execute(&mut *conn)
        .await?;

    for tag_name in tags {
        let tag_id: Option<(String,)> = sqlx::query_as("SELECT id FROM tags WHERE name = ?")
            .bind(tag_name)
            .fetch_optional(&mut *conn)
            .await?;

        let tag_id = match tag_id {
            Some((id,)) => id,
            None => {
                let new_id = uuid::Uuid::new_v4().to_string();
                sqlx::query("INSERT INTO tags (id, name, created_at) VALUES (?, ?, ?)")
                    .bind(&new_id)
                    .bind(tag_name)
                    .bind(now)
                    .execute(&mut *conn)
                    .await?;
                new_id
            }
        };

        sqlx::query("INSERT OR IGNORE INTO tool_tags (tool_id, tag_id) VALUES (?, ?)")
            .bind(tool_id)
            .bind(&tag_id)
            .execute(&mut *conn)
            .await?;
    }

    prune_unused_tags(conn).await
}

/// Drop tag rows no tool links to any more.
async fn prune_unused_tags(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let pruned = sqlx::query("DELETE FROM tags WHERE id NOT IN (SELECT tag_id FROM tool_tags)")
        .execute(&mut *conn)
        .await?
        .rows_affected();
    if pruned > 0 {
        tracing::debug!("Pruned {pruned} unused tag(s)");
    }
    Ok(())
}

// Escape LIKE wildcards so a query matches literally.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Ids of tools whose title, description or any tag name contains `query`.
/// SQLite's LIKE is case-insensitive for ASCII.
async fn matching_tool_ids(db: &SqlitePool, query: &str) -> Result<HashSet<String>, sqlx::Error> {
    let ids: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT t.id
        FROM tools t
        LEFT JOIN tool_tags tt ON tt.tool_id = t.id
        LEFT JOIN tags g ON g.id = tt.tag_id
        WHERE t.title LIKE ?1 ESCAPE '\'
           OR t.description LIKE ?1 ESCAPE '\'
           OR g.name LIKE ?1 ESCAPE '\'
        "#,
    )
    .bind(like_pattern(query))
    .fetch_all(db)
    .await?;

    Ok(ids.into_iter().map(|(id,)| id).collect())
}

async fn list_tools(State(state): State<AppState>) -> Result<Json<Vec<ToolWithTags>>, AppError> {
    Ok(Json(fetch_tools(&state.db).await?))
}

async fn create_tool(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiJson(input): ApiJson<ToolInput>,
) -> Result<impl IntoResponse, AppError> {
    let title = required(input.title, "title")?;
    let link = required(input.link, "link")?;
    let description = required(input.description, "description")?;
    require_http_url(&link)?;

    let now = chrono::Utc::now().to_rfc3339();
    let id = uuid::Uuid::new_v4().to_string();

    let mut tx = state.db.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO tools (id, title, link, description, is_personal_tool, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&title)
    .bind(&link)
    .bind(&description)
    .bind(input.is_personal_tool.unwrap_or(false))
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    replace_tags(&mut tx, &id, &input.tags.unwrap_or_default(), &now).await?;
    tx.commit().await?;

    let tool = fetch_tool(&state.db, &id)
        .await?
        .ok_or(AppError::RecordNotFound("Tool"))?;
    tracing::info!("Created tool {} ({})", tool.tool.title, tool.tool.id);
    sync_tool(state.search.as_ref(), &tool).await;

    Ok((StatusCode::CREATED, Json(tool)))
}

async fn update_tool(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ToolInput>,
) -> Result<Json<ToolWithTags>, AppError> {
    let Some(existing) = fetch_tool(&state.db, &id).await? else {
        return Err(AppError::RecordNotFound("Tool"));
    };

    let title = match input.title {
        Some(t) => required(Some(t), "title")?,
        None => existing.tool.title,
    };
    let link = match input.link {
        Some(l) => required(Some(l), "link")?,
        None => existing.tool.link,
    };
    let description = match input.description {
        Some(d) => required(Some(d), "description")?,
        None => existing.tool.description,
    };
    require_http_url(&link)?;
    let is_personal_tool = input
        .is_personal_tool
        .unwrap_or(existing.tool.is_personal_tool);

    let now = chrono::Utc::now().to_rfc3339();
    let mut tx = state.db.begin().await?;
    sqlx::query(
        r#"
        UPDATE tools
        SET title = ?, link = ?, description = ?, is_personal_tool = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&title)
    .bind(&link)
    .bind(&description)
    .bind(is_personal_tool)
    .bind(&now)
    .bind(&id)
    .execute(&mut *tx)
    .await?;

    if let Some(tags) = input.tags {
        replace_tags(&mut tx, &id, &tags, &now).await?;
    }
    tx.commit().await?;

    let tool = fetch_tool(&state.db, &id)
        .await?
        .ok_or(AppError::RecordNotFound("Tool"))?;
    sync_tool(state.search.as_ref(), &tool).await;

    Ok(Json(tool))
}

async fn delete_tool(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = state.db.begin().await?;
    let result = sqlx::query("DELETE FROM tools WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::RecordNotFound("Tool"));
    }
    prune_unused_tags(&mut tx).await?;
    tx.commit().await?;

    tracing::info!("Deleted tool {id}");
    unsync_tool(state.search.as_ref(), &id).await;

    Ok(Json(json!({ "success": true })))
}

async fn search_tools(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ToolWithTags>>, AppError> {
    let tools = fetch_tools(&state.db).await?;
    let Some(query) = optional(params.q) else {
        return Ok(Json(tools));
    };

    let Some(index) = state.search.as_ref() else {
        let ids = matching_tool_ids(&state.db, &query).await?;
        return Ok(Json(
            tools.into_iter().filter(|t| ids.contains(&t.tool.id)).collect(),
        ));
    };

    // Hits are returned in relevance order; ids no longer in the database are skipped
    let hits = index.search(&query).await?;
    let mut by_id: HashMap<String, ToolWithTags> =
        tools.into_iter().map(|t| (t.tool.id.clone(), t)).collect();
    Ok(Json(
        hits.into_iter().filter_map(|hit| by_id.remove(&hit.id)).collect(),
    ))
}

async fn reindex_tools(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let index = state
        .search
        .as_ref()
        .ok_or(AppError::NotConfigured("MEILI_URL"))?;

    let tools = fetch_tools(&state.db).await?;
    let documents: Vec<ToolDocument> = tools.iter().map(ToolDocument::from).collect();
    index.upsert(&documents).await?;

    tracing::info!("Reindexed {} tools", documents.len());
    Ok(Json(json!({ "indexed": documents.len() })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(id: &str) -> Tool {
        Tool {
            id: id.to_string(),
            title: id.to_uppercase(),
            link: format!("https://{id}.example"),
            description: String::new(),
            is_personal_tool: false,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn attach_tags_groups_by_tool() {
        let tools = vec![tool("a"), tool("b")];
        let pairs = vec![
            ("a".to_string(), "llm".to_string()),
            ("b".to_string(), "image".to_string()),
            ("a".to_string(), "search".to_string()),
        ];
        let attached = attach_tags(tools, pairs);
        assert_eq!(attached[0].tags, vec!["llm", "search"]);
        assert_eq!(attached[1].tags, vec!["image"]);
    }

    #[test]
    fn attach_tags_leaves_untagged_tools_empty() {
        let attached = attach_tags(vec![tool("a")], vec![]);
        assert!(attached[0].tags.is_empty());
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("llm"), "%llm%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }
}
