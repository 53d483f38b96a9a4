use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};

use crate::auth::MaybeAdmin;
use crate::error::AppError;
use crate::models::{MediaItem, Note, Prompt, PromptType, ToolWithTags};
use crate::pacific;
use crate::routes::{notes::fetch_notes, tools::fetch_tools};
use crate::AppState;

struct DateGroup<T> {
    label: String,
    items: Vec<T>,
}

struct NoteView {
    id: String,
    content: String,
    time: String,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    current_stack: Vec<ToolWithTags>,
    other_tools: Vec<ToolWithTags>,
    operator_prompts: Vec<Prompt>,
    regular_prompts: Vec<Prompt>,
    media: Vec<DateGroup<MediaItem>>,
    notes: Vec<DateGroup<NoteView>>,
    static_hash: &'static str,
    is_admin: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

fn date_label(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

fn pacific_time(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|t| {
            pacific::to_pacific(t.with_timezone(&Utc))
                .format("%-I:%M %p")
                .to_string()
        })
        .unwrap_or_default()
}

fn into_groups<T>(groups: Vec<(NaiveDate, Vec<T>)>) -> Vec<DateGroup<T>> {
    groups
        .into_iter()
        .map(|(date, items)| DateGroup {
            label: date_label(date),
            items,
        })
        .collect()
}

async fn index(
    State(state): State<AppState>,
    MaybeAdmin(admin): MaybeAdmin,
) -> Result<impl IntoResponse, AppError> {
    let is_admin = admin.is_some();

    let (current_stack, other_tools): (Vec<_>, Vec<_>) = fetch_tools(&state.db)
        .await?
        .into_iter()
        .partition(|t| t.tool.is_personal_tool);

    let prompts: Vec<Prompt> = sqlx::query_as("SELECT * FROM prompts ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;
    let (operator_prompts, regular_prompts): (Vec<_>, Vec<_>) = prompts
        .into_iter()
        .partition(|p| p.kind == PromptType::Operator);

    let media: Vec<MediaItem> = sqlx::query_as("SELECT * FROM media_items ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;
    let media = into_groups(pacific::group_by_date(media, |m| m.created_at.as_str()));

    let notes: Vec<Note> = if is_admin {
        fetch_notes(&state.db).await?
    } else {
        Vec::new()
    };
    let notes = into_groups(pacific::group_by_date(notes, |n| n.created_at.as_str()))
        .into_iter()
        .map(|group| DateGroup {
            label: group.label,
            items: group
                .items
                .into_iter()
                .map(|n| NoteView {
                    time: pacific_time(&n.created_at),
                    id: n.id,
                    content: n.content,
                })
                .collect(),
        })
        .collect();

    let template = IndexTemplate {
        current_stack,
        other_tools,
        operator_prompts,
        regular_prompts,
        media,
        notes,
        static_hash: crate::STATIC_HASH,
        is_admin,
    };
    Ok(Html(template.render()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_times_are_pacific() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        assert_eq!(date_label(date), "Friday, July 4, 2025");
        assert_eq!(pacific_time("2025-07-04T19:05:00+00:00"), "12:05 PM");
        assert_eq!(pacific_time("bogus"), "");
    }
}
