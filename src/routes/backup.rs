use axum::{extract::State, routing::get, Json, Router};

use crate::auth::CronCaller;
use crate::backup::{run_backup, BackupReport};
use crate::error::AppError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/cron/backup", get(scheduled_backup))
}

async fn scheduled_backup(
    State(state): State<AppState>,
    _caller: CronCaller,
) -> Result<Json<BackupReport>, AppError> {
    let report = run_backup(&state.db).await?;
    if !report.success {
        tracing::warn!("Backup {} completed with failed tables", report.backup_id);
    }
    Ok(Json(report))
}
