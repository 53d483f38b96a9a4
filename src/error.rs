use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    /// Update or delete of a row that does not exist. Reported as a server
    /// error, matching how the curator UI has always surfaced it.
    #[error("{0} not found")]
    RecordNotFound(&'static str),

    /// A webpage fetch, LLM call or search request failed.
    #[error("{0}")]
    Upstream(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RecordNotFound(_)
            | AppError::Upstream(_)
            | AppError::NotConfigured(_)
            | AppError::Database(_)
            | AppError::Template(_)
            | AppError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                "Internal server error".to_string()
            }
            AppError::Template(e) => {
                tracing::error!("Template error: {e}");
                "Internal server error".to_string()
            }
            AppError::Session(e) => {
                tracing::error!("Session error: {e}");
                "Internal server error".to_string()
            }
            AppError::Upstream(e) => {
                tracing::warn!("Upstream error: {e}");
                e.clone()
            }
            other => other.to_string(),
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}
