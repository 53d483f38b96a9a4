use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tower_sessions::Session;

use crate::error::AppError;
use crate::AppState;

const ADMIN_KEY: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub logged_in_at: String,
}

/// The signed-in curator. Rejects with 401 when there is no admin session.
pub struct AdminUser(pub Admin);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        current_admin(parts, state)
            .await
            .map(AdminUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Whoever is viewing: `Some` for the admin, `None` for anonymous visitors.
pub struct MaybeAdmin(pub Option<Admin>);

impl<S> FromRequestParts<S> for MaybeAdmin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAdmin(current_admin(parts, state).await))
    }
}

async fn current_admin<S: Send + Sync>(parts: &mut Parts, state: &S) -> Option<Admin> {
    let session = Session::from_request_parts(parts, state).await.ok()?;
    session.get(ADMIN_KEY).await.ok().flatten()
}

/// Caller of the scheduled backup endpoint, authenticated by `Authorization: Bearer <CRON_SECRET>`.
pub struct CronCaller;

impl FromRequestParts<AppState> for CronCaller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(secret) = state.config.cron_secret.as_deref() else {
            tracing::warn!("Backup requested but CRON_SECRET is not set");
            return Err(AppError::Unauthorized);
        };

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));

        match token {
            Some(token) if secret_matches(token, secret) => Ok(CronCaller),
            _ => Err(AppError::Unauthorized),
        }
    }
}

// Length leaks, contents don't
fn secret_matches(submitted: &str, expected: &str) -> bool {
    submitted.len() == expected.len() && bool::from(submitted.as_bytes().ct_eq(expected.as_bytes()))
}

/// Check a submitted password against the configured admin password.
pub fn check_password(configured: Option<&str>, submitted: &str) -> Result<bool, AppError> {
    let Some(expected) = configured else {
        return Err(AppError::Forbidden(
            "Admin login is disabled: ADMIN_PASSWORD is not set".to_string(),
        ));
    };
    Ok(!submitted.is_empty() && secret_matches(submitted, expected))
}

pub async fn login_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    let admin = Admin {
        logged_in_at: chrono::Utc::now().to_rfc3339(),
    };
    session.insert(ADMIN_KEY, admin).await
}

pub async fn logout_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_check() {
        assert!(check_password(Some("hunter2"), "hunter2").unwrap());
        assert!(!check_password(Some("hunter2"), "wrong").unwrap());
        assert!(!check_password(Some("hunter2"), "").unwrap());
        assert!(!check_password(Some("hunter2"), "hunter22").unwrap());
        assert!(!check_password(Some("hunter2"), "Hunter2").unwrap());
    }

    #[test]
    fn secret_comparison() {
        assert!(secret_matches("cron-secret", "cron-secret"));
        assert!(!secret_matches("cron-secreT", "cron-secret"));
        assert!(!secret_matches("cron", "cron-secret"));
        assert!(!secret_matches("", "cron-secret"));
    }

    #[test]
    fn password_check_without_configured_password_is_forbidden() {
        let err = check_password(None, "anything").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }
}
