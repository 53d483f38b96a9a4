use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::auth::{check_password, login_admin, logout_admin, MaybeAdmin};
use crate::error::AppError;
use crate::AppState;

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    error: Option<String>,
    static_hash: &'static str,
    is_admin: bool,
}

#[derive(Deserialize)]
pub struct LoginForm {
    password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", post(logout))
}

async fn login_page(MaybeAdmin(admin): MaybeAdmin) -> Result<impl IntoResponse, AppError> {
    if admin.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let template = LoginTemplate {
        error: None,
        static_hash: crate::STATIC_HASH,
        is_admin: false,
    };
    Ok(Html(template.render()?).into_response())
}

async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    if check_password(state.config.admin_password.as_deref(), &form.password)? {
        login_admin(&session).await?;
        tracing::info!("Admin signed in");
        return Ok(Redirect::to("/").into_response());
    }

    tracing::warn!("Rejected admin login attempt");
    let template = LoginTemplate {
        error: Some("Invalid password".to_string()),
        static_hash: crate::STATIC_HASH,
        is_admin: false,
    };
    Ok((StatusCode::UNAUTHORIZED, Html(template.render()?)).into_response())
}

async fn logout(session: Session) -> Result<impl IntoResponse, AppError> {
    logout_admin(&session).await?;
    Ok(Redirect::to("/"))
}
