pub mod auth;
pub mod backup;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod pacific;
pub mod routes;
pub mod scrape;
pub mod search;

pub const STATIC_HASH: &str = env!("STATIC_HASH");

use axum::http::{header, HeaderValue};
use axum::{routing::get, Router};
use sqlx::SqlitePool;
use std::sync::Arc;
use time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::Level;

use crate::config::Config;
use crate::llm::{Assistants, ChatClient};
use crate::scrape::WebFetcher;
use crate::search::SearchIndex;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub fetcher: WebFetcher,
    pub assistants: Assistants,
    pub search: Option<SearchIndex>,
}

impl AppState {
    /// Build the outbound HTTP clients described by `config`.
    pub fn new(db: SqlitePool, config: Config) -> Result<Self, reqwest::Error> {
        let assistants = Assistants {
            openai: config
                .openai
                .clone()
                .map(|c| ChatClient::new("OpenAI", c, true))
                .transpose()?,
            perplexity: config
                .perplexity
                .clone()
                .map(|c| ChatClient::new("Perplexity", c, false))
                .transpose()?,
        };
        let search = config.meili.clone().map(SearchIndex::new).transpose()?;
        let fetcher = WebFetcher::new(&config)?;

        Ok(Self {
            db,
            config: Arc::new(config),
            fetcher,
            assistants,
            search,
        })
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Build the full Axum application router.
///
/// Caller is responsible for running database migrations on `state.db`
/// beforehand. This function sets up the session store (and migrates its
/// table), then assembles all route modules, middleware, and state.
pub async fn build_app(state: AppState) -> Result<Router, sqlx::Error> {
    let session_store = SqliteStore::new(state.db.clone());
    session_store.migrate().await?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::days(30)))
        .with_secure(state.config.secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax);

    let app = Router::new()
        .route("/health", get(health))
        .merge(routes::pages::router())
        .merge(routes::auth::router())
        .merge(routes::tools::router())
        .merge(routes::prompts::router())
        .merge(routes::media::router())
        .merge(routes::notes::router())
        .merge(routes::assist::router())
        .merge(routes::backup::router())
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("public, max-age=86400"),
                ))
                .service(ServeDir::new("static")),
        )
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state);

    Ok(app)
}
