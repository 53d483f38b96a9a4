use arsenal::cli::{self, Command};
use arsenal::config::Config;
use arsenal::{build_app, db, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "arsenal=info,tower_http=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let command = cli::parse_args(std::env::args().skip(1))?;
    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database_url).await?;

    match command {
        Command::Backup => cli::backup(&pool).await,
        Command::Export { path } => cli::export(&pool, &path).await,
        Command::Serve => {
            let addr = config.bind_addr;
            let state = AppState::new(pool, config)?;
            let app = build_app(state).await?;

            let listener = TcpListener::bind(addr).await?;
            tracing::info!("listening on {}", addr);
            axum::serve(listener, app).await?;
            Ok(())
        }
    }
}
