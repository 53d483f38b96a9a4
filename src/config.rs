use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/arsenal.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_PERPLEXITY_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_PERPLEXITY_MODEL: &str = "sonar";
pub const DEFAULT_MEILI_INDEX: &str = "tools";

pub const DEFAULT_FETCH_ATTEMPTS: u32 = 3;
pub const DEFAULT_FETCH_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Connection details for one OpenAI-compatible chat provider.
#[derive(Debug, Clone)]
pub struct ChatProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct MeiliConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub index: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub secure_cookies: bool,
    /// Password for the single admin account. Admin login is refused when unset.
    pub admin_password: Option<String>,
    /// Bearer secret for the scheduled backup endpoint. The endpoint is closed when unset.
    pub cron_secret: Option<String>,
    pub openai: Option<ChatProviderConfig>,
    pub perplexity: Option<ChatProviderConfig>,
    pub meili: Option<MeiliConfig>,
    pub fetch_attempts: u32,
    pub fetch_retry_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            secure_cookies: false,
            admin_password: None,
            cron_secret: None,
            openai: None,
            perplexity: None,
            meili: None,
            fetch_attempts: DEFAULT_FETCH_ATTEMPTS,
            fetch_retry_delay: DEFAULT_FETCH_RETRY_DELAY,
        }
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn flag(name: &str) -> bool {
    var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn chat_provider(prefix: &str, default_url: &str, default_model: &str) -> Option<ChatProviderConfig> {
    let api_key = var(&format!("{prefix}_API_KEY"))?;
    Some(ChatProviderConfig {
        base_url: var(&format!("{prefix}_BASE_URL")).unwrap_or_else(|| default_url.to_string()),
        api_key,
        model: var(&format!("{prefix}_MODEL")).unwrap_or_else(|| default_model.to_string()),
    })
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a local `.env` file.
    pub fn from_env() -> Result<Self, String> {
        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e| format!("Invalid BIND_ADDR: {e}"))?;

        let meili = var("MEILI_URL").map(|url| MeiliConfig {
            url,
            api_key: var("MEILI_API_KEY"),
            index: var("MEILI_INDEX").unwrap_or_else(|| DEFAULT_MEILI_INDEX.to_string()),
        });

        let fetch_attempts = match var("FETCH_ATTEMPTS") {
            Some(v) => v.parse().map_err(|e| format!("Invalid FETCH_ATTEMPTS: {e}"))?,
            None => DEFAULT_FETCH_ATTEMPTS,
        };
        let fetch_retry_delay = match var("FETCH_RETRY_DELAY_MS") {
            Some(v) => Duration::from_millis(
                v.parse().map_err(|e| format!("Invalid FETCH_RETRY_DELAY_MS: {e}"))?,
            ),
            None => DEFAULT_FETCH_RETRY_DELAY,
        };

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr,
            secure_cookies: flag("SECURE_COOKIES"),
            admin_password: var("ADMIN_PASSWORD"),
            cron_secret: var("CRON_SECRET"),
            openai: chat_provider("OPENAI", DEFAULT_OPENAI_URL, DEFAULT_OPENAI_MODEL),
            perplexity: chat_provider("PERPLEXITY", DEFAULT_PERPLEXITY_URL, DEFAULT_PERPLEXITY_MODEL),
            meili,
            fetch_attempts: fetch_attempts.max(1),
            fetch_retry_delay,
        })
    }
}
