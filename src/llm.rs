//! OpenAI-compatible chat completion clients and response parsing.
//!
//! OpenAI and Perplexity speak the same `/chat/completions` dialect, so a
//! single [`ChatClient`] serves both.

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;

use crate::config::ChatProviderConfig;
use crate::error::AppError;
use crate::models::tag::{deserialize_tags, normalize_tags};
use crate::scrape::PageSummary;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

const TOOL_SYSTEM_PROMPT: &str = "You catalogue AI tools. Given information about a web page, \
respond with a JSON object with exactly these keys: \"title\" (the product name only, no tagline), \
\"description\" (one or two plain sentences describing what the tool does), and \"tags\" \
(an array of 3 to 6 short lowercase category labels).";

const SUMMARY_SYSTEM_PROMPT: &str = "You summarize articles, videos and posts for a personal \
bookmark collection. Respond with a concise summary of two to four sentences in plain text.";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client for one chat-completions provider.
#[derive(Clone)]
pub struct ChatClient {
    name: &'static str,
    client: Client,
    config: ChatProviderConfig,
    json_mode: bool,
}

impl ChatClient {
    /// `json_mode` requests `response_format: json_object`, which Perplexity does not accept.
    pub fn new(
        name: &'static str,
        config: ChatProviderConfig,
        json_mode: bool,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        tracing::info!(
            "Initializing {name} chat client: url={}, model={}",
            config.base_url,
            config.model
        );

        Ok(Self {
            name,
            client,
            config,
            json_mode,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Send one system + user exchange and return the assistant's text.
    pub async fn complete(&self, system: &str, user: &str, want_json: bool) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.3,
            response_format: (want_json && self.json_mode).then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        tracing::debug!("Sending chat completion to {} ({})", self.name, self.config.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("{} request failed: {e}", self.name)))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => "Unknown error".to_string(),
            };
            return Err(AppError::Upstream(format!(
                "{} API error ({status}): {message}",
                self.name
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid {} response: {e}", self.name)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::Upstream(format!("{} returned an empty response", self.name)))
    }

    /// Ask for a title, description and tags for an AI tool.
    pub async fn describe_tool(&self, page: &ToolPrompt<'_>) -> Result<ToolSuggestion, AppError> {
        let raw = self.complete(TOOL_SYSTEM_PROMPT, &page.render(), true).await?;
        parse_tool_suggestion(&raw).ok_or_else(|| {
            tracing::warn!("Unparseable {} tool response: {raw}", self.name);
            AppError::Upstream(format!("Could not parse {} response", self.name))
        })
    }

    pub async fn summarize(&self, page: &PageSummary) -> Result<String, AppError> {
        let mut user = format!("URL: {}\n", page.url);
        if let Some(title) = &page.title {
            user.push_str(&format!("Title: {title}\n"));
        }
        if let Some(description) = &page.description {
            user.push_str(&format!("Description: {description}\n"));
        }
        if !page.content.is_empty() {
            user.push_str(&format!("\nContent:\n{}", page.content));
        }
        self.complete(SUMMARY_SYSTEM_PROMPT, &user, false).await
    }
}

/// What the model is told about a tool's page.
pub struct ToolPrompt<'a> {
    pub url: &'a str,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub content: Option<&'a str>,
}

impl<'a> ToolPrompt<'a> {
    pub fn from_page(page: &'a PageSummary) -> Self {
        Self {
            url: &page.url,
            title: page.title.as_deref(),
            description: page.description.as_deref(),
            content: Some(page.content.as_str()).filter(|c| !c.is_empty()),
        }
    }

    fn render(&self) -> String {
        let mut out = format!("URL: {}\n", self.url);
        if let Some(title) = self.title {
            out.push_str(&format!("Page title: {title}\n"));
        }
        if let Some(description) = self.description {
            out.push_str(&format!("Meta description: {description}\n"));
        }
        match self.content {
            Some(content) => out.push_str(&format!("\nPage content:\n{content}")),
            None => out.push_str("\nNo page content was captured; use what you know about this URL."),
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSuggestion {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
struct RawSuggestion {
    #[serde(alias = "name", alias = "tool_name", alias = "toolName")]
    title: Option<String>,
    description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    tags: Option<Vec<String>>,
}

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap());
static MD_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)\*\*\s*(?:tool\s+name|title|name)\s*:?\s*\*\*\s*:?\s*(.+)$").unwrap());
static MD_DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)\*\*\s*description\s*:?\s*\*\*\s*:?\s*(.+)$").unwrap());
static MD_TAGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)\*\*\s*tags\s*:?\s*\*\*\s*:?\s*(.+)$").unwrap());

fn parse_json_suggestion(raw: &str) -> Option<ToolSuggestion> {
    let unfenced = FENCE_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);
    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end < start {
        return None;
    }

    let parsed: RawSuggestion = serde_json::from_str(&unfenced[start..=end]).ok()?;
    let title = parsed.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
    Some(ToolSuggestion {
        title,
        description: parsed.description.unwrap_or_default().trim().to_string(),
        tags: parsed.tags.unwrap_or_default(),
    })
}

fn strip_markdown(s: &str) -> String {
    s.trim().trim_matches(|c| c == '*' || c == '_' || c == '`').trim().to_string()
}

fn parse_markdown_suggestion(raw: &str) -> Option<ToolSuggestion> {
    let title = MD_TITLE_RE
        .captures(raw)
        .map(|c| strip_markdown(&c[1]))
        .filter(|t| !t.is_empty())?;
    let description = MD_DESCRIPTION_RE
        .captures(raw)
        .map(|c| strip_markdown(&c[1]))
        .unwrap_or_default();
    let tags = MD_TAGS_RE
        .captures(raw)
        .map(|c| normalize_tags(strip_markdown(&c[1]).split(',')))
        .unwrap_or_default();
    Some(ToolSuggestion {
        title,
        description,
        tags,
    })
}

/// Parse a model reply as JSON, falling back to bolded markdown fields.
pub fn parse_tool_suggestion(raw: &str) -> Option<ToolSuggestion> {
    parse_json_suggestion(raw).or_else(|| parse_markdown_suggestion(raw))
}

/// The configured LLM providers.
#[derive(Clone, Default)]
pub struct Assistants {
    pub openai: Option<ChatClient>,
    pub perplexity: Option<ChatClient>,
}

impl Assistants {
    pub fn openai(&self) -> Result<&ChatClient, AppError> {
        self.openai.as_ref().ok_or(AppError::NotConfigured("OPENAI_API_KEY"))
    }

    /// Perplexity when configured, OpenAI otherwise.
    pub fn researcher(&self) -> Result<&ChatClient, AppError> {
        self.perplexity
            .as_ref()
            .or(self.openai.as_ref())
            .ok_or(AppError::NotConfigured("PERPLEXITY_API_KEY"))
    }
}
