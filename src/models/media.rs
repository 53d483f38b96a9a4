use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum MediaType {
    #[serde(rename = "article")]
    #[sqlx(rename = "article")]
    Article,
    #[serde(rename = "tweet")]
    #[sqlx(rename = "tweet")]
    Tweet,
    #[serde(rename = "youtube")]
    #[sqlx(rename = "youtube")]
    Youtube,
    #[serde(rename = "other")]
    #[sqlx(rename = "other")]
    Other,
}

impl MediaType {
    /// Title used when the caller did not supply one. Articles have none.
    pub fn default_title(&self) -> Option<&'static str> {
        match self {
            MediaType::Tweet => Some("Tweet"),
            MediaType::Youtube => Some("YouTube Video"),
            MediaType::Article | MediaType::Other => None,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Article => write!(f, "article"),
            MediaType::Tweet => write!(f, "tweet"),
            MediaType::Youtube => write!(f, "youtube"),
            MediaType::Other => write!(f, "other"),
        }
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(MediaType::Article),
            "tweet" => Ok(MediaType::Tweet),
            "youtube" => Ok(MediaType::Youtube),
            "other" => Ok(MediaType::Other),
            other => Err(format!(
                "Invalid media type '{other}', expected one of article, tweet, youtube, other"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: MediaType,
    #[serde(rename = "embedHtml")]
    pub embed_html: Option<String>,
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    pub comment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// What the URL alone tells us about a media bookmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedMedia {
    pub kind: MediaType,
    pub video_id: Option<String>,
}

impl DetectedMedia {
    pub fn embed_html(&self) -> Option<String> {
        self.video_id.as_deref().map(youtube_embed_html)
    }
}

fn bare_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    let host = ["www.", "mobile.", "m."]
        .iter()
        .find_map(|prefix| host.strip_prefix(prefix))
        .map(str::to_string)
        .unwrap_or(host);
    Some(host)
}

/// Classify a URL by hostname and pull out the YouTube video id if there is one.
pub fn detect_media(raw: &str) -> DetectedMedia {
    let Ok(url) = Url::parse(raw.trim()) else {
        return DetectedMedia {
            kind: MediaType::Other,
            video_id: None,
        };
    };
    let Some(host) = bare_host(&url) else {
        return DetectedMedia {
            kind: MediaType::Other,
            video_id: None,
        };
    };

    match host.as_str() {
        "twitter.com" | "x.com" => DetectedMedia {
            kind: MediaType::Tweet,
            video_id: None,
        },
        "youtube.com" | "youtu.be" => DetectedMedia {
            kind: MediaType::Youtube,
            video_id: youtube_video_id(&url, &host),
        },
        _ => DetectedMedia {
            kind: MediaType::Article,
            video_id: None,
        },
    }
}

fn youtube_video_id(url: &Url, host: &str) -> Option<String> {
    let candidate = if host == "youtu.be" {
        url.path_segments()?.filter(|s| !s.is_empty()).last().map(str::to_string)
    } else if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
        Some(v.into_owned())
    } else {
        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["shorts", id, ..] | ["embed", id, ..] | ["live", id, ..] => Some(id.to_string()),
            _ => None,
        }
    }?;

    let id = candidate.split('&').next().unwrap_or_default().trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

pub fn youtube_embed_html(video_id: &str) -> String {
    format!(
        r#"<iframe width="560" height="315" src="https://www.youtube.com/embed/{video_id}" title="YouTube video player" frameborder="0" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_youtube_link_strips_query() {
        let detected = detect_media("https://youtu.be/abc123?t=5");
        assert_eq!(detected.kind, MediaType::Youtube);
        assert_eq!(detected.video_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn watch_link_uses_v_parameter() {
        let detected = detect_media("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL1");
        assert_eq!(detected.kind, MediaType::Youtube);
        assert_eq!(detected.video_id.as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn shorts_and_mobile_links() {
        let detected = detect_media("https://m.youtube.com/shorts/xyz789");
        assert_eq!(detected.video_id.as_deref(), Some("xyz789"));
    }

    #[test]
    fn ampersand_joined_id_is_trimmed() {
        let detected = detect_media("https://youtu.be/abc123&feature=share");
        assert_eq!(detected.video_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn tweets_from_both_hosts() {
        assert_eq!(detect_media("https://twitter.com/a/status/1").kind, MediaType::Tweet);
        assert_eq!(detect_media("https://x.com/a/status/1").kind, MediaType::Tweet);
        assert_eq!(detect_media("https://mobile.twitter.com/a").kind, MediaType::Tweet);
    }

    #[test]
    fn everything_else_is_an_article() {
        let detected = detect_media("https://example.com/post");
        assert_eq!(detected.kind, MediaType::Article);
        assert_eq!(detected.video_id, None);
        assert_eq!(detected.embed_html(), None);
    }

    #[test]
    fn unparseable_url_is_other() {
        assert_eq!(detect_media("not a url").kind, MediaType::Other);
    }

    #[test]
    fn embed_html_points_at_embed_url() {
        let detected = detect_media("https://youtu.be/abc123");
        let html = detected.embed_html().unwrap();
        assert!(html.contains("https://www.youtube.com/embed/abc123"));
    }

    #[test]
    fn default_titles() {
        assert_eq!(MediaType::Tweet.default_title(), Some("Tweet"));
        assert_eq!(MediaType::Youtube.default_title(), Some("YouTube Video"));
        assert_eq!(MediaType::Article.default_title(), None);
    }

    #[test]
    fn media_item_uses_camel_case_video_fields() {
        let item = MediaItem {
            id: "m1".to_string(),
            title: "Talk".to_string(),
            url: "https://youtu.be/abc123".to_string(),
            description: None,
            kind: MediaType::Youtube,
            embed_html: Some(youtube_embed_html("abc123")),
            video_id: Some("abc123".to_string()),
            comment: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["videoId"], "abc123");
        assert_eq!(json["type"], "youtube");
        assert!(json["embedHtml"].is_string());
    }
}
