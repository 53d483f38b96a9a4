use serde::{Deserialize, Deserializer};

/// Trim, lowercase and de-duplicate tag labels, keeping first-seen order.
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.as_ref().trim().trim_start_matches('#').trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

// Tags arrive either as a JSON array or as a comma-separated string
pub fn deserialize_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrCsv {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match Option::<ListOrCsv>::deserialize(deserializer)? {
        None => None,
        Some(ListOrCsv::List(list)) => Some(normalize_tags(list)),
        Some(ListOrCsv::Csv(s)) => Some(normalize_tags(s.split(','))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "deserialize_tags")]
        tags: Option<Vec<String>>,
    }

    #[test]
    fn normalize_dedupes_and_lowercases() {
        let tags = normalize_tags([" LLM ", "llm", "#Agents", "", "coding"]);
        assert_eq!(tags, vec!["llm", "agents", "coding"]);
    }

    #[test]
    fn tags_accept_list_or_csv() {
        let body: Body = serde_json::from_str(r#"{"tags": ["A", "b"]}"#).unwrap();
        assert_eq!(body.tags, Some(vec!["a".to_string(), "b".to_string()]));

        let body: Body = serde_json::from_str(r#"{"tags": "x, Y ,"}"#).unwrap();
        assert_eq!(body.tags, Some(vec!["x".to_string(), "y".to_string()]));

        let body: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(body.tags, None);
    }
}
