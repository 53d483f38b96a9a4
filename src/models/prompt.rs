use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum PromptType {
    #[serde(rename = "operator")]
    #[sqlx(rename = "operator")]
    Operator,
    #[serde(rename = "regular")]
    #[sqlx(rename = "regular")]
    Regular,
}

impl std::fmt::Display for PromptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromptType::Operator => write!(f, "operator"),
            PromptType::Regular => write!(f, "regular"),
        }
    }
}

impl FromStr for PromptType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operator" => Ok(PromptType::Operator),
            "regular" => Ok(PromptType::Regular),
            other => Err(format!(
                "Invalid prompt type '{other}', expected 'operator' or 'regular'"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Prompt {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: PromptType,
    pub created_at: String,
    pub updated_at: String,
}
