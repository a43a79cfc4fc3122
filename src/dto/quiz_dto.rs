use crate::models::question::{Difficulty, Question, QuestionSource};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateQuizPayload {
    #[validate(length(min = 1, message = "subject cannot be empty"))]
    pub subject: String,
    #[validate(range(min = 1, message = "count must be at least 1"))]
    pub count: u32,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub objective: Option<String>,
    pub difficulty: Option<Difficulty>,
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OfflineSelectionPayload {
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub objective: Option<String>,
    #[validate(range(min = 1, message = "count must be at least 1"))]
    pub count: u32,
}

// Trims and converts empty strings to None so "objective": "" behaves like
// an absent filter.
fn trim_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}

#[derive(Debug, Serialize)]
pub struct QuizBatchResponse {
    pub questions: Vec<Question>,
    pub source: QuestionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OfflineSelectionResponse {
    pub questions: Vec<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
