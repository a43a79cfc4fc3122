use crate::models::question::AnswerKey;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Structurally valid question extracted from provider output. Field defaults
/// may have been backfilled; id and batch metadata are attached on acceptance.
#[derive(Debug, Clone)]
pub struct ParsedQuestion {
    pub text: String,
    pub options: [String; 4],
    pub correct_option: AnswerKey,
    pub explanation: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
    #[error("no brace-delimited JSON object in provider output")]
    NoJsonObject,
    #[error("unparseable after repair: {0}")]
    Unparseable(#[source] serde_json::Error),
    #[error("JSON candidate is not an object")]
    NotAnObject,
}

/// Extracts a question record from free-form model text: longest `{...}`
/// substring, strict parse, one bounded repair pass, then field backfill.
pub fn parse_question(raw: &str) -> Result<ParsedQuestion, ParseFailure> {
    let candidate = extract_object(raw).ok_or(ParseFailure::NoJsonObject)?;

    let value: Value = match serde_json::from_str(candidate) {
        Ok(v) => v,
        Err(_) => {
            let repaired = repair(candidate);
            serde_json::from_str(&repaired).map_err(ParseFailure::Unparseable)?
        }
    };
    if !value.is_object() {
        return Err(ParseFailure::NotAnObject);
    }

    Ok(backfill(&value))
}

fn extract_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

fn unquoted_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:"#).expect("key regex is valid")
    })
}

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#",\s*([}\]])"#).expect("comma regex is valid"))
}

// Bounded textual repairs for near-JSON: quote bare keys, swap single quotes
// for double, drop trailing commas. Anything beyond this is a parse failure.
fn repair(candidate: &str) -> String {
    let quoted_keys = unquoted_key_re().replace_all(candidate, "${1}\"${2}\":");
    let double_quoted = quoted_keys.replace('\'', "\"");
    trailing_comma_re()
        .replace_all(&double_quoted, "${1}")
        .into_owned()
}

fn backfill(value: &Value) -> ParsedQuestion {
    let text = first_string(value, &["question_text", "question", "text"])
        .unwrap_or_else(|| "Question text unavailable".to_string());

    let provided: Vec<String> = value
        .get("options")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .take(4)
                .collect()
        })
        .unwrap_or_default();
    let option_at = |i: usize| {
        provided
            .get(i)
            .cloned()
            .unwrap_or_else(|| format!("Option {}", (b'A' + i as u8) as char))
    };
    let options = [option_at(0), option_at(1), option_at(2), option_at(3)];

    let correct_option = ["correct_answer", "correct_option", "answer"]
        .iter()
        .find_map(|key| value.get(*key))
        .map(answer_from_value)
        .unwrap_or(AnswerKey::A);

    let explanation = first_string(value, &["explanation", "rationale"])
        .unwrap_or_else(|| "No explanation provided.".to_string());

    ParsedQuestion {
        text,
        options,
        correct_option,
        explanation,
    }
}

fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| value.get(*key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn answer_from_value(value: &Value) -> AnswerKey {
    if let Some(s) = value.as_str() {
        AnswerKey::from_raw(s)
    } else if let Some(n) = value.as_u64() {
        // Some providers answer with a zero-based option index.
        AnswerKey::from_index(n as usize).unwrap_or(AnswerKey::A)
    } else {
        AnswerKey::A
    }
}
