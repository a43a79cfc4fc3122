use crate::error::{Error, Result};
use crate::models::question::AnswerKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

const FALLBACK_JSON: &str = include_str!("../../data/fallback_templates.json");
const BANK_JSON: &str = include_str!("../../data/question_bank.json");

/// Hand-authored question used when generation cannot fill a slot.
/// Subject is the key of the surrounding map.
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackTemplate {
    pub text: String,
    pub options: [String; 4],
    pub correct_option: AnswerKey,
    pub explanation: String,
    pub objective: String,
    pub difficulty_level: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BankQuestion {
    pub id: String,
    pub subject: String,
    pub objective: String,
    pub text: String,
    pub options: [String; 4],
    pub correct_option: AnswerKey,
    pub explanation: String,
    pub difficulty_level: u8,
}

static FALLBACK: OnceLock<HashMap<String, Vec<FallbackTemplate>>> = OnceLock::new();
static BANK: OnceLock<Vec<BankQuestion>> = OnceLock::new();

/// Parses the embedded content tables. Called once at startup so a bad data
/// file aborts boot instead of surfacing as a runtime 5xx.
pub fn init_banks() -> Result<()> {
    let fallback: HashMap<String, Vec<FallbackTemplate>> = serde_json::from_str(FALLBACK_JSON)
        .map_err(|e| Error::Config(format!("invalid fallback_templates.json: {}", e)))?;
    if fallback.values().all(|list| list.is_empty()) {
        return Err(Error::Config(
            "fallback_templates.json contains no questions".to_string(),
        ));
    }
    let bank: Vec<BankQuestion> = serde_json::from_str(BANK_JSON)
        .map_err(|e| Error::Config(format!("invalid question_bank.json: {}", e)))?;

    let _ = FALLBACK.set(fallback);
    let _ = BANK.set(bank);
    Ok(())
}

pub fn fallback_templates() -> &'static HashMap<String, Vec<FallbackTemplate>> {
    FALLBACK.get_or_init(|| {
        serde_json::from_str(FALLBACK_JSON).expect("fallback_templates.json is valid")
    })
}

pub fn question_bank() -> &'static [BankQuestion] {
    BANK.get_or_init(|| serde_json::from_str(BANK_JSON).expect("question_bank.json is valid"))
        .as_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_banks_parse() {
        assert!(init_banks().is_ok());
        assert!(!question_bank().is_empty());
        assert!(fallback_templates().contains_key("math"));
    }

    #[test]
    fn bank_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for q in question_bank() {
            assert!(seen.insert(q.id.as_str()), "duplicate bank id {}", q.id);
        }
    }

    #[test]
    fn bank_correct_options_reference_nonempty_choices() {
        for q in question_bank() {
            assert!(!q.options[q.correct_option.index()].is_empty());
        }
    }
}
