use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub provider_timeout_secs: u64,
    pub slot_stagger_ms: u64,
    pub generation_passes: usize,
    pub max_questions: usize,
    // Empirically chosen thresholds; tunable per deployment.
    pub duplicate_similarity: f64,
    pub objective_alignment: f64,
    pub quiz_rps: u32,
    pub usage_webhook_url: Option<String>,
    pub force_offline: bool,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            gemini_api_key: env::var("GEMINI_API_KEY").ok(),
            gemini_model: env_or("GEMINI_MODEL", "gemini-2.0-flash"),
            provider_timeout_secs: env_parse_or("PROVIDER_TIMEOUT_SECS", 30)?,
            slot_stagger_ms: env_parse_or("SLOT_STAGGER_MS", 150)?,
            generation_passes: env_parse_or("GENERATION_PASSES", 3)?,
            max_questions: env_parse_or("MAX_QUESTIONS", 20)?,
            duplicate_similarity: env_parse_or("DUPLICATE_SIMILARITY_THRESHOLD", 0.4)?,
            objective_alignment: env_parse_or("OBJECTIVE_ALIGNMENT_THRESHOLD", 0.2)?,
            quiz_rps: env_parse_or("QUIZ_RPS", 30)?,
            usage_webhook_url: env::var("USAGE_WEBHOOK_URL").ok(),
            force_offline: env_parse_or("FORCE_OFFLINE", false)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
