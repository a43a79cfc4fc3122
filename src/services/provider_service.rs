use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
// Gemini's OpenAI-compatible surface; both providers share one transport.
const GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions";

const SYSTEM_ROLE: &str = "You are an experienced exam author. You write challenging, \
unambiguous multiple-choice questions and always answer with a single JSON object.";

/// Transport-level failures. Recovered inside the orchestrator by moving on
/// to the next provider or the fallback library; never surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned status {status}")]
    Status {
        provider: String,
        status: reqwest::StatusCode,
    },
    #[error("{provider} response had no message content")]
    MissingContent { provider: String },
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

pub struct ChatCompletionClient {
    name: String,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
    client: Client,
}

impl ChatCompletionClient {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            api_key,
            model,
            timeout,
            client,
        }
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_ROLE},
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.8
        });

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: self.name.clone(),
                source,
            })?;

        if !res.status().is_success() {
            return Err(ProviderError::Status {
                provider: self.name.clone(),
                status: res.status(),
            });
        }

        let body: Value = res.json().await.map_err(|source| ProviderError::Transport {
            provider: self.name.clone(),
            source,
        })?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::MissingContent {
                provider: self.name.clone(),
            })
    }
}

/// One client per configured API key, in priority order. An empty result
/// means the service runs offline-only.
pub fn build_providers(config: &Config, client: Client) -> Vec<Arc<dyn CompletionProvider>> {
    let timeout = Duration::from_secs(config.provider_timeout_secs);
    let mut providers: Vec<Arc<dyn CompletionProvider>> = Vec::new();

    if let Some(key) = &config.openai_api_key {
        providers.push(Arc::new(ChatCompletionClient::new(
            "openai",
            OPENAI_ENDPOINT,
            key.clone(),
            config.openai_model.clone(),
            timeout,
            client.clone(),
        )));
    }
    if let Some(key) = &config.gemini_api_key {
        providers.push(Arc::new(ChatCompletionClient::new(
            "gemini",
            GEMINI_ENDPOINT,
            key.clone(),
            config.gemini_model.clone(),
            timeout,
            client,
        )));
    }
    providers
}
