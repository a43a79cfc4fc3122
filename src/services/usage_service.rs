use crate::models::question::QuestionSource;
use chrono::Utc;
use reqwest::Client;
use tracing::warn;

/// Fire-and-forget delivery of served question ids to an optional tracking
/// webhook. Never blocks or fails the batch response.
#[derive(Clone)]
pub struct UsageService {
    client: Client,
    target_url: Option<String>,
}

impl UsageService {
    pub fn new(client: Client, target_url: Option<String>) -> Self {
        Self { client, target_url }
    }

    pub fn record_served(
        &self,
        session_id: Option<&str>,
        question_ids: &[String],
        source: QuestionSource,
    ) {
        let Some(url) = self.target_url.clone() else {
            return;
        };
        let payload = serde_json::json!({
            "event": "questions_served",
            "session_id": session_id,
            "question_ids": question_ids,
            "source": source,
            "served_at": Utc::now(),
        });
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(res) if res.status().is_success() => {}
                Ok(res) => {
                    warn!(status = %res.status(), "usage sink rejected delivery");
                }
                Err(err) => {
                    warn!(error = %err, "usage sink delivery failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_sink_is_a_noop() {
        // No runtime needed: without a target URL nothing is spawned.
        let service = UsageService::new(Client::new(), None);
        service.record_served(Some("session"), &["q-1".to_string()], QuestionSource::Generated);
    }

    #[test]
    fn delivery_failure_never_reaches_the_caller() {
        let service = UsageService::new(
            Client::new(),
            Some("http://127.0.0.1:9/unreachable".to_string()),
        );
        tokio_test::block_on(async {
            service.record_served(None, &["q-1".to_string()], QuestionSource::LocalBank);
            tokio::task::yield_now().await;
        });
    }
}
