use crate::{
    dto::quiz_dto::{
        GenerateQuizPayload, OfflineSelectionPayload, OfflineSelectionResponse, QuizBatchResponse,
    },
    error::{Error, Result},
    models::question::{Difficulty, QuestionSource},
    services::offline_service,
    AppState,
};
use axum::{extract::State, response::IntoResponse, Json};
use tracing::info;
use validator::Validate;

#[axum::debug_handler]
pub async fn generate_quiz(
    State(state): State<AppState>,
    Json(payload): Json<GenerateQuizPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let config = crate::config::get_config();
    let count = payload.count as usize;
    if count > config.max_questions {
        return Err(Error::BadRequest(format!(
            "count must not exceed {}",
            config.max_questions
        )));
    }
    let difficulty = payload.difficulty.unwrap_or(Difficulty::Medium);

    let (questions, source, warning) = if state.mode_arbiter.is_online() {
        let batch = state
            .generation_service
            .generate_batch(
                &payload.subject,
                payload.objective.as_deref(),
                difficulty,
                count,
            )
            .await?;
        (batch.questions, batch.source, batch.warning)
    } else {
        info!(subject = %payload.subject, "offline: serving batch from the local bank");
        let selection =
            offline_service::select(Some(&payload.subject), payload.objective.as_deref(), count);
        (selection.questions, QuestionSource::LocalBank, selection.warning)
    };

    if questions.is_empty() {
        return Err(Error::Exhausted(
            "no questions could be produced for this request".to_string(),
        ));
    }

    let ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
    state
        .usage_service
        .record_served(payload.session_id.as_deref(), &ids, source);

    Ok(Json(QuizBatchResponse {
        questions,
        source,
        warning,
    }))
}

#[axum::debug_handler]
pub async fn offline_selection(
    State(state): State<AppState>,
    Json(payload): Json<OfflineSelectionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let config = crate::config::get_config();
    let count = payload.count as usize;
    if count > config.max_questions {
        return Err(Error::BadRequest(format!(
            "count must not exceed {}",
            config.max_questions
        )));
    }

    let selection = offline_service::select(
        payload.subject.as_deref(),
        payload.objective.as_deref(),
        count,
    );

    let ids: Vec<String> = selection.questions.iter().map(|q| q.id.clone()).collect();
    state
        .usage_service
        .record_served(None, &ids, QuestionSource::LocalBank);

    Ok(Json(OfflineSelectionResponse {
        questions: selection.questions,
        warning: selection.warning,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mode_service::MockConnectivityProbe;
    use std::sync::Arc;

    fn init_test_config() {
        std::env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("GEMINI_API_KEY");
        let _ = crate::config::init_config();
    }

    #[tokio::test]
    async fn online_arbiter_without_providers_still_serves_a_full_batch() {
        init_test_config();

        // Probe says online, but no provider is configured: every slot must
        // fall back and the request must still succeed.
        let mut probe = MockConnectivityProbe::new();
        probe.expect_is_online().return_const(true);
        let state = crate::AppState::with_probe(Arc::new(probe));

        let payload = GenerateQuizPayload {
            subject: "math".to_string(),
            count: 2,
            objective: None,
            difficulty: None,
            session_id: None,
        };
        let result = generate_quiz(State(state), Json(payload)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn offline_arbiter_routes_to_the_local_bank() {
        init_test_config();

        let mut probe = MockConnectivityProbe::new();
        probe.expect_is_online().return_const(false);
        let state = crate::AppState::with_probe(Arc::new(probe));

        let payload = GenerateQuizPayload {
            subject: "physics".to_string(),
            count: 1,
            objective: None,
            difficulty: None,
            session_id: None,
        };
        let result = generate_quiz(State(state), Json(payload)).await;
        assert!(result.is_ok());
    }
}
