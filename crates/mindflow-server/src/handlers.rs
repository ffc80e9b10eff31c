//! HTTP Handlers
//!
//! One POST endpoint per orchestrator operation. Every handler locks its
//! session's mutex for the duration of the call, so operations against a
//! single session are serialized; sessions never share state.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mindflow_core::AgentError;
use mindflow_core::contract::{
    AnswerEvalOutput, CheatsheetOutput, ConfigOutput, DeepDiveOutput, FlashcardOutput,
    InteractiveOutput, MermaidOutput, QuestionOutput, RetentionOutput, SummaryOutput,
};
use mindflow_tutor::{LearningState, SafetyReport, TopicStart};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model_connected: bool,
}

/// Structured error surfaced to the caller. `message` is always the
/// user-facing text; raw detail is only logged.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTopicRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    pub topic: String,
    #[serde(default)]
    pub user_background: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTopicResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub start: TopicStart,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtopicRequest {
    pub session_id: Uuid,
    pub subtopic: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub session_id: Uuid,
    pub subtopic: String,
    pub user_answer: String,
    #[serde(default)]
    pub correct_answer: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptsRequest {
    pub session_id: Uuid,
    pub concepts: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyCheckRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    pub content: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    pub session_id: Uuid,
    pub user_input: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    pub next_agent: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveRequest {
    pub session_id: Uuid,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureRequest {
    pub session_id: Uuid,
    pub request: String,
}

// ============================================================================
// Error mapping
// ============================================================================

fn api_error(err: AgentError) -> ApiError {
    let (status, kind) = match &err {
        AgentError::Parse(_) => (StatusCode::BAD_GATEWAY, "PARSE_ERROR"),
        AgentError::InvalidResponse { .. } => (StatusCode::BAD_GATEWAY, "INVALID_RESPONSE_FORMAT"),
        AgentError::SafetyDeclined(_) => (StatusCode::BAD_GATEWAY, "SAFETY_DECLINED"),
        AgentError::Provider(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
        AgentError::ProviderUnavailable(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_UNAVAILABLE")
        }
        AgentError::Network(_) => (StatusCode::SERVICE_UNAVAILABLE, "NETWORK_ERROR"),
        AgentError::Session(_) => (StatusCode::CONFLICT, "NO_ACTIVE_TOPIC"),
        AgentError::UnknownAgent(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_AGENT"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };

    tracing::error!(error = %err, kind, "request failed");

    (
        status,
        Json(ErrorResponse {
            kind: kind.into(),
            message: err.user_message(),
        }),
    )
}

fn session_not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            kind: "SESSION_NOT_FOUND".into(),
            message: "Unknown session. Please start a new topic.".into(),
        }),
    )
}

/// Best-effort client IP from proxy headers, used only as a location hint
/// for crisis-resource lookup.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        model_connected,
    })
}

/// Start a new learning topic, creating a session when none is supplied.
pub async fn start_topic(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<StartTopicRequest>,
) -> Result<Json<StartTopicResponse>, ApiError> {
    let session_id = match payload.session_id {
        Some(id) => id,
        None => state.create_session(client_ip(&headers)).await,
    };
    let session = state.session(session_id).await.ok_or_else(session_not_found)?;

    let start = session
        .lock()
        .await
        .start_new_topic(&payload.topic, payload.user_background.as_deref())
        .await
        .map_err(api_error)?;

    Ok(Json(StartTopicResponse { session_id, start }))
}

/// Explain one subtopic
pub async fn get_explanation(
    State(state): State<AppState>,
    Json(payload): Json<SubtopicRequest>,
) -> Result<Json<DeepDiveOutput>, ApiError> {
    let session = state
        .session(payload.session_id)
        .await
        .ok_or_else(session_not_found)?;

    let explanation = session
        .lock()
        .await
        .explanation(&payload.subtopic)
        .await
        .map_err(api_error)?;

    Ok(Json(explanation))
}

/// Pose a quiz question
pub async fn get_quiz(
    State(state): State<AppState>,
    Json(payload): Json<SubtopicRequest>,
) -> Result<Json<QuestionOutput>, ApiError> {
    let session = state
        .session(payload.session_id)
        .await
        .ok_or_else(session_not_found)?;

    let question = session
        .lock()
        .await
        .quiz_question(&payload.subtopic)
        .await
        .map_err(api_error)?;

    Ok(Json(question))
}

/// Grade the learner's answer
pub async fn get_feedback(
    State(state): State<AppState>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<Json<AnswerEvalOutput>, ApiError> {
    let session = state
        .session(payload.session_id)
        .await
        .ok_or_else(session_not_found)?;

    let evaluation = session
        .lock()
        .await
        .feedback(
            &payload.subtopic,
            &payload.user_answer,
            payload.correct_answer.as_deref(),
        )
        .await
        .map_err(api_error)?;

    Ok(Json(evaluation))
}

/// End-of-session summary
pub async fn get_summary(
    State(state): State<AppState>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<SummaryOutput>, ApiError> {
    let session = state
        .session(payload.session_id)
        .await
        .ok_or_else(session_not_found)?;

    let summary = session
        .lock()
        .await
        .session_summary()
        .await
        .map_err(api_error)?;

    Ok(Json(summary))
}

/// Memory aids for the given concepts
pub async fn get_retention(
    State(state): State<AppState>,
    Json(payload): Json<ConceptsRequest>,
) -> Result<Json<RetentionOutput>, ApiError> {
    let session = state
        .session(payload.session_id)
        .await
        .ok_or_else(session_not_found)?;

    let aids = session
        .lock()
        .await
        .retention_aids(&payload.concepts)
        .await
        .map_err(api_error)?;

    Ok(Json(aids))
}

/// Safety classification with crisis-resource escalation. Works with or
/// without an existing session; the check itself never fails.
pub async fn check_safety(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SafetyCheckRequest>,
) -> Result<Json<SafetyReport>, ApiError> {
    let report = match payload.session_id {
        Some(id) => {
            let session = state.session(id).await.ok_or_else(session_not_found)?;
            let guard = session.lock().await;
            guard
                .check_content_safety(&payload.content, payload.context.as_deref())
                .await
        }
        None => {
            let session = state.build_session(client_ip(&headers));
            session
                .check_content_safety(&payload.content, payload.context.as_deref())
                .await
        }
    };

    Ok(Json(report))
}

/// Route free-form input to the best-suited agent
pub async fn classify(
    State(state): State<AppState>,
    Json(payload): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let session = state
        .session(payload.session_id)
        .await
        .ok_or_else(session_not_found)?;

    let next_agent = session
        .lock()
        .await
        .classify_next_agent(&payload.user_input)
        .await
        .map_err(api_error)?;

    Ok(Json(ClassifyResponse {
        next_agent: next_agent.name().into(),
    }))
}

/// Free-form tutoring turn
pub async fn interactive(
    State(state): State<AppState>,
    Json(payload): Json<InteractiveRequest>,
) -> Result<Json<InteractiveOutput>, ApiError> {
    let session = state
        .session(payload.session_id)
        .await
        .ok_or_else(session_not_found)?;

    let reply = session
        .lock()
        .await
        .interactive_turn(&payload.message)
        .await
        .map_err(api_error)?;

    Ok(Json(reply))
}

/// Apply a tutoring-style preference
pub async fn configure(
    State(state): State<AppState>,
    Json(payload): Json<ConfigureRequest>,
) -> Result<Json<ConfigOutput>, ApiError> {
    let session = state
        .session(payload.session_id)
        .await
        .ok_or_else(session_not_found)?;

    let config = session
        .lock()
        .await
        .configure(&payload.request)
        .await
        .map_err(api_error)?;

    Ok(Json(config))
}

/// Flashcards for the given concepts
pub async fn get_flashcards(
    State(state): State<AppState>,
    Json(payload): Json<ConceptsRequest>,
) -> Result<Json<FlashcardOutput>, ApiError> {
    let session = state
        .session(payload.session_id)
        .await
        .ok_or_else(session_not_found)?;

    let cards = session
        .lock()
        .await
        .flashcards(&payload.concepts)
        .await
        .map_err(api_error)?;

    Ok(Json(cards))
}

/// One-page session reference
pub async fn get_cheatsheet(
    State(state): State<AppState>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<CheatsheetOutput>, ApiError> {
    let session = state
        .session(payload.session_id)
        .await
        .ok_or_else(session_not_found)?;

    let sheet = session.lock().await.cheatsheet().await.map_err(api_error)?;

    Ok(Json(sheet))
}

/// Concept-relationship diagram for the learning path
pub async fn get_diagram(
    State(state): State<AppState>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<MermaidOutput>, ApiError> {
    let session = state
        .session(payload.session_id)
        .await
        .ok_or_else(session_not_found)?;

    let diagram = session
        .lock()
        .await
        .concept_diagram()
        .await
        .map_err(api_error)?;

    Ok(Json(diagram))
}

/// Read-only state snapshot for a session
pub async fn session_state(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LearningState>, ApiError> {
    let session = state.session(id).await.ok_or_else(session_not_found)?;
    let snapshot = session.lock().await.state().clone();
    Ok(Json(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping_kinds() {
        let (status, Json(body)) = api_error(AgentError::Parse("bad".into()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.kind, "PARSE_ERROR");

        let (status, Json(body)) = api_error(AgentError::Network("down".into()));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.kind, "NETWORK_ERROR");

        let (status, Json(body)) = api_error(AgentError::Session("no topic".into()));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.kind, "NO_ACTIVE_TOPIC");
    }

    #[test]
    fn test_error_message_is_user_facing() {
        let (_, Json(body)) = api_error(AgentError::Parse("raw model text: {oops".into()));
        assert!(!body.message.contains("oops"));
    }

    #[test]
    fn test_request_wire_names() {
        let payload: FeedbackRequest = serde_json::from_value(serde_json::json!({
            "sessionId": "7f1b3a88-9a50-4b1f-bf2a-8c3a5f1d2e49",
            "subtopic": "Light Reactions",
            "userAnswer": "chlorophyll",
        }))
        .unwrap();
        assert_eq!(payload.subtopic, "Light Reactions");
        assert!(payload.correct_answer.is_none());
    }

    #[test]
    fn test_client_ip_takes_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));

        let empty = HeaderMap::new();
        assert!(client_ip(&empty).is_none());
    }
}
