//! MindFlow HTTP Server
//!
//! Axum-based server exposing the tutoring orchestrator: one POST endpoint
//! per session operation, plus health and state-snapshot endpoints.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mindflow_core::{GenerationOptions, ModelProvider};
use mindflow_runtime::GeminiProvider;
use mindflow_tutor::GeoResourceLookup;

use crate::handlers::{
    check_safety, classify, configure, get_cheatsheet, get_diagram, get_explanation,
    get_feedback, get_flashcards, get_quiz, get_retention, get_summary, health_check,
    interactive, session_state, start_topic,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Initialize model provider
    let provider = Arc::new(GeminiProvider::from_env()?);
    let options = GenerationOptions {
        model: provider.model().to_string(),
        ..Default::default()
    };

    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to Gemini ({})", options.model),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Gemini not reachable - agent calls will fail");
            tracing::warn!("  Check GEMINI_API_KEY and network access");
        }
    }

    // Crisis-resource lookup for safety escalation
    let resources = Arc::new(GeoResourceLookup::new());

    // Build application state
    let state = AppState::new(provider, resources, options);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health
        .route("/health", get(health_check))
        // Core session operations
        .route("/api/start-topic", post(start_topic))
        .route("/api/get-explanation", post(get_explanation))
        .route("/api/get-quiz", post(get_quiz))
        .route("/api/get-feedback", post(get_feedback))
        .route("/api/get-summary", post(get_summary))
        .route("/api/get-retention", post(get_retention))
        .route("/api/check-safety", post(check_safety))
        // Supplemental operations
        .route("/api/classify", post(classify))
        .route("/api/interactive", post(interactive))
        .route("/api/configure", post(configure))
        .route("/api/flashcards", post(get_flashcards))
        .route("/api/cheatsheet", post(get_cheatsheet))
        .route("/api/diagram", post(get_diagram))
        // Session inspection
        .route("/api/session/{id}/state", get(session_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("MindFlow server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                  - Health check");
    tracing::info!("  POST /api/start-topic         - Begin a learning topic");
    tracing::info!("  POST /api/get-explanation     - Explain a subtopic");
    tracing::info!("  POST /api/get-quiz            - Pose a quiz question");
    tracing::info!("  POST /api/get-feedback        - Grade an answer");
    tracing::info!("  POST /api/get-summary         - Session summary");
    tracing::info!("  POST /api/get-retention       - Memory aids");
    tracing::info!("  POST /api/check-safety        - Safety classification");
    tracing::info!("  GET  /api/session/{{id}}/state - Session snapshot");

    axum::serve(listener, app).await?;

    Ok(())
}
