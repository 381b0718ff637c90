//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API, WebSocket endpoint, and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        ErrorResponse, ExplainResponse, GameResponse, GenerateTextPayload, GeneratedTextResponse,
        LearningPayload, QuizQuestionDto, TranscriptResponse,
    },
    state::AppState,
    ws::ws_handler,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::generate_game,
        handlers::generate_quiz,
        handlers::explain_topic,
        handlers::generate_text,
        handlers::transcribe_audio,
    ),
    components(
        schemas(LearningPayload, GenerateTextPayload, GameResponse, QuizQuestionDto, ExplainResponse, GeneratedTextResponse, TranscriptResponse, ErrorResponse)
    ),
    tags(
        (name = "Sprout API", description = "Generated learning artifacts and voice access")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route("/game", post(handlers::generate_game))
        .route("/quiz", post(handlers::generate_quiz))
        .route("/explain", post(handlers::explain_topic))
        .route("/generate_text", post(handlers::generate_text))
        .route("/transcribe", post(handlers::transcribe_audio))
        .route("/ws", get(ws_handler))
        // Apply the state ONLY to this group of routes.
        .with_state(app_state);

    // Create the final router that merges the stateful routes
    // with the stateless routes (like Swagger UI).
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(handlers::read_root))
        .route("/health", get(handlers::health_check))
        .merge(api_router)
}
