//! Axum Handlers for the REST API
//!
//! This module contains the HTTP entry points for the generation pipeline
//! and the transcription endpoint. It uses `utoipa` doc comments to generate
//! OpenAPI documentation, and translates the core error taxonomy into HTTP
//! statuses at this boundary -- no raw transport errors reach clients.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use sprout_core::{
    PipelineError,
    pipeline::GeneratedArtifact,
    request::{AccommodationTag, GenerationRequest, LearnerProfile, RawGenerationRequest},
};
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    models::{
        ErrorResponse, ExplainResponse, GameResponse, GenerateTextPayload, GeneratedTextResponse,
        LearningPayload, QuizQuestionDto, TranscriptResponse,
    },
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    ServiceUnavailable(String),
    UpstreamFailure(String),
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::ServiceUnavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
            ApiError::UpstreamFailure(message) => (StatusCode::BAD_GATEWAY, message),
            ApiError::InternalServerError(detail) => {
                error!("Internal Server Error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidRequest(message) => ApiError::BadRequest(message),
            PipelineError::ServiceUnavailable(detail) => {
                error!(%detail, "reasoning service unreachable");
                ApiError::ServiceUnavailable(
                    "The learning helper is unreachable right now. Please try again in a moment."
                        .to_string(),
                )
            }
            PipelineError::ServiceRejected(detail) => {
                error!(%detail, "reasoning service rejected the request");
                ApiError::UpstreamFailure(
                    "The learning helper could not handle that request. Please try again."
                        .to_string(),
                )
            }
            PipelineError::MalformedResponse(detail) => {
                error!(%detail, "reasoning service reply was not parseable");
                ApiError::UpstreamFailure(
                    "The learning helper gave a confusing answer. Please try again.".to_string(),
                )
            }
            PipelineError::SchemaViolation { mode, detail } => {
                error!(%mode, %detail, "reasoning service reply violated the schema");
                ApiError::UpstreamFailure(
                    "The learning helper gave a confusing answer. Please try again.".to_string(),
                )
            }
            // Internal invariant violation: log the detail, never expose it.
            PipelineError::CompilationError(detail) => ApiError::InternalServerError(detail),
        }
    }
}

fn normalize(payload: &LearningPayload, mode: &str) -> Result<GenerationRequest, ApiError> {
    Ok(GenerationRequest::normalize(RawGenerationRequest {
        name: String::new(),
        age: payload.age,
        accommodation: payload.disability.clone(),
        subject: payload.subject.clone(),
        topic: payload.topic.clone(),
        mode: mode.to_string(),
    })?)
}

fn profile_from(age: i64, disability: &str) -> Result<LearnerProfile, ApiError> {
    if !(1..=18).contains(&age) {
        return Err(ApiError::BadRequest(format!(
            "age must be between 1 and 18, got {}",
            age
        )));
    }
    Ok(LearnerProfile {
        name: String::new(),
        age: age as u8,
        accommodation: AccommodationTag::parse(disability),
    })
}

/// Generate a playable mini-game for a topic.
#[utoipa::path(
    post,
    path = "/game",
    request_body = LearningPayload,
    responses(
        (status = 200, description = "Game generated successfully", body = GameResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 502, description = "The reasoning service produced unusable output", body = ErrorResponse),
        (status = 503, description = "The reasoning service is unreachable", body = ErrorResponse)
    )
)]
pub async fn generate_game(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LearningPayload>,
) -> Result<Json<GameResponse>, ApiError> {
    info!(topic = %payload.topic, "Creating mini-game");
    let request = normalize(&payload, "game")?;
    match state.generator.generate(&request).await? {
        GeneratedArtifact::Game { design, bundle } => {
            info!(title = %bundle.title, "Generated mini-game");
            Ok(Json(GameResponse::from_parts(design, bundle)))
        }
        _ => Err(ApiError::InternalServerError(
            "game request produced a non-game artifact".to_string(),
        )),
    }
}

/// Generate quiz questions for a topic.
#[utoipa::path(
    post,
    path = "/quiz",
    request_body = LearningPayload,
    responses(
        (status = 200, description = "Quiz generated successfully", body = [QuizQuestionDto]),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 502, description = "The reasoning service produced unusable output", body = ErrorResponse),
        (status = 503, description = "The reasoning service is unreachable", body = ErrorResponse)
    )
)]
pub async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LearningPayload>,
) -> Result<Json<Vec<QuizQuestionDto>>, ApiError> {
    info!(subject = %payload.subject, topic = %payload.topic, "Creating quiz");
    let request = normalize(&payload, "quiz")?;
    match state.generator.generate(&request).await? {
        GeneratedArtifact::Quiz(questions) => {
            info!(count = questions.len(), "Generated quiz questions");
            Ok(Json(questions.into_iter().map(Into::into).collect()))
        }
        _ => Err(ApiError::InternalServerError(
            "quiz request produced a non-quiz artifact".to_string(),
        )),
    }
}

/// Generate an explanatory lesson for a topic.
#[utoipa::path(
    post,
    path = "/explain",
    request_body = LearningPayload,
    responses(
        (status = 200, description = "Explanation generated successfully", body = ExplainResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 502, description = "The reasoning service produced unusable output", body = ErrorResponse),
        (status = 503, description = "The reasoning service is unreachable", body = ErrorResponse)
    )
)]
pub async fn explain_topic(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LearningPayload>,
) -> Result<Json<ExplainResponse>, ApiError> {
    info!(topic = %payload.topic, "Creating explanation");
    let request = normalize(&payload, "lesson")?;
    match state.generator.generate(&request).await? {
        GeneratedArtifact::Lesson(lesson) => Ok(Json(lesson.into())),
        _ => Err(ApiError::InternalServerError(
            "lesson request produced a non-lesson artifact".to_string(),
        )),
    }
}

/// Generate a short piece of text from an ad hoc prompt.
#[utoipa::path(
    post,
    path = "/generate_text",
    request_body = GenerateTextPayload,
    responses(
        (status = 200, description = "Text generated successfully", body = GeneratedTextResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 502, description = "The reasoning service produced unusable output", body = ErrorResponse),
        (status = 503, description = "The reasoning service is unreachable", body = ErrorResponse)
    )
)]
pub async fn generate_text(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerateTextPayload>,
) -> Result<Json<GeneratedTextResponse>, ApiError> {
    let profile = profile_from(payload.age, &payload.disability)?;
    let generated_text = state
        .generator
        .generate_text(&payload.prompt, &profile)
        .await?;
    Ok(Json(GeneratedTextResponse { generated_text }))
}

/// Transcribe an uploaded audio recording.
#[utoipa::path(
    post,
    path = "/transcribe",
    responses(
        (status = 200, description = "Audio transcribed successfully", body = TranscriptResponse),
        (status = 400, description = "Upload was not an audio file", body = ErrorResponse),
        (status = 502, description = "Transcription provider failed", body = ErrorResponse),
        (status = 503, description = "No transcription provider configured", body = ErrorResponse)
    )
)]
pub async fn transcribe_audio(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let transcriber = state.transcriber.clone().ok_or_else(|| {
        ApiError::ServiceUnavailable(
            "Transcription is not configured on this server.".to_string(),
        )
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let mime = field.content_type().unwrap_or("").to_string();
        if !mime.starts_with("audio/") {
            return Err(ApiError::BadRequest(
                "File must be an audio file".to_string(),
            ));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let transcript = transcriber
            .transcribe(data.to_vec(), &mime)
            .await
            .map_err(|e| {
                error!(error = %e, "transcription provider failed");
                ApiError::UpstreamFailure("Transcription failed. Please try again.".to_string())
            })?;
        info!("Audio transcribed successfully");
        return Ok(Json(TranscriptResponse { transcript }));
    }

    Err(ApiError::BadRequest(
        "multipart upload must contain an `audio` field".to_string(),
    ))
}

/// Service banner.
pub async fn read_root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Sprout learning hub is live",
        "version": env!("CARGO_PKG_VERSION"),
        "features": [
            "on-the-spot game generation",
            "quiz and lesson generation",
            "accommodation-aware adaptations",
            "voice transcription",
        ],
    }))
}

/// Liveness check.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "version": env!("CARGO_PKG_VERSION") }))
}
