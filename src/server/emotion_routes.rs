//! Emotion detection, statistics and per-session history routes.

use super::state::{GuardedDetector, GuardedEmotionLogStore, ServerState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Deserialize, Debug)]
struct DetectBody {
    image_data: String,
    session_id: Option<String>,
}

#[derive(Serialize)]
struct DetectResponse {
    emotion: crate::emotion::EmotionLabel,
    confidence: f64,
    timestamp: i64,
    session_id: Option<String>,
}

async fn detect(
    State(detector): State<GuardedDetector>,
    Json(body): Json<DetectBody>,
) -> Response {
    if body.image_data.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing image data").into_response();
    }

    match detector.detect(&body.image_data, body.session_id).await {
        Ok(log) => Json(DetectResponse {
            emotion: log.emotion,
            confidence: log.confidence,
            timestamp: log.timestamp,
            session_id: log.session_id,
        })
        .into_response(),
        Err(err) => {
            error!("Could not record detection: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn statistics(State(log_store): State<GuardedEmotionLogStore>) -> Response {
    match log_store.counts_by_emotion() {
        Ok(counts) => {
            // Serialize through label strings so the keys come out lowercase.
            let body: std::collections::HashMap<&'static str, i64> = counts
                .into_iter()
                .map(|(label, count)| (label.as_str(), count))
                .collect();
            Json(body).into_response()
        }
        Err(err) => {
            error!("Could not aggregate emotion statistics: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn session_history(
    State(log_store): State<GuardedEmotionLogStore>,
    Path(session_id): Path<String>,
) -> Response {
    match log_store.logs_by_session(&session_id) {
        Ok(logs) => Json(logs).into_response(),
        Err(err) => {
            error!("Could not load history for session {}: {}", session_id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn make_emotion_routes(state: ServerState) -> Router {
    Router::new()
        .route("/detect", post(detect))
        .route("/statistics", get(statistics))
        .route("/sessions/{session_id}", get(session_history))
        .with_state(state)
}
