//! Per-emotion playlist routes.

use super::song_routes::parse_emotion_label;
use super::state::{GuardedCatalogStore, ServerState};
use crate::catalog_store::PlaylistError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::error;

async fn get_playlist(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(label): Path<String>,
) -> Response {
    let emotion = match parse_emotion_label(&label) {
        Ok(x) => x,
        Err(response) => return response,
    };
    match catalog_store.get_or_create_playlist(emotion) {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => {
            error!("Could not load playlist for {}: {}", emotion, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn rebuild_playlist(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(label): Path<String>,
) -> Response {
    let emotion = match parse_emotion_label(&label) {
        Ok(x) => x,
        Err(response) => return response,
    };
    match catalog_store.rebuild_playlist(emotion) {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => {
            error!("Could not rebuild playlist for {}: {}", emotion, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn add_song(
    State(catalog_store): State<GuardedCatalogStore>,
    Path((label, song_id)): Path<(String, i64)>,
) -> Response {
    let emotion = match parse_emotion_label(&label) {
        Ok(x) => x,
        Err(response) => return response,
    };
    match catalog_store.add_song_to_playlist(emotion, song_id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(PlaylistError::SongNotFound(id)) => {
            (StatusCode::NOT_FOUND, format!("Song {} does not exist", id)).into_response()
        }
        Err(PlaylistError::PlaylistNotFound(emotion)) => (
            StatusCode::NOT_FOUND,
            format!("No playlist exists for {}", emotion),
        )
            .into_response(),
        Err(PlaylistError::Storage(err)) => {
            error!("Could not add song {} to {} playlist: {}", song_id, emotion, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn remove_song(
    State(catalog_store): State<GuardedCatalogStore>,
    Path((label, song_id)): Path<(String, i64)>,
) -> Response {
    let emotion = match parse_emotion_label(&label) {
        Ok(x) => x,
        Err(response) => return response,
    };
    match catalog_store.remove_song_from_playlist(emotion, song_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(PlaylistError::SongNotFound(id)) => {
            (StatusCode::NOT_FOUND, format!("Song {} does not exist", id)).into_response()
        }
        Err(PlaylistError::PlaylistNotFound(emotion)) => (
            StatusCode::NOT_FOUND,
            format!("No playlist exists for {}", emotion),
        )
            .into_response(),
        Err(PlaylistError::Storage(err)) => {
            error!(
                "Could not remove song {} from {} playlist: {}",
                song_id, emotion, err
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn make_playlist_routes(state: ServerState) -> Router {
    Router::new()
        .route("/emotion/{label}", get(get_playlist))
        .route("/emotion/{label}", post(rebuild_playlist))
        .route("/emotion/{label}/songs/{song_id}", post(add_song))
        .route("/emotion/{label}/songs/{song_id}", delete(remove_song))
        .with_state(state)
}
