//! Song catalog routes: listing, search, upload, download, deletion.

use super::state::{GuardedCatalogStore, ServerState};
use super::stream_song::stream_song;
use crate::catalog_store::NewSong;
use crate::emotion::EmotionLabel;
use crate::media_store::MediaStore;
use crate::server::metrics::set_catalog_songs;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::error;

/// Exactly 10 MiB is still accepted.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Body cap leaves headroom for the non-file multipart fields.
const MAX_UPLOAD_BODY_BYTES: usize = 12 * 1024 * 1024;
const MAX_TEXT_FIELD_CHARS: usize = 255;

const ACCEPTED_MIME_TYPES: [&str; 2] = ["audio/mpeg", "audio/wav"];

/// Strict parse for labels arriving in paths and form fields. Anything
/// outside the taxonomy is a client error.
pub(super) fn parse_emotion_label(label: &str) -> Result<EmotionLabel, Response> {
    EmotionLabel::from_name(label).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("Invalid emotion label: {}", label),
        )
            .into_response()
    })
}

async fn list_songs(State(catalog_store): State<GuardedCatalogStore>) -> Response {
    match catalog_store.list_songs() {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => {
            error!("Could not list songs: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn songs_by_emotion(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(label): Path<String>,
) -> Response {
    let emotion = match parse_emotion_label(&label) {
        Ok(x) => x,
        Err(response) => return response,
    };
    match catalog_store.songs_by_emotion(emotion) {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => {
            error!("Could not list songs for {}: {}", emotion, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn songs_by_emotion_random(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(label): Path<String>,
) -> Response {
    let emotion = match parse_emotion_label(&label) {
        Ok(x) => x,
        Err(response) => return response,
    };
    match catalog_store.songs_by_emotion_shuffled(emotion) {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => {
            error!("Could not shuffle songs for {}: {}", emotion, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_song(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> Response {
    match catalog_store.get_song(id) {
        Ok(Some(song)) => Json(song).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Could not load song {}: {}", id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

async fn search_songs(
    State(catalog_store): State<GuardedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let q = match query.q.as_deref() {
        Some(q) if !q.is_empty() => q,
        _ => return Json(Vec::<crate::catalog_store::Song>::new()).into_response(),
    };
    match catalog_store.search_songs(q) {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => {
            error!("Song search failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

struct UploadFields {
    file_name: Option<String>,
    mime_type: Option<String>,
    data: Vec<u8>,
    title: Option<String>,
    artist: Option<String>,
    emotion: Option<String>,
}

async fn collect_upload_fields(mut multipart: Multipart) -> Result<UploadFields, Response> {
    let mut fields = UploadFields {
        file_name: None,
        mime_type: None,
        data: Vec::new(),
        title: None,
        artist: None,
        emotion: None,
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Err(
                    (StatusCode::BAD_REQUEST, format!("Malformed upload: {}", err))
                        .into_response(),
                )
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                fields.file_name = field.file_name().map(|s| s.to_string());
                fields.mime_type = field.content_type().map(|s| s.to_string());
                fields.data = match field.bytes().await {
                    Ok(bytes) => bytes.to_vec(),
                    Err(err) => {
                        return Err((
                            StatusCode::BAD_REQUEST,
                            format!("Could not read file part: {}", err),
                        )
                            .into_response())
                    }
                };
            }
            "title" | "artist" | "emotion" => {
                let value = match field.text().await {
                    Ok(text) => text,
                    Err(err) => {
                        return Err((
                            StatusCode::BAD_REQUEST,
                            format!("Could not read {} field: {}", name, err),
                        )
                            .into_response())
                    }
                };
                match name.as_str() {
                    "title" => fields.title = Some(value),
                    "artist" => fields.artist = Some(value),
                    _ => fields.emotion = Some(value),
                }
            }
            _ => {}
        }
    }

    Ok(fields)
}

fn validated_text_field(value: Option<String>, name: &str) -> Result<String, Response> {
    let value = value.unwrap_or_default().trim().to_string();
    if value.is_empty() {
        return Err((StatusCode::BAD_REQUEST, format!("Missing {}", name)).into_response());
    }
    if value.chars().count() > MAX_TEXT_FIELD_CHARS {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("{} exceeds {} characters", name, MAX_TEXT_FIELD_CHARS),
        )
            .into_response());
    }
    Ok(value)
}

async fn upload_song(
    State(catalog_store): State<GuardedCatalogStore>,
    State(media_store): State<MediaStore>,
    multipart: Multipart,
) -> Response {
    let fields = match collect_upload_fields(multipart).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    let title = match validated_text_field(fields.title, "title") {
        Ok(x) => x,
        Err(response) => return response,
    };
    let artist = match validated_text_field(fields.artist, "artist") {
        Ok(x) => x,
        Err(response) => return response,
    };
    let emotion = match parse_emotion_label(fields.emotion.unwrap_or_default().trim()) {
        Ok(x) => x,
        Err(response) => return response,
    };

    if fields.data.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing or empty file").into_response();
    }
    if fields.data.len() > MAX_UPLOAD_BYTES {
        return (
            StatusCode::BAD_REQUEST,
            format!(
                "File too large ({:#}), the limit is {:#}",
                byte_unit::Byte::from(fields.data.len()),
                byte_unit::Byte::from(MAX_UPLOAD_BYTES)
            ),
        )
            .into_response();
    }
    let mime_type = fields.mime_type.unwrap_or_default();
    if !ACCEPTED_MIME_TYPES.contains(&mime_type.as_str()) {
        return (
            StatusCode::BAD_REQUEST,
            format!("Unsupported file type: {}", mime_type),
        )
            .into_response();
    }

    // Bytes land on disk before the catalog row exists.
    let file_path = match media_store
        .save(fields.file_name.as_deref(), &mime_type, &fields.data)
        .await
    {
        Ok(name) => name,
        Err(err) => {
            error!("Could not store uploaded file: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let new_song = NewSong {
        title,
        artist,
        emotion,
        file_path,
        file_size: fields.data.len() as i64,
        mime_type,
    };
    match catalog_store.create_song(new_song) {
        Ok(song) => {
            set_catalog_songs(catalog_store.songs_count());
            (StatusCode::CREATED, Json(song)).into_response()
        }
        Err(err) => {
            error!("Could not create catalog record: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn download_song(
    State(catalog_store): State<GuardedCatalogStore>,
    State(media_store): State<MediaStore>,
    Path(id): Path<i64>,
) -> Response {
    let song = match catalog_store.get_song(id) {
        Ok(Some(song)) => song,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Could not load song {} for download: {}", id, err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let path = media_store.resolve(&song.file_path);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(err) => {
            error!("Could not open {} for download: {}", path.display(), err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let extension = std::path::Path::new(&song.file_path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let attachment_name = format!("{}.{}", song.title.replace('"', "'"), extension);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, song.mime_type)
        .header(header::CONTENT_LENGTH, song.file_size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", attachment_name),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .unwrap()
}

async fn delete_song(
    State(catalog_store): State<GuardedCatalogStore>,
    State(media_store): State<MediaStore>,
    Path(id): Path<i64>,
) -> Response {
    let song = match catalog_store.get_song(id) {
        Ok(Some(song)) => song,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Could not load song {} for deletion: {}", id, err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Best-effort file removal, the record always goes.
    media_store.delete(&song.file_path).await;

    match catalog_store.delete_song(id) {
        Ok(true) => {
            set_catalog_songs(catalog_store.songs_count());
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Could not delete song {}: {}", id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn delete_all_songs(
    State(catalog_store): State<GuardedCatalogStore>,
    State(media_store): State<MediaStore>,
) -> Response {
    let songs = match catalog_store.list_songs() {
        Ok(songs) => songs,
        Err(err) => {
            error!("Could not enumerate songs for bulk delete: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    for song in &songs {
        media_store.delete(&song.file_path).await;
    }

    match catalog_store.delete_all_songs() {
        Ok(()) => {
            set_catalog_songs(0);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => {
            error!("Could not delete all songs: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn make_song_routes(state: ServerState) -> Router {
    // "/all" and "/search" before "/{id}" so the literal segments win.
    Router::new()
        .route("/", get(list_songs))
        .route(
            "/",
            post(upload_song).layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES)),
        )
        .route("/search", get(search_songs))
        .route("/all", delete(delete_all_songs))
        .route("/emotion/{label}", get(songs_by_emotion))
        .route("/emotion/{label}/random", get(songs_by_emotion_random))
        .route("/{id}", get(get_song))
        .route("/{id}", delete(delete_song))
        .route("/{id}/download", get(download_song))
        .route("/{id}/stream", get(stream_song))
        .with_state(state)
}
