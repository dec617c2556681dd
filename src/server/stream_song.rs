//! Audio streaming with single-range `Range` support.

use super::state::{GuardedCatalogStore, ServerState};
use crate::media_store::MediaStore;
use axum::{
    body::Body,
    extract::{FromRequestParts, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, SeekFrom},
};
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

const HEADER_BYTE_RANGE: &str = "Range";
const STREAM_BUFFER_CAPACITY: usize = 4096 * 16;

/// A parsed `Range: bytes=...` header, before validation against the file
/// length. `bytes=-n` keeps n in `end_inclusive` with no start (suffix form).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start_inclusive: Option<u64>,
    end_inclusive: Option<u64>,
}

/// A byte range resolved against a concrete file length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResolvedRange {
    start: u64,
    end: u64,
}

impl ByteRange {
    pub fn new(start_inclusive: Option<u64>, end_inclusive: Option<u64>) -> ByteRange {
        ByteRange {
            start_inclusive,
            end_inclusive,
        }
    }

    fn parse<S: AsRef<str>>(s: S) -> Option<ByteRange> {
        let v = s.as_ref();
        if !v.starts_with("bytes=") {
            return None;
        }

        let v = &v[6..];
        let parts: Vec<&str> = v.split('-').collect();
        if parts.len() != 2 {
            return None;
        }

        let start_inclusive = if parts[0].is_empty() {
            None
        } else {
            Some(parts[0].parse::<u64>().ok()?)
        };
        let end_inclusive = if parts[1].is_empty() {
            None
        } else {
            Some(parts[1].parse::<u64>().ok()?)
        };
        if start_inclusive.is_none() && end_inclusive.is_none() {
            return None;
        }

        Some(ByteRange {
            start_inclusive,
            end_inclusive,
        })
    }

    /// Resolve against the file length. None means the range cannot be
    /// satisfied (start past EOF, inverted bounds, zero-length suffix).
    fn resolve(&self, file_length: u64) -> Option<ResolvedRange> {
        if file_length == 0 {
            return None;
        }
        match (self.start_inclusive, self.end_inclusive) {
            (Some(start), end) => {
                if start >= file_length {
                    return None;
                }
                let end = end.unwrap_or(file_length - 1).min(file_length - 1);
                if start > end {
                    return None;
                }
                Some(ResolvedRange { start, end })
            }
            // Suffix form: the last n bytes.
            (None, Some(n)) => {
                if n == 0 {
                    return None;
                }
                Some(ResolvedRange {
                    start: file_length.saturating_sub(n),
                    end: file_length - 1,
                })
            }
            (None, None) => None,
        }
    }
}

pub struct ByteRangeExtractionError {}

impl IntoResponse for ByteRangeExtractionError {
    fn into_response(self) -> Response {
        StatusCode::BAD_REQUEST.into_response()
    }
}

impl FromRequestParts<ServerState> for Option<ByteRange> {
    type Rejection = ByteRangeExtractionError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        Ok(parts
            .headers
            .get(HEADER_BYTE_RANGE)
            .map(|x| x.to_str())
            .map(|x| x.ok())
            .and_then(|x| x.and_then(ByteRange::parse)))
    }
}

pub async fn stream_song(
    byte_range: Option<ByteRange>,
    State(catalog_store): State<GuardedCatalogStore>,
    State(media_store): State<MediaStore>,
    Path(id): Path<i64>,
) -> Response {
    let song = match catalog_store.get_song(id) {
        Ok(Some(song)) => song,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Could not load song {} for streaming: {}", id, err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    debug!("Streaming song: {}", song.title);

    let path = media_store.resolve(&song.file_path);
    let mut file = match File::open(&path).await {
        Ok(x) => x,
        Err(err) => {
            error!("Could not open {} for streaming: {}", path.display(), err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let file_length = match file.metadata().await {
        Ok(x) => x.len(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let resolved = match byte_range {
        None => None,
        Some(range) => match range.resolve(file_length) {
            Some(resolved) => Some(resolved),
            None => {
                return Response::builder()
                    .status(StatusCode::RANGE_NOT_SATISFIABLE)
                    .header("Content-Range", format!("bytes */{}", file_length))
                    .body(Body::empty())
                    .unwrap()
            }
        },
    };

    let (status_code, start, chunk_size) = match resolved {
        None => (StatusCode::OK, 0, file_length),
        Some(ResolvedRange { start, end }) => {
            (StatusCode::PARTIAL_CONTENT, start, end - start + 1)
        }
    };

    if start > 0 && file.seek(SeekFrom::Start(start)).await.is_err() {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let stream = ReaderStream::with_capacity(file.take(chunk_size), STREAM_BUFFER_CAPACITY);
    let body = Body::from_stream(stream);

    let mut builder = Response::builder()
        .status(status_code)
        .header("Content-Type", song.mime_type)
        .header("Accept-Ranges", "bytes")
        .header("Content-length", chunk_size);
    if status_code == StatusCode::PARTIAL_CONTENT {
        builder = builder.header(
            "Content-Range",
            format!("bytes {}-{}/{}", start, start + chunk_size - 1, file_length),
        );
    }
    builder.body(body).unwrap()
}
