//! Test fixtures: audio payloads and a stub classifier server.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use std::sync::Arc;

/// A minimal but plausible MP3 payload: an ID3v2 header followed by padding.
pub fn test_mp3_bytes() -> Vec<u8> {
    let mut bytes = vec![b'I', b'D', b'3', 3, 0, 0, 0, 0, 0, 0];
    bytes.extend(std::iter::repeat(0xAAu8).take(4096));
    bytes
}

/// A minimal RIFF/WAVE payload.
pub fn test_wav_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(2048u32 + 36).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend(std::iter::repeat(0u8).take(20));
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&2048u32.to_le_bytes());
    bytes.extend(std::iter::repeat(0x55u8).take(2048));
    bytes
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: Arc<serde_json::Value>,
}

/// An in-process stand-in for the external face-emotion analysis service.
/// Answers every POST /analyze with a canned status and body.
pub struct StubClassifier {
    /// URL to point the server's classifier at.
    pub url: String,
    _shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl StubClassifier {
    pub async fn spawn(status: StatusCode, body: serde_json::Value) -> Self {
        let state = StubState {
            status,
            body: Arc::new(body),
        };
        let app = Router::new()
            .route("/analyze", post(analyze))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub classifier");
        let port = listener.local_addr().unwrap().port();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Stub classifier failed");
        });

        Self {
            url: format!("http://127.0.0.1:{}/analyze", port),
            _shutdown_tx: shutdown_tx,
        }
    }

    /// A stub that always detects the given emotion with the given score.
    pub async fn detecting(emotion: &str, score: f64) -> Self {
        Self::spawn(
            StatusCode::OK,
            serde_json::json!({
                "results": {"0": {"emotion": {emotion: score}}}
            }),
        )
        .await
    }
}

async fn analyze(State(state): State<StubState>) -> impl IntoResponse {
    (state.status, Json(state.body.as_ref().clone()))
}
