//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own databases and media
//! directory on a random port. Dropping the handle shuts the server down.

use super::constants::*;
use moodify_server::catalog_store::{CatalogStore, SqliteCatalogStore};
use moodify_server::detection::{
    DeepFaceClassifier, EmotionClassifier, EmotionDetector, SimulatedClassifier,
};
use moodify_server::emotion_log::{EmotionLogStore, SqliteEmotionLogStore};
use moodify_server::media_store::MediaStore;
use moodify_server::server::server::make_app;
use moodify_server::server::{RequestsLoggingLevel, ServerConfig};
use moodify_server::user::SqliteUserStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

const READ_POOL_SIZE: usize = 2;

pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Direct store access for assertions that bypass HTTP
    pub catalog_store: Arc<dyn CatalogStore>,
    pub emotion_log_store: Arc<dyn EmotionLogStore>,

    /// The media root the server writes uploads into
    pub media_path: std::path::PathBuf,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a test server backed by the simulated classifier.
    pub async fn spawn() -> Self {
        Self::spawn_inner(None).await
    }

    /// Spawns a test server whose classifier calls the given analyze URL,
    /// usually a `StubClassifier`.
    pub async fn spawn_with_classifier_url(url: &str) -> Self {
        Self::spawn_inner(Some(url.to_string())).await
    }

    async fn spawn_inner(classifier_url: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let media_path = temp_dir.path().join("media");

        let catalog_store = Arc::new(
            SqliteCatalogStore::new(temp_dir.path().join("library.db"), READ_POOL_SIZE)
                .expect("Failed to open catalog store"),
        );
        let emotion_log_store = Arc::new(
            SqliteEmotionLogStore::new(temp_dir.path().join("emotions.db"), READ_POOL_SIZE)
                .expect("Failed to open emotion log store"),
        );
        let user_store = Arc::new(
            SqliteUserStore::new(temp_dir.path().join("users.db"), READ_POOL_SIZE)
                .expect("Failed to open user store"),
        );

        let media_store = MediaStore::new(&media_path);
        media_store
            .init()
            .await
            .expect("Failed to create media dir");

        let classifier: Arc<dyn EmotionClassifier> = match classifier_url {
            Some(url) => Arc::new(
                DeepFaceClassifier::new(&url, Duration::from_secs(2))
                    .expect("Failed to build classifier client"),
            ),
            None => Arc::new(SimulatedClassifier),
        };
        let detector = Arc::new(EmotionDetector::new(classifier, emotion_log_store.clone()));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
        };
        let app = make_app(
            config,
            catalog_store.clone() as Arc<dyn CatalogStore>,
            media_store,
            emotion_log_store.clone() as Arc<dyn EmotionLogStore>,
            user_store,
            detector,
        );

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            catalog_store,
            emotion_log_store,
            media_path,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling /health.
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client
                .get(format!("{}/health", self.base_url))
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
