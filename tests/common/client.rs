//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint. When routes or
//! request formats change, update only this file.

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Registers and logs in the standard test user.
    ///
    /// # Panics
    ///
    /// Panics if registration or login fails.
    pub async fn authenticated(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.register(TEST_USER, TEST_EMAIL, TEST_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Test user registration failed: {:?}",
            response.text().await
        );
        let response = client.login(TEST_USER, TEST_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Test user login failed: {:?}",
            response.text().await
        );

        client
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /auth/register
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/auth/register", self.base_url))
            .json(&json!({
                "username": username,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Register request failed")
    }

    /// POST /auth/login
    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/auth/login", self.base_url))
            .json(&json!({
                "username": username,
                "password": password
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// POST /auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .post(format!("{}/auth/logout", self.base_url))
            .send()
            .await
            .expect("Logout request failed")
    }

    // ========================================================================
    // Emotion Endpoints
    // ========================================================================

    /// POST /emotion/detect
    pub async fn detect(&self, image_data: &str, session_id: Option<&str>) -> Response {
        let mut body = json!({ "image_data": image_data });
        if let Some(sid) = session_id {
            body["session_id"] = json!(sid);
        }
        self.client
            .post(format!("{}/emotion/detect", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Detect request failed")
    }

    /// GET /emotion/statistics
    pub async fn emotion_statistics(&self) -> Response {
        self.client
            .get(format!("{}/emotion/statistics", self.base_url))
            .send()
            .await
            .expect("Statistics request failed")
    }

    /// GET /emotion/sessions/{session_id}
    pub async fn session_history(&self, session_id: &str) -> Response {
        self.client
            .get(format!("{}/emotion/sessions/{}", self.base_url, session_id))
            .send()
            .await
            .expect("Session history request failed")
    }

    // ========================================================================
    // Song Endpoints
    // ========================================================================

    /// GET /songs
    pub async fn list_songs(&self) -> Response {
        self.client
            .get(format!("{}/songs", self.base_url))
            .send()
            .await
            .expect("List songs request failed")
    }

    /// GET /songs/emotion/{label}
    pub async fn songs_by_emotion(&self, label: &str) -> Response {
        self.client
            .get(format!("{}/songs/emotion/{}", self.base_url, label))
            .send()
            .await
            .expect("Songs by emotion request failed")
    }

    /// GET /songs/emotion/{label}/random
    pub async fn songs_by_emotion_random(&self, label: &str) -> Response {
        self.client
            .get(format!("{}/songs/emotion/{}/random", self.base_url, label))
            .send()
            .await
            .expect("Random songs request failed")
    }

    /// GET /songs/{id}
    pub async fn get_song(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/songs/{}", self.base_url, id))
            .send()
            .await
            .expect("Get song request failed")
    }

    /// GET /songs/search?q={q}
    pub async fn search_songs(&self, q: &str) -> Response {
        self.client
            .get(format!("{}/songs/search", self.base_url))
            .query(&[("q", q)])
            .send()
            .await
            .expect("Search request failed")
    }

    /// GET /songs/search with no query parameter
    pub async fn search_songs_without_query(&self) -> Response {
        self.client
            .get(format!("{}/songs/search", self.base_url))
            .send()
            .await
            .expect("Search request failed")
    }

    /// POST /songs (multipart upload)
    pub async fn upload_song(
        &self,
        title: &str,
        artist: &str,
        emotion: &str,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Response {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .expect("Invalid MIME type in test");
        let form = Form::new()
            .part("file", part)
            .text("title", title.to_string())
            .text("artist", artist.to_string())
            .text("emotion", emotion.to_string());

        self.client
            .post(format!("{}/songs", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("Upload request failed")
    }

    /// GET /songs/{id}/download
    pub async fn download_song(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/songs/{}/download", self.base_url, id))
            .send()
            .await
            .expect("Download request failed")
    }

    /// GET /songs/{id}/stream
    pub async fn stream_song(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/songs/{}/stream", self.base_url, id))
            .send()
            .await
            .expect("Stream request failed")
    }

    /// GET /songs/{id}/stream with a Range header
    pub async fn stream_song_with_range(&self, id: i64, range: &str) -> Response {
        self.client
            .get(format!("{}/songs/{}/stream", self.base_url, id))
            .header("Range", range)
            .send()
            .await
            .expect("Stream with range request failed")
    }

    /// DELETE /songs/{id}
    pub async fn delete_song(&self, id: i64) -> Response {
        self.client
            .delete(format!("{}/songs/{}", self.base_url, id))
            .send()
            .await
            .expect("Delete song request failed")
    }

    /// DELETE /songs/all
    pub async fn delete_all_songs(&self) -> Response {
        self.client
            .delete(format!("{}/songs/all", self.base_url))
            .send()
            .await
            .expect("Delete all songs request failed")
    }

    // ========================================================================
    // Playlist Endpoints
    // ========================================================================

    /// GET /playlists/emotion/{label}
    pub async fn get_playlist(&self, label: &str) -> Response {
        self.client
            .get(format!("{}/playlists/emotion/{}", self.base_url, label))
            .send()
            .await
            .expect("Get playlist request failed")
    }

    /// POST /playlists/emotion/{label}
    pub async fn rebuild_playlist(&self, label: &str) -> Response {
        self.client
            .post(format!("{}/playlists/emotion/{}", self.base_url, label))
            .send()
            .await
            .expect("Rebuild playlist request failed")
    }

    /// POST /playlists/emotion/{label}/songs/{song_id}
    pub async fn add_song_to_playlist(&self, label: &str, song_id: i64) -> Response {
        self.client
            .post(format!(
                "{}/playlists/emotion/{}/songs/{}",
                self.base_url, label, song_id
            ))
            .send()
            .await
            .expect("Add song to playlist request failed")
    }

    /// DELETE /playlists/emotion/{label}/songs/{song_id}
    pub async fn remove_song_from_playlist(&self, label: &str, song_id: i64) -> Response {
        self.client
            .delete(format!(
                "{}/playlists/emotion/{}/songs/{}",
                self.base_url, label, song_id
            ))
            .send()
            .await
            .expect("Remove song from playlist request failed")
    }

    // ========================================================================
    // System Endpoints
    // ========================================================================

    /// GET /
    pub async fn get_identity(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Identity request failed")
    }

    /// GET /metrics
    pub async fn get_metrics(&self) -> Response {
        self.client
            .get(format!("{}/metrics", self.base_url))
            .send()
            .await
            .expect("Metrics request failed")
    }
}
