//! Models for the SQLite-backed song library.

use crate::emotion::EmotionLabel;
use serde::Serialize;

/// A catalog song as stored and served.
#[derive(Clone, Debug, Serialize)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub emotion: EmotionLabel,
    /// File name under the media root, assigned at upload time.
    pub file_path: String,
    pub file_size: i64,
    /// Seconds. Not populated by upload itself.
    pub duration: Option<f64>,
    pub mime_type: String,
    /// Unix seconds.
    pub created: i64,
    pub updated: i64,
}

/// Input for a catalog record. The audio bytes must already be on disk at
/// `file_path` before this is inserted.
#[derive(Clone, Debug)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub emotion: EmotionLabel,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
}

/// A per-emotion playlist row. Membership lives in the association table and
/// is served as a list of [`Song`]s.
#[derive(Clone, Debug, Serialize)]
pub struct Playlist {
    pub id: i64,
    pub emotion: EmotionLabel,
    pub created: i64,
    pub updated: i64,
}
