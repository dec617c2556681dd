//! CatalogStore trait definition.
//!
//! Abstracts the song library so handlers and tests can run against any
//! backend; the production implementation is `SqliteCatalogStore`.

use super::models::{NewSong, Song};
use crate::emotion::EmotionLabel;
use anyhow::Result;
use thiserror::Error;

/// Typed failures for playlist membership operations, so the HTTP layer can
/// tell a missing aggregate apart from a storage fault.
#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("song {0} does not exist")]
    SongNotFound(i64),
    #[error("no playlist exists for emotion {0}")]
    PlaylistNotFound(EmotionLabel),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Songs
    // =========================================================================

    /// All songs, newest first.
    fn list_songs(&self) -> Result<Vec<Song>>;

    /// Songs carrying the given emotion, newest first.
    fn songs_by_emotion(&self, emotion: EmotionLabel) -> Result<Vec<Song>>;

    /// Same set as [`songs_by_emotion`](Self::songs_by_emotion), freshly
    /// shuffled on every call.
    fn songs_by_emotion_shuffled(&self, emotion: EmotionLabel) -> Result<Vec<Song>>;

    fn get_song(&self, id: i64) -> Result<Option<Song>>;

    /// Case-insensitive substring search over title and artist. A song
    /// matching both appears once.
    fn search_songs(&self, query: &str) -> Result<Vec<Song>>;

    /// Insert a catalog record. The audio bytes must already be on disk.
    fn create_song(&self, song: NewSong) -> Result<Song>;

    /// Remove a catalog record. Returns false if no such song exists.
    /// Membership rows cascade away. Does not touch the stored file.
    fn delete_song(&self, id: i64) -> Result<bool>;

    /// Remove every catalog record. Does not touch stored files.
    fn delete_all_songs(&self) -> Result<()>;

    /// Song count for the metrics gauge.
    fn songs_count(&self) -> usize;

    // =========================================================================
    // Playlists
    // =========================================================================

    /// Return the playlist's songs for the emotion, materializing the playlist
    /// from the current catalog if it does not exist yet.
    fn get_or_create_playlist(&self, emotion: EmotionLabel) -> Result<Vec<Song>>;

    /// (Re)build the playlist for the emotion from the current catalog,
    /// replacing any existing membership. Returns the new membership.
    fn rebuild_playlist(&self, emotion: EmotionLabel) -> Result<Vec<Song>>;

    /// Add a song to the emotion's playlist, creating an empty playlist if
    /// absent. Adding an existing member is a no-op.
    fn add_song_to_playlist(
        &self,
        emotion: EmotionLabel,
        song_id: i64,
    ) -> Result<(), PlaylistError>;

    /// Remove a song from the emotion's playlist. Removing a non-member is a
    /// no-op; a missing playlist is an error.
    fn remove_song_from_playlist(
        &self,
        emotion: EmotionLabel,
        song_id: i64,
    ) -> Result<(), PlaylistError>;
}
