//! SQLite schema for the song library database.
//!
//! Holds the song catalog, the per-emotion playlists and their membership
//! rows. Playlist uniqueness per emotion is a column constraint; membership
//! rows cascade away when either side is deleted.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, Schema, SqlType, Table, DEFAULT_TIMESTAMP,
};

const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", SqlType::Text, non_null = true),
        sqlite_column!("artist", SqlType::Text, non_null = true),
        sqlite_column!("file_path", SqlType::Text, non_null = true),
        sqlite_column!("emotion", SqlType::Text, non_null = true),
        sqlite_column!("file_size", SqlType::Integer, non_null = true),
        sqlite_column!("duration", SqlType::Real),
        sqlite_column!("mime_type", SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_songs_emotion", "emotion")],
    unique_constraints: &[],
};

const PLAYLISTS_TABLE: Table = Table {
    name: "playlists",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("emotion", SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

/// Playlist <-> Song membership. Iteration order is insertion order (by id).
const PLAYLIST_SONGS_TABLE: Table = Table {
    name: "playlist_songs",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "playlist_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "playlists",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "song_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "songs",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
    ],
    indices: &[("idx_playlist_songs_playlist", "playlist_id")],
    unique_constraints: &[&["playlist_id", "song_id"]],
};

pub const LIBRARY_SCHEMA: Schema = Schema {
    version: 1,
    tables: &[SONGS_TABLE, PLAYLISTS_TABLE, PLAYLIST_SONGS_TABLE],
};

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn schema_creates_and_validates() {
        let conn = Connection::open_in_memory().unwrap();
        LIBRARY_SCHEMA.initialize(&conn).unwrap();
        LIBRARY_SCHEMA.initialize(&conn).unwrap();
    }

    #[test]
    fn playlist_emotion_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        LIBRARY_SCHEMA.initialize(&conn).unwrap();

        conn.execute("INSERT INTO playlists (emotion) VALUES ('happy')", [])
            .unwrap();
        let err = conn.execute("INSERT INTO playlists (emotion) VALUES ('happy')", []);
        assert!(err.is_err());
    }

    #[test]
    fn deleting_song_cascades_membership() {
        let conn = Connection::open_in_memory().unwrap();
        LIBRARY_SCHEMA.initialize(&conn).unwrap();

        conn.execute(
            "INSERT INTO songs (title, artist, file_path, emotion, file_size, mime_type) \
             VALUES ('Low', 'Flo Rida', 'low.mp3', 'happy', 1024, 'audio/mpeg')",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO playlists (emotion) VALUES ('happy')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO playlist_songs (playlist_id, song_id) VALUES (1, 1)",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM songs WHERE id = 1", []).unwrap();
        let members: i64 = conn
            .query_row("SELECT COUNT(*) FROM playlist_songs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(members, 0);
    }

    #[test]
    fn duplicate_membership_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        LIBRARY_SCHEMA.initialize(&conn).unwrap();

        conn.execute(
            "INSERT INTO songs (title, artist, file_path, emotion, file_size, mime_type) \
             VALUES ('Low', 'Flo Rida', 'low.mp3', 'happy', 1024, 'audio/mpeg')",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO playlists (emotion) VALUES ('happy')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO playlist_songs (playlist_id, song_id) VALUES (1, 1)",
            [],
        )
        .unwrap();
        let err = conn.execute(
            "INSERT INTO playlist_songs (playlist_id, song_id) VALUES (1, 1)",
            [],
        );
        assert!(err.is_err());
    }
}
