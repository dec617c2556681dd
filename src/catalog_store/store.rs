//! SQLite-backed song library implementation.
//!
//! One write connection behind a mutex, a small rotating pool of read
//! connections, WAL journal mode. Playlist mutations run in transactions on
//! the writer so seeding and membership rewrites are atomic.

use super::models::{NewSong, Song};
use super::schema::LIBRARY_SCHEMA;
use super::trait_def::{CatalogStore, PlaylistError};
use crate::emotion::EmotionLabel;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

const SONG_COLUMNS: &str =
    "id, title, artist, emotion, file_path, file_size, duration, mime_type, created, updated";

#[derive(Clone)]
pub struct SqliteCatalogStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

impl SqliteCatalogStore {
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path = db_path.as_ref();

        let write_conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open library database")?;

        LIBRARY_SCHEMA.initialize(&write_conn)?;
        write_conn.pragma_update(None, "journal_mode", "WAL")?;

        let song_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))
            .unwrap_or(0);
        info!("Opened song library: {} songs", song_count);

        let mut read_pool = Vec::with_capacity(read_pool_size);
        for _ in 0..read_pool_size {
            let read_conn = Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_conn.pragma_update(None, "journal_mode", "WAL")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteCatalogStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn parse_song_row(row: &Row) -> rusqlite::Result<Song> {
        let emotion_name: String = row.get(3)?;
        let emotion = EmotionLabel::from_name(&emotion_name).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("unknown emotion label '{}'", emotion_name).into(),
            )
        })?;
        Ok(Song {
            id: row.get(0)?,
            title: row.get(1)?,
            artist: row.get(2)?,
            emotion,
            file_path: row.get(4)?,
            file_size: row.get(5)?,
            duration: row.get(6)?,
            mime_type: row.get(7)?,
            created: row.get(8)?,
            updated: row.get(9)?,
        })
    }

    fn query_songs(conn: &Connection, sql: &str, query_params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Song>> {
        let mut stmt = conn.prepare_cached(sql)?;
        let songs = stmt
            .query_map(query_params, Self::parse_song_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    fn playlist_id_for(conn: &Connection, emotion: EmotionLabel) -> Result<Option<i64>> {
        match conn.query_row(
            "SELECT id FROM playlists WHERE emotion = ?1",
            params![emotion.as_str()],
            |r| r.get(0),
        ) {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_playlist(conn: &Connection, emotion: EmotionLabel) -> Result<i64> {
        conn.execute(
            "INSERT INTO playlists (emotion) VALUES (?1)",
            params![emotion.as_str()],
        )
        .context("Could not create playlist")?;
        Ok(conn.last_insert_rowid())
    }

    /// Membership in insertion order.
    fn playlist_members(conn: &Connection, playlist_id: i64) -> Result<Vec<Song>> {
        Self::query_songs(
            conn,
            "SELECT s.id, s.title, s.artist, s.emotion, s.file_path, s.file_size, \
                    s.duration, s.mime_type, s.created, s.updated \
             FROM playlist_songs ps \
             JOIN songs s ON s.id = ps.song_id \
             WHERE ps.playlist_id = ?1 ORDER BY ps.id",
            &[&playlist_id],
        )
    }

    /// Copy every catalog song of the emotion into the playlist.
    fn seed_playlist(conn: &Connection, playlist_id: i64, emotion: EmotionLabel) -> Result<()> {
        conn.execute(
            "INSERT INTO playlist_songs (playlist_id, song_id) \
             SELECT ?1, id FROM songs WHERE emotion = ?2 ORDER BY created DESC, id DESC",
            params![playlist_id, emotion.as_str()],
        )
        .context("Could not seed playlist")?;
        Ok(())
    }

    fn song_exists(conn: &Connection, id: i64) -> Result<bool> {
        match conn.query_row("SELECT 1 FROM songs WHERE id = ?1", params![id], |r| {
            r.get::<_, i32>(0)
        }) {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Escape LIKE wildcards so the query is matched literally.
fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl CatalogStore for SqliteCatalogStore {
    fn list_songs(&self) -> Result<Vec<Song>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        Self::query_songs(
            &conn,
            &format!(
                "SELECT {} FROM songs ORDER BY created DESC, id DESC",
                SONG_COLUMNS
            ),
            &[],
        )
    }

    fn songs_by_emotion(&self, emotion: EmotionLabel) -> Result<Vec<Song>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        Self::query_songs(
            &conn,
            &format!(
                "SELECT {} FROM songs WHERE emotion = ?1 ORDER BY created DESC, id DESC",
                SONG_COLUMNS
            ),
            &[&emotion.as_str()],
        )
    }

    fn songs_by_emotion_shuffled(&self, emotion: EmotionLabel) -> Result<Vec<Song>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        Self::query_songs(
            &conn,
            &format!(
                "SELECT {} FROM songs WHERE emotion = ?1 ORDER BY RANDOM()",
                SONG_COLUMNS
            ),
            &[&emotion.as_str()],
        )
    }

    fn get_song(&self, id: i64) -> Result<Option<Song>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt =
            conn.prepare_cached(&format!("SELECT {} FROM songs WHERE id = ?1", SONG_COLUMNS))?;
        match stmt.query_row(params![id], Self::parse_song_row) {
            Ok(song) => Ok(Some(song)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn search_songs(&self, query: &str) -> Result<Vec<Song>> {
        let pattern = format!("%{}%", escape_like(query));
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        Self::query_songs(
            &conn,
            &format!(
                "SELECT {} FROM songs \
                 WHERE title LIKE ?1 ESCAPE '\\' OR artist LIKE ?1 ESCAPE '\\' \
                 ORDER BY created DESC, id DESC",
                SONG_COLUMNS
            ),
            &[&pattern],
        )
    }

    fn create_song(&self, song: NewSong) -> Result<Song> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO songs (title, artist, file_path, emotion, file_size, mime_type) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                song.title,
                song.artist,
                song.file_path,
                song.emotion.as_str(),
                song.file_size,
                song.mime_type
            ],
        )
        .context("Could not insert song")?;
        let id = conn.last_insert_rowid();

        let mut stmt =
            conn.prepare_cached(&format!("SELECT {} FROM songs WHERE id = ?1", SONG_COLUMNS))?;
        let created = stmt.query_row(params![id], Self::parse_song_row)?;
        Ok(created)
    }

    fn delete_song(&self, id: i64) -> Result<bool> {
        let conn = self.write_conn.lock().unwrap();
        let deleted = conn
            .execute("DELETE FROM songs WHERE id = ?1", params![id])
            .context("Could not delete song")?;
        Ok(deleted > 0)
    }

    fn delete_all_songs(&self) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute("DELETE FROM songs", [])
            .context("Could not delete songs")?;
        Ok(())
    }

    fn songs_count(&self) -> usize {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM songs", [], |r| r.get::<_, i64>(0))
            .unwrap_or(0) as usize
    }

    fn get_or_create_playlist(&self, emotion: EmotionLabel) -> Result<Vec<Song>> {
        {
            let read_conn = self.get_read_conn();
            let conn = read_conn.lock().unwrap();
            if let Some(playlist_id) = Self::playlist_id_for(&conn, emotion)? {
                return Self::playlist_members(&conn, playlist_id);
            }
        }

        let mut guard = self.write_conn.lock().unwrap();
        let tx = guard.transaction()?;
        // Re-check under the writer lock: another request may have won the race.
        let songs = match Self::playlist_id_for(&tx, emotion)? {
            Some(playlist_id) => Self::playlist_members(&tx, playlist_id)?,
            None => {
                let playlist_id = Self::insert_playlist(&tx, emotion)?;
                Self::seed_playlist(&tx, playlist_id, emotion)?;
                Self::playlist_members(&tx, playlist_id)?
            }
        };
        tx.commit()?;
        Ok(songs)
    }

    fn rebuild_playlist(&self, emotion: EmotionLabel) -> Result<Vec<Song>> {
        let mut guard = self.write_conn.lock().unwrap();
        let tx = guard.transaction()?;
        let playlist_id = match Self::playlist_id_for(&tx, emotion)? {
            Some(playlist_id) => {
                tx.execute(
                    "DELETE FROM playlist_songs WHERE playlist_id = ?1",
                    params![playlist_id],
                )?;
                tx.execute(
                    "UPDATE playlists SET updated = cast(strftime('%s','now') as int) \
                     WHERE id = ?1",
                    params![playlist_id],
                )?;
                playlist_id
            }
            None => Self::insert_playlist(&tx, emotion)?,
        };
        Self::seed_playlist(&tx, playlist_id, emotion)?;
        let songs = Self::playlist_members(&tx, playlist_id)?;
        tx.commit()?;
        Ok(songs)
    }

    fn add_song_to_playlist(
        &self,
        emotion: EmotionLabel,
        song_id: i64,
    ) -> Result<(), PlaylistError> {
        let mut guard = self.write_conn.lock().unwrap();
        let tx = guard.transaction().context("begin playlist update")?;
        if !Self::song_exists(&tx, song_id)? {
            return Err(PlaylistError::SongNotFound(song_id));
        }
        let playlist_id = match Self::playlist_id_for(&tx, emotion)? {
            Some(playlist_id) => playlist_id,
            None => Self::insert_playlist(&tx, emotion)?,
        };
        tx.execute(
            "INSERT OR IGNORE INTO playlist_songs (playlist_id, song_id) VALUES (?1, ?2)",
            params![playlist_id, song_id],
        )
        .context("Could not add song to playlist")?;
        tx.commit().context("commit playlist update")?;
        Ok(())
    }

    fn remove_song_from_playlist(
        &self,
        emotion: EmotionLabel,
        song_id: i64,
    ) -> Result<(), PlaylistError> {
        let mut guard = self.write_conn.lock().unwrap();
        let tx = guard.transaction().context("begin playlist update")?;
        let playlist_id = Self::playlist_id_for(&tx, emotion)?
            .ok_or(PlaylistError::PlaylistNotFound(emotion))?;
        tx.execute(
            "DELETE FROM playlist_songs WHERE playlist_id = ?1 AND song_id = ?2",
            params![playlist_id, song_id],
        )
        .context("Could not remove song from playlist")?;
        tx.commit().context("commit playlist update")?;
        Ok(())
    }
}
