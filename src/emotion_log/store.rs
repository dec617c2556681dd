//! SQLite-backed emotion log implementation.

use super::models::{EmotionLog, NewEmotionLog};
use super::schema::EMOTIONS_SCHEMA;
use super::trait_def::EmotionLogStore;
use crate::emotion::EmotionLabel;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const LOG_COLUMNS: &str = "id, emotion, confidence, timestamp, session_id";

#[derive(Clone)]
pub struct SqliteEmotionLogStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

impl SqliteEmotionLogStore {
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path = db_path.as_ref();

        let write_conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open emotion log database")?;

        EMOTIONS_SCHEMA.initialize(&write_conn)?;
        write_conn.pragma_update(None, "journal_mode", "WAL")?;

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

        Ok(SqliteEmotionLogStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn parse_log_row(row: &Row) -> rusqlite::Result<EmotionLog> {
        let emotion_name: String = row.get(1)?;
        let emotion = EmotionLabel::from_name(&emotion_name).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("unknown emotion label '{}'", emotion_name).into(),
            )
        })?;
        Ok(EmotionLog {
            id: row.get(0)?,
            emotion,
            confidence: row.get(2)?,
            timestamp: row.get(3)?,
            session_id: row.get(4)?,
        })
    }
}

impl EmotionLogStore for SqliteEmotionLogStore {
    fn append(&self, log: NewEmotionLog) -> Result<EmotionLog> {
        let timestamp = log
            .timestamp
            .unwrap_or_else(|| Utc::now().timestamp_millis());

        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO emotion_logs (emotion, confidence, timestamp, session_id) \
             VALUES (?1, ?2, ?3, ?4)",
            params![log.emotion.as_str(), log.confidence, timestamp, log.session_id],
        )
        .context("Could not append emotion log")?;

        Ok(EmotionLog {
            id: conn.last_insert_rowid(),
            emotion: log.emotion,
            confidence: log.confidence,
            timestamp,
            session_id: log.session_id,
        })
    }

    fn logs_by_session(&self, session_id: &str) -> Result<Vec<EmotionLog>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM emotion_logs WHERE session_id = ?1 \
             ORDER BY timestamp DESC, id DESC",
            LOG_COLUMNS
        ))?;
        let logs = stmt
            .query_map(params![session_id], Self::parse_log_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    fn logs_in_range(&self, start: i64, end: i64) -> Result<Vec<EmotionLog>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM emotion_logs WHERE timestamp >= ?1 AND timestamp <= ?2 \
             ORDER BY timestamp ASC, id ASC",
            LOG_COLUMNS
        ))?;
        let logs = stmt
            .query_map(params![start, end], Self::parse_log_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    fn counts_by_emotion(&self) -> Result<HashMap<EmotionLabel, i64>> {
        let mut counts: HashMap<EmotionLabel, i64> =
            EmotionLabel::ALL.iter().map(|label| (*label, 0)).collect();

        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt =
            conn.prepare_cached("SELECT emotion, COUNT(*) FROM emotion_logs GROUP BY emotion")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (name, count) = row?;
            if let Some(label) = EmotionLabel::from_name(&name) {
                counts.insert(label, count);
            }
        }
        Ok(counts)
    }
}
