//! SQLite schema for the emotion log database.
//!
//! A single append-only table. Timestamps are unix milliseconds and are
//! assigned in code (the second-resolution SQL default is too coarse here).

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, Schema, SqlType, Table};

const EMOTION_LOGS_TABLE: Table = Table {
    name: "emotion_logs",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("emotion", SqlType::Text, non_null = true),
        sqlite_column!("confidence", SqlType::Real, non_null = true),
        sqlite_column!("timestamp", SqlType::Integer, non_null = true),
        sqlite_column!("session_id", SqlType::Text),
    ],
    indices: &[
        ("idx_emotion_logs_session", "session_id"),
        ("idx_emotion_logs_timestamp", "timestamp"),
    ],
    unique_constraints: &[],
};

pub const EMOTIONS_SCHEMA: Schema = Schema {
    version: 1,
    tables: &[EMOTION_LOGS_TABLE],
};
