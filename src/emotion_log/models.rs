//! Models for the emotion detection log.

use crate::emotion::EmotionLabel;
use serde::Serialize;

/// One appended detection event. Never updated or deleted.
#[derive(Clone, Debug, Serialize)]
pub struct EmotionLog {
    pub id: i64,
    pub emotion: EmotionLabel,
    pub confidence: f64,
    /// Unix milliseconds.
    pub timestamp: i64,
    pub session_id: Option<String>,
}

/// Input for appending a record. A missing timestamp defaults to now.
#[derive(Clone, Debug)]
pub struct NewEmotionLog {
    pub emotion: EmotionLabel,
    pub confidence: f64,
    pub timestamp: Option<i64>,
    pub session_id: Option<String>,
}
