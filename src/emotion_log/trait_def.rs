//! EmotionLogStore trait definition.

use super::models::{EmotionLog, NewEmotionLog};
use crate::emotion::EmotionLabel;
use anyhow::Result;
use std::collections::HashMap;

pub trait EmotionLogStore: Send + Sync {
    /// Append a detection event and return it with its assigned id.
    fn append(&self, log: NewEmotionLog) -> Result<EmotionLog>;

    /// Events for a session, most recent first.
    fn logs_by_session(&self, session_id: &str) -> Result<Vec<EmotionLog>>;

    /// Events with timestamps in `[start, end]` (unix millis, inclusive
    /// bounds), oldest first.
    fn logs_in_range(&self, start: i64, end: i64) -> Result<Vec<EmotionLog>>;

    /// Detection counts keyed by label. Every label is present, zero when no
    /// events carry it.
    fn counts_by_emotion(&self) -> Result<HashMap<EmotionLabel, i64>>;
}
