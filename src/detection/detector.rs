//! The snapshot detection-and-logging flow.

use super::classifier::EmotionClassifier;
use crate::emotion_log::{EmotionLog, EmotionLogStore, NewEmotionLog};
use crate::server::metrics;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Orchestrates one detection: classify the snapshot, then durably record
/// the outcome. Classification cannot fail; only the log write can, and a
/// failed write fails the whole detection.
pub struct EmotionDetector {
    classifier: Arc<dyn EmotionClassifier>,
    log_store: Arc<dyn EmotionLogStore>,
}

impl EmotionDetector {
    pub fn new(
        classifier: Arc<dyn EmotionClassifier>,
        log_store: Arc<dyn EmotionLogStore>,
    ) -> Self {
        Self {
            classifier,
            log_store,
        }
    }

    pub async fn detect(
        &self,
        image_data: &str,
        session_id: Option<String>,
    ) -> Result<EmotionLog> {
        let classification = self.classifier.classify(image_data).await;
        let log = self
            .log_store
            .append(NewEmotionLog {
                emotion: classification.emotion,
                confidence: classification.confidence,
                timestamp: None,
                session_id,
            })
            .context("Could not record emotion detection")?;

        metrics::record_detection(
            classification.source.as_str(),
            classification.emotion.as_str(),
        );
        Ok(log)
    }
}
