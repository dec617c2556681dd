//! Classifier strategy for emotion snapshots.

use crate::emotion::EmotionLabel;
use async_trait::async_trait;
use rand::Rng;

/// Which variant actually produced a classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassifierSource {
    DeepFace,
    Simulated,
}

impl ClassifierSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierSource::DeepFace => "deepface",
            ClassifierSource::Simulated => "simulated",
        }
    }
}

/// A detected label with its confidence in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub emotion: EmotionLabel,
    pub confidence: f64,
    pub source: ClassifierSource,
}

/// Turns an image payload into a classification. Implementations never fail:
/// a variant that can fail internally must fall back on its own.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    async fn classify(&self, image_data: &str) -> Classification;
}

/// Uniform random label with confidence drawn from [0.70, 1.00). Stands in
/// when no external classifier is configured and backs the external one as
/// its failure fallback.
#[derive(Clone, Copy, Default)]
pub struct SimulatedClassifier;

#[async_trait]
impl EmotionClassifier for SimulatedClassifier {
    async fn classify(&self, _image_data: &str) -> Classification {
        let mut rng = rand::rng();
        let emotion = EmotionLabel::ALL[rng.random_range(0..EmotionLabel::ALL.len())];
        let confidence = 0.7 + rng.random::<f64>() * 0.3;
        Classification {
            emotion,
            confidence,
            source: ClassifierSource::Simulated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_confidence_stays_in_bounds() {
        let classifier = SimulatedClassifier;
        for _ in 0..200 {
            let c = classifier.classify("ignored").await;
            assert!(c.confidence >= 0.7 && c.confidence <= 1.0);
            assert_eq!(c.source, ClassifierSource::Simulated);
        }
    }
}
