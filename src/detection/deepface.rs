//! HTTP client for the external face-emotion analysis service.
//!
//! The service receives a base64 image payload and answers with per-label
//! scores for each detected subject. Any failure here, from a refused
//! connection to a malformed body, is masked by the simulated fallback so
//! callers always get a classification.

use super::classifier::{Classification, ClassifierSource, EmotionClassifier, SimulatedClassifier};
use crate::emotion::EmotionLabel;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    img: &'a str,
    actions: [&'static str; 1],
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    results: Option<HashMap<String, SubjectResult>>,
}

#[derive(Deserialize)]
struct SubjectResult {
    emotion: Option<HashMap<String, f64>>,
}

pub struct DeepFaceClassifier {
    client: reqwest::Client,
    url: String,
    fallback: SimulatedClassifier,
}

impl DeepFaceClassifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            fallback: SimulatedClassifier,
        })
    }

    async fn analyze(&self, image_data: &str) -> Result<Classification> {
        let request = AnalyzeRequest {
            img: image_data,
            actions: ["emotion"],
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .context("emotion analysis request failed")?;

        if !response.status().is_success() {
            bail!("emotion analysis failed with status {}", response.status());
        }

        let body: AnalyzeResponse = response
            .json()
            .await
            .context("emotion analysis response was not valid JSON")?;
        parse_classification(&body)
    }
}

#[async_trait]
impl EmotionClassifier for DeepFaceClassifier {
    async fn classify(&self, image_data: &str) -> Classification {
        match self.analyze(image_data).await {
            Ok(classification) => classification,
            Err(e) => {
                warn!("Emotion analysis failed, simulating instead: {:#}", e);
                self.fallback.classify(image_data).await
            }
        }
    }
}

/// Pick the winning label from the first detected subject. Scores above 1.0
/// are on the percentage scale and get divided down.
fn parse_classification(response: &AnalyzeResponse) -> Result<Classification> {
    let results = response
        .results
        .as_ref()
        .filter(|results| !results.is_empty())
        .context("no results in emotion analysis response")?;
    let scores = results
        .get("0")
        .and_then(|subject| subject.emotion.as_ref())
        .context("no emotion scores for the first subject")?;

    let (name, score) = scores
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .context("empty emotion score map")?;

    let confidence = if *score > 1.0 { *score / 100.0 } else { *score };
    Ok(Classification {
        emotion: EmotionLabel::from_name_or_neutral(name),
        confidence: confidence.clamp(0.0, 1.0),
        source: ClassifierSource::DeepFace,
    })
}
