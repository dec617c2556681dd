//! The fixed emotion taxonomy used across songs, playlists and detection logs.

use serde::{Deserialize, Serialize};

/// One of the seven emotion categories every song and detection snapshot
/// is tagged with. The canonical textual form is lowercase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Happy,
    Sad,
    Angry,
    Surprise,
    Fear,
    Disgust,
    Neutral,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Surprise,
        EmotionLabel::Fear,
        EmotionLabel::Disgust,
        EmotionLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Neutral => "neutral",
        }
    }

    /// Case-insensitive parse. Returns None for anything outside the taxonomy.
    pub fn from_name(name: &str) -> Option<EmotionLabel> {
        match name.to_ascii_lowercase().as_str() {
            "happy" => Some(EmotionLabel::Happy),
            "sad" => Some(EmotionLabel::Sad),
            "angry" => Some(EmotionLabel::Angry),
            "surprise" => Some(EmotionLabel::Surprise),
            "fear" => Some(EmotionLabel::Fear),
            "disgust" => Some(EmotionLabel::Disgust),
            "neutral" => Some(EmotionLabel::Neutral),
            _ => None,
        }
    }

    /// Total parse used when mapping classifier output names: unknown text
    /// resolves to Neutral instead of an error, so a misbehaving classifier
    /// can never fail a detection. Keep user input on `from_name`.
    pub fn from_name_or_neutral(name: &str) -> EmotionLabel {
        Self::from_name(name).unwrap_or(EmotionLabel::Neutral)
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
