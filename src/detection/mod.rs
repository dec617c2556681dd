mod classifier;
mod deepface;
mod detector;

pub use classifier::{Classification, ClassifierSource, EmotionClassifier, SimulatedClassifier};
pub use deepface::DeepFaceClassifier;
pub use detector::EmotionDetector;
