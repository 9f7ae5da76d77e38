use serde::{Deserialize, Serialize};

use crate::classification::domain::emotion::{Emotion, EmotionScores};
use crate::detection::domain::face_region::FaceRegion;
use crate::shared::pixel_array::PixelArray;

/// Knobs for a single emotion analysis request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Fail instead of falling back to the whole image when no face is found.
    pub enforce_detection: bool,
}

/// Emotion analysis of one face.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceAnalysis {
    pub region: FaceRegion,
    pub face_confidence: f64,
    pub emotion: EmotionScores,
    pub dominant_emotion: Emotion,
}

/// Domain interface for per-face emotion analysis.
///
/// Input must be a BGR [`PixelArray`]. Returns one record per analyzed face,
/// most confident face first.
pub trait EmotionClassifier: Send {
    fn analyze(
        &mut self,
        image: &PixelArray,
        options: &AnalysisOptions,
    ) -> Result<Vec<FaceAnalysis>, Box<dyn std::error::Error>>;
}
