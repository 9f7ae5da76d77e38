use crate::classification::domain::emotion::Emotion;
use crate::classification::domain::emotion_classifier::{
    AnalysisOptions, EmotionClassifier, FaceAnalysis,
};
use crate::normalization::domain::image_normalizer::ImageNormalizer;
use crate::normalization::domain::input_image::InputImage;
use crate::shared::error::EmotionError;

/// The dominant emotion of the most confident face in an upload.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedEmotion {
    pub emotion: Emotion,
    pub analysis: FaceAnalysis,
}

impl std::fmt::Display for DetectedEmotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Detected Emotion: {}", self.emotion)
    }
}

/// Single-upload pipeline: normalize → classify → pick first face.
///
/// Every failure, whatever layer it comes from, is returned as an
/// [`EmotionError`]; nothing propagates past `execute` any other way.
pub struct DetectEmotionUseCase {
    normalizer: ImageNormalizer,
    classifier: Box<dyn EmotionClassifier>,
    options: AnalysisOptions,
}

impl DetectEmotionUseCase {
    /// Uses best-effort face selection (detection not enforced).
    pub fn new(classifier: Box<dyn EmotionClassifier>) -> Self {
        Self {
            normalizer: ImageNormalizer::new(),
            classifier,
            options: AnalysisOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn execute(&mut self, image: Option<InputImage>) -> Result<DetectedEmotion, EmotionError> {
        let pixels = self.normalizer.normalize(image)?;
        log::debug!(
            "Classifying {}x{} {} image (enforce_detection={})",
            pixels.width(),
            pixels.height(),
            pixels.order(),
            self.options.enforce_detection
        );

        let analysis = self
            .classifier
            .analyze(&pixels, &self.options)
            .map_err(EmotionError::processing)?
            .into_iter()
            .next()
            .ok_or_else(|| EmotionError::processing("classifier returned no faces"))?;

        Ok(DetectedEmotion {
            emotion: analysis.dominant_emotion,
            analysis,
        })
    }
}
