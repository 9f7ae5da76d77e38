use image::imageops::FilterType;
use image::GrayImage;

use crate::classification::domain::emotion::EmotionScores;
use crate::classification::domain::emotion_classifier::{
    AnalysisOptions, EmotionClassifier, FaceAnalysis,
};
use crate::classification::domain::emotion_model::EmotionModel;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_region::FaceRegion;
use crate::shared::pixel_array::{ChannelOrder, PixelArray};

/// Detect faces, then score each face crop with an emotion model.
///
/// With detection not enforced, an image without any detectable face is
/// analyzed as a single whole-image region.
pub struct FaceEmotionAnalyzer {
    detector: Box<dyn FaceDetector>,
    model: Box<dyn EmotionModel>,
}

impl FaceEmotionAnalyzer {
    pub fn new(detector: Box<dyn FaceDetector>, model: Box<dyn EmotionModel>) -> Self {
        Self { detector, model }
    }

    fn regions(
        &mut self,
        image: &PixelArray,
        options: &AnalysisOptions,
    ) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>> {
        let (w, h) = (image.width(), image.height());
        let mut regions: Vec<FaceRegion> = self
            .detector
            .detect(image)?
            .iter()
            .filter_map(|r| r.clamp_to(w, h))
            .collect();

        if regions.is_empty() {
            if options.enforce_detection {
                return Err("Face could not be detected. Please confirm that the picture \
                            is a face photo or disable enforce_detection."
                    .into());
            }
            log::warn!("No face detected, analyzing the whole {w}x{h} image");
            regions.push(FaceRegion::whole_image(w, h));
        }

        regions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(regions)
    }
}

impl EmotionClassifier for FaceEmotionAnalyzer {
    fn analyze(
        &mut self,
        image: &PixelArray,
        options: &AnalysisOptions,
    ) -> Result<Vec<FaceAnalysis>, Box<dyn std::error::Error>> {
        if image.order() != ChannelOrder::Bgr {
            return Err(format!("emotion analysis expects BGR input, got {}", image.order()).into());
        }

        let size = self.model.input_size();
        let mut results = Vec::new();
        for region in self.regions(image, options)? {
            let face = gray_crop(image, &region);
            let face = image::imageops::resize(&face, size, size, FilterType::Triangle);
            let logits = self.model.predict(&face)?;
            let emotion = EmotionScores::from_logits(self.model.labels(), &logits)?;
            let dominant_emotion = emotion.dominant().ok_or("emotion model returned no scores")?;
            log::debug!(
                "Face at ({}, {}) {}x{}: {dominant_emotion}",
                region.x,
                region.y,
                region.width,
                region.height
            );
            results.push(FaceAnalysis {
                face_confidence: region.confidence,
                region,
                emotion,
                dominant_emotion,
            });
        }
        Ok(results)
    }
}

/// Cuts `region` out of a BGR image as 8-bit luma (BT.601 weights).
///
/// `region` must already be clamped to the image bounds.
fn gray_crop(image: &PixelArray, region: &FaceRegion) -> GrayImage {
    let view = image.view();
    let (x0, y0) = (region.x as usize, region.y as usize);
    GrayImage::from_fn(region.width as u32, region.height as u32, |x, y| {
        let px = view.slice(ndarray::s![y0 + y as usize, x0 + x as usize, ..]);
        let (b, g, r) = (px[0] as f32, px[1] as f32, px[2] as f32);
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        image::Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}
