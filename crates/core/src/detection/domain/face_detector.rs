use crate::detection::domain::face_region::FaceRegion;
use crate::shared::pixel_array::PixelArray;

/// Domain interface for face detection.
///
/// Implementations own inference sessions that need exclusive access,
/// hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, image: &PixelArray) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>>;
}
