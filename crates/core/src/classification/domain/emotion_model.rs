use image::GrayImage;

use crate::classification::domain::emotion::Emotion;

/// Scores a single grayscale face crop.
pub trait EmotionModel: Send {
    /// Side length of the square crop the model expects.
    fn input_size(&self) -> u32;

    /// Emotion named by each position of [`EmotionModel::predict`]'s output.
    fn labels(&self) -> &[Emotion];

    /// Raw, unnormalized scores for an `input_size` × `input_size` face.
    fn predict(&mut self, face: &GrayImage) -> Result<Vec<f32>, Box<dyn std::error::Error>>;
}
