/// FER+ facial expression model run through ONNX Runtime.
///
/// Takes a 64x64 grayscale face with raw 0-255 intensities and returns eight
/// unnormalized scores.
use std::path::Path;

use image::GrayImage;

use crate::classification::domain::emotion::Emotion;
use crate::classification::domain::emotion_model::EmotionModel;
use crate::detection::infrastructure::execution_provider::load_session;

const INPUT_SIZE: u32 = 64;

/// Output order of the FER+ model.
const FERPLUS_LABELS: &[Emotion] = &[
    Emotion::Neutral,
    Emotion::Happy,
    Emotion::Surprise,
    Emotion::Sad,
    Emotion::Angry,
    Emotion::Disgust,
    Emotion::Fear,
    Emotion::Contempt,
];

pub struct OnnxFerPlusModel {
    session: ort::session::Session,
}

impl OnnxFerPlusModel {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: load_session(model_path)?,
        })
    }
}

impl EmotionModel for OnnxFerPlusModel {
    fn input_size(&self) -> u32 {
        INPUT_SIZE
    }

    fn labels(&self) -> &[Emotion] {
        FERPLUS_LABELS
    }

    fn predict(&mut self, face: &GrayImage) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let tensor = preprocess(face)?;
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("FER+ model produced no outputs".into());
        }
        let scores = outputs[0].try_extract_array::<f32>()?;
        let scores: Vec<f32> = scores.iter().copied().collect();
        if scores.len() != FERPLUS_LABELS.len() {
            return Err(format!(
                "FER+ model returned {} scores, expected {}",
                scores.len(),
                FERPLUS_LABELS.len()
            )
            .into());
        }
        Ok(scores)
    }
}

/// Packs a 64x64 gray face into a `[1, 1, 64, 64]` tensor of raw intensities.
fn preprocess(face: &GrayImage) -> Result<ndarray::Array4<f32>, Box<dyn std::error::Error>> {
    if face.dimensions() != (INPUT_SIZE, INPUT_SIZE) {
        return Err(format!(
            "FER+ expects a {INPUT_SIZE}x{INPUT_SIZE} face, got {}x{}",
            face.width(),
            face.height()
        )
        .into());
    }
    let size = INPUT_SIZE as usize;
    let data: Vec<f32> = face.as_raw().iter().map(|&v| v as f32).collect();
    Ok(ndarray::Array4::from_shape_vec((1, 1, size, size), data)?)
}
