pub mod face_emotion_analyzer;
pub mod onnx_ferplus_model;
