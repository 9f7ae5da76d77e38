//! Face emotion detection for single uploaded images.
//!
//! [`pipeline::detect_emotion_use_case::DetectEmotionUseCase`] is the entry
//! point: it normalizes an upload into a BGR pixel array, hands it to an
//! [`classification::domain::emotion_classifier::EmotionClassifier`] and
//! reports the first face's dominant emotion.

pub mod classification {
    pub mod domain {
        pub mod emotion;
        pub mod emotion_classifier;
        pub mod emotion_model;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod face_detector;
        pub mod face_region;
    }
    pub mod infrastructure;
}

pub mod normalization {
    pub mod domain {
        pub mod image_normalizer;
        pub mod input_image;
    }
}

pub mod pipeline {
    pub mod detect_emotion_use_case;
}

pub mod shared {
    pub mod constants;
    pub mod error;
    pub mod model_resolver;
    pub mod pixel_array;
    pub mod settings;
}

pub mod upload {
    pub mod image_file_reader;
}
