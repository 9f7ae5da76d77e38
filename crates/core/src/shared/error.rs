use thiserror::Error;

/// Everything that can go wrong between receiving an upload and reporting
/// its dominant emotion.
///
/// `Display` renders the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmotionError {
    #[error("Error: No image received.")]
    NoImage,
    #[error("Error: Image is not a NumPy array. Got {type_name}")]
    InvalidType { type_name: String },
    #[error("Error in image emotion detection: {0}")]
    ProcessingFailure(String),
}

impl EmotionError {
    /// Wraps any lower-level error as a processing failure, keeping its text.
    pub fn processing(err: impl std::fmt::Display) -> Self {
        EmotionError::ProcessingFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_image_message() {
        assert_eq!(EmotionError::NoImage.to_string(), "Error: No image received.");
    }

    #[test]
    fn test_invalid_type_message_embeds_type_name() {
        let err = EmotionError::InvalidType {
            type_name: "&str".to_string(),
        };
        assert_eq!(err.to_string(), "Error: Image is not a NumPy array. Got &str");
    }

    #[test]
    fn test_processing_keeps_underlying_text() {
        let err = EmotionError::processing("model exploded");
        assert_eq!(
            err.to_string(),
            "Error in image emotion detection: model exploded"
        );
    }
}
