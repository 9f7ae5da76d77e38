use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classification::domain::emotion_classifier::AnalysisOptions;
use crate::shared::constants::APP_DIR_NAME;

/// Persisted defaults for emotion analysis.
///
/// Missing or unreadable settings silently fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Face detector confidence threshold, 0.0-1.0.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub enforce_detection: bool,
}

fn default_confidence() -> f64 {
    crate::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confidence: default_confidence(),
            enforce_detection: false,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|json| match serde_json::from_str(&json) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    log::warn!("Ignoring malformed settings {}: {e}", path.display());
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            enforce_detection: self.enforce_detection,
        }
    }
}
