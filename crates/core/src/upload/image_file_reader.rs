use std::fs;
use std::path::Path;

use image::DynamicImage;

use crate::normalization::domain::input_image::InputImage;

/// Turns uploaded files into [`InputImage`]s the way an upload widget would.
///
/// Gray uploads are widened to RGB (RGBA when they carry alpha) so a plain
/// grayscale photo is still analyzable. Files that fail to decode are passed
/// on as [`InputImage::Encoded`] so the normalizer reports the decode error.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }

    /// Reads an upload from disk. An empty file counts as no upload.
    pub fn read(&self, path: &Path) -> Result<Option<InputImage>, Box<dyn std::error::Error>> {
        let bytes = fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
        log::debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(self.read_bytes(bytes))
    }

    pub fn read_bytes(&self, bytes: Vec<u8>) -> Option<InputImage> {
        if bytes.is_empty() {
            return None;
        }
        match image::load_from_memory(&bytes) {
            Ok(image) => Some(InputImage::Image(widen_gray(image))),
            Err(e) => {
                log::warn!("Upload did not decode up front: {e}");
                Some(InputImage::Encoded(bytes))
            }
        }
    }
}

fn widen_gray(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_) => {
            DynamicImage::ImageRgb8(image.to_rgb8())
        }
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => {
            DynamicImage::ImageRgba8(image.to_rgba8())
        }
        other => other,
    }
}
