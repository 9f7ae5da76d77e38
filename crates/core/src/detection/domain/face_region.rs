use serde::{Deserialize, Serialize};

/// A detected face as an axis-aligned box in image pixel coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Detector confidence; 0.0 for the whole-image fallback region.
    pub confidence: f64,
}

impl FaceRegion {
    /// Builds a region from `(x1, y1, x2, y2)` corner coordinates.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f64) -> Self {
        let x = x1.round() as i32;
        let y = y1.round() as i32;
        Self {
            x,
            y,
            width: (x2.round() as i32).saturating_sub(x).max(0),
            height: (y2.round() as i32).saturating_sub(y).max(0),
            confidence,
        }
    }

    /// The region covering an entire image, used when no face was found.
    pub fn whole_image(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width: width as i32,
            height: height as i32,
            confidence: 0.0,
        }
    }

    /// Intersects the region with a `width` × `height` image.
    ///
    /// Returns `None` when nothing of the region remains visible.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<FaceRegion> {
        let x1 = self.x.clamp(0, width as i32);
        let y1 = self.y.clamp(0, height as i32);
        let x2 = self.x.saturating_add(self.width).clamp(0, width as i32);
        let y2 = self.y.saturating_add(self.height).clamp(0, height as i32);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(FaceRegion {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
            confidence: self.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn region(x: i32, y: i32, w: i32, h: i32) -> FaceRegion {
        FaceRegion {
            x,
            y,
            width: w,
            height: h,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_from_corners_rounds() {
        let r = FaceRegion::from_corners(10.4, 20.6, 50.5, 80.2, 0.7);
        assert_eq!((r.x, r.y, r.width, r.height), (10, 21, 41, 59));
        assert_eq!(r.confidence, 0.7);
    }

    #[test]
    fn test_from_corners_inverted_box_has_zero_size() {
        let r = FaceRegion::from_corners(50.0, 50.0, 10.0, 10.0, 0.5);
        assert_eq!((r.width, r.height), (0, 0));
    }

    #[test]
    fn test_from_corners_extreme_coordinates_saturate() {
        let r = FaceRegion::from_corners(-3.0e9, -3.0e9, 3.0e9, 3.0e9, 0.5);
        assert_eq!((r.x, r.y), (i32::MIN, i32::MIN));
        assert_eq!((r.width, r.height), (i32::MAX, i32::MAX));
    }

    #[test]
    fn test_clamp_to_huge_region_covers_image() {
        let r = region(i32::MAX - 5, 0, i32::MAX, 10);
        assert_eq!(r.clamp_to(100, 100), None);
        let r = region(-10, -10, i32::MAX, i32::MAX);
        assert_eq!(r.clamp_to(100, 60), Some(region(0, 0, 100, 60)));
    }

    #[test]
    fn test_whole_image() {
        let r = FaceRegion::whole_image(100, 60);
        assert_eq!(r, region(0, 0, 100, 60).with_confidence(0.0));
    }

    #[rstest]
    #[case(region(10, 10, 20, 20), Some(region(10, 10, 20, 20)))]
    #[case(region(-5, -5, 20, 20), Some(region(0, 0, 15, 15)))]
    #[case(region(90, 90, 20, 20), Some(region(90, 90, 10, 10)))]
    #[case(region(150, 10, 20, 20), None)]
    #[case(region(10, -30, 20, 20), None)]
    fn test_clamp_to(#[case] input: FaceRegion, #[case] expected: Option<FaceRegion>) {
        assert_eq!(input.clamp_to(100, 100), expected);
    }

    impl FaceRegion {
        fn with_confidence(mut self, confidence: f64) -> Self {
            self.confidence = confidence;
            self
        }
    }
}
