use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

/// Layout of the channels in the last dimension of a pixel array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    Gray,
    GrayAlpha,
    Rgb,
    Bgr,
    Rgba,
    Bgra,
}

impl ChannelOrder {
    pub fn channel_count(self) -> usize {
        match self {
            ChannelOrder::Gray => 1,
            ChannelOrder::GrayAlpha => 2,
            ChannelOrder::Rgb | ChannelOrder::Bgr => 3,
            ChannelOrder::Rgba | ChannelOrder::Bgra => 4,
        }
    }

    /// The order left after dropping a trailing alpha channel.
    pub fn without_alpha(self) -> Self {
        match self {
            ChannelOrder::GrayAlpha => ChannelOrder::Gray,
            ChannelOrder::Rgba => ChannelOrder::Rgb,
            ChannelOrder::Bgra => ChannelOrder::Bgr,
            other => other,
        }
    }
}

impl std::fmt::Display for ChannelOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelOrder::Gray => write!(f, "Gray"),
            ChannelOrder::GrayAlpha => write!(f, "GrayAlpha"),
            ChannelOrder::Rgb => write!(f, "RGB"),
            ChannelOrder::Bgr => write!(f, "BGR"),
            ChannelOrder::Rgba => write!(f, "RGBA"),
            ChannelOrder::Bgra => write!(f, "BGRA"),
        }
    }
}

/// An 8-bit image laid out as (height, width, channels).
///
/// The channel order travels with the data so consumers never have to guess
/// whether red or blue comes first.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelArray {
    data: Array3<u8>,
    order: ChannelOrder,
}

impl PixelArray {
    pub fn new(data: Array3<u8>, order: ChannelOrder) -> Self {
        debug_assert_eq!(
            data.shape()[2],
            order.channel_count(),
            "channel dimension must match channel order"
        );
        Self { data, order }
    }

    /// Builds a 3-channel array from row-major bytes.
    pub fn from_raw(
        bytes: Vec<u8>,
        width: u32,
        height: u32,
        order: ChannelOrder,
    ) -> Result<Self, ndarray::ShapeError> {
        let shape = (height as usize, width as usize, order.channel_count());
        Ok(Self::new(Array3::from_shape_vec(shape, bytes)?, order))
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    pub fn into_inner(self) -> Array3<u8> {
        self.data
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn width(&self) -> u32 {
        self.data.shape()[1] as u32
    }

    pub fn height(&self) -> u32 {
        self.data.shape()[0] as u32
    }

    pub fn channels(&self) -> usize {
        self.data.shape()[2]
    }

    /// Swaps channel 0 and channel 2 in place, flipping RGB <-> BGR.
    ///
    /// Alpha, if present, stays in the last position. Values are not scaled.
    pub fn swap_red_blue(&mut self) {
        if self.channels() < 3 {
            return;
        }
        for mut pixel in self.data.lanes_mut(ndarray::Axis(2)) {
            pixel.swap(0, 2);
        }
        self.order = match self.order {
            ChannelOrder::Rgb => ChannelOrder::Bgr,
            ChannelOrder::Bgr => ChannelOrder::Rgb,
            ChannelOrder::Rgba => ChannelOrder::Bgra,
            ChannelOrder::Bgra => ChannelOrder::Rgba,
            other => other,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_2x2() -> PixelArray {
        let bytes = vec![
            1, 2, 3, 4, 5, 6, //
            7, 8, 9, 10, 11, 12,
        ];
        PixelArray::from_raw(bytes, 2, 2, ChannelOrder::Rgb).unwrap()
    }

    #[test]
    fn test_shape_accessors() {
        let bytes = vec![0u8; 24]; // 2 rows x 4 cols x 3
        let pixels = PixelArray::from_raw(bytes, 4, 2, ChannelOrder::Bgr).unwrap();
        assert_eq!(pixels.width(), 4);
        assert_eq!(pixels.height(), 2);
        assert_eq!(pixels.channels(), 3);
        assert_eq!(pixels.view().shape(), &[2, 4, 3]);
        assert_eq!(pixels.order(), ChannelOrder::Bgr);
    }

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        let result = PixelArray::from_raw(vec![0u8; 10], 2, 2, ChannelOrder::Rgb);
        assert!(result.is_err());
    }

    #[test]
    fn test_swap_red_blue_swaps_outer_channels() {
        let mut pixels = rgb_2x2();
        pixels.swap_red_blue();
        assert_eq!(pixels.order(), ChannelOrder::Bgr);
        let view = pixels.view();
        assert_eq!(view[[0, 0, 0]], 3);
        assert_eq!(view[[0, 0, 1]], 2);
        assert_eq!(view[[0, 0, 2]], 1);
        assert_eq!(view[[1, 1, 0]], 12);
        assert_eq!(view[[1, 1, 2]], 10);
    }

    #[test]
    fn test_swap_red_blue_is_self_inverse() {
        let original = rgb_2x2();
        let mut pixels = original.clone();
        pixels.swap_red_blue();
        pixels.swap_red_blue();
        assert_eq!(pixels, original);
    }

    #[test]
    fn test_swap_red_blue_keeps_alpha_last() {
        let bytes = vec![10, 20, 30, 255];
        let mut pixels = PixelArray::from_raw(bytes, 1, 1, ChannelOrder::Rgba).unwrap();
        pixels.swap_red_blue();
        assert_eq!(pixels.order(), ChannelOrder::Bgra);
        assert_eq!(pixels.view().iter().copied().collect::<Vec<_>>(), vec![30, 20, 10, 255]);
    }

    #[test]
    fn test_without_alpha() {
        assert_eq!(ChannelOrder::Rgba.without_alpha(), ChannelOrder::Rgb);
        assert_eq!(ChannelOrder::Bgra.without_alpha(), ChannelOrder::Bgr);
        assert_eq!(ChannelOrder::GrayAlpha.without_alpha(), ChannelOrder::Gray);
        assert_eq!(ChannelOrder::Rgb.without_alpha(), ChannelOrder::Rgb);
    }
}
