use std::any::Any;

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use ndarray::{Array2, Array3, ArrayD};

use crate::shared::pixel_array::ChannelOrder;

/// Raw pixel values of any supported element type, in (height, width[, channels]) order.
#[derive(Clone, Debug, PartialEq)]
pub enum PixelData {
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

impl PixelData {
    pub fn shape(&self) -> &[usize] {
        match self {
            PixelData::U8(a) => a.shape(),
            PixelData::U16(a) => a.shape(),
            PixelData::I32(a) => a.shape(),
            PixelData::I64(a) => a.shape(),
            PixelData::F32(a) => a.shape(),
            PixelData::F64(a) => a.shape(),
        }
    }

    pub fn dtype(&self) -> &'static str {
        match self {
            PixelData::U8(_) => "u8",
            PixelData::U16(_) => "u16",
            PixelData::I32(_) => "i32",
            PixelData::I64(_) => "i64",
            PixelData::F32(_) => "f32",
            PixelData::F64(_) => "f64",
        }
    }
}

macro_rules! impl_pixel_data_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<ArrayD<$t>> for PixelData {
                fn from(array: ArrayD<$t>) -> Self {
                    PixelData::$variant(array)
                }
            }

            impl From<Array3<$t>> for PixelData {
                fn from(array: Array3<$t>) -> Self {
                    PixelData::$variant(array.into_dyn())
                }
            }
        )*
    };
}

impl_pixel_data_from!(u8 => U8, u16 => U16, i32 => I32, i64 => I64, f32 => F32, f64 => F64);

/// A raw pixel array paired with the order of its channels.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    data: PixelData,
    order: ChannelOrder,
}

impl PixelBuffer {
    pub fn new(data: impl Into<PixelData>, order: ChannelOrder) -> Self {
        Self {
            data: data.into(),
            order,
        }
    }

    /// Wraps an array whose channel order is implied by its shape.
    ///
    /// 2-D arrays and single-channel arrays are gray, two channels are
    /// gray+alpha, four are RGBA and everything else is assumed RGB.
    pub fn from_array(data: impl Into<PixelData>) -> Self {
        let data = data.into();
        let order = implied_order(data.shape());
        Self { data, order }
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn into_parts(self) -> (PixelData, ChannelOrder) {
        (self.data, self.order)
    }
}

fn implied_order(shape: &[usize]) -> ChannelOrder {
    match shape {
        [_, _] | [_, _, 1] => ChannelOrder::Gray,
        [_, _, 2] => ChannelOrder::GrayAlpha,
        [_, _, 4] => ChannelOrder::Rgba,
        _ => ChannelOrder::Rgb,
    }
}

/// An uploaded image in whatever form the caller happened to have it.
///
/// Absence is expressed as `Option<InputImage>` at the call site.
#[derive(Clone, Debug)]
pub enum InputImage {
    /// A decoded image object.
    Image(DynamicImage),
    /// Undecoded file contents (PNG, JPEG, ...).
    Encoded(Vec<u8>),
    /// A raw pixel array.
    Pixels(PixelBuffer),
    /// A value with no image interpretation; only its type is kept.
    Other { type_name: String },
}

impl InputImage {
    /// Classifies an arbitrary value by its runtime type.
    ///
    /// Image buffers, pixel arrays and encoded bytes map to their matching
    /// variant; anything else becomes [`InputImage::Other`] carrying the
    /// value's type name.
    pub fn from_value<T: Any>(value: T) -> Self {
        let boxed: Box<dyn Any> = Box::new(value);

        macro_rules! try_downcast {
            ($boxed:ident, $t:ty, $convert:expr) => {
                let $boxed = match $boxed.downcast::<$t>() {
                    Ok(v) => return $convert(*v),
                    Err(other) => other,
                };
            };
        }

        try_downcast!(boxed, InputImage, |v: InputImage| v);
        try_downcast!(boxed, DynamicImage, InputImage::Image);
        try_downcast!(boxed, RgbImage, |v| InputImage::Image(DynamicImage::ImageRgb8(v)));
        try_downcast!(boxed, RgbaImage, |v| InputImage::Image(DynamicImage::ImageRgba8(v)));
        try_downcast!(boxed, GrayImage, |v| InputImage::Image(DynamicImage::ImageLuma8(v)));
        try_downcast!(boxed, PixelBuffer, InputImage::Pixels);
        try_downcast!(boxed, Vec<u8>, InputImage::Encoded);
        try_downcast!(boxed, Array2<u8>, |v: Array2<u8>| pixels(v.into_dyn()));
        try_downcast!(boxed, ArrayD<u8>, pixels);
        try_downcast!(boxed, Array3<u8>, pixels);
        try_downcast!(boxed, Array3<u16>, pixels);
        try_downcast!(boxed, Array3<i32>, pixels);
        try_downcast!(boxed, Array3<i64>, pixels);
        try_downcast!(boxed, Array3<f32>, pixels);
        try_downcast!(boxed, Array3<f64>, pixels);
        drop(boxed);

        InputImage::Other {
            type_name: std::any::type_name::<T>().to_string(),
        }
    }
}

fn pixels(data: impl Into<PixelData>) -> InputImage {
    InputImage::Pixels(PixelBuffer::from_array(data))
}

impl From<DynamicImage> for InputImage {
    fn from(image: DynamicImage) -> Self {
        InputImage::Image(image)
    }
}

impl From<PixelBuffer> for InputImage {
    fn from(buffer: PixelBuffer) -> Self {
        InputImage::Pixels(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_from_value_dynamic_image() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 3));
        assert!(matches!(InputImage::from_value(image), InputImage::Image(_)));
    }

    #[test]
    fn test_from_value_rgba_buffer_becomes_image() {
        let image = RgbaImage::new(2, 2);
        match InputImage::from_value(image) {
            InputImage::Image(DynamicImage::ImageRgba8(buf)) => assert_eq!(buf.dimensions(), (2, 2)),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_from_value_bytes_are_encoded() {
        assert!(matches!(
            InputImage::from_value(vec![0x89u8, b'P', b'N', b'G']),
            InputImage::Encoded(_)
        ));
    }

    #[test]
    fn test_from_value_array_infers_order() {
        let rgba = Array3::<u8>::zeros((2, 2, 4));
        match InputImage::from_value(rgba) {
            InputImage::Pixels(buf) => assert_eq!(buf.order(), ChannelOrder::Rgba),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_from_value_float_array_keeps_dtype() {
        let arr = Array3::<f32>::zeros((2, 2, 3));
        match InputImage::from_value(arr) {
            InputImage::Pixels(buf) => assert_eq!(buf.data().dtype(), "f32"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_from_value_passes_input_image_through() {
        let input = InputImage::Encoded(vec![1, 2, 3]);
        match InputImage::from_value(input) {
            InputImage::Encoded(bytes) => assert_eq!(bytes, vec![1, 2, 3]),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_from_value_str_is_other() {
        match InputImage::from_value("not an image") {
            InputImage::Other { type_name } => assert_eq!(type_name, "&str"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_from_value_number_is_other() {
        match InputImage::from_value(42i32) {
            InputImage::Other { type_name } => assert_eq!(type_name, "i32"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[rstest]
    #[case(&[10, 10], ChannelOrder::Gray)]
    #[case(&[10, 10, 1], ChannelOrder::Gray)]
    #[case(&[10, 10, 2], ChannelOrder::GrayAlpha)]
    #[case(&[10, 10, 3], ChannelOrder::Rgb)]
    #[case(&[10, 10, 4], ChannelOrder::Rgba)]
    #[case(&[10, 10, 5], ChannelOrder::Rgb)]
    fn test_implied_order(#[case] shape: &[usize], #[case] expected: ChannelOrder) {
        assert_eq!(implied_order(shape), expected);
    }
}
