use image::DynamicImage;
use ndarray::{s, ArrayD, IxDyn, Ix3};

use crate::normalization::domain::input_image::{InputImage, PixelBuffer, PixelData};
use crate::shared::error::EmotionError;
use crate::shared::pixel_array::{ChannelOrder, PixelArray};

/// Turns whatever the caller uploaded into an 8-bit, 3-channel BGR array.
///
/// Pipeline: null check → coerce image objects → reject non-arrays →
/// cast to `u8` → drop alpha → RGB to BGR.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageNormalizer;

impl ImageNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, image: Option<InputImage>) -> Result<PixelArray, EmotionError> {
        let image = image.ok_or(EmotionError::NoImage)?;

        let buffer = match coerce(image)? {
            Coerced::Pixels(buffer) => buffer,
            Coerced::Other(type_name) => return Err(EmotionError::InvalidType { type_name }),
        };

        let (data, order) = buffer.into_parts();
        log::debug!(
            "Normalizing {} array of shape {:?} ({order})",
            data.dtype(),
            data.shape()
        );

        let bytes = cast_to_u8(data);
        let (bytes, order) = strip_alpha(bytes, order).map_err(EmotionError::processing)?;
        to_bgr(bytes, order)
    }
}

enum Coerced {
    Pixels(PixelBuffer),
    Other(String),
}

fn coerce(image: InputImage) -> Result<Coerced, EmotionError> {
    match image {
        InputImage::Pixels(buffer) => Ok(Coerced::Pixels(buffer)),
        InputImage::Image(image) => image_to_buffer(image).map(Coerced::Pixels),
        InputImage::Encoded(bytes) => {
            let image = image::load_from_memory(&bytes).map_err(EmotionError::processing)?;
            image_to_buffer(image).map(Coerced::Pixels)
        }
        InputImage::Other { type_name } => Ok(Coerced::Other(type_name)),
    }
}

/// Converts a decoded image into a raw array without touching pixel values.
///
/// Gray images become 2-D arrays, as a decoded gray image has no channel axis.
fn image_to_buffer(image: DynamicImage) -> Result<PixelBuffer, EmotionError> {
    let (w, h) = (image.width() as usize, image.height() as usize);

    fn shaped<T>(raw: Vec<T>, shape: &[usize]) -> Result<ArrayD<T>, EmotionError> {
        ArrayD::from_shape_vec(IxDyn(shape), raw).map_err(EmotionError::processing)
    }

    let buffer = match image {
        DynamicImage::ImageLuma8(buf) => {
            PixelBuffer::new(shaped(buf.into_raw(), &[h, w])?, ChannelOrder::Gray)
        }
        DynamicImage::ImageLumaA8(buf) => {
            PixelBuffer::new(shaped(buf.into_raw(), &[h, w, 2])?, ChannelOrder::GrayAlpha)
        }
        DynamicImage::ImageRgb8(buf) => {
            PixelBuffer::new(shaped(buf.into_raw(), &[h, w, 3])?, ChannelOrder::Rgb)
        }
        DynamicImage::ImageRgba8(buf) => {
            PixelBuffer::new(shaped(buf.into_raw(), &[h, w, 4])?, ChannelOrder::Rgba)
        }
        DynamicImage::ImageLuma16(buf) => {
            PixelBuffer::new(shaped(buf.into_raw(), &[h, w])?, ChannelOrder::Gray)
        }
        DynamicImage::ImageLumaA16(buf) => {
            PixelBuffer::new(shaped(buf.into_raw(), &[h, w, 2])?, ChannelOrder::GrayAlpha)
        }
        DynamicImage::ImageRgb16(buf) => {
            PixelBuffer::new(shaped(buf.into_raw(), &[h, w, 3])?, ChannelOrder::Rgb)
        }
        DynamicImage::ImageRgba16(buf) => {
            PixelBuffer::new(shaped(buf.into_raw(), &[h, w, 4])?, ChannelOrder::Rgba)
        }
        DynamicImage::ImageRgb32F(buf) => {
            PixelBuffer::new(shaped(buf.into_raw(), &[h, w, 3])?, ChannelOrder::Rgb)
        }
        DynamicImage::ImageRgba32F(buf) => {
            PixelBuffer::new(shaped(buf.into_raw(), &[h, w, 4])?, ChannelOrder::Rgba)
        }
        other => PixelBuffer::new(
            shaped(other.into_rgba8().into_raw(), &[h, w, 4])?,
            ChannelOrder::Rgba,
        ),
    };
    Ok(buffer)
}

/// Conversion to `u8` that keeps the low 8 bits instead of saturating.
///
/// Floats are truncated toward zero first; NaN becomes 0. Out-of-range values
/// wrap rather than clamp.
trait WrapToU8: Copy {
    fn wrap_to_u8(self) -> u8;
}

impl WrapToU8 for u16 {
    fn wrap_to_u8(self) -> u8 {
        self as u8
    }
}

impl WrapToU8 for i32 {
    fn wrap_to_u8(self) -> u8 {
        self as u8
    }
}

impl WrapToU8 for i64 {
    fn wrap_to_u8(self) -> u8 {
        self as u8
    }
}

impl WrapToU8 for f32 {
    fn wrap_to_u8(self) -> u8 {
        (self as f64).wrap_to_u8()
    }
}

impl WrapToU8 for f64 {
    fn wrap_to_u8(self) -> u8 {
        // `as i64` truncates toward zero and maps NaN to 0
        (self as i64) as u8
    }
}

fn cast_to_u8(data: PixelData) -> ArrayD<u8> {
    fn wrap<T: WrapToU8>(array: ArrayD<T>) -> ArrayD<u8> {
        array.mapv(WrapToU8::wrap_to_u8)
    }

    match data {
        PixelData::U8(array) => array,
        PixelData::U16(array) => wrap(array),
        PixelData::I32(array) => wrap(array),
        PixelData::I64(array) => wrap(array),
        PixelData::F32(array) => wrap(array),
        PixelData::F64(array) => wrap(array),
    }
}

/// Drops the fourth channel of a (height, width, 4) array.
fn strip_alpha(
    bytes: ArrayD<u8>,
    order: ChannelOrder,
) -> Result<(ArrayD<u8>, ChannelOrder), ndarray::ShapeError> {
    if bytes.ndim() != 3 || bytes.shape()[2] != 4 {
        return Ok((bytes, order));
    }
    let rgba = bytes.into_dimensionality::<Ix3>()?;
    let stripped = rgba.slice(s![.., .., ..3]).to_owned().into_dyn();
    let order = match order {
        ChannelOrder::Bgra | ChannelOrder::Bgr => ChannelOrder::Bgr,
        ChannelOrder::Gray | ChannelOrder::GrayAlpha => order.without_alpha(),
        _ => ChannelOrder::Rgb,
    };
    log::debug!("Dropped alpha channel, now {order}");
    Ok((stripped, order))
}

fn to_bgr(bytes: ArrayD<u8>, order: ChannelOrder) -> Result<PixelArray, EmotionError> {
    let shape = bytes.shape().to_vec();
    let array = bytes.into_dimensionality::<Ix3>().map_err(|_| {
        EmotionError::ProcessingFailure(format!(
            "expected a (height, width, channels) array, got shape {shape:?}"
        ))
    })?;

    let (h, w, c) = array.dim();
    if h == 0 || w == 0 {
        return Err(EmotionError::ProcessingFailure(format!(
            "image has no pixels (shape {shape:?})"
        )));
    }
    if c != order.channel_count() {
        return Err(EmotionError::ProcessingFailure(format!(
            "channel order {order} expects {} channels, array has {c}",
            order.channel_count()
        )));
    }

    match order {
        ChannelOrder::Bgr => Ok(PixelArray::new(array, ChannelOrder::Bgr)),
        ChannelOrder::Rgb => {
            let mut pixels = PixelArray::new(array, ChannelOrder::Rgb);
            pixels.swap_red_blue();
            Ok(pixels)
        }
        other => Err(EmotionError::ProcessingFailure(format!(
            "cannot convert {other} image with {c} channels to BGR"
        ))),
    }
}
