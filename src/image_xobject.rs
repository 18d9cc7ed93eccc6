// This code is inspired by https://github.com/fschutt/printpdf/blob/2bebdc65d06dafbe926ed4b43fedd10f966c59d3/src/xobject.rs

use crate::Error;
use lopdf::ObjectId;
use png::{BitDepth, ColorType, Transformations};
use std::io::Read;

/// A decoded signature image ready to be stored as an image XObject.
#[derive(Debug, Clone)]
pub struct ImageXObject {
    /// Width of the image (original width, not scaled width)
    pub width: u32,
    /// Height of the image (original height, not scaled height)
    pub height: u32,
    /// Only `Rgb` and `Grayscale` are stored, alpha goes into a separate mask.
    pub color_space: ColorType,
    /// Always 8 after decoding, the decoder expands and strips other depths.
    pub bits_per_component: BitDepth,
    /// Should the image be interpolated when scaled?
    pub interpolate: bool,
    /// The actual data from the image
    pub image_data: Vec<u8>,
    /// Image used as a soft mask. (transparency)
    pub s_mask: Option<ObjectId>,
}

impl ImageXObject {
    /// Returns 1 or 2 images. The first is the color images.
    /// The second is (if present) the mask/alpha channel of the image.
    pub fn try_from_png<R: Read>(reader: R) -> Result<(Self, Option<Self>), Error> {
        let mut decoder = png::Decoder::new(reader);
        // Palette images become RGB(A), 16 bit becomes 8 bit.
        decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
        let mut image_reader = decoder.read_info()?;
        // Allocate the output buffer.
        let mut buf = vec![0; image_reader.output_buffer_size()];
        // Read the next frame. An APNG might contain multiple frames.
        let info = image_reader.next_frame(&mut buf)?;
        let image_data = &buf[..info.buffer_size()];

        let (color_space, image_color_data, alpha_data) = match info.color_type {
            ColorType::Rgba => (
                ColorType::Rgb,
                Self::split_alpha(image_data, 4),
                Some(Self::alpha_channel(image_data, 4)),
            ),
            ColorType::GrayscaleAlpha => (
                ColorType::Grayscale,
                Self::split_alpha(image_data, 2),
                Some(Self::alpha_channel(image_data, 2)),
            ),
            ColorType::Rgb => (ColorType::Rgb, image_data.to_vec(), None),
            ColorType::Grayscale => (ColorType::Grayscale, image_data.to_vec(), None),
            ColorType::Indexed => {
                return Err(Error::from("Palette image was not expanded by the decoder."))
            }
        };
        log::trace!(
            "Decoded signature image {}x{} ({:?}, alpha: {}).",
            info.width,
            info.height,
            color_space,
            alpha_data.is_some()
        );

        Ok((
            Self {
                width: info.width,
                height: info.height,
                color_space,
                bits_per_component: BitDepth::Eight,
                image_data: image_color_data,
                interpolate: true,
                s_mask: None, // This should be filled in later
            },
            alpha_data.map(|alpha_data| Self {
                width: info.width,
                height: info.height,
                color_space: ColorType::Grayscale,
                bits_per_component: BitDepth::Eight,
                image_data: alpha_data,
                interpolate: true,
                s_mask: None,
            }),
        ))
    }

    /// Color bytes of each pixel without the trailing alpha byte.
    fn split_alpha(data: &[u8], channels: usize) -> Vec<u8> {
        let mut output = Vec::with_capacity(data.len() / channels * (channels - 1));
        for pixel in data.chunks_exact(channels) {
            output.extend_from_slice(&pixel[..channels - 1]);
        }
        output
    }

    fn alpha_channel(data: &[u8], channels: usize) -> Vec<u8> {
        data.chunks_exact(channels)
            .map(|pixel| pixel[channels - 1])
            .collect()
    }
}

// Inspired and derived from: https://github.com/fschutt/printpdf/blob/2bebdc65d06dafbe926ed4b43fedd10f966c59d3/src/xobject.rs#L245
impl From<ImageXObject> for lopdf::Stream {
    fn from(image: ImageXObject) -> Self {
        use lopdf::Object::*;

        let cs: &'static str = match image.color_space {
            ColorType::Rgb | ColorType::Rgba => "DeviceRGB",
            ColorType::Grayscale | ColorType::GrayscaleAlpha | ColorType::Indexed => "DeviceGray",
        };

        let mut dict = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("XObject".as_bytes().to_vec())),
            ("Subtype", Name("Image".as_bytes().to_vec())),
            ("Width", Integer(image.width as i64)),
            ("Height", Integer(image.height as i64)),
            ("Interpolate", image.interpolate.into()),
            ("BitsPerComponent", Integer(image.bits_per_component as i64)),
            ("ColorSpace", Name(cs.as_bytes().to_vec())),
        ]);
        if let Some(s_mask) = image.s_mask {
            dict.set("SMask", Reference(s_mask));
        }

        lopdf::Stream::new(dict, image.image_data)
    }
}

impl From<ImageXObject> for lopdf::Object {
    fn from(image: ImageXObject) -> Self {
        lopdf::Object::Stream(image.into())
    }
}
