//! Re-encoding of uploaded images into the form Ollama expects.
//!
//! Every image is flattened to 8-bit RGB, written as JPEG and base64 encoded,
//! whatever format and colour mode it arrived in.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use thiserror::Error;

/// JPEG quality used for forwarded images.
pub const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}

/// A file taken from the `images` multipart field.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Upload {
    /// Only named files declared as `image/*` are considered for encoding.
    pub fn is_image(&self) -> bool {
        self.file_name.as_deref().is_some_and(|n| !n.is_empty())
            && self
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// Decode `bytes`, convert to RGB and return base64 encoded JPEG data.
pub fn encode_image(bytes: &[u8]) -> Result<String, ImageError> {
    let decoded = image::load_from_memory(bytes).map_err(ImageError::Decode)?;
    let rgb = match decoded {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(ImageError::Encode)?;

    Ok(STANDARD.encode(jpeg))
}

/// Encode every image upload, skipping (and logging) the ones that fail.
///
/// Order of the surviving images follows upload order.
pub fn encode_uploads(uploads: &[Upload]) -> Vec<String> {
    uploads
        .iter()
        .filter(|upload| upload.is_image())
        .filter_map(|upload| match encode_image(&upload.data) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                tracing::warn!(
                    file_name = upload.file_name.as_deref().unwrap_or("-"),
                    error = %e,
                    "Dropping image that could not be re-encoded"
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn decode(encoded: &str) -> DynamicImage {
        let bytes = STANDARD.decode(encoded).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        image::load_from_memory(&bytes).unwrap()
    }

    fn upload(name: Option<&str>, content_type: Option<&str>, data: Vec<u8>) -> Upload {
        Upload {
            file_name: name.map(str::to_string),
            content_type: content_type.map(str::to_string),
            data,
        }
    }

    #[test]
    fn grayscale_png_becomes_rgb_jpeg() {
        let gray = GrayImage::from_pixel(17, 9, Luma([128]));
        let encoded = encode_image(&png(DynamicImage::ImageLuma8(gray))).unwrap();

        let decoded = decode(&encoded);
        assert_eq!((decoded.width(), decoded.height()), (17, 9));
        assert_eq!(decoded.color(), ColorType::Rgb8);
    }

    #[test]
    fn rgba_png_becomes_rgb_jpeg() {
        let rgba = RgbaImage::from_pixel(32, 20, Rgba([200, 10, 10, 120]));
        let encoded = encode_image(&png(DynamicImage::ImageRgba8(rgba))).unwrap();

        let decoded = decode(&encoded);
        assert_eq!((decoded.width(), decoded.height()), (32, 20));
        assert_eq!(decoded.color(), ColorType::Rgb8);
    }

    #[test]
    fn grayscale_jpeg_becomes_rgb_jpeg() {
        let gray = GrayImage::from_pixel(13, 21, Luma([60]));
        let mut input = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(gray)
            .write_to(&mut input, ImageFormat::Jpeg)
            .unwrap();
        assert_eq!(
            image::load_from_memory(input.get_ref()).unwrap().color(),
            ColorType::L8
        );

        let decoded = decode(&encode_image(input.get_ref()).unwrap());
        assert_eq!((decoded.width(), decoded.height()), (13, 21));
        assert_eq!(decoded.color(), ColorType::Rgb8);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = encode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ImageError::Decode(_)));
    }

    #[test]
    fn only_named_image_uploads_are_considered() {
        let good = png(DynamicImage::ImageLuma8(GrayImage::new(4, 4)));
        let uploads = vec![
            upload(Some("a.png"), Some("image/png"), good.clone()),
            upload(Some("notes.txt"), Some("text/plain"), good.clone()),
            upload(None, Some("image/png"), good.clone()),
            upload(Some("broken.png"), Some("image/png"), b"nope".to_vec()),
            upload(Some("b.png"), Some("image/png"), good),
        ];

        assert_eq!(encode_uploads(&uploads).len(), 2);
    }
}
