use image::{ColorType, DynamicImage, ImageFormat};

use crate::error::{BedrockError, Result};

/// An uploaded photo, decoded once and owned by a single request.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub color: ColorType,
    image: DynamicImage,
}

impl SourceImage {
    /// Decode an upload. Only PNG and JPEG are accepted.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(BedrockError::InvalidImage("upload is empty".into()));
        }

        let format = image::guess_format(bytes)
            .map_err(|e| BedrockError::InvalidImage(format!("unrecognised image data: {}", e)))?;

        if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
            return Err(BedrockError::InvalidImage(format!(
                "{:?} uploads are not supported, use PNG or JPEG",
                format
            )));
        }

        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| BedrockError::InvalidImage(e.to_string()))?;

        log::debug!(
            "Decoded {:?} upload: {}x{} {:?}",
            format,
            image.width(),
            image.height(),
            image.color()
        );

        Ok(Self {
            format,
            width: image.width(),
            height: image.height(),
            color: image.color(),
            image,
        })
    }

    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use std::io::Cursor;

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    #[test]
    fn png_upload_keeps_declared_metadata() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(40, 30, Rgba([1, 2, 3, 255])));
        let source = SourceImage::from_bytes(&encode(&img, ImageFormat::Png)).unwrap();
        assert_eq!(source.format, ImageFormat::Png);
        assert_eq!((source.width, source.height), (40, 30));
        assert_eq!(source.color, ColorType::Rgba8);
    }

    #[test]
    fn jpeg_upload_is_accepted() {
        let img = DynamicImage::new_rgb8(16, 16);
        let source = SourceImage::from_bytes(&encode(&img, ImageFormat::Jpeg)).unwrap();
        assert_eq!(source.format, ImageFormat::Jpeg);
    }

    #[test]
    fn garbage_and_empty_uploads_are_rejected() {
        assert!(matches!(
            SourceImage::from_bytes(&[]),
            Err(BedrockError::InvalidImage(_))
        ));
        assert!(matches!(
            SourceImage::from_bytes(b"definitely not an image"),
            Err(BedrockError::InvalidImage(_))
        ));
    }

    #[test]
    fn non_png_jpeg_formats_are_rejected() {
        // GIF magic, recognised by guess_format but not accepted
        let err = SourceImage::from_bytes(b"GIF89a\x01\x00\x01\x00").unwrap_err();
        assert!(err.to_string().contains("PNG or JPEG"));
    }
}
