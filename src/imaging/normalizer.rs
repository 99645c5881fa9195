use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{
    codecs::jpeg::JpegEncoder, imageops, imageops::FilterType, DynamicImage, RgbImage,
};

use crate::error::{BedrockError, Result};

use super::{SourceImage, ALLOWED_SIZES, CONDITIONING_JPEG_QUALITY, MIN_SIZE, SIZE_STEP};

/// A 3-channel image whose edges are drawn from [`ALLOWED_SIZES`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    image: RgbImage,
}

impl NormalizedImage {
    pub fn from_source(source: &SourceImage) -> Result<Self> {
        normalize(source.image())
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
        self.image
            .write_with_encoder(encoder)
            .map_err(|e| BedrockError::InvalidImage(format!("JPEG encoding failed: {}", e)))?;
        Ok(bytes)
    }

    /// Base64 JPEG (quality 90) as embedded in request payloads.
    pub fn to_base64_jpeg(&self) -> Result<String> {
        Ok(STANDARD.encode(self.to_jpeg(CONDITIONING_JPEG_QUALITY)?))
    }
}

/// First grid size with the smallest distance to `value`.
pub fn closest_size(value: f64) -> u32 {
    let mut best = ALLOWED_SIZES[0];
    let mut best_distance = (f64::from(best) - value).abs();
    for &candidate in &ALLOWED_SIZES[1..] {
        let distance = (f64::from(candidate) - value).abs();
        if distance < best_distance {
            best = candidate;
            best_distance = distance;
        }
    }
    best
}

fn snap(size: u32) -> u32 {
    (size / SIZE_STEP * SIZE_STEP).max(MIN_SIZE)
}

/// Grid dimensions for a `width` x `height` source, keeping the aspect ratio
/// as close as the grid allows.
pub fn target_dimensions(width: u32, height: u32) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(BedrockError::InvalidImage(format!(
            "degenerate image dimensions {}x{}",
            width, height
        )));
    }

    let ratio = f64::from(width) / f64::from(height);
    let (target_width, target_height) = if ratio >= 1.0 {
        let target_width = closest_size(f64::from(width));
        (target_width, closest_size(f64::from(target_width) / ratio))
    } else {
        let target_height = closest_size(f64::from(height));
        (closest_size(f64::from(target_height) * ratio), target_height)
    };

    Ok((snap(target_width), snap(target_height)))
}

/// Convert to RGB and resample onto the size grid with a Lanczos filter.
/// The input is left untouched.
pub fn normalize(img: &DynamicImage) -> Result<NormalizedImage> {
    let (width, height) = (img.width(), img.height());
    let (target_width, target_height) = target_dimensions(width, height)?;

    let rgb = img.to_rgb8();
    let image = if (width, height) == (target_width, target_height) {
        rgb
    } else {
        imageops::resize(&rgb, target_width, target_height, FilterType::Lanczos3)
    };

    log::debug!(
        "Normalized {}x{} image to {}x{}",
        width,
        height,
        target_width,
        target_height
    );

    Ok(NormalizedImage { image })
}
