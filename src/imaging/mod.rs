//! Upload handling and pre-submission normalization of conditioning images.

mod normalizer;
mod source;

pub use normalizer::{closest_size, normalize, target_dimensions, NormalizedImage};
pub use source::SourceImage;

/// Edge lengths the image models accept for conditioning images.
pub const ALLOWED_SIZES: [u32; 9] = [512, 576, 640, 704, 768, 832, 896, 960, 1024];

/// Every normalized edge is a multiple of this.
pub const SIZE_STEP: u32 = 64;

pub const MIN_SIZE: u32 = 512;

/// JPEG quality used when a conditioning image is embedded in a request.
pub const CONDITIONING_JPEG_QUALITY: u8 = 90;
