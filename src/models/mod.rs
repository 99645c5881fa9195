pub mod common;
pub mod image;

pub use common::*;
pub use self::image::*;
