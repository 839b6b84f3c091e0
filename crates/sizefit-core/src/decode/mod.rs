//! Source image loading.
//!
//! Decodes JPEG, PNG, WebP and GIF sources into one upright RGB raster per
//! job, with an optional downscale before the quality search begins.

mod load;
mod resize;
mod types;

pub use load::{decode_image, load_image, read_orientation};
pub use resize::{resize_to_fit, resize_to_width};
pub use types::{DecodeError, DecodedImage, Orientation, ResizeFilter};
