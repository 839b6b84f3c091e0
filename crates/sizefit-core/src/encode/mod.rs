//! Encoder adapter for sizefit.
//!
//! This module maps an output format and a quality value onto one encoder
//! call and reports the resulting buffer:
//! - JPEG and WebP take the quality value directly
//! - PNG remaps quality onto an inverted deflate compression level
//! - GIF ignores quality and palette-reduces the image instead
//!
//! Nothing here writes files or keeps state between calls.
//!
//! # Examples
//!
//! ```ignore
//! use sizefit_core::encode::{attempt_encode, OutputFormat, QualityRange};
//!
//! let result = attempt_encode(&image, OutputFormat::Jpeg, 80, QualityRange::default())?;
//! println!("Encoded {} bytes", result.byte_size);
//! ```

mod adapter;
mod gif;
mod jpeg;
mod png;
mod types;
mod webp;

pub use adapter::{attempt_encode, ImageQualityEncoder, QualityEncoder};
pub use gif::encode_gif;
pub use jpeg::encode_jpeg;
pub use png::{compression_level, encode_png, MAX_COMPRESSION_LEVEL};
pub use types::{EncodeError, EncodeResult, OutputFormat, QualityRange};
pub use self::webp::encode_webp;
