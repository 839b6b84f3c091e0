//! Sizefit Core - target-size image re-encoding
//!
//! Re-encodes a raster image as JPEG, WebP, PNG or GIF, searching the
//! quality knob so the output lands near a requested byte size.
//!
//! The search is codec-agnostic: anything implementing
//! [`QualityEncoder`](encode::QualityEncoder) can be driven by
//! [`find_quality_for_target_size`].

pub mod compress;
pub mod config;
pub mod decode;
pub mod encode;
pub mod search;

pub use compress::{
    compress_file, encode_for_mode, CompressError, CompressMode, CompressReport, CompressRequest,
    CompressStatus, Resize,
};
pub use config::{load_config, Config, ConfigError};
pub use decode::{load_image, DecodedImage, ResizeFilter};
pub use encode::{EncodeError, EncodeResult, OutputFormat, QualityEncoder, QualityRange};
pub use search::{
    encode_at_fixed_quality, find_quality_for_target_size, FallbackPolicy, MatchKind, SearchError,
    SearchOptions, SearchOutcome,
};
