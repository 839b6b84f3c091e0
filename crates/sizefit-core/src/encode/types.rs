//! Core types for encode attempts.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during a single encode attempt.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The requested output extension has no encoder mapping.
    #[error("Unsupported output format: {extension:?}")]
    UnsupportedFormat { extension: String },

    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// Quality bounds are reversed or outside 1-100
    #[error("Invalid quality range: [{min}, {max}] (need 1 <= min <= max <= 100)")]
    InvalidQualityRange { min: u8, max: u8 },

    /// The codec rejected the image or parameter
    #[error("{format} encoding failed: {reason}")]
    EncodingFailed { format: OutputFormat, reason: String },
}

impl EncodeError {
    pub(crate) fn failed(format: OutputFormat, reason: impl ToString) -> Self {
        Self::EncodingFailed {
            format,
            reason: reason.to_string(),
        }
    }
}

/// Output container formats with a known encoder mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Webp,
    Png,
    Gif,
}

impl OutputFormat {
    /// Resolve a format from a file extension (`"jpg"`, `".PNG"`, ...).
    pub fn from_extension(extension: &str) -> Result<Self, EncodeError> {
        let normalized = extension.trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            _ => Err(EncodeError::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    /// Resolve a format from the extension of an output path.
    pub fn from_path(path: &Path) -> Result<Self, EncodeError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension)
    }

    /// Whether the quality parameter changes the encoded output.
    pub fn has_quality_knob(self) -> bool {
        !matches!(self, Self::Gif)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "JPEG",
            Self::Webp => "WEBP",
            Self::Png => "PNG",
            Self::Gif => "GIF",
        };
        f.write_str(name)
    }
}

/// Inclusive bounds of the quality parameter explored by a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityRange {
    min: u8,
    max: u8,
}

impl QualityRange {
    pub const DEFAULT_MIN: u8 = 5;
    pub const DEFAULT_MAX: u8 = 95;

    pub fn new(min: u8, max: u8) -> Result<Self, EncodeError> {
        if min == 0 || max > 100 || min > max {
            return Err(EncodeError::InvalidQualityRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(self) -> u8 {
        self.min
    }

    pub fn max(self) -> u8 {
        self.max
    }

    /// Number of distinct quality values in the range.
    pub fn span(self) -> u32 {
        (self.max - self.min) as u32 + 1
    }

    pub fn contains(self, quality: u8) -> bool {
        (self.min..=self.max).contains(&quality)
    }

    pub fn iter(self) -> impl Iterator<Item = u8> {
        self.min..=self.max
    }
}

impl Default for QualityRange {
    fn default() -> Self {
        Self {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}

/// The outcome of one encode attempt: an in-memory buffer and its size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeResult {
    /// Encoded size in bytes.
    pub byte_size: u64,
    /// Encoded file contents.
    pub bytes: Vec<u8>,
}

impl EncodeResult {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            byte_size: bytes.len() as u64,
            bytes,
        }
    }
}

/// Check that an RGB buffer matches its declared dimensions.
pub(crate) fn validate_rgb(pixels: &[u8], width: u32, height: u32) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }

    Ok(())
}
