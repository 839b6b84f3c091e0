//! Format dispatch for single encode attempts.

use crate::decode::DecodedImage;

use super::gif::encode_gif;
use super::jpeg::encode_jpeg;
use super::png::{compression_level, encode_png};
use super::types::{EncodeError, EncodeResult, OutputFormat, QualityRange};
use super::webp::encode_webp;

/// Something the quality search can ask for an encode at a given quality.
///
/// Implementations must not keep state between calls: the same quality must
/// produce the same result.
pub trait QualityEncoder {
    /// Output format this encoder produces.
    fn format(&self) -> OutputFormat;

    /// Encode once at `quality` and report the buffer and its size.
    fn encode_at(&self, quality: u8) -> Result<EncodeResult, EncodeError>;

    /// The codec setting `quality` actually resolves to.
    ///
    /// Qualities that share a setting produce identical output, which lets
    /// exhaustive scans skip duplicates.
    fn effective_setting(&self, quality: u8) -> u8 {
        quality
    }
}

/// Perform one encode of `image` as `format` at `quality`.
///
/// `range` is only consulted for PNG, where quality is remapped onto a
/// compression level relative to the search bounds.
pub fn attempt_encode(
    image: &DecodedImage,
    format: OutputFormat,
    quality: u8,
    range: QualityRange,
) -> Result<EncodeResult, EncodeError> {
    let (pixels, width, height) = (&image.pixels, image.width, image.height);

    let bytes = match format {
        OutputFormat::Jpeg => encode_jpeg(pixels, width, height, quality)?,
        OutputFormat::Webp => encode_webp(pixels, width, height, quality)?,
        OutputFormat::Png => encode_png(pixels, width, height, compression_level(quality, range))?,
        OutputFormat::Gif => encode_gif(pixels, width, height)?,
    };

    Ok(EncodeResult::new(bytes))
}

/// [`QualityEncoder`] over a decoded raster and a fixed output format.
#[derive(Debug, Clone, Copy)]
pub struct ImageQualityEncoder<'a> {
    image: &'a DecodedImage,
    format: OutputFormat,
    range: QualityRange,
}

impl<'a> ImageQualityEncoder<'a> {
    pub fn new(image: &'a DecodedImage, format: OutputFormat, range: QualityRange) -> Self {
        Self {
            image,
            format,
            range,
        }
    }
}

impl QualityEncoder for ImageQualityEncoder<'_> {
    fn format(&self) -> OutputFormat {
        self.format
    }

    fn encode_at(&self, quality: u8) -> Result<EncodeResult, EncodeError> {
        attempt_encode(self.image, self.format, quality, self.range)
    }

    fn effective_setting(&self, quality: u8) -> u8 {
        match self.format {
            OutputFormat::Jpeg | OutputFormat::Webp => quality,
            OutputFormat::Png => compression_level(quality, self.range),
            OutputFormat::Gif => 0,
        }
    }
}
