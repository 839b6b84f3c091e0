use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading or reshaping the source image.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Cannot read {path}: {reason}")]
    Read { path: String, reason: String },

    /// The bytes match none of the compiled-in source formats.
    #[error("Unrecognized source image format")]
    UnknownFormat,

    #[error("Malformed source image: {0}")]
    Malformed(String),

    #[error("Invalid resize target: {width}x{height}")]
    InvalidResize { width: u32, height: u32 },
}

/// Resampling filter used when the job shrinks the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    Bilinear,
    CatmullRom,
    #[default]
    Lanczos3,
}

impl From<ResizeFilter> for image::imageops::FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => image::imageops::FilterType::Nearest,
            ResizeFilter::Bilinear => image::imageops::FilterType::Triangle,
            ResizeFilter::CatmullRom => image::imageops::FilterType::CatmullRom,
            ResizeFilter::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// EXIF orientation tag (values 1-8), named by how the stored pixels look
/// relative to the upright scene. `RotatedLeft` (tag 6) is stored turned 90
/// degrees counter-clockwise and [`Orientation::apply`] turns it clockwise.
///
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Upright,
    Mirrored,
    UpsideDown,
    MirroredUpsideDown,
    MirroredRotatedLeft,
    RotatedLeft,
    MirroredRotatedRight,
    RotatedRight,
}

impl Orientation {
    /// Map a raw tag value; anything outside 1-8 is treated as upright.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Orientation::Mirrored,
            3 => Orientation::UpsideDown,
            4 => Orientation::MirroredUpsideDown,
            5 => Orientation::MirroredRotatedLeft,
            6 => Orientation::RotatedLeft,
            7 => Orientation::MirroredRotatedRight,
            8 => Orientation::RotatedRight,
            _ => Orientation::Upright,
        }
    }

    /// Rotate and flip `img` so it displays upright without the tag.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Upright => img,
            Orientation::Mirrored => img.fliph(),
            Orientation::UpsideDown => img.rotate180(),
            Orientation::MirroredUpsideDown => img.flipv(),
            Orientation::MirroredRotatedLeft => img.rotate90().fliph(),
            Orientation::RotatedLeft => img.rotate90(),
            Orientation::MirroredRotatedRight => img.rotate270().fliph(),
            Orientation::RotatedRight => img.rotate270(),
        }
    }
}

/// Upright RGB raster every encode attempt reads from.
///
/// Produced once per job and only borrowed by the search. `pixels` is
/// row-major, three bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 3);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Flatten any decoded image (alpha, palette, 16-bit) to 8-bit RGB.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let rgb = img.into_rgb8();
        let (width, height) = rgb.dimensions();
        Self::new(width, height, rgb.into_raw())
    }

    /// Borrow the pixels as an `image` buffer view.
    pub(crate) fn as_rgb_image(&self) -> Option<image::ImageBuffer<image::Rgb<u8>, &[u8]>> {
        image::ImageBuffer::from_raw(self.width, self.height, self.pixels.as_slice())
    }
}
