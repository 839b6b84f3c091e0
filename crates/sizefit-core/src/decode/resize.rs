//! Optional shrink before the quality search.
//!
//! Very small targets are often out of reach at any quality, so a job may
//! downscale the raster once up front. Nothing here ever enlarges an image.

use super::{DecodeError, DecodedImage, ResizeFilter};

/// Shrink to `width` pixels wide, keeping the aspect ratio.
pub fn resize_to_width(
    image: &DecodedImage,
    width: u32,
    filter: ResizeFilter,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 {
        return Err(DecodeError::InvalidResize {
            width,
            height: image.height,
        });
    }
    if image.width <= width {
        return Ok(image.clone());
    }

    let height = scale_edge(image.height, width, image.width);
    resample(image, width, height, filter)
}

/// Shrink so neither edge exceeds `max_edge`, keeping the aspect ratio.
pub fn resize_to_fit(
    image: &DecodedImage,
    max_edge: u32,
    filter: ResizeFilter,
) -> Result<DecodedImage, DecodeError> {
    if max_edge == 0 {
        return Err(DecodeError::InvalidResize {
            width: 0,
            height: 0,
        });
    }
    if image.width <= max_edge && image.height <= max_edge {
        return Ok(image.clone());
    }

    let (width, height) = if image.width >= image.height {
        (max_edge, scale_edge(image.height, max_edge, image.width))
    } else {
        (scale_edge(image.width, max_edge, image.height), max_edge)
    };
    resample(image, width, height, filter)
}

/// `edge * numerator / denominator`, rounded, at least one pixel.
fn scale_edge(edge: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = (edge as f64 * numerator as f64 / denominator as f64).round() as u32;
    scaled.max(1)
}

fn resample(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: ResizeFilter,
) -> Result<DecodedImage, DecodeError> {
    let view = image.as_rgb_image().ok_or_else(|| {
        DecodeError::Malformed(format!(
            "pixel buffer does not match {}x{}",
            image.width, image.height
        ))
    })?;
    let resized = image::imageops::resize(&view, width, height, filter.into());
    Ok(DecodedImage::new(width, height, resized.into_raw()))
}
