//! Reading the source file.

use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::ImageReader;
use tracing::debug;

use super::{DecodeError, DecodedImage, Orientation};

/// Read and decode the source image at `path`.
pub fn load_image(path: &Path) -> Result<DecodedImage, DecodeError> {
    let bytes = std::fs::read(path).map_err(|e| DecodeError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let image = decode_image(&bytes)?;
    debug!(
        path = %path.display(),
        width = image.width,
        height = image.height,
        bytes = bytes.len(),
        "Loaded source image"
    );
    Ok(image)
}

/// Decode in-memory bytes to an upright RGB raster.
///
/// The container is sniffed from the content rather than trusted from a file
/// extension. An EXIF orientation tag, when present, is baked into the pixels
/// since the encoders never write one back.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::UnknownFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let orientation = read_orientation(bytes);
    if orientation != Orientation::Upright {
        debug!(?orientation, "Applying EXIF orientation");
    }
    Ok(DecodedImage::from_dynamic(orientation.apply(img)))
}

/// EXIF orientation of the primary image, `Upright` when absent or unreadable.
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from_exif)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    fn encode_png(width: u32, height: u32, data: &[u8], color: ExtendedColorType) -> Vec<u8> {
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(data, width, height, color)
            .unwrap();
        buffer
    }

    #[test]
    fn test_decode_rgb_png_keeps_pixels() {
        let pixels = vec![10u8, 20, 30, 40, 50, 60];
        let img = decode_image(&encode_png(2, 1, &pixels, ExtendedColorType::Rgb8)).unwrap();

        assert_eq!((img.width, img.height), (2, 1));
        assert_eq!(img.pixels, pixels);
    }

    #[test]
    fn test_decode_grayscale_expands_to_rgb() {
        let img = decode_image(&encode_png(2, 1, &[0, 200], ExtendedColorType::L8)).unwrap();
        assert_eq!(img.pixels, vec![0, 0, 0, 200, 200, 200]);
    }

    #[test]
    fn test_decode_unknown_bytes() {
        assert!(matches!(
            decode_image(b"not an image"),
            Err(DecodeError::UnknownFormat)
        ));
        assert!(matches!(decode_image(&[]), Err(DecodeError::UnknownFormat)));
    }

    #[test]
    fn test_decode_truncated_png() {
        let bytes = encode_png(16, 16, &[77u8; 16 * 16 * 3], ExtendedColorType::Rgb8);
        assert!(matches!(
            decode_image(&bytes[..bytes.len() / 2]),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_read_orientation_without_exif() {
        let bytes = encode_png(1, 1, &[0, 0, 0], ExtendedColorType::Rgb8);
        assert_eq!(read_orientation(&bytes), Orientation::Upright);
        assert_eq!(read_orientation(b"garbage"), Orientation::Upright);
    }

    #[test]
    fn test_load_image_missing_file() {
        let err = load_image(Path::new("/nonexistent/source.png")).unwrap_err();
        match err {
            DecodeError::Read { path, .. } => assert_eq!(path, "/nonexistent/source.png"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_load_image_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.png");
        std::fs::write(&path, encode_png(4, 3, &[1u8; 36], ExtendedColorType::Rgb8)).unwrap();

        let img = load_image(&path).unwrap();
        assert_eq!((img.width, img.height), (4, 3));
    }
}
