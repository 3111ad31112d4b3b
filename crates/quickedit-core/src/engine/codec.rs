//! Decoding and re-encoding of whole image files.
//!
//! Every transform decodes the input with its format sniffed from content and
//! writes the result back in that same format.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageReader};

use super::EngineError;

/// A decoded image and the container format it came from.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

/// Decode `bytes`, guessing the format from their signature.
///
/// Bytes with no recognizable signature are attempted as PNG.
pub fn decode(bytes: &[u8]) -> Result<Decoded, EngineError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| EngineError::Identify(e.to_string()))?;

    let format = reader.format().unwrap_or(ImageFormat::Png);
    reader.set_format(format);
    let image = reader
        .decode()
        .map_err(|e| EngineError::Decode(e.to_string()))?;

    Ok(Decoded { image, format })
}

/// Encode `image` as `format`.
///
/// Formats without an alpha channel get the pixels flattened to RGB first.
pub fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, EngineError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EngineError::InvalidDimensions {
            width: image.width(),
            height: image.height(),
        });
    }

    let mut output = Vec::new();
    let result = if format == ImageFormat::Jpeg && image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut Cursor::new(&mut output), format)
    } else {
        image.write_to(&mut Cursor::new(&mut output), format)
    };
    result.map_err(|e| EngineError::Encode(e.to_string()))?;

    Ok(output)
}

/// Debug-style name of a format, as reported in metadata ("Png", "Jpeg", ...).
pub fn format_name(format: ImageFormat) -> String {
    format!("{:?}", format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encoded_image, png_bytes};

    #[test]
    fn test_decode_png() {
        let decoded = decode(&png_bytes(8, 4)).unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!((decoded.image.width(), decoded.image.height()), (8, 4));
    }

    #[test]
    fn test_decode_jpeg_keeps_format() {
        let decoded = decode(&encoded_image(16, 16, ImageFormat::Jpeg)).unwrap();
        assert_eq!(decoded.format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode(b"not an image at all").unwrap_err();
        assert!(matches!(err, EngineError::Decode(_)));
    }

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::new(4, 4));
        let bytes = encode(&rgba, ImageFormat::Jpeg).unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_round_trip_png_is_lossless() {
        let original = decode(&png_bytes(5, 3)).unwrap();
        let bytes = encode(&original.image, original.format).unwrap();
        let again = decode(&bytes).unwrap();
        assert_eq!(again.image.to_rgb8(), original.image.to_rgb8());
    }

    #[test]
    fn test_format_name() {
        assert_eq!(format_name(ImageFormat::Png), "Png");
        assert_eq!(format_name(ImageFormat::WebP), "WebP");
    }
}
