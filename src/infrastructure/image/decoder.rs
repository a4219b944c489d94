//! Raster decoder backed by the `image` crate.

use crate::domain::errors::DecodeError;
use crate::domain::ports::Decoder;

/// Decodes PNG, JPEG and WebP data, sniffing the format from the bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl Decoder for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<image::DynamicImage, DecodeError> {
        image::load_from_memory(bytes).map_err(|e| match e {
            image::ImageError::Unsupported(inner) => DecodeError::unsupported(inner.to_string()),
            other => DecodeError::malformed(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::new_rgba8(3, 2)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decodes_png() {
        let img = RasterDecoder.decode(&png_bytes()).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(RasterDecoder.decode(b"definitely not an image").is_err());
    }

    #[test]
    fn test_truncated_png_is_malformed() {
        let bytes = png_bytes();
        let err = RasterDecoder.decode(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }
}
