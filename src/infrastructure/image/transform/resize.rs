//! Downscaling to fit a bounding box.

use image::DynamicImage;
use image::imageops::FilterType;

use crate::domain::errors::TransformError;
use crate::domain::ports::Transformer;

/// Scales an image down to fit within `max_width` x `max_height`, keeping its
/// aspect ratio. Images that already fit are returned unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeTransformer {
    max_width: u32,
    max_height: u32,
}

impl ResizeTransformer {
    /// Creates a transformer bounded by the given box.
    #[must_use]
    pub const fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }
}

impl Transformer for ResizeTransformer {
    fn key(&self) -> String {
        format!("resize_{}x{}", self.max_width, self.max_height)
    }

    fn transform(&self, image: &DynamicImage) -> Result<DynamicImage, TransformError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(TransformError::geometry(format!(
                "bounding box must be non-empty, got {}x{}",
                self.max_width, self.max_height
            )));
        }

        if image.width() <= self.max_width && image.height() <= self.max_height {
            return Ok(image.clone());
        }

        Ok(image.resize(self.max_width, self.max_height, FilterType::Lanczos3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(800, 600, 400, 300, (400, 300) ; "same_aspect")]
    #[test_case(800, 200, 400, 300, (400, 100) ; "wide")]
    #[test_case(100, 50, 400, 300, (100, 50) ; "already_fits")]
    fn test_resize_fits_box(w: u32, h: u32, max_w: u32, max_h: u32, expected: (u32, u32)) {
        let output = ResizeTransformer::new(max_w, max_h)
            .transform(&DynamicImage::new_rgb8(w, h))
            .unwrap();
        assert_eq!((output.width(), output.height()), expected);
    }

    #[test]
    fn test_empty_box_is_rejected() {
        let err = ResizeTransformer::new(0, 10)
            .transform(&DynamicImage::new_rgb8(4, 4))
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidGeometry { .. }));
    }

    #[test]
    fn test_key() {
        assert_eq!(ResizeTransformer::new(400, 300).key(), "resize_400x300");
    }
}
