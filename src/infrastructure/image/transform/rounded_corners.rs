//! Rounded corner clipping.

use image::{DynamicImage, Rgba};

use crate::domain::errors::TransformError;
use crate::domain::ports::Transformer;

/// Clips an image to a rounded rectangle.
///
/// A positive `radius` applies to every corner; otherwise the per-corner radii
/// are used. Pixels outside the outline become transparent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoundedCornersTransformer {
    radius: f32,
    top_left: f32,
    top_right: f32,
    bottom_right: f32,
    bottom_left: f32,
}

impl RoundedCornersTransformer {
    /// Same radius on every corner.
    #[must_use]
    pub const fn new(radius: f32) -> Self {
        Self {
            radius,
            top_left: 0.0,
            top_right: 0.0,
            bottom_right: 0.0,
            bottom_left: 0.0,
        }
    }

    /// Individual radius per corner, clockwise from the top left.
    #[must_use]
    pub const fn per_corner(
        top_left: f32,
        top_right: f32,
        bottom_right: f32,
        bottom_left: f32,
    ) -> Self {
        Self {
            radius: 0.0,
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// Effective radii: top left, top right, bottom right, bottom left.
    fn radii(&self) -> [f32; 4] {
        if self.radius > 0.0 {
            [self.radius; 4]
        } else {
            [
                self.top_left,
                self.top_right,
                self.bottom_right,
                self.bottom_left,
            ]
        }
    }

    fn validate(&self) -> Result<(), TransformError> {
        let all = [
            self.radius,
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ];
        if all.iter().any(|r| r.is_nan() || *r < 0.0) {
            return Err(TransformError::geometry(format!(
                "corner radii must be non-negative, got {all:?}"
            )));
        }
        Ok(())
    }
}

/// Fraction of the pixel centred at (`x`, `y`) inside the rounded outline.
fn coverage(x: f32, y: f32, width: f32, height: f32, [tl, tr, br, bl]: [f32; 4]) -> f32 {
    let (cx, cy, r) = if x < tl && y < tl {
        (tl, tl, tl)
    } else if x > width - tr && y < tr {
        (width - tr, tr, tr)
    } else if x > width - br && y > height - br {
        (width - br, height - br, br)
    } else if x < bl && y > height - bl {
        (bl, height - bl, bl)
    } else {
        return 1.0;
    };
    let distance = (x - cx).hypot(y - cy);
    (r - distance + 0.5).clamp(0.0, 1.0)
}

impl Transformer for RoundedCornersTransformer {
    fn key(&self) -> String {
        if self.radius > 0.0 {
            format!("roundedCorners_r{:?}", self.radius)
        } else {
            format!(
                "roundedCorners_tl{:?}_tr{:?}_br{:?}_bl{:?}",
                self.top_left, self.top_right, self.bottom_right, self.bottom_left
            )
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn transform(&self, image: &DynamicImage) -> Result<DynamicImage, TransformError> {
        self.validate()?;
        let radii = self.radii();
        if radii.iter().all(|r| *r == 0.0) {
            return Ok(image.clone());
        }

        let mut output = image.to_rgba8();
        let (width, height) = (output.width() as f32, output.height() as f32);
        let limit = width.min(height) / 2.0;
        let radii = radii.map(|r| r.min(limit));

        for (x, y, pixel) in output.enumerate_pixels_mut() {
            let cover = coverage(x as f32 + 0.5, y as f32 + 0.5, width, height, radii);
            if cover < 1.0 {
                let Rgba([r, g, b, a]) = *pixel;
                *pixel = Rgba([r, g, b, (f32::from(a) * cover).round() as u8]);
            }
        }

        Ok(DynamicImage::ImageRgba8(output))
    }
}
