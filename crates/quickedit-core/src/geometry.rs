//! Crop selection geometry.
//!
//! Selections live in *display space*: the CSS pixels of the rendered
//! preview. The engine works in *natural space*: the source image's pixel
//! grid. Selections are only converted to natural space at commit time.
//!
//! # Coordinate System
//!
//! - (0, 0) = top-left corner of the preview
//! - x grows to the right, y grows downwards
//! - a valid selection is always at least `min_size` on each side and fully
//!   inside `[0, display.width] × [0, display.height]`

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest selection edge, in display pixels.
pub const MIN_CROP_SIZE: f64 = 10.0;

/// Fraction of the display covered by a freshly opened selection.
pub const INITIAL_SELECTION_RATIO: f64 = 0.8;

/// Errors raised when converting between coordinate spaces.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// The preview has no rendered area, so no scale factor exists.
    #[error("Display size {width}x{height} has no area")]
    EmptyDisplay { width: f64, height: f64 },

    /// The source image has no pixels.
    #[error("Natural size {width}x{height} has no area")]
    EmptyImage { width: u32, height: u32 },
}

/// Rendered size of the preview element, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either side is zero, negative or not a number.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// A selection rectangle in display space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A crop region in natural (source pixel) space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the region lies inside an image of the given dimensions.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

/// Selection limits used by the crop tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropGeometry {
    /// Minimum selection edge in display pixels.
    pub min_size: f64,
    /// Fraction of the display covered by the initial selection.
    pub initial_ratio: f64,
}

impl Default for CropGeometry {
    fn default() -> Self {
        Self {
            min_size: MIN_CROP_SIZE,
            initial_ratio: INITIAL_SELECTION_RATIO,
        }
    }
}

impl CropGeometry {
    /// Centred selection covering `initial_ratio` of the display.
    ///
    /// The result is passed through [`CropGeometry::constrain`], so tiny
    /// displays still yield a selection of at least `min_size`.
    pub fn initial_selection(&self, display: Size) -> Rect {
        let width = display.width * self.initial_ratio;
        let height = display.height * self.initial_ratio;
        let x = (display.width - width) / 2.0;
        let y = (display.height - height) / 2.0;
        self.constrain(Rect::new(x, y, width, height), display)
    }

    /// Clamp a candidate selection into the display.
    ///
    /// Position is clamped before size: `x` into `[0, display.width - min]`,
    /// then `width` into `[min, display.width - x]` (likewise for y/height).
    /// Dragging an edge past the border therefore shrinks the selection
    /// instead of pushing the opposite edge outside.
    ///
    /// A display smaller than `min_size` on some axis collapses the selection
    /// to the full extent of that axis.
    pub fn constrain(&self, rect: Rect, display: Size) -> Rect {
        let min = self.min_size;
        let x = clamp_low_first(rect.x, 0.0, display.width - min);
        let y = clamp_low_first(rect.y, 0.0, display.height - min);
        let width = rect.width.max(min).min(display.width - x).max(0.0);
        let height = rect.height.max(min).min(display.height - y).max(0.0);
        Rect::new(x, y, width, height)
    }
}

/// `value.min(hi).max(lo)`; unlike `f64::clamp` this never panics when
/// `hi < lo`, the lower bound wins instead. NaN maps to `lo`.
#[inline]
fn clamp_low_first(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return lo;
    }
    value.min(hi).max(lo)
}

/// Convert a display-space selection into a natural-space crop region.
///
/// Each field is scaled by `natural / display` on its axis and rounded to the
/// nearest pixel. Rounding both origin and extent can overshoot the image by
/// one pixel, so the extent is trimmed to stay inside the image and kept at
/// least one pixel.
///
/// Must be called with the display size at commit time; a preview that was
/// resized between selection and commit yields a proportionally drifted
/// region.
pub fn to_natural(
    rect: Rect,
    display: Size,
    natural: (u32, u32),
) -> Result<PixelRect, GeometryError> {
    if display.is_empty() {
        return Err(GeometryError::EmptyDisplay {
            width: display.width,
            height: display.height,
        });
    }
    let (natural_w, natural_h) = natural;
    if natural_w == 0 || natural_h == 0 {
        return Err(GeometryError::EmptyImage {
            width: natural_w,
            height: natural_h,
        });
    }

    let scale_x = natural_w as f64 / display.width;
    let scale_y = natural_h as f64 / display.height;

    let x = scale_to_pixels(rect.x, scale_x).min(natural_w - 1);
    let y = scale_to_pixels(rect.y, scale_y).min(natural_h - 1);
    let width = scale_to_pixels(rect.width, scale_x).clamp(1, natural_w - x);
    let height = scale_to_pixels(rect.height, scale_y).clamp(1, natural_h - y);

    Ok(PixelRect::new(x, y, width, height))
}

#[inline]
fn scale_to_pixels(value: f64, scale: f64) -> u32 {
    // Float-to-int `as` casts saturate, and NaN becomes 0.
    (value * scale).round().max(0.0) as u32
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Display sizes at least one minimum selection wide.
    fn display_strategy() -> impl Strategy<Value = Size> {
        (MIN_CROP_SIZE..=4000.0, MIN_CROP_SIZE..=4000.0).prop_map(|(w, h)| Size::new(w, h))
    }

    /// Arbitrary candidate rectangles, including out-of-range values.
    fn rect_strategy() -> impl Strategy<Value = Rect> {
        (
            -5000.0f64..=5000.0,
            -5000.0f64..=5000.0,
            -5000.0f64..=5000.0,
            -5000.0f64..=5000.0,
        )
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        /// Property: constrained selections stay inside the display with
        /// at least the minimum size.
        #[test]
        fn prop_constrain_within_bounds(
            rect in rect_strategy(),
            display in display_strategy(),
        ) {
            let out = CropGeometry::default().constrain(rect, display);

            prop_assert!(out.x >= 0.0);
            prop_assert!(out.y >= 0.0);
            prop_assert!(out.x + out.width <= display.width + 1e-9);
            prop_assert!(out.y + out.height <= display.height + 1e-9);
            prop_assert!(out.width >= MIN_CROP_SIZE);
            prop_assert!(out.height >= MIN_CROP_SIZE);
        }

        /// Property: constrain is idempotent.
        #[test]
        fn prop_constrain_idempotent(
            rect in rect_strategy(),
            display in display_strategy(),
        ) {
            let geometry = CropGeometry::default();
            let once = geometry.constrain(rect, display);
            let twice = geometry.constrain(once, display);

            prop_assert_eq!(once, twice);
        }

        /// Property: doubling the display together with the selection maps to
        /// the same natural region, within rounding.
        #[test]
        fn prop_to_natural_scale_consistent(
            rect in rect_strategy(),
            display in (20.0f64..=2000.0, 20.0f64..=2000.0),
            natural in (20u32..=8000, 20u32..=8000),
        ) {
            let geometry = CropGeometry::default();
            let display = Size::new(display.0, display.1);
            let doubled_display = Size::new(display.width * 2.0, display.height * 2.0);

            let base = geometry.constrain(rect, display);
            let doubled = Rect::new(base.x * 2.0, base.y * 2.0, base.width * 2.0, base.height * 2.0);

            let a = to_natural(base, display, natural).unwrap();
            let b = to_natural(geometry.constrain(doubled, doubled_display), doubled_display, natural).unwrap();

            prop_assert!((a.x as i64 - b.x as i64).abs() <= 1);
            prop_assert!((a.y as i64 - b.y as i64).abs() <= 1);
            prop_assert!((a.width as i64 - b.width as i64).abs() <= 1);
            prop_assert!((a.height as i64 - b.height as i64).abs() <= 1);
        }

        /// Property: natural regions always fit the source image.
        #[test]
        fn prop_to_natural_fits_image(
            rect in rect_strategy(),
            display in display_strategy(),
            natural in (1u32..=8000, 1u32..=8000),
        ) {
            let constrained = CropGeometry::default().constrain(rect, display);
            let out = to_natural(constrained, display, natural).unwrap();

            prop_assert!(out.fits_within(natural.0, natural.1));
            prop_assert!(out.width >= 1);
            prop_assert!(out.height >= 1);
        }
    }
}
