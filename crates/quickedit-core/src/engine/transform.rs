//! Geometric transforms on decoded images.

use image::DynamicImage;

use super::EngineError;
use crate::geometry::PixelRect;
use crate::protocol::RotateDirection;
use crate::resize::{ResizeSpec, MAX_DIMENSION, MIN_DIMENSION};

/// Cut out `region`, which must lie entirely inside the image.
pub fn crop(image: &DynamicImage, region: PixelRect) -> Result<DynamicImage, EngineError> {
    let (width, height) = (image.width(), image.height());
    if region.width == 0 || region.height == 0 || !region.fits_within(width, height) {
        return Err(EngineError::CropOutOfBounds {
            region,
            width,
            height,
        });
    }
    Ok(image.crop_imm(region.x, region.y, region.width, region.height))
}

/// Scale to exactly the requested size; the aspect lock is already resolved.
pub fn resize(image: &DynamicImage, spec: &ResizeSpec) -> Result<DynamicImage, EngineError> {
    let allowed = MIN_DIMENSION..=MAX_DIMENSION;
    if !allowed.contains(&spec.width) || !allowed.contains(&spec.height) {
        return Err(EngineError::InvalidDimensions {
            width: spec.width,
            height: spec.height,
        });
    }
    Ok(image.resize_exact(spec.width, spec.height, spec.filter.to_image_filter()))
}

/// Quarter turn: left is counter-clockwise, right is clockwise.
pub fn rotate(image: &DynamicImage, direction: RotateDirection) -> DynamicImage {
    match direction {
        RotateDirection::Left => image.rotate270(),
        RotateDirection::Right => image.rotate90(),
    }
}
