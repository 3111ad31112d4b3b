//! Pixel adjustments.
//!
//! ## Order
//! 1. Exposure
//! 2. Shadows
//! 3. Highlights
//! 4. Gamma
//! 5. Brightness
//! 6. Contrast
//! 7. Saturation
//! 8. Vibrance
//! 9. Hue
//!
//! Steps whose parameter is at its identity value are skipped, so neutral
//! parameters return the image untouched.

use image::imageops::{brighten, contrast, huerotate};
use image::{DynamicImage, RgbaImage};

use crate::adjust::EngineAdjustParams;

/// Parameters closer than this to identity are treated as identity.
const EPSILON: f32 = 0.001;

/// Brightness slider units to `brighten` offset (±100 maps to about ±128).
const BRIGHTNESS_SCALE: f32 = 1.28;

/// Apply every adjustment in order, returning a new image.
///
/// The result keeps the source's alpha-ness: RGB in, RGB out.
pub fn apply_adjustments(image: &DynamicImage, params: &EngineAdjustParams) -> DynamicImage {
    if is_identity(params) {
        return image.clone();
    }

    let mut rgba = image.to_rgba8();

    apply_tonal(&mut rgba, params);

    if params.brightness != 0 {
        let offset = (params.brightness as f32 * BRIGHTNESS_SCALE).round() as i32;
        rgba = brighten(&rgba, offset);
    }
    if params.contrast.abs() > EPSILON {
        rgba = contrast(&rgba, params.contrast);
    }

    apply_color(&mut rgba, params);

    if params.hue != 0 {
        rgba = huerotate(&rgba, params.hue);
    }

    let adjusted = DynamicImage::ImageRgba8(rgba);
    if image.color().has_alpha() {
        adjusted
    } else {
        DynamicImage::ImageRgb8(adjusted.to_rgb8())
    }
}

fn is_identity(params: &EngineAdjustParams) -> bool {
    params.brightness == 0
        && params.hue == 0
        && params.contrast.abs() <= EPSILON
        && (params.saturation - 1.0).abs() <= EPSILON
        && params.exposure.abs() <= EPSILON
        && (params.gamma - 1.0).abs() <= EPSILON
        && params.shadows.abs() <= EPSILON
        && params.highlights.abs() <= EPSILON
        && params.vibrance.abs() <= EPSILON
}

/// Exposure, shadows, highlights and gamma in one pass. Alpha is untouched.
fn apply_tonal(rgba: &mut RgbaImage, params: &EngineAdjustParams) {
    let exposure = if params.exposure.abs() > EPSILON {
        Some(2.0_f32.powf(params.exposure))
    } else {
        None
    };
    let shadows = (params.shadows.abs() > EPSILON).then_some(params.shadows);
    let highlights = (params.highlights.abs() > EPSILON).then_some(params.highlights);
    let inv_gamma = ((params.gamma - 1.0).abs() > EPSILON).then(|| 1.0 / params.gamma.max(0.01));

    if exposure.is_none() && shadows.is_none() && highlights.is_none() && inv_gamma.is_none() {
        return;
    }

    for chunk in rgba.chunks_exact_mut(4) {
        let mut rgb = [
            chunk[0] as f32 / 255.0,
            chunk[1] as f32 / 255.0,
            chunk[2] as f32 / 255.0,
        ];

        if let Some(multiplier) = exposure {
            rgb = scale(rgb, multiplier);
        }
        if let Some(amount) = shadows {
            let weight = (1.0 - luminance(rgb) * 2.0).max(0.0);
            rgb = scale(rgb, 1.0 + (amount / 100.0) * weight);
        }
        if let Some(amount) = highlights {
            let weight = ((luminance(rgb) - 0.5) * 2.0).max(0.0);
            rgb = scale(rgb, 1.0 + (amount / 100.0) * weight);
        }
        if let Some(inv) = inv_gamma {
            rgb = rgb.map(|c| c.powf(inv));
        }

        for (dst, c) in chunk.iter_mut().zip(rgb) {
            *dst = to_u8(c);
        }
    }
}

/// Saturation then vibrance, both in HSL space.
fn apply_color(rgba: &mut RgbaImage, params: &EngineAdjustParams) {
    let saturation = ((params.saturation - 1.0).abs() > EPSILON).then_some(params.saturation);
    let vibrance = (params.vibrance.abs() > EPSILON).then_some(params.vibrance / 100.0);

    if saturation.is_none() && vibrance.is_none() {
        return;
    }

    for chunk in rgba.chunks_exact_mut(4) {
        let (h, mut s, l) = rgb_to_hsl(chunk[0], chunk[1], chunk[2]);

        if let Some(factor) = saturation {
            s = (s * factor).clamp(0.0, 1.0);
        }
        if let Some(amount) = vibrance {
            // Muted colors move more than saturated ones
            s = (s + amount * (1.0 - s)).clamp(0.0, 1.0);
        }

        let (r, g, b) = hsl_to_rgb(h, s, l);
        chunk[0] = r;
        chunk[1] = g;
        chunk[2] = b;
    }
}

#[inline]
fn scale(rgb: [f32; 3], factor: f32) -> [f32; 3] {
    rgb.map(|c| (c * factor).clamp(0.0, 1.0))
}

#[inline]
fn to_u8(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Rec. 601 luma.
#[inline]
fn luminance([r, g, b]: [f32; 3]) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// RGB (0-255) to HSL (h: 0-360, s: 0-1, l: 0-1).
fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    let d = max - min;
    if d.abs() < f32::EPSILON {
        return (0.0, 0.0, l);
    }

    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        let h = (g - b) / d;
        if g < b {
            h + 6.0
        } else {
            h
        }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h * 60.0, s, l)
}

/// HSL (h: 0-360, s: 0-1, l: 0-1) to RGB (0-255).
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    if s.abs() < f32::EPSILON {
        let v = to_u8(l);
        return (v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let h = h / 360.0;

    (
        to_u8(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_u8(hue_to_channel(p, q, h)),
        to_u8(hue_to_channel(p, q, h - 1.0 / 3.0)),
    )
}

#[inline]
fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = if t < 0.0 {
        t + 1.0
    } else if t > 1.0 {
        t - 1.0
    } else {
        t
    };

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};

    fn solid(r: u8, g: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([r, g, b])))
    }

    fn first_pixel(image: &DynamicImage) -> [u8; 3] {
        image.to_rgb8().get_pixel(0, 0).0
    }

    fn with(edit: impl FnOnce(&mut EngineAdjustParams)) -> EngineAdjustParams {
        let mut params = EngineAdjustParams::IDENTITY;
        edit(&mut params);
        params
    }

    // ===== Identity Tests =====

    #[test]
    fn test_identity_no_adjustments() {
        let image = solid(128, 64, 192);
        let result = apply_adjustments(&image, &EngineAdjustParams::IDENTITY);
        assert_eq!(result.to_rgb8(), image.to_rgb8());
    }

    #[test]
    fn test_rgb_stays_rgb() {
        let result = apply_adjustments(&solid(10, 20, 30), &with(|p| p.brightness = 10));
        assert!(!result.color().has_alpha());
    }

    #[test]
    fn test_alpha_preserved() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 40])));
        let result = apply_adjustments(&image, &with(|p| p.exposure = 1.0));
        assert_eq!(result.to_rgba8().get_pixel(0, 0)[3], 40);
    }

    // ===== Tonal Tests =====

    #[test]
    fn test_exposure_one_stop_doubles() {
        let result = apply_adjustments(&solid(64, 32, 100), &with(|p| p.exposure = 1.0));
        assert_eq!(first_pixel(&result), [128, 64, 200]);
    }

    #[test]
    fn test_exposure_clips_at_white() {
        let result = apply_adjustments(&solid(200, 200, 200), &with(|p| p.exposure = 2.0));
        assert_eq!(first_pixel(&result), [255, 255, 255]);
    }

    #[test]
    fn test_shadows_only_touch_dark_pixels() {
        let params = with(|p| p.shadows = 50.0);
        let dark = first_pixel(&apply_adjustments(&solid(40, 40, 40), &params));
        let bright = first_pixel(&apply_adjustments(&solid(200, 200, 200), &params));

        assert!(dark[0] > 40);
        assert_eq!(bright, [200, 200, 200]);
    }

    #[test]
    fn test_highlights_only_touch_bright_pixels() {
        let params = with(|p| p.highlights = -50.0);
        let dark = first_pixel(&apply_adjustments(&solid(40, 40, 40), &params));
        let bright = first_pixel(&apply_adjustments(&solid(220, 220, 220), &params));

        assert_eq!(dark, [40, 40, 40]);
        assert!(bright[0] < 220);
    }

    #[test]
    fn test_gamma_above_one_lifts_midtones() {
        let result = apply_adjustments(&solid(128, 128, 128), &with(|p| p.gamma = 2.0));
        assert!(first_pixel(&result)[0] > 128);
    }

    #[test]
    fn test_brightness_is_scaled() {
        // 50 * 1.28 = 64
        let result = apply_adjustments(&solid(100, 100, 100), &with(|p| p.brightness = 50));
        assert_eq!(first_pixel(&result), [164, 164, 164]);
    }

    #[test]
    fn test_contrast_spreads_values() {
        let params = with(|p| p.contrast = 50.0);
        let dark = first_pixel(&apply_adjustments(&solid(60, 60, 60), &params));
        let bright = first_pixel(&apply_adjustments(&solid(200, 200, 200), &params));

        assert!(dark[0] < 60);
        assert!(bright[0] > 200);
    }

    // ===== Color Tests =====

    #[test]
    fn test_zero_saturation_is_grayscale() {
        let result = apply_adjustments(&solid(200, 50, 50), &with(|p| p.saturation = 0.0));
        let [r, g, b] = first_pixel(&result);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn test_vibrance_leaves_full_saturation() {
        let result = apply_adjustments(&solid(255, 0, 0), &with(|p| p.vibrance = 80.0));
        assert_eq!(first_pixel(&result), [255, 0, 0]);
    }

    #[test]
    fn test_vibrance_boosts_muted_color() {
        let result = apply_adjustments(&solid(140, 120, 120), &with(|p| p.vibrance = 80.0));
        let [r, g, _] = first_pixel(&result);
        assert!(r - g > 20);
    }

    #[test]
    fn test_hue_rotation_changes_color() {
        let result = apply_adjustments(&solid(255, 0, 0), &with(|p| p.hue = 120));
        let [r, g, _] = first_pixel(&result);
        assert!(g > r);
    }

    #[test]
    fn test_hsl_conversion() {
        assert_eq!(rgb_to_hsl(255, 0, 0), (0.0, 1.0, 0.5));
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), (0, 255, 0));

        let (h, s, l) = rgb_to_hsl(30, 144, 255);
        assert_eq!(hsl_to_rgb(h, s, l), (30, 144, 255));
    }

    #[test]
    fn test_gray_has_no_saturation() {
        let (_, s, l) = rgb_to_hsl(128, 128, 128);
        assert_eq!(s, 0.0);
        assert!((l - 128.0 / 255.0).abs() < 1e-6);
    }
}
