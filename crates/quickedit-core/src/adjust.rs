//! Tonal adjustment parameters.
//!
//! [`AdjustVector`] holds the slider values exactly as the UI shows them and
//! is the single source of truth. [`to_engine_params`] is the only place the
//! UI → engine mapping lives; it runs at dispatch time.
//!
//! ## UI ranges and engine mapping
//!
//! | Field      | UI range     | Engine value        |
//! |------------|--------------|---------------------|
//! | brightness | -100..=100   | unchanged (integer) |
//! | contrast   | -100..=100   | unchanged           |
//! | saturation | 0..=200      | `/ 100` (0.0..=2.0) |
//! | hue        | -180..=180   | unchanged (degrees) |
//! | exposure   | -200..=200   | `/ 100` (stops)     |
//! | gamma      | 10..=300     | `/ 100` (0.1..=3.0) |
//! | shadows    | -100..=100   | unchanged           |
//! | highlights | -100..=100   | unchanged           |
//! | vibrance   | -100..=100   | unchanged           |

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// One of the nine sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustField {
    Brightness,
    Contrast,
    Saturation,
    Hue,
    Exposure,
    Gamma,
    Shadows,
    Highlights,
    Vibrance,
}

impl AdjustField {
    pub const ALL: [AdjustField; 9] = [
        AdjustField::Brightness,
        AdjustField::Contrast,
        AdjustField::Saturation,
        AdjustField::Hue,
        AdjustField::Exposure,
        AdjustField::Gamma,
        AdjustField::Shadows,
        AdjustField::Highlights,
        AdjustField::Vibrance,
    ];

    /// Inclusive UI range of the slider.
    pub fn range(self) -> RangeInclusive<i32> {
        match self {
            AdjustField::Saturation => 0..=200,
            AdjustField::Hue => -180..=180,
            AdjustField::Exposure => -200..=200,
            AdjustField::Gamma => 10..=300,
            AdjustField::Brightness
            | AdjustField::Contrast
            | AdjustField::Shadows
            | AdjustField::Highlights
            | AdjustField::Vibrance => -100..=100,
        }
    }

    /// Slider name as used by the view.
    pub fn name(self) -> &'static str {
        match self {
            AdjustField::Brightness => "brightness",
            AdjustField::Contrast => "contrast",
            AdjustField::Saturation => "saturation",
            AdjustField::Hue => "hue",
            AdjustField::Exposure => "exposure",
            AdjustField::Gamma => "gamma",
            AdjustField::Shadows => "shadows",
            AdjustField::Highlights => "highlights",
            AdjustField::Vibrance => "vibrance",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        AdjustField::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// UI-facing slider values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustVector {
    pub brightness: i32,
    pub contrast: i32,
    pub saturation: i32,
    pub hue: i32,
    pub exposure: i32,
    pub gamma: i32,
    pub shadows: i32,
    pub highlights: i32,
    pub vibrance: i32,
}

impl AdjustVector {
    /// The vector of an image that has never been adjusted.
    pub const NEUTRAL: AdjustVector = AdjustVector {
        brightness: 0,
        contrast: 0,
        saturation: 100,
        hue: 0,
        exposure: 0,
        gamma: 100,
        shadows: 0,
        highlights: 0,
        vibrance: 0,
    };

    pub fn get(&self, field: AdjustField) -> i32 {
        match field {
            AdjustField::Brightness => self.brightness,
            AdjustField::Contrast => self.contrast,
            AdjustField::Saturation => self.saturation,
            AdjustField::Hue => self.hue,
            AdjustField::Exposure => self.exposure,
            AdjustField::Gamma => self.gamma,
            AdjustField::Shadows => self.shadows,
            AdjustField::Highlights => self.highlights,
            AdjustField::Vibrance => self.vibrance,
        }
    }

    /// Return a copy with `field` set, clamped to the field's UI range.
    pub fn with(mut self, field: AdjustField, value: i32) -> Self {
        let range = field.range();
        let value = value.clamp(*range.start(), *range.end());
        let slot = match field {
            AdjustField::Brightness => &mut self.brightness,
            AdjustField::Contrast => &mut self.contrast,
            AdjustField::Saturation => &mut self.saturation,
            AdjustField::Hue => &mut self.hue,
            AdjustField::Exposure => &mut self.exposure,
            AdjustField::Gamma => &mut self.gamma,
            AdjustField::Shadows => &mut self.shadows,
            AdjustField::Highlights => &mut self.highlights,
            AdjustField::Vibrance => &mut self.vibrance,
        };
        *slot = value;
        self
    }
}

impl Default for AdjustVector {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Neutral slider values, restored by the reset control.
pub fn reset() -> AdjustVector {
    AdjustVector::NEUTRAL
}

/// Parameters in the ranges the engine expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineAdjustParams {
    /// -100 to +100
    pub brightness: i32,
    /// -100 to +100
    pub contrast: f32,
    /// 0 to 2 (1 = original)
    pub saturation: f32,
    /// -180 to +180 degrees
    pub hue: i32,
    /// -2 to +2 stops
    pub exposure: f32,
    /// 0.1 to 3.0 (1 = original)
    pub gamma: f32,
    /// -100 to +100
    pub shadows: f32,
    /// -100 to +100
    pub highlights: f32,
    /// -100 to +100
    pub vibrance: f32,
}

impl EngineAdjustParams {
    /// Parameters that leave every pixel unchanged.
    pub const IDENTITY: EngineAdjustParams = EngineAdjustParams {
        brightness: 0,
        contrast: 0.0,
        saturation: 1.0,
        hue: 0,
        exposure: 0.0,
        gamma: 1.0,
        shadows: 0.0,
        highlights: 0.0,
        vibrance: 0.0,
    };
}

/// Map UI slider values to engine parameters.
pub fn to_engine_params(vector: &AdjustVector) -> EngineAdjustParams {
    EngineAdjustParams {
        brightness: vector.brightness,
        contrast: vector.contrast as f32,
        saturation: vector.saturation as f32 / 100.0,
        hue: vector.hue,
        exposure: vector.exposure as f32 / 100.0,
        gamma: vector.gamma as f32 / 100.0,
        shadows: vector.shadows as f32,
        highlights: vector.highlights as f32,
        vibrance: vector.vibrance as f32,
    }
}
