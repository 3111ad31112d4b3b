//! Editor configuration.
//!
//! Every field has a default, so an empty object (or `undefined` from
//! JavaScript) yields a working editor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::CropGeometry;
use crate::resize::DEFAULT_DEBOUNCE_MS;

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("crop.minSize must be a positive number, got {0}")]
    MinCropSize(f64),

    #[error("crop.initialRatio must be in (0, 1], got {0}")]
    InitialRatio(f64),
}

/// Tunables for the editor controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub crop: CropGeometry,
    /// Quiet period before a typed dimension is applied.
    pub resize_debounce_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            crop: CropGeometry::default(),
            resize_debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl EditorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let min = self.crop.min_size;
        if !min.is_finite() || min <= 0.0 {
            return Err(ConfigError::MinCropSize(min));
        }
        let ratio = self.crop.initial_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigError::InitialRatio(ratio));
        }
        Ok(())
    }
}
