//! Image metadata as reported by the engine.

use serde::{Deserialize, Serialize};

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl Orientation {
    /// Returns true if this orientation swaps width and height dimensions.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90CW
                | Orientation::Transverse
                | Orientation::Rotate270CW
        )
    }

    /// Map a raw EXIF value, rejecting anything outside 1-8.
    pub fn from_exif(value: u32) -> Option<Self> {
        match value {
            1 => Some(Orientation::Normal),
            2 => Some(Orientation::FlipHorizontal),
            3 => Some(Orientation::Rotate180),
            4 => Some(Orientation::FlipVertical),
            5 => Some(Orientation::Transpose),
            6 => Some(Orientation::Rotate90CW),
            7 => Some(Orientation::Transverse),
            8 => Some(Orientation::Rotate270CW),
            _ => None,
        }
    }
}

/// Optional EXIF-derived fields. `None` means the tag was absent from the
/// source image, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExifSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    /// Camera make (e.g., "Sony").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,
    /// Camera model (e.g., "ILCE-6600").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,
    /// DateTimeOriginal as written by the camera.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_taken: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,
    /// Formatted f-number (e.g., "f/2.8").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aperture: Option<String>,
    /// Formatted exposure time (e.g., "1/250s").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter_speed: Option<String>,
    /// Formatted focal length (e.g., "35 mm").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<String>,
    /// "Fired", "Did not fire" or "Off".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lens_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software: Option<String>,
    /// Human-readable exposure program (e.g., "Aperture priority").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_program: Option<String>,
}

impl ExifSummary {
    /// True when no EXIF field was found.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Metadata computed from one specific image buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    /// Container format name (e.g., "Png", "Jpeg").
    pub format: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Color type label (e.g., "Rgb8", "Rgba16").
    pub color_type: String,
    pub bits_per_pixel: u16,
    pub has_alpha: bool,
    /// `width / height`.
    pub aspect_ratio: f64,
    #[serde(default, skip_serializing_if = "ExifSummary::is_empty")]
    pub exif: ExifSummary,
}

impl ImageMetadata {
    /// Get the effective dimensions after orientation correction.
    pub fn oriented_dimensions(&self) -> (u32, u32) {
        match self.exif.orientation {
            Some(o) if o.swaps_dimensions() => (self.height, self.width),
            _ => (self.width, self.height),
        }
    }
}
