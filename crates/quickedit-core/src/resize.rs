//! Resize tool parameters.
//!
//! The solver turns raw user input for one dimension into a validated
//! `(width, height)` pair, optionally locked to the aspect ratio captured when
//! the tool was opened. Input coalescing lives in [`Debouncer`]; the solver
//! itself is stateless.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest allowed output dimension in pixels.
pub const MIN_DIMENSION: u32 = 1;

/// Largest allowed output dimension in pixels.
pub const MAX_DIMENSION: u32 = 16384;

/// Default window for coalescing dimension input.
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Resampling filter passed through to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    /// Nearest neighbor (fastest, blocky).
    Nearest,
    /// Linear interpolation.
    Triangle,
    /// Cubic Catmull-Rom spline.
    CatmullRom,
    /// Gaussian blur kernel.
    Gaussian,
    /// Lanczos with window 3 (slowest, sharpest).
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    pub const ALL: [ResizeFilter; 5] = [
        ResizeFilter::Nearest,
        ResizeFilter::Triangle,
        ResizeFilter::CatmullRom,
        ResizeFilter::Gaussian,
        ResizeFilter::Lanczos3,
    ];

    /// Wire name of the filter.
    pub fn as_str(self) -> &'static str {
        match self {
            ResizeFilter::Nearest => "nearest",
            ResizeFilter::Triangle => "triangle",
            ResizeFilter::CatmullRom => "catmull_rom",
            ResizeFilter::Gaussian => "gaussian",
            ResizeFilter::Lanczos3 => "lanczos3",
        }
    }

    /// Convert to the image crate's filter.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            ResizeFilter::Nearest => image::imageops::FilterType::Nearest,
            ResizeFilter::Triangle => image::imageops::FilterType::Triangle,
            ResizeFilter::CatmullRom => image::imageops::FilterType::CatmullRom,
            ResizeFilter::Gaussian => image::imageops::FilterType::Gaussian,
            ResizeFilter::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a filter name is not one of [`ResizeFilter::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown resize filter: {0}")]
pub struct UnknownFilter(pub String);

impl FromStr for ResizeFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResizeFilter::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownFilter(s.to_string()))
    }
}

/// Which dimension the user edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Width,
    Height,
}

/// A validated `(width, height)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Target of a resize request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeSpec {
    pub width: u32,
    pub height: u32,
    pub filter: ResizeFilter,
    pub maintain_aspect_ratio: bool,
}

/// Round and clamp a raw dimension into `[MIN_DIMENSION, MAX_DIMENSION]`.
///
/// Non-finite input (an emptied text field parses to NaN) maps to the minimum.
pub fn validate(value: f64) -> u32 {
    if value.is_nan() {
        return MIN_DIMENSION;
    }
    value
        .round()
        .clamp(MIN_DIMENSION as f64, MAX_DIMENSION as f64) as u32
}

/// Solve both dimensions after one of them changed.
///
/// * unlocked: the changed field is validated, the other is re-validated as-is
/// * locked: the other field is derived from `aspect_ratio`
///   (`width / height` of the *original* image) and then validated
///
/// The ratio must be the one captured when the tool opened. Deriving it from
/// already-rounded current values would compound rounding error.
pub fn solve(
    changed: Dimension,
    raw: f64,
    maintain_aspect_ratio: bool,
    current_other: u32,
    aspect_ratio: f64,
) -> Dimensions {
    let value = validate(raw);

    let other = if maintain_aspect_ratio && aspect_ratio.is_finite() && aspect_ratio > 0.0 {
        match changed {
            Dimension::Width => validate(value as f64 / aspect_ratio),
            Dimension::Height => validate(value as f64 * aspect_ratio),
        }
    } else {
        validate(current_other as f64)
    };

    match changed {
        Dimension::Width => Dimensions {
            width: value,
            height: other,
        },
        Dimension::Height => Dimensions {
            width: other,
            height: value,
        },
    }
}

/// Resize tool state: the spec being edited plus the snapshot it is
/// solved against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeTool {
    pub spec: ResizeSpec,
    /// Dimensions of the image when the tool was opened.
    pub original: Dimensions,
    /// `original.width / original.height`, fixed for the tool's lifetime.
    pub aspect_ratio: f64,
}

impl ResizeTool {
    /// Snapshot the current image dimensions.
    pub fn open(width: u32, height: u32) -> Self {
        let aspect_ratio = if height == 0 {
            1.0
        } else {
            width as f64 / height as f64
        };
        let original = Dimensions {
            width: validate(width as f64),
            height: validate(height as f64),
        };

        Self {
            spec: ResizeSpec {
                width: original.width,
                height: original.height,
                filter: ResizeFilter::default(),
                maintain_aspect_ratio: true,
            },
            original,
            aspect_ratio,
        }
    }

    /// Apply an edit to one dimension, returning the updated tool.
    pub fn with_dimension(self, changed: Dimension, raw: f64) -> Self {
        let current_other = match changed {
            Dimension::Width => self.spec.height,
            Dimension::Height => self.spec.width,
        };
        let solved = solve(
            changed,
            raw,
            self.spec.maintain_aspect_ratio,
            current_other,
            self.aspect_ratio,
        );

        Self {
            spec: ResizeSpec {
                width: solved.width,
                height: solved.height,
                ..self.spec
            },
            ..self
        }
    }

    pub fn with_filter(self, filter: ResizeFilter) -> Self {
        Self {
            spec: ResizeSpec { filter, ..self.spec },
            ..self
        }
    }

    /// Toggle the aspect lock.
    ///
    /// Locking re-derives the height from the current width so the pair is
    /// consistent with the original ratio straight away.
    pub fn with_aspect_lock(self, locked: bool) -> Self {
        let spec = ResizeSpec {
            maintain_aspect_ratio: locked,
            ..self.spec
        };
        let tool = Self { spec, ..self };
        if locked {
            tool.with_dimension(Dimension::Width, spec.width as f64)
        } else {
            tool
        }
    }
}

/// Trailing-edge debouncer for dimension input.
///
/// Time is supplied by the caller in milliseconds (e.g. `performance.now()`),
/// which keeps the policy deterministic under test. Only the latest input
/// for a dimension within a window survives; an edit of the other dimension
/// releases the pending one immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct Debouncer {
    window_ms: u64,
    pending: Option<PendingInput>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingInput {
    at_ms: u64,
    changed: Dimension,
    raw: f64,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            pending: None,
        }
    }

    /// Record an input event, replacing an earlier pending edit of the same
    /// dimension. A pending edit of the other dimension is returned and must
    /// be applied before this one.
    #[must_use = "a released edit of the other dimension must be applied"]
    pub fn push(&mut self, now_ms: u64, changed: Dimension, raw: f64) -> Option<(Dimension, f64)> {
        let released = self
            .pending
            .filter(|p| p.changed != changed)
            .map(|p| (p.changed, p.raw));
        self.pending = Some(PendingInput {
            at_ms: now_ms,
            changed,
            raw,
        });
        released
    }

    /// Release the pending input once the window has elapsed since it arrived.
    pub fn poll(&mut self, now_ms: u64) -> Option<(Dimension, f64)> {
        let pending = self.pending?;
        if now_ms.saturating_sub(pending.at_ms) < self.window_ms {
            return None;
        }
        self.pending = None;
        Some((pending.changed, pending.raw))
    }

    /// Release the pending input regardless of the window (used on commit).
    pub fn flush(&mut self) -> Option<(Dimension, f64)> {
        self.pending.take().map(|p| (p.changed, p.raw))
    }

    /// Drop the pending input (used on cancel).
    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rounds_and_clamps() {
        assert_eq!(validate(99.4), 99);
        assert_eq!(validate(99.5), 100);
        assert_eq!(validate(0.0), MIN_DIMENSION);
        assert_eq!(validate(-50.0), MIN_DIMENSION);
        assert_eq!(validate(1e9), MAX_DIMENSION);
        assert_eq!(validate(f64::NAN), MIN_DIMENSION);
        assert_eq!(validate(f64::INFINITY), MAX_DIMENSION);
    }

    #[test]
    fn test_solve_unlocked_keeps_other() {
        let dims = solve(Dimension::Width, 640.0, false, 500, 2.0);
        assert_eq!(dims, Dimensions { width: 640, height: 500 });

        let dims = solve(Dimension::Height, 10.0, false, 0, 2.0);
        assert_eq!(dims, Dimensions { width: MIN_DIMENSION, height: 10 });
    }

    #[test]
    fn test_solve_locked_width_drives_height() {
        // 1000x500 -> ratio 2.0
        let dims = solve(Dimension::Width, 600.0, true, 500, 2.0);
        assert_eq!(dims, Dimensions { width: 600, height: 300 });
    }

    #[test]
    fn test_solve_locked_height_drives_width() {
        let dims = solve(Dimension::Height, 300.0, true, 1000, 2.0);
        assert_eq!(dims, Dimensions { width: 600, height: 300 });
    }

    #[test]
    fn test_solve_locked_clamps_derived() {
        let dims = solve(Dimension::Width, 16000.0, true, 1, 0.5);
        assert_eq!(dims, Dimensions { width: 16000, height: MAX_DIMENSION });
    }

    #[test]
    fn test_solve_locked_with_invalid_ratio_falls_back() {
        let dims = solve(Dimension::Width, 300.0, true, 77, f64::NAN);
        assert_eq!(dims, Dimensions { width: 300, height: 77 });
    }

    #[test]
    fn test_tool_open_snapshots_ratio() {
        let tool = ResizeTool::open(1000, 500);
        assert_eq!(tool.aspect_ratio, 2.0);
        assert_eq!(tool.spec.width, 1000);
        assert_eq!(tool.spec.height, 500);
        assert!(tool.spec.maintain_aspect_ratio);
        assert_eq!(tool.spec.filter, ResizeFilter::Lanczos3);
    }

    #[test]
    fn test_tool_open_zero_height() {
        let tool = ResizeTool::open(100, 0);
        assert_eq!(tool.aspect_ratio, 1.0);
        assert_eq!(tool.original.height, MIN_DIMENSION);
    }

    #[test]
    fn test_tool_repeated_edits_use_original_ratio() {
        // 3:1 image; bouncing through odd sizes must not drift the ratio
        let mut tool = ResizeTool::open(900, 300);
        for w in [7.0, 13.0, 101.0, 5.0, 899.0] {
            tool = tool.with_dimension(Dimension::Width, w);
        }
        tool = tool.with_dimension(Dimension::Width, 900.0);
        assert_eq!(tool.spec.height, 300);
    }

    #[test]
    fn test_tool_unlocked_is_independent() {
        let tool = ResizeTool::open(1000, 500)
            .with_aspect_lock(false)
            .with_dimension(Dimension::Width, 10.0);
        assert_eq!(tool.spec.width, 10);
        assert_eq!(tool.spec.height, 500);
    }

    #[test]
    fn test_tool_relock_rederives_height() {
        let tool = ResizeTool::open(1000, 500)
            .with_aspect_lock(false)
            .with_dimension(Dimension::Height, 123.0)
            .with_aspect_lock(true);
        assert_eq!(tool.spec.width, 1000);
        assert_eq!(tool.spec.height, 500);
    }

    #[test]
    fn test_filter_names_round_trip() {
        for filter in ResizeFilter::ALL {
            assert_eq!(filter.as_str().parse::<ResizeFilter>(), Ok(filter));
        }
        assert_eq!(
            "bicubic".parse::<ResizeFilter>(),
            Err(UnknownFilter("bicubic".to_string()))
        );
        assert_eq!(
            UnknownFilter("bicubic".to_string()).to_string(),
            "Unknown resize filter: bicubic"
        );
    }

    #[test]
    fn test_filter_conversion() {
        assert!(matches!(
            ResizeFilter::CatmullRom.to_image_filter(),
            image::imageops::FilterType::CatmullRom
        ));
        assert!(matches!(
            ResizeFilter::Triangle.to_image_filter(),
            image::imageops::FilterType::Triangle
        ));
    }

    #[test]
    fn test_debouncer_waits_for_window() {
        let mut debouncer = Debouncer::new(200);
        assert_eq!(debouncer.push(1000, Dimension::Width, 10.0), None);
        assert_eq!(debouncer.push(1100, Dimension::Width, 100.0), None);

        assert_eq!(debouncer.poll(1250), None);
        assert_eq!(debouncer.poll(1300), Some((Dimension::Width, 100.0)));
        assert_eq!(debouncer.poll(5000), None);
    }

    #[test]
    fn test_debouncer_releases_other_dimension() {
        let mut debouncer = Debouncer::new(200);
        assert_eq!(debouncer.push(0, Dimension::Width, 300.0), None);
        assert_eq!(
            debouncer.push(50, Dimension::Height, 200.0),
            Some((Dimension::Width, 300.0))
        );

        assert_eq!(debouncer.poll(200), None);
        assert_eq!(debouncer.poll(250), Some((Dimension::Height, 200.0)));
    }

    #[test]
    fn test_debouncer_flush_and_clear() {
        let mut debouncer = Debouncer::default();
        assert_eq!(debouncer.push(0, Dimension::Height, 42.0), None);
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.flush(), Some((Dimension::Height, 42.0)));
        assert!(!debouncer.is_pending());

        assert_eq!(debouncer.push(0, Dimension::Height, 1.0), None);
        debouncer.clear();
        assert_eq!(debouncer.poll(u64::MAX), None);
    }
}
