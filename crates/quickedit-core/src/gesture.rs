//! Pointer gestures on the crop selection.
//!
//! A [`CropGesture`] exists only between pointer-down and pointer-up. It
//! remembers where the pointer went down and what the selection looked like
//! at that moment; every move is replayed from that snapshot with the total
//! pointer delta, so many small moves never accumulate drift.

use serde::{Deserialize, Serialize};

use crate::geometry::{CropGeometry, Rect, Size};

/// Pointer position in display space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Corner handles of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handle {
    #[serde(rename = "nw")]
    NorthWest,
    #[serde(rename = "ne")]
    NorthEast,
    #[serde(rename = "sw")]
    SouthWest,
    #[serde(rename = "se")]
    SouthEast,
}

impl Handle {
    /// Parse the short compass name used by the view (`nw`, `ne`, `sw`, `se`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "nw" => Some(Handle::NorthWest),
            "ne" => Some(Handle::NorthEast),
            "sw" => Some(Handle::SouthWest),
            "se" => Some(Handle::SouthEast),
            _ => None,
        }
    }
}

/// What the pointer grabbed on pointer-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    /// The selection body: translate without resizing.
    Drag,
    /// One of the four corners.
    Resize(Handle),
}

/// An in-progress drag or corner resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropGesture {
    kind: GestureKind,
    origin: Point,
    start: Rect,
}

impl CropGesture {
    /// Start a gesture from the pointer-down position and current selection.
    pub fn begin(kind: GestureKind, origin: Point, selection: Rect) -> Self {
        log::debug!("crop gesture {:?} started at ({}, {})", kind, origin.x, origin.y);
        Self {
            kind,
            origin,
            start: selection,
        }
    }

    /// Selection for the pointer at `pointer`, recomputed from the snapshot.
    pub fn update(&self, pointer: Point, geometry: &CropGeometry, display: Size) -> Rect {
        let dx = pointer.x - self.origin.x;
        let dy = pointer.y - self.origin.y;
        let s = self.start;

        let candidate = match self.kind {
            GestureKind::Drag => {
                // Slide along the border rather than shrink against it.
                let x = (s.x + dx).min(display.width - s.width).max(0.0);
                let y = (s.y + dy).min(display.height - s.height).max(0.0);
                Rect::new(x, y, s.width, s.height)
            }
            GestureKind::Resize(Handle::NorthWest) => {
                Rect::new(s.x + dx, s.y + dy, s.width - dx, s.height - dy)
            }
            GestureKind::Resize(Handle::NorthEast) => {
                Rect::new(s.x, s.y + dy, s.width + dx, s.height - dy)
            }
            GestureKind::Resize(Handle::SouthWest) => {
                Rect::new(s.x + dx, s.y, s.width - dx, s.height + dy)
            }
            GestureKind::Resize(Handle::SouthEast) => {
                Rect::new(s.x, s.y, s.width + dx, s.height + dy)
            }
        };

        geometry.constrain(candidate, display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISPLAY: Size = Size {
        width: 400.0,
        height: 300.0,
    };

    fn start() -> Rect {
        Rect::new(100.0, 100.0, 100.0, 100.0)
    }

    fn run(kind: GestureKind, dx: f64, dy: f64) -> Rect {
        let gesture = CropGesture::begin(kind, Point::new(150.0, 150.0), start());
        gesture.update(
            Point::new(150.0 + dx, 150.0 + dy),
            &CropGeometry::default(),
            DISPLAY,
        )
    }

    #[test]
    fn test_drag_translates() {
        let rect = run(GestureKind::Drag, 20.0, -10.0);
        assert_eq!(rect, Rect::new(120.0, 90.0, 100.0, 100.0));
    }

    #[test]
    fn test_drag_keeps_size_at_border() {
        let rect = run(GestureKind::Drag, 500.0, 500.0);
        assert_eq!(rect, Rect::new(300.0, 200.0, 100.0, 100.0));

        let rect = run(GestureKind::Drag, -500.0, -500.0);
        assert_eq!(rect, Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_nw_moves_origin_and_shrinks() {
        let rect = run(GestureKind::Resize(Handle::NorthWest), 10.0, 20.0);
        assert_eq!(rect, Rect::new(110.0, 120.0, 90.0, 80.0));
    }

    #[test]
    fn test_ne_moves_top_and_grows_width() {
        let rect = run(GestureKind::Resize(Handle::NorthEast), 10.0, 20.0);
        assert_eq!(rect, Rect::new(100.0, 120.0, 110.0, 80.0));
    }

    #[test]
    fn test_sw_moves_left_and_grows_height() {
        let rect = run(GestureKind::Resize(Handle::SouthWest), 10.0, 20.0);
        assert_eq!(rect, Rect::new(110.0, 100.0, 90.0, 120.0));
    }

    #[test]
    fn test_se_grows_freely() {
        let rect = run(GestureKind::Resize(Handle::SouthEast), 10.0, 20.0);
        assert_eq!(rect, Rect::new(100.0, 100.0, 110.0, 120.0));
    }

    #[test]
    fn test_se_past_edge_is_absorbed() {
        let rect = run(GestureKind::Resize(Handle::SouthEast), 1000.0, 1000.0);
        assert_eq!(rect, Rect::new(100.0, 100.0, 300.0, 200.0));
    }

    #[test]
    fn test_nw_collapse_respects_min_size() {
        let rect = run(GestureKind::Resize(Handle::NorthWest), 200.0, 200.0);
        assert!(rect.width >= crate::geometry::MIN_CROP_SIZE);
        assert!(rect.height >= crate::geometry::MIN_CROP_SIZE);
        assert!(rect.x + rect.width <= DISPLAY.width);
        assert!(rect.y + rect.height <= DISPLAY.height);
    }

    #[test]
    fn test_update_replays_from_snapshot() {
        let geometry = CropGeometry::default();
        let gesture = CropGesture::begin(
            GestureKind::Resize(Handle::SouthEast),
            Point::new(0.0, 0.0),
            start(),
        );

        // Many small moves, then a final position: only the final delta counts
        for step in 0..100 {
            let _ = gesture.update(Point::new(step as f64 * 0.37, step as f64 * 0.11), &geometry, DISPLAY);
        }
        let rect = gesture.update(Point::new(5.0, 5.0), &geometry, DISPLAY);

        assert_eq!(rect, Rect::new(100.0, 100.0, 105.0, 105.0));
    }

    #[test]
    fn test_handle_from_name() {
        assert_eq!(Handle::from_name("nw"), Some(Handle::NorthWest));
        assert_eq!(Handle::from_name("se"), Some(Handle::SouthEast));
        assert_eq!(Handle::from_name("n"), None);
    }
}
