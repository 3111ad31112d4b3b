//! JavaScript handle to the editor controller.
//!
//! The view forwards DOM events to a [`JsEditor`] and re-renders from
//! [`JsEditor::snapshot`]. Structured values cross the boundary through
//! `serde-wasm-bindgen`; errors become string `JsValue`s.

use std::fmt::Display;

use quickedit_core::{
    AdjustField, Dimension, Editor, EditorConfig, GestureKind, Handle, Point, RotateDirection,
};
use wasm_bindgen::prelude::*;

use crate::channel::WorkerChannel;
use crate::message::lenient_filter;

fn to_js(error: impl Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// What the pointer went down on: `"move"` for the selection body, or a
/// corner name.
pub fn parse_gesture_target(target: &str) -> Option<GestureKind> {
    match target {
        "move" => Some(GestureKind::Drag),
        corner => Handle::from_name(corner).map(GestureKind::Resize),
    }
}

pub fn parse_dimension(name: &str) -> Option<Dimension> {
    match name {
        "width" => Some(Dimension::Width),
        "height" => Some(Dimension::Height),
        _ => None,
    }
}

/// Clamp a `performance.now()` reading into whole milliseconds.
pub fn to_millis(now: f64) -> u64 {
    if now.is_finite() && now > 0.0 {
        now as u64
    } else {
        0
    }
}

/// Editor bound to a worker-hosted engine.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const editor = new JsEditor('./engine-worker.js', { resizeDebounceMs: 150 });
///
/// editor.load_file(file.name, file.type, new Uint8Array(await file.arrayBuffer()));
///
/// function frame(now: number) {
///   editor.tick(now);
///   const event = editor.poll();
///   if (event) render(editor.snapshot(), event);
///   requestAnimationFrame(frame);
/// }
/// ```
#[wasm_bindgen]
pub struct JsEditor {
    inner: Editor<WorkerChannel>,
}

#[wasm_bindgen]
impl JsEditor {
    /// Spawn the engine worker and create an editor.
    ///
    /// `config` may be `undefined` for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(worker_url: &str, config: JsValue) -> Result<JsEditor, JsValue> {
        let config: EditorConfig = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        let channel = WorkerChannel::spawn(worker_url).map_err(to_js)?;
        let inner = Editor::new(config, channel).map_err(to_js)?;
        Ok(JsEditor { inner })
    }

    pub fn load_file(
        &mut self,
        file_name: &str,
        mime: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<(), JsValue> {
        self.inner
            .load_file(file_name, mime.as_deref(), bytes)
            .map_err(to_js)
    }

    pub fn refresh_metadata(&mut self) -> Result<(), JsValue> {
        self.inner.refresh_metadata().map_err(to_js)
    }

    pub fn set_display_size(&mut self, width: f64, height: f64) {
        self.inner.set_display_size(width, height);
    }

    pub fn open_crop(&mut self) -> Result<(), JsValue> {
        self.inner.open_crop().map_err(to_js)
    }

    pub fn open_resize(&mut self) -> Result<(), JsValue> {
        self.inner.open_resize().map_err(to_js)
    }

    pub fn open_adjust(&mut self) -> Result<(), JsValue> {
        self.inner.open_adjust().map_err(to_js)
    }

    pub fn cancel(&mut self) {
        self.inner.cancel();
    }

    pub fn apply(&mut self) -> Result<(), JsValue> {
        self.inner.apply().map_err(to_js)
    }

    /// `direction` is `"left"` or `"right"`.
    pub fn rotate(&mut self, direction: &str) -> Result<(), JsValue> {
        let direction: RotateDirection = direction.parse().map_err(to_js)?;
        self.inner.rotate(direction).map_err(to_js)
    }

    /// `target` is `"move"`, `"nw"`, `"ne"`, `"sw"` or `"se"`.
    pub fn pointer_down(&mut self, target: &str, x: f64, y: f64) -> Result<(), JsValue> {
        let kind = parse_gesture_target(target)
            .ok_or_else(|| to_js(format!("Unknown crop handle: {}", target)))?;
        self.inner
            .pointer_down(kind, Point::new(x, y))
            .map_err(to_js)
    }

    /// Returns the updated selection, or `null` when no gesture is active.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<JsValue, JsValue> {
        match self.inner.pointer_move(Point::new(x, y)).map_err(to_js)? {
            Some(selection) => Ok(serde_wasm_bindgen::to_value(&selection)?),
            None => Ok(JsValue::NULL),
        }
    }

    pub fn pointer_up(&mut self) {
        self.inner.pointer_up();
    }

    /// Typed dimension input; `dimension` is `"width"` or `"height"`.
    pub fn resize_input(&mut self, dimension: &str, value: f64, now: f64) -> Result<(), JsValue> {
        let changed = parse_dimension(dimension)
            .ok_or_else(|| to_js(format!("Unknown dimension: {}", dimension)))?;
        self.inner
            .resize_input(changed, value, to_millis(now))
            .map_err(to_js)
    }

    /// Release debounced input. Returns true when the resize spec changed.
    pub fn tick(&mut self, now: f64) -> Result<bool, JsValue> {
        Ok(self.inner.tick(to_millis(now)).map_err(to_js)?.is_some())
    }

    /// Unknown filter names fall back to Lanczos3.
    pub fn set_resize_filter(&mut self, filter: &str) -> Result<(), JsValue> {
        self.inner
            .set_resize_filter(lenient_filter(filter))
            .map_err(to_js)
    }

    pub fn set_maintain_aspect_ratio(&mut self, locked: bool) -> Result<(), JsValue> {
        self.inner.set_maintain_aspect_ratio(locked).map_err(to_js)
    }

    /// Set one slider by name (e.g. `"brightness"`); the value is clamped to
    /// the slider's range.
    pub fn set_adjustment(&mut self, field: &str, value: i32) -> Result<(), JsValue> {
        let field = AdjustField::from_name(field)
            .ok_or_else(|| to_js(format!("Unknown adjustment: {}", field)))?;
        self.inner.set_adjustment(field, value).map_err(to_js)
    }

    pub fn reset_adjustments(&mut self) -> Result<(), JsValue> {
        self.inner.reset_adjustments().map_err(to_js)
    }

    /// Apply a pending engine response. Returns the resulting event, `null`
    /// when nothing has arrived, or throws the failure message.
    pub fn poll(&mut self) -> Result<JsValue, JsValue> {
        match self.inner.poll() {
            None => Ok(JsValue::NULL),
            Some(Ok(event)) => Ok(serde_wasm_bindgen::to_value(&event)?),
            Some(Err(e)) => Err(to_js(e)),
        }
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.snapshot())?)
    }

    /// Copy of the current image's bytes, for building a preview URL.
    pub fn image_bytes(&self) -> Option<Vec<u8>> {
        self.inner
            .session()
            .map(|s| s.buffer().as_bytes().to_vec())
    }

    #[wasm_bindgen(getter)]
    pub fn processing(&self) -> bool {
        self.inner.is_processing()
    }

    #[wasm_bindgen(getter)]
    pub fn controls_enabled(&self) -> bool {
        self.inner.controls_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gesture_target() {
        assert_eq!(parse_gesture_target("move"), Some(GestureKind::Drag));
        assert_eq!(
            parse_gesture_target("sw"),
            Some(GestureKind::Resize(Handle::SouthWest))
        );
        assert_eq!(parse_gesture_target("n"), None);
    }

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension("width"), Some(Dimension::Width));
        assert_eq!(parse_dimension("height"), Some(Dimension::Height));
        assert_eq!(parse_dimension("depth"), None);
    }

    #[test]
    fn test_to_millis() {
        assert_eq!(to_millis(1234.9), 1234);
        assert_eq!(to_millis(-5.0), 0);
        assert_eq!(to_millis(f64::NAN), 0);
    }
}
