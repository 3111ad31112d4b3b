//! QuickEdit Core - editing state and engine protocol
//!
//! This crate holds everything of the in-browser editor that is not UI:
//! crop geometry and pointer gestures, the resize solver, adjustment
//! mapping, the tool state machine, the single-in-flight dispatch protocol
//! to the image-processing engine, the image session, and a controller that
//! ties them together. A reference engine built on the `image` crate is
//! included so the protocol can run end to end.

pub mod adjust;
pub mod config;
pub mod dispatch;
pub mod editor;
pub mod engine;
pub mod geometry;
pub mod gesture;
pub mod metadata;
pub mod protocol;
pub mod resize;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;

pub use adjust::{to_engine_params, AdjustField, AdjustVector, EngineAdjustParams};
pub use config::{ConfigError, EditorConfig};
pub use dispatch::{DispatchError, Dispatcher, EngineChannel, TransportError};
pub use editor::{Editor, EditorError, EditorEvent, EditorSnapshot};
pub use engine::{Engine, EngineError, LocalChannel, LocalEngine};
pub use geometry::{CropGeometry, PixelRect, Rect, Size};
pub use gesture::{CropGesture, GestureKind, Handle, Point};
pub use metadata::{ExifSummary, ImageMetadata, Orientation};
pub use protocol::{
    Action, EngineRequest, EngineResponse, ImageBuffer, Operation, ParseNameError, RotateDirection,
};
pub use resize::{Dimension, ResizeFilter, ResizeSpec, UnknownFilter};
pub use session::{ImageSession, InputError, PreviewId};
pub use state::{EditorState, Tool};
