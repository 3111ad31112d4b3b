//! Messages exchanged with the image-processing engine.
//!
//! # Ownership
//!
//! [`ImageBuffer`] is deliberately not `Clone`. Putting one into an
//! [`EngineRequest`] moves it: the sender cannot read it again, matching a
//! transferred `ArrayBuffer` on the JavaScript side. Callers that must keep
//! their bytes take an explicit copy with [`ImageBuffer::duplicate`] first.
//!
//! # Request (controller → engine)
//!
//! ```text
//! { action: "crop", buffer: <bytes>, params: { x, y, width, height } }
//! ```
//!
//! # Response (engine → controller)
//!
//! ```text
//! success: { metadata: {...}, outputBuffer: <bytes> }   // no outputBuffer for "metadata"
//! failure: { error: "crop failed: ..." }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adjust::EngineAdjustParams;
use crate::geometry::PixelRect;
use crate::metadata::ImageMetadata;
use crate::resize::ResizeSpec;

/// A name that is not part of the wire vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseNameError {
    #[error("Unknown action: {0}")]
    Action(String),

    #[error("Invalid rotation direction")]
    RotateDirection(String),
}

/// The five engine actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Metadata,
    Crop,
    Resize,
    Rotate,
    Adjust,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Metadata => "metadata",
            Action::Crop => "crop",
            Action::Resize => "resize",
            Action::Rotate => "rotate",
            Action::Adjust => "adjust",
        }
    }

    /// Whether a successful response carries a new image buffer.
    pub fn produces_output(self) -> bool {
        !matches!(self, Action::Metadata)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "metadata" => Ok(Action::Metadata),
            "crop" => Ok(Action::Crop),
            "resize" => Ok(Action::Resize),
            "rotate" => Ok(Action::Rotate),
            "adjust" => Ok(Action::Adjust),
            other => Err(ParseNameError::Action(other.to_string())),
        }
    }
}

/// Quarter-turn direction for the rotate action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotateDirection {
    /// 90° counter-clockwise.
    Left,
    /// 90° clockwise.
    Right,
}

impl FromStr for RotateDirection {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(RotateDirection::Left),
            "right" => Ok(RotateDirection::Right),
            other => Err(ParseNameError::RotateDirection(other.to_string())),
        }
    }
}

/// Encoded image bytes with unique ownership.
#[derive(PartialEq, Eq)]
pub struct ImageBuffer(Vec<u8>);

impl ImageBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Fresh copy of the bytes, for keeping a buffer that is about to be
    /// transferred.
    pub fn duplicate(&self) -> Self {
        Self(self.0.clone())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageBuffer({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for ImageBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Action plus its validated parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "params", rename_all = "snake_case")]
pub enum Operation {
    Metadata,
    Crop(PixelRect),
    Resize(ResizeSpec),
    Rotate(RotateDirection),
    Adjust(EngineAdjustParams),
}

impl Operation {
    pub fn action(&self) -> Action {
        match self {
            Operation::Metadata => Action::Metadata,
            Operation::Crop(_) => Action::Crop,
            Operation::Resize(_) => Action::Resize,
            Operation::Rotate(_) => Action::Rotate,
            Operation::Adjust(_) => Action::Adjust,
        }
    }
}

/// One request to the engine; owns the buffer it carries.
#[derive(Debug)]
pub struct EngineRequest {
    pub operation: Operation,
    pub buffer: ImageBuffer,
}

impl EngineRequest {
    pub fn new(operation: Operation, buffer: ImageBuffer) -> Self {
        Self { operation, buffer }
    }

    pub fn action(&self) -> Action {
        self.operation.action()
    }
}

/// The engine's single reply to a request.
#[derive(Debug)]
pub enum EngineResponse {
    Success {
        /// Metadata of `output` when present, otherwise of the input buffer.
        metadata: ImageMetadata,
        output: Option<ImageBuffer>,
    },
    Failure {
        /// Already prefixed with the action name.
        error: String,
    },
}

impl EngineResponse {
    /// Build a failure attributed to `action`.
    pub fn failure(action: Action, cause: impl fmt::Display) -> Self {
        EngineResponse::Failure {
            error: format!("{} failed: {}", action, cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resize::ResizeFilter;

    #[test]
    fn test_action_names_round_trip() {
        for action in [
            Action::Metadata,
            Action::Crop,
            Action::Resize,
            Action::Rotate,
            Action::Adjust,
        ] {
            assert_eq!(action.as_str().parse::<Action>(), Ok(action));
        }
        assert_eq!(
            "blur".parse::<Action>(),
            Err(ParseNameError::Action("blur".to_string()))
        );
        assert_eq!(
            ParseNameError::Action("blur".to_string()).to_string(),
            "Unknown action: blur"
        );
    }

    #[test]
    fn test_only_metadata_has_no_output() {
        assert!(!Action::Metadata.produces_output());
        assert!(Action::Crop.produces_output());
        assert!(Action::Adjust.produces_output());
    }

    #[test]
    fn test_failure_is_prefixed() {
        let response = EngineResponse::failure(Action::Resize, "Out of memory");
        match response {
            EngineResponse::Failure { error } => assert_eq!(error, "resize failed: Out of memory"),
            EngineResponse::Success { .. } => panic!("expected failure"),
        }
    }

    #[test]
    fn test_duplicate_is_independent() {
        let original = ImageBuffer::new(vec![1, 2, 3]);
        let copy = original.duplicate();
        let moved = original.into_bytes();

        assert_eq!(copy.as_bytes(), moved.as_slice());
        assert_eq!(copy.len(), 3);
    }

    #[test]
    fn test_buffer_debug_hides_bytes() {
        let buffer = ImageBuffer::new(vec![0; 2048]);
        assert_eq!(format!("{:?}", buffer), "ImageBuffer(2048 bytes)");
    }

    #[test]
    fn test_rotate_direction_parse() {
        assert_eq!("left".parse(), Ok(RotateDirection::Left));
        assert_eq!("right".parse(), Ok(RotateDirection::Right));
        let err = "up".parse::<RotateDirection>().unwrap_err();
        assert_eq!(err, ParseNameError::RotateDirection("up".to_string()));
        assert_eq!(err.to_string(), "Invalid rotation direction");
    }

    #[test]
    fn test_operation_action() {
        let op = Operation::Resize(ResizeSpec {
            width: 10,
            height: 10,
            filter: ResizeFilter::Nearest,
            maintain_aspect_ratio: false,
        });
        assert_eq!(op.action(), Action::Resize);
        assert_eq!(Operation::Metadata.action(), Action::Metadata);
        assert_eq!(
            Operation::Crop(PixelRect::new(0, 0, 1, 1)).action(),
            Action::Crop
        );
    }
}
