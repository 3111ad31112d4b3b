//! Active tool and per-tool parameters.
//!
//! [`EditorState`] is a plain value. Every transition consumes the current
//! state and returns the next one, so invariants can be checked at each
//! boundary and no field is ever half-updated.
//!
//! ```text
//! Idle --enter_crop-->   Cropping  --cancel/apply--> Idle
//! Idle --enter_resize--> Resizing  --cancel/apply--> Idle
//! Idle --enter_adjust--> Adjusting --cancel/apply--> Idle
//! any  --rotate--------------------------------------> Idle
//! ```
//!
//! Whether a dispatch is in flight is not tracked here; the editor refuses
//! tool input while one is pending.

use serde::Serialize;
use thiserror::Error;

use crate::adjust::{self, to_engine_params, AdjustVector};
use crate::geometry::{self, CropGeometry, GeometryError, Rect, Size};
use crate::protocol::{Operation, RotateDirection};
use crate::resize::ResizeTool;

/// The exclusive tool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Idle,
    Cropping,
    Resizing,
    Adjusting,
}

/// Invalid tool transitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    /// Another tool must be closed first.
    #[error("Cannot open {requested:?} while {active:?} is active")]
    ToolActive { active: Tool, requested: Tool },

    /// The edit belongs to a tool that is not open.
    #[error("{expected:?} is not the active tool ({active:?} is)")]
    WrongTool { expected: Tool, active: Tool },

    /// Apply was requested with no tool open.
    #[error("No tool is active")]
    NothingToApply,

    /// The crop selection could not be mapped onto the image.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Parameters of every tool. Each persists while its tool is inactive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterStore {
    /// Display-space selection; set when the crop tool is first opened.
    pub crop: Option<Rect>,
    /// Resize snapshot and spec; set when the resize tool is first opened.
    pub resize: Option<ResizeTool>,
    pub adjust: AdjustVector,
}

/// What a commit needs to know about the image and the preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommitContext {
    /// Rendered preview size at commit time.
    pub display: Size,
    /// Natural pixel size of the current image.
    pub natural: (u32, u32),
}

/// Snapshot of the tool state machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditorState {
    pub tool: Tool,
    pub params: ParameterStore,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    fn require_idle(&self, requested: Tool) -> Result<(), StateError> {
        match self.tool {
            Tool::Idle => Ok(()),
            active => Err(StateError::ToolActive { active, requested }),
        }
    }

    fn require_tool(&self, expected: Tool) -> Result<(), StateError> {
        if self.tool == expected {
            Ok(())
        } else {
            Err(StateError::WrongTool {
                expected,
                active: self.tool,
            })
        }
    }

    fn with_tool(self, tool: Tool) -> Self {
        log::debug!("tool {:?} -> {:?}", self.tool, tool);
        Self { tool, ..self }
    }

    /// `Idle → Cropping`, initializing a centred selection.
    pub fn enter_crop(self, geometry: &CropGeometry, display: Size) -> Result<Self, StateError> {
        self.require_idle(Tool::Cropping)?;
        let selection = geometry.initial_selection(display);
        let params = ParameterStore {
            crop: Some(selection),
            ..self.params
        };
        Ok(Self { params, ..self }.with_tool(Tool::Cropping))
    }

    /// `Idle → Resizing`, snapshotting the image's dimensions and ratio.
    pub fn enter_resize(self, width: u32, height: u32) -> Result<Self, StateError> {
        self.require_idle(Tool::Resizing)?;
        let params = ParameterStore {
            resize: Some(ResizeTool::open(width, height)),
            ..self.params
        };
        Ok(Self { params, ..self }.with_tool(Tool::Resizing))
    }

    /// `Idle → Adjusting`, resetting the sliders to neutral.
    pub fn enter_adjust(self) -> Result<Self, StateError> {
        self.require_idle(Tool::Adjusting)?;
        let params = ParameterStore {
            adjust: adjust::reset(),
            ..self.params
        };
        Ok(Self { params, ..self }.with_tool(Tool::Adjusting))
    }

    /// Replace the crop selection during a gesture.
    pub fn with_crop_selection(self, selection: Rect) -> Result<Self, StateError> {
        self.require_tool(Tool::Cropping)?;
        let params = ParameterStore {
            crop: Some(selection),
            ..self.params
        };
        Ok(Self { params, ..self })
    }

    /// Update the resize tool through `edit`.
    pub fn with_resize(
        self,
        edit: impl FnOnce(ResizeTool) -> ResizeTool,
    ) -> Result<Self, StateError> {
        self.require_tool(Tool::Resizing)?;
        let params = ParameterStore {
            resize: self.params.resize.map(edit),
            ..self.params
        };
        Ok(Self { params, ..self })
    }

    /// Replace the adjustment sliders.
    pub fn with_adjust(self, vector: AdjustVector) -> Result<Self, StateError> {
        self.require_tool(Tool::Adjusting)?;
        let params = ParameterStore {
            adjust: vector,
            ..self.params
        };
        Ok(Self { params, ..self })
    }

    /// Any tool `→ Idle` without dispatching.
    pub fn cancel(self) -> Self {
        self.with_tool(Tool::Idle)
    }

    /// Any tool `→ Idle`, producing the operation to dispatch.
    ///
    /// The state returns to `Idle` straight away, whether or not the
    /// dispatched request later succeeds.
    pub fn apply(self, context: CommitContext) -> Result<(Self, Operation), StateError> {
        let operation = match self.tool {
            Tool::Idle => return Err(StateError::NothingToApply),
            Tool::Cropping => {
                let selection = self.params.crop.ok_or(StateError::NothingToApply)?;
                Operation::Crop(geometry::to_natural(
                    selection,
                    context.display,
                    context.natural,
                )?)
            }
            Tool::Resizing => {
                let tool = self.params.resize.ok_or(StateError::NothingToApply)?;
                Operation::Resize(tool.spec)
            }
            Tool::Adjusting => Operation::Adjust(to_engine_params(&self.params.adjust)),
        };
        Ok((self.with_tool(Tool::Idle), operation))
    }

    /// Rotation has no modal state: always lands in `Idle`.
    pub fn rotate(self, direction: RotateDirection) -> (Self, Operation) {
        (self.with_tool(Tool::Idle), Operation::Rotate(direction))
    }
}
