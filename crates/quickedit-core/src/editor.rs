//! Editor controller.
//!
//! [`Editor`] is what a view binds to. It owns the tool state, the current
//! image session and the dispatcher, turns user input into state transitions
//! and engine requests, and applies engine responses back to the session.
//!
//! The host drives it by calling [`Editor::poll`] whenever the engine channel
//! may have a message (after a worker `message` event, or once per frame) and
//! [`Editor::tick`] to release debounced resize input.
//!
//! While a request is in flight every tool control is refused with
//! [`EditorError::Processing`]. A failed request leaves the session exactly
//! as it was.

use serde::Serialize;
use thiserror::Error;

use crate::adjust::{self, AdjustField, AdjustVector};
use crate::config::{ConfigError, EditorConfig};
use crate::dispatch::{Completion, DispatchError, DispatchState, Dispatcher, EngineChannel};
use crate::geometry::{Rect, Size};
use crate::gesture::{CropGesture, GestureKind, Point};
use crate::metadata::ImageMetadata;
use crate::protocol::{Action, EngineRequest, ImageBuffer, Operation, RotateDirection};
use crate::resize::{Debouncer, Dimension, ResizeFilter, ResizeSpec};
use crate::session::{validate_upload, ImageSession, InputError, PreviewId, SessionSummary};
use crate::state::{CommitContext, EditorState, StateError, Tool};

/// Everything the controller can refuse or report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The control needs an image and none is loaded.
    #[error("No image loaded")]
    NoImage,

    /// Controls are disabled until the in-flight request completes.
    #[error("Processing {0}; try again when it completes")]
    Processing(Action),
}

/// What changed after a response was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    /// A newly loaded file became the session.
    Loaded {
        preview: PreviewId,
        /// Preview of the session this load replaced, if any.
        released: Option<PreviewId>,
    },
    /// A transform succeeded and the session holds its output.
    ImageReplaced {
        action: Action,
        preview: PreviewId,
        released: PreviewId,
    },
    /// Metadata for the current buffer was re-read.
    MetadataRefreshed,
}

/// Serializable picture of the editor for the view layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub tool: Tool,
    pub crop: Option<Rect>,
    pub resize: Option<ResizeSpec>,
    pub adjust: AdjustVector,
    pub processing: bool,
    pub controls_enabled: bool,
    pub last_error: Option<String>,
    pub session: Option<SessionSummary>,
}

/// A file waiting for its metadata before it becomes the session.
struct PendingLoad {
    file_name: String,
    buffer: ImageBuffer,
}

pub struct Editor<C> {
    config: EditorConfig,
    state: EditorState,
    dispatcher: Dispatcher<C>,
    session: Option<ImageSession>,
    pending_load: Option<PendingLoad>,
    gesture: Option<CropGesture>,
    display: Size,
    debouncer: Debouncer,
    last_preview: PreviewId,
    last_error: Option<String>,
}

impl<C: EngineChannel> Editor<C> {
    pub fn new(config: EditorConfig, channel: C) -> Result<Self, EditorError> {
        config.validate()?;
        Ok(Self {
            config,
            state: EditorState::new(),
            dispatcher: Dispatcher::new(channel),
            session: None,
            pending_load: None,
            gesture: None,
            display: Size::default(),
            debouncer: Debouncer::new(config.resize_debounce_ms),
            last_preview: PreviewId(0),
            last_error: None,
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn session(&self) -> Option<&ImageSession> {
        self.session.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// A request (load or transform) is in flight.
    pub fn is_processing(&self) -> bool {
        self.dispatcher.is_pending()
    }

    /// Whether tool controls should be enabled in the view.
    pub fn controls_enabled(&self) -> bool {
        self.session.is_some() && !self.is_processing()
    }

    // ---- Loading -------------------------------------------------------

    /// Start loading a file. The previous session stays current until the
    /// engine has read the new file's metadata.
    pub fn load_file(
        &mut self,
        file_name: impl Into<String>,
        mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<(), EditorError> {
        self.ensure_ready()?;
        let file_name = file_name.into();

        if let Err(e) = validate_upload(mime, &bytes) {
            log::warn!("rejected upload {}: {}", file_name, e);
            return Err(self.fail(e.into()));
        }

        let buffer = ImageBuffer::new(bytes);
        self.send(Operation::Metadata, buffer.duplicate())?;
        self.gesture = None;
        self.debouncer.clear();
        log::info!("loading {} ({} bytes)", file_name, buffer.len());
        self.pending_load = Some(PendingLoad { file_name, buffer });
        Ok(())
    }

    /// Re-read metadata for the current image.
    pub fn refresh_metadata(&mut self) -> Result<(), EditorError> {
        self.ensure_ready()?;
        let buffer = self.current_session()?.checkout();
        self.send(Operation::Metadata, buffer)
    }

    // ---- Preview -------------------------------------------------------

    /// Record the rendered size of the preview element.
    ///
    /// An open crop selection is not rescaled; the commit converts with
    /// whatever size is current at that moment.
    pub fn set_display_size(&mut self, width: f64, height: f64) {
        self.display = Size::new(width, height);
    }

    // ---- Tools ---------------------------------------------------------

    pub fn open_crop(&mut self) -> Result<(), EditorError> {
        self.ensure_ready()?;
        self.current_session()?;
        let (geometry, display) = (self.config.crop, self.display);
        self.transition(|s| s.enter_crop(&geometry, display))
    }

    pub fn open_resize(&mut self) -> Result<(), EditorError> {
        self.ensure_ready()?;
        let (width, height) = self.current_session()?.dimensions();
        self.debouncer.clear();
        self.transition(|s| s.enter_resize(width, height))
    }

    pub fn open_adjust(&mut self) -> Result<(), EditorError> {
        self.ensure_ready()?;
        self.current_session()?;
        self.transition(|s| s.enter_adjust())
    }

    /// Close the active tool, discarding nothing but the open/closed state.
    pub fn cancel(&mut self) {
        self.gesture = None;
        self.debouncer.clear();
        self.state = self.state.clone().cancel();
    }

    /// Commit the active tool through the engine.
    ///
    /// The tool closes immediately; the image changes when the response is
    /// polled.
    pub fn apply(&mut self) -> Result<(), EditorError> {
        self.ensure_ready()?;
        self.flush_resize_input()?;

        let context = CommitContext {
            display: self.display,
            natural: self.current_session()?.dimensions(),
        };
        let (state, operation) = match self.state.clone().apply(context) {
            Ok(next) => next,
            Err(e) => return Err(self.fail(e.into())),
        };
        let buffer = self.current_session()?.checkout();

        self.state = state;
        self.gesture = None;
        self.send(operation, buffer)
    }

    /// Rotate a quarter turn. Closes any open tool.
    pub fn rotate(&mut self, direction: RotateDirection) -> Result<(), EditorError> {
        self.ensure_ready()?;
        let buffer = self.current_session()?.checkout();

        let (state, operation) = self.state.clone().rotate(direction);
        self.state = state;
        self.gesture = None;
        self.debouncer.clear();
        self.send(operation, buffer)
    }

    // ---- Crop gestures -------------------------------------------------

    pub fn pointer_down(&mut self, kind: GestureKind, at: Point) -> Result<(), EditorError> {
        self.ensure_ready()?;
        let selection = match (self.state.tool, self.state.params.crop) {
            (Tool::Cropping, Some(selection)) => selection,
            (active, _) => {
                return Err(StateError::WrongTool {
                    expected: Tool::Cropping,
                    active,
                }
                .into())
            }
        };
        self.gesture = Some(CropGesture::begin(kind, at, selection));
        Ok(())
    }

    /// Move the active gesture. Returns the new selection, or `None` when no
    /// gesture is in progress.
    pub fn pointer_move(&mut self, at: Point) -> Result<Option<Rect>, EditorError> {
        let Some(gesture) = self.gesture else {
            return Ok(None);
        };
        if let Err(e) = self.ensure_ready() {
            self.gesture = None;
            return Err(e);
        }
        let selection = gesture.update(at, &self.config.crop, self.display);
        self.transition(|s| s.with_crop_selection(selection))?;
        Ok(Some(selection))
    }

    pub fn pointer_up(&mut self) {
        self.gesture = None;
    }

    // ---- Resize --------------------------------------------------------

    /// Record a typed dimension. It takes effect once `tick` sees the
    /// debounce window elapse, or on apply.
    pub fn resize_input(
        &mut self,
        changed: Dimension,
        raw: f64,
        now_ms: u64,
    ) -> Result<(), EditorError> {
        self.ensure_ready()?;
        self.require_tool(Tool::Resizing)?;
        if let Some((earlier, earlier_raw)) = self.debouncer.push(now_ms, changed, raw) {
            self.apply_resize_input(earlier, earlier_raw)?;
        }
        Ok(())
    }

    /// Release debounced input. Returns the updated spec when it changed.
    ///
    /// Input is held while a request is in flight.
    pub fn tick(&mut self, now_ms: u64) -> Result<Option<ResizeSpec>, EditorError> {
        if self.is_processing() || !self.debouncer.is_pending() {
            return Ok(None);
        }
        let Some((changed, raw)) = self.debouncer.poll(now_ms) else {
            return Ok(None);
        };
        self.apply_resize_input(changed, raw)?;
        Ok(self.state.params.resize.map(|t| t.spec))
    }

    pub fn set_resize_filter(&mut self, filter: ResizeFilter) -> Result<(), EditorError> {
        self.ensure_ready()?;
        self.transition(|s| s.with_resize(|t| t.with_filter(filter)))
    }

    pub fn set_maintain_aspect_ratio(&mut self, locked: bool) -> Result<(), EditorError> {
        self.ensure_ready()?;
        self.flush_resize_input()?;
        self.transition(|s| s.with_resize(|t| t.with_aspect_lock(locked)))
    }

    // ---- Adjust --------------------------------------------------------

    pub fn set_adjustment(&mut self, field: AdjustField, value: i32) -> Result<(), EditorError> {
        self.ensure_ready()?;
        let vector = self.state.params.adjust.with(field, value);
        self.transition(|s| s.with_adjust(vector))
    }

    pub fn reset_adjustments(&mut self) -> Result<(), EditorError> {
        self.ensure_ready()?;
        self.transition(|s| s.with_adjust(adjust::reset()))
    }

    // ---- Responses -----------------------------------------------------

    /// Apply the engine's response, if one has arrived.
    pub fn poll(&mut self) -> Option<Result<EditorEvent, EditorError>> {
        let result = match self.dispatcher.poll()? {
            Ok(Completion::Metadata(metadata)) => Ok(self.finish_metadata(metadata)),
            Ok(Completion::Transformed {
                action,
                buffer,
                metadata,
            }) => self.finish_transform(action, buffer, metadata),
            Err(e) => {
                // A failed load leaves the current session in place
                self.pending_load = None;
                Err(self.fail(e.into()))
            }
        };
        if result.is_ok() {
            self.last_error = None;
        }
        Some(result)
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            tool: self.state.tool,
            crop: self.state.params.crop,
            resize: self.state.params.resize.map(|t| t.spec),
            adjust: self.state.params.adjust,
            processing: self.is_processing(),
            controls_enabled: self.controls_enabled(),
            last_error: self.last_error.clone(),
            session: self.session.as_ref().map(ImageSession::summary),
        }
    }

    // ---- Internals -----------------------------------------------------

    fn ensure_ready(&self) -> Result<(), EditorError> {
        match self.dispatcher.state() {
            DispatchState::Ready => Ok(()),
            DispatchState::Pending(action) => Err(EditorError::Processing(action)),
        }
    }

    fn current_session(&self) -> Result<&ImageSession, EditorError> {
        self.session.as_ref().ok_or(EditorError::NoImage)
    }

    fn require_tool(&self, expected: Tool) -> Result<(), EditorError> {
        if self.state.tool == expected {
            Ok(())
        } else {
            Err(StateError::WrongTool {
                expected,
                active: self.state.tool,
            }
            .into())
        }
    }

    /// Run a state transition; on error the current state is kept.
    fn transition(
        &mut self,
        f: impl FnOnce(EditorState) -> Result<EditorState, StateError>,
    ) -> Result<(), EditorError> {
        self.state = f(self.state.clone())?;
        Ok(())
    }

    fn flush_resize_input(&mut self) -> Result<(), EditorError> {
        match self.debouncer.flush() {
            Some((changed, raw)) => self.apply_resize_input(changed, raw),
            None => Ok(()),
        }
    }

    fn apply_resize_input(&mut self, changed: Dimension, raw: f64) -> Result<(), EditorError> {
        self.transition(|s| s.with_resize(|t| t.with_dimension(changed, raw)))
    }

    fn send(&mut self, operation: Operation, buffer: ImageBuffer) -> Result<(), EditorError> {
        match self.dispatcher.send(EngineRequest::new(operation, buffer)) {
            Ok(()) => {
                self.last_error = None;
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    fn fail(&mut self, error: EditorError) -> EditorError {
        self.last_error = Some(error.to_string());
        error
    }

    fn next_preview(&mut self) -> PreviewId {
        self.last_preview = self.last_preview.next();
        self.last_preview
    }

    fn finish_metadata(&mut self, metadata: ImageMetadata) -> EditorEvent {
        match self.pending_load.take() {
            Some(load) => {
                log::info!(
                    "loaded {}: {}x{} {}",
                    load.file_name,
                    metadata.width,
                    metadata.height,
                    metadata.format
                );
                let preview = self.next_preview();
                let released = self.session.take().map(|s| s.preview());
                self.session = Some(ImageSession::new(
                    load.file_name,
                    load.buffer,
                    metadata,
                    preview,
                ));
                // Tool parameters belong to the previous image
                self.state = EditorState::new();
                self.gesture = None;
                self.debouncer.clear();
                EditorEvent::Loaded { preview, released }
            }
            None => {
                self.session = self.session.take().map(|s| s.with_metadata(metadata));
                EditorEvent::MetadataRefreshed
            }
        }
    }

    fn finish_transform(
        &mut self,
        action: Action,
        buffer: ImageBuffer,
        metadata: ImageMetadata,
    ) -> Result<EditorEvent, EditorError> {
        let Some(session) = self.session.take() else {
            log::warn!("{} completed with no session; dropping output", action);
            return Err(EditorError::NoImage);
        };
        let preview = self.next_preview();
        let (session, released) = session.replace(buffer, metadata, preview);
        log::info!(
            "{} applied: {}x{} ({} bytes)",
            action,
            session.metadata().width,
            session.metadata().height,
            session.byte_size()
        );
        self.session = Some(session);
        Ok(EditorEvent::ImageReplaced {
            action,
            preview,
            released,
        })
    }
}
