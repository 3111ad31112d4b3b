//! Reference image-processing engine.
//!
//! The engine is a pure function of a request: decode the transferred buffer,
//! run one operation, encode the result in the source format and describe
//! the new buffer. Every failure comes back as
//! [`EngineResponse::Failure`] prefixed with the action name; the engine
//! never panics on bad input.
//!
//! In the browser it runs inside a worker. [`LocalChannel`] runs it on the
//! calling thread instead, which is what native hosts and tests use.

mod adjustments;
mod codec;
mod inspect;
mod transform;

use std::collections::VecDeque;

use thiserror::Error;

pub use adjustments::apply_adjustments;
pub use codec::{decode, encode, Decoded};
pub use inspect::{describe, read_exif};

use crate::dispatch::{EngineChannel, TransportError};
use crate::geometry::PixelRect;
use crate::metadata::ImageMetadata;
use crate::protocol::{EngineRequest, EngineResponse, ImageBuffer, Operation};

/// Why the engine could not complete an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Failed to identify format: {0}")]
    Identify(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error(
        "Crop region ({},{} {}x{}) exceeds image bounds ({width}x{height})",
        .region.x,
        .region.y,
        .region.width,
        .region.height
    )]
    CropOutOfBounds {
        region: PixelRect,
        width: u32,
        height: u32,
    },

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Something that answers engine requests.
pub trait Engine {
    /// Process one request. Always produces exactly one response.
    fn process(&self, request: EngineRequest) -> EngineResponse;
}

/// In-process engine backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalEngine;

impl LocalEngine {
    pub fn new() -> Self {
        Self
    }

    fn run(
        &self,
        operation: Operation,
        bytes: &[u8],
    ) -> Result<(ImageMetadata, Option<ImageBuffer>), EngineError> {
        let decoded = codec::decode(bytes)?;

        let output = match operation {
            Operation::Metadata => {
                return Ok((inspect::describe(&decoded.image, decoded.format, bytes), None));
            }
            Operation::Crop(region) => transform::crop(&decoded.image, region)?,
            Operation::Resize(spec) => transform::resize(&decoded.image, &spec)?,
            Operation::Rotate(direction) => transform::rotate(&decoded.image, direction),
            Operation::Adjust(params) => adjustments::apply_adjustments(&decoded.image, &params),
        };

        let encoded = codec::encode(&output, decoded.format)?;
        // Metadata always describes the bytes being returned
        let metadata = inspect::describe(&output, decoded.format, &encoded);
        Ok((metadata, Some(ImageBuffer::new(encoded))))
    }
}

impl Engine for LocalEngine {
    fn process(&self, request: EngineRequest) -> EngineResponse {
        let action = request.action();
        let bytes = request.buffer.into_bytes();
        log::debug!("engine: {} on {} bytes", action, bytes.len());

        match self.run(request.operation, &bytes) {
            Ok((metadata, output)) => EngineResponse::Success { metadata, output },
            Err(e) => {
                log::warn!("engine: {} failed: {}", action, e);
                EngineResponse::failure(action, e)
            }
        }
    }
}

/// Channel that runs an engine synchronously on `post`.
///
/// Responses queue up until polled, so the controller sees the same
/// post-then-poll sequence as with a worker.
#[derive(Debug, Default)]
pub struct LocalChannel<E> {
    engine: E,
    inbox: VecDeque<EngineResponse>,
}

impl<E: Engine> LocalChannel<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            inbox: VecDeque::new(),
        }
    }
}

impl<E: Engine> EngineChannel for LocalChannel<E> {
    fn post(&mut self, request: EngineRequest) -> Result<(), TransportError> {
        let response = self.engine.process(request);
        self.inbox.push_back(response);
        Ok(())
    }

    fn try_recv(&mut self) -> Option<Result<EngineResponse, TransportError>> {
        self.inbox.pop_front().map(Ok)
    }
}
