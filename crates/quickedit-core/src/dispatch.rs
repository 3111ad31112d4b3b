//! Single-in-flight dispatch to the engine.
//!
//! ```text
//! Ready --send--> Pending(action) --response--> Ready
//!                                 --failure---> Ready (error surfaced)
//! ```
//!
//! Responses carry no correlation id: they are matched to the one pending
//! request. A second send while `Pending` is rejected with
//! [`DispatchError::Busy`] rather than risk misattributing the replies.
//! There is no cancellation or timeout.

use thiserror::Error;

use crate::metadata::ImageMetadata;
use crate::protocol::{Action, EngineRequest, EngineResponse, ImageBuffer};

/// The channel itself failed (worker crashed, message could not be posted).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Engine channel error: {0}")]
pub struct TransportError(pub String);

/// Transport to an engine: posts requests, yields responses when they arrive.
///
/// `try_recv` never blocks; hosts poll it from their event loop.
pub trait EngineChannel {
    /// Hand a request (and ownership of its buffer) to the engine.
    fn post(&mut self, request: EngineRequest) -> Result<(), TransportError>;

    /// Next available response or channel error, if any.
    fn try_recv(&mut self) -> Option<Result<EngineResponse, TransportError>>;
}

impl<C: EngineChannel + ?Sized> EngineChannel for Box<C> {
    fn post(&mut self, request: EngineRequest) -> Result<(), TransportError> {
        (**self).post(request)
    }

    fn try_recv(&mut self) -> Option<Result<EngineResponse, TransportError>> {
        (**self).try_recv()
    }
}

/// Errors from a dispatched action.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// A request is already in flight.
    #[error("A {0} request is already in flight")]
    Busy(Action),

    /// The channel failed; distinct from the engine rejecting the work.
    #[error("{action} failed: {source}")]
    Transport {
        action: Action,
        #[source]
        source: TransportError,
    },

    /// The engine reported a failure; the message names the action.
    #[error("{0}")]
    Engine(String),

    /// A mutating action succeeded without returning an image.
    #[error("{0} response is missing its output buffer")]
    MissingOutput(Action),
}

/// Whether a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Ready,
    Pending(Action),
}

/// A successfully decoded response.
#[derive(Debug)]
pub enum Completion {
    /// Metadata for the buffer that was sent.
    Metadata(ImageMetadata),
    /// A new image with metadata computed from it.
    Transformed {
        action: Action,
        buffer: ImageBuffer,
        metadata: ImageMetadata,
    },
}

/// Owns the engine channel and enforces one request at a time.
pub struct Dispatcher<C> {
    channel: C,
    state: DispatchState,
}

impl<C: EngineChannel> Dispatcher<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            state: DispatchState::Ready,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, DispatchState::Pending(_))
    }

    #[cfg(test)]
    pub(crate) fn channel(&self) -> &C {
        &self.channel
    }

    #[cfg(test)]
    pub(crate) fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Send a request, moving its buffer into the channel.
    ///
    /// On a transport error the dispatcher stays `Ready`.
    pub fn send(&mut self, request: EngineRequest) -> Result<(), DispatchError> {
        if let DispatchState::Pending(action) = self.state {
            return Err(DispatchError::Busy(action));
        }

        let action = request.action();
        log::debug!("dispatching {} ({} bytes)", action, request.buffer.len());

        self.channel.post(request).map_err(|source| {
            log::error!("failed to post {} request: {}", action, source);
            DispatchError::Transport { action, source }
        })?;

        self.state = DispatchState::Pending(action);
        Ok(())
    }

    /// Collect the response to the pending request, if it has arrived.
    ///
    /// Messages that arrive while nothing is pending are logged and dropped.
    pub fn poll(&mut self) -> Option<Result<Completion, DispatchError>> {
        while let Some(message) = self.channel.try_recv() {
            let DispatchState::Pending(action) = self.state else {
                log::warn!("dropping engine message with no request in flight");
                continue;
            };
            self.state = DispatchState::Ready;

            return Some(match message {
                Ok(response) => Self::complete(action, response),
                Err(source) => {
                    log::error!("engine channel failed during {}: {}", action, source);
                    Err(DispatchError::Transport { action, source })
                }
            });
        }
        None
    }

    fn complete(action: Action, response: EngineResponse) -> Result<Completion, DispatchError> {
        match response {
            EngineResponse::Failure { error } => {
                log::warn!("engine failure: {}", error);
                Err(DispatchError::Engine(error))
            }
            EngineResponse::Success { metadata, output } => {
                if !action.produces_output() {
                    return Ok(Completion::Metadata(metadata));
                }
                let buffer = output.ok_or(DispatchError::MissingOutput(action))?;
                log::debug!(
                    "{} completed: {}x{} ({} bytes)",
                    action,
                    metadata.width,
                    metadata.height,
                    buffer.len()
                );
                Ok(Completion::Transformed {
                    action,
                    buffer,
                    metadata,
                })
            }
        }
    }
}
