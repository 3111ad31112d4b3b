//! The loaded image and its lifecycle.
//!
//! An [`ImageSession`] is created when a file finishes loading and is
//! replaced wholesale after every successful transform. Buffer, byte size and
//! metadata always change together.

use serde::Serialize;
use thiserror::Error;

use crate::metadata::ImageMetadata;
use crate::protocol::ImageBuffer;

/// Rejections raised before anything is sent to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// The file is empty.
    #[error("File is empty")]
    Empty,

    /// The browser reported a non-image MIME type.
    #[error("Not an image file: {0}")]
    NotAnImage(String),

    /// The bytes do not start with a known image signature.
    #[error("Unrecognized image format")]
    UnrecognizedFormat,
}

/// Reject files that cannot be images.
///
/// `mime` is the type reported by the browser, if any; an empty string is
/// treated as unknown. The content must also sniff as a known format.
pub fn validate_upload(mime: Option<&str>, bytes: &[u8]) -> Result<image::ImageFormat, InputError> {
    if let Some(mime) = mime.filter(|m| !m.is_empty()) {
        if !mime.starts_with("image/") {
            return Err(InputError::NotAnImage(mime.to_string()));
        }
    }
    if bytes.is_empty() {
        return Err(InputError::Empty);
    }
    image::guess_format(bytes).map_err(|_| InputError::UnrecognizedFormat)
}

/// Handle to a rendered preview (e.g. an object URL held by the view).
///
/// Each session value gets a fresh id; the view releases the id a replaced
/// session reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PreviewId(pub u64);

impl PreviewId {
    pub fn next(self) -> Self {
        PreviewId(self.0 + 1)
    }
}

/// The current image: exclusively owns its buffer.
#[derive(Debug)]
pub struct ImageSession {
    file_name: String,
    buffer: ImageBuffer,
    metadata: ImageMetadata,
    preview: PreviewId,
}

impl ImageSession {
    pub fn new(
        file_name: impl Into<String>,
        buffer: ImageBuffer,
        metadata: ImageMetadata,
        preview: PreviewId,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            buffer,
            metadata,
            preview,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn buffer(&self) -> &ImageBuffer {
        &self.buffer
    }

    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    /// Size of the encoded buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn preview(&self) -> PreviewId {
        self.preview
    }

    /// Natural pixel dimensions of the current image.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.metadata.width, self.metadata.height)
    }

    /// Copy of the buffer for transfer to the engine; the session keeps its own.
    pub fn checkout(&self) -> ImageBuffer {
        self.buffer.duplicate()
    }

    /// The session that follows a successful transform.
    ///
    /// Returns the new session and the preview that should be released.
    pub fn replace(
        self,
        buffer: ImageBuffer,
        metadata: ImageMetadata,
        preview: PreviewId,
    ) -> (ImageSession, PreviewId) {
        let released = self.preview;
        let next = ImageSession {
            file_name: self.file_name,
            buffer,
            metadata,
            preview,
        };
        (next, released)
    }

    /// Same buffer with freshly read metadata.
    pub fn with_metadata(self, metadata: ImageMetadata) -> ImageSession {
        ImageSession { metadata, ..self }
    }

    /// Serializable view of the session for the UI.
    pub fn summary(&self) -> SessionSummary {
        let (oriented_width, oriented_height) = self.metadata.oriented_dimensions();
        SessionSummary {
            file_name: self.file_name.clone(),
            byte_size: self.byte_size(),
            preview: self.preview,
            oriented_width,
            oriented_height,
            metadata: self.metadata.clone(),
        }
    }
}

/// What the view needs to render file information.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub file_name: String,
    pub byte_size: usize,
    pub preview: PreviewId,
    /// Dimensions once EXIF orientation is applied, for laying out the
    /// preview.
    pub oriented_width: u32,
    pub oriented_height: u32,
    pub metadata: ImageMetadata,
}
