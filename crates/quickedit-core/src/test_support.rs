//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::io::Cursor;

use crate::dispatch::{EngineChannel, TransportError};
use crate::metadata::{ExifSummary, ImageMetadata};
use crate::protocol::{EngineRequest, EngineResponse, ImageBuffer, Operation};

/// Channel that records requests and replays queued responses.
#[derive(Default)]
pub(crate) struct ScriptedChannel {
    /// Operations posted so far, with the byte length of the transferred buffer.
    pub sent: Vec<(Operation, usize)>,
    pub inbox: VecDeque<Result<EngineResponse, TransportError>>,
    /// When set, `post` fails with this message.
    pub fail_post: Option<String>,
}

impl ScriptedChannel {
    pub fn respond(&mut self, response: EngineResponse) {
        self.inbox.push_back(Ok(response));
    }

    pub fn respond_image(&mut self, bytes: Vec<u8>, metadata: ImageMetadata) {
        self.respond(EngineResponse::Success {
            metadata,
            output: Some(ImageBuffer::new(bytes)),
        });
    }

    pub fn fail_transport(&mut self, message: &str) {
        self.inbox.push_back(Err(TransportError(message.to_string())));
    }
}

impl EngineChannel for ScriptedChannel {
    fn post(&mut self, request: EngineRequest) -> Result<(), TransportError> {
        if let Some(message) = &self.fail_post {
            return Err(TransportError(message.clone()));
        }
        self.sent.push((request.operation, request.buffer.len()));
        Ok(())
    }

    fn try_recv(&mut self) -> Option<Result<EngineResponse, TransportError>> {
        self.inbox.pop_front()
    }
}

/// Metadata for a plain RGB PNG of the given size.
pub(crate) fn metadata(width: u32, height: u32) -> ImageMetadata {
    ImageMetadata {
        format: "Png".to_string(),
        width,
        height,
        color_type: "Rgb8".to_string(),
        bits_per_pixel: 24,
        has_alpha: false,
        aspect_ratio: width as f64 / height.max(1) as f64,
        exif: ExifSummary::default(),
    }
}

/// Encode a gradient RGB image in the given format.
pub(crate) fn encoded_image(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("test image should encode");
    bytes
}

/// Encode a gradient RGB PNG.
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded_image(width, height, image::ImageFormat::Png)
}
