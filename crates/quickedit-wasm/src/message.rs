//! Wire format of engine messages.
//!
//! ## Request (controller → worker)
//! ```json
//! { "action": "crop", "params": { "x": 0, "y": 0, "width": 10, "height": 10 }, "buffer": ArrayBuffer }
//! ```
//! `params` is omitted for `metadata`; for `rotate` it is `"left"` or `"right"`.
//!
//! ## Response (worker → controller)
//! Success:
//! ```json
//! { "metadata": { "format": "Png", "width": 10, ... }, "outputBuffer": ArrayBuffer }
//! ```
//! Error:
//! ```json
//! { "error": "crop failed: ..." }
//! ```
//!
//! ## Ready Signal (worker → controller)
//! ```json
//! { "type": "ready" }
//! ```
//!
//! Image bytes always travel as an `ArrayBuffer` listed in the transfer list,
//! so the sending side loses access to them.

use js_sys::{Array, ArrayBuffer, Object, Reflect, Uint8Array};
use quickedit_core::adjust::EngineAdjustParams;
use quickedit_core::dispatch::TransportError;
use quickedit_core::protocol::ParseNameError;
use quickedit_core::{
    Action, EngineRequest, EngineResponse, ImageBuffer, ImageMetadata, Operation, PixelRect,
    ResizeFilter, ResizeSpec, RotateDirection,
};
use serde::Deserialize;
use wasm_bindgen::JsValue;

const READY: &str = "ready";

/// Resize parameters as sent by JavaScript; the filter is a free-form name.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResize {
    width: u32,
    height: u32,
    #[serde(default)]
    filter: String,
    #[serde(default)]
    maintain_aspect_ratio: bool,
}

/// Parse a filter name, falling back to Lanczos3 for anything unknown.
pub fn lenient_filter(name: &str) -> ResizeFilter {
    name.parse().unwrap_or_else(|e| {
        log::warn!("{}; using {}", e, ResizeFilter::default());
        ResizeFilter::default()
    })
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), JsValue> {
    Reflect::set(target, &key.into(), value).map(|_| ())
}

/// Field value, treating `undefined` and `null` as absent.
fn get(source: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(source, &key.into())
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

/// Move bytes into a fresh JS `ArrayBuffer` for transfer.
fn into_array_buffer(buffer: ImageBuffer) -> ArrayBuffer {
    Uint8Array::from(buffer.into_bytes().as_slice()).buffer()
}

/// Copy bytes out of an `ArrayBuffer` or typed array.
fn bytes_of(value: &JsValue) -> Vec<u8> {
    Uint8Array::new(value).to_vec()
}

fn params_to_js(operation: &Operation) -> Result<JsValue, serde_wasm_bindgen::Error> {
    match operation {
        Operation::Metadata => Ok(JsValue::UNDEFINED),
        Operation::Crop(region) => serde_wasm_bindgen::to_value(region),
        Operation::Resize(spec) => serde_wasm_bindgen::to_value(spec),
        Operation::Rotate(direction) => serde_wasm_bindgen::to_value(direction),
        Operation::Adjust(params) => serde_wasm_bindgen::to_value(params),
    }
}

fn operation_from_js(action: Action, params: JsValue) -> Result<Operation, String> {
    let invalid = |e: &dyn std::fmt::Display| format!("{} failed: Invalid parameters: {}", action, e);

    let operation = match action {
        Action::Metadata => Operation::Metadata,
        Action::Crop => Operation::Crop(
            serde_wasm_bindgen::from_value::<PixelRect>(params).map_err(|e| invalid(&e))?,
        ),
        Action::Resize => {
            let wire: WireResize = serde_wasm_bindgen::from_value(params).map_err(|e| invalid(&e))?;
            Operation::Resize(ResizeSpec {
                width: wire.width,
                height: wire.height,
                filter: lenient_filter(&wire.filter),
                maintain_aspect_ratio: wire.maintain_aspect_ratio,
            })
        }
        Action::Rotate => {
            let direction = params.as_string().unwrap_or_default();
            Operation::Rotate(
                direction
                    .parse::<RotateDirection>()
                    .map_err(|e| format!("{} failed: {}", action, e))?,
            )
        }
        Action::Adjust => Operation::Adjust(
            serde_wasm_bindgen::from_value::<EngineAdjustParams>(params)
                .map_err(|e| invalid(&e))?,
        ),
    };
    Ok(operation)
}

/// Build the request message and its transfer list, consuming the buffer.
pub fn encode_request(request: EngineRequest) -> Result<(Object, Array), JsValue> {
    let msg = Object::new();
    set(&msg, "action", &request.action().as_str().into())?;

    let params = params_to_js(&request.operation)?;
    if !params.is_undefined() {
        set(&msg, "params", &params)?;
    }

    let buffer = into_array_buffer(request.buffer);
    set(&msg, "buffer", &buffer)?;

    Ok((msg, Array::of1(&buffer)))
}

/// Parse a request message. Errors are complete failure messages.
pub fn decode_request(data: &JsValue) -> Result<EngineRequest, String> {
    let action: Action = get(data, "action")
        .and_then(|v| v.as_string())
        .ok_or_else(|| "Missing 'action' field in request".to_string())?
        .parse()
        .map_err(|e: ParseNameError| e.to_string())?;

    let params = get(data, "params").unwrap_or(JsValue::UNDEFINED);
    let operation = operation_from_js(action, params)?;

    let buffer = get(data, "buffer")
        .ok_or_else(|| format!("{} failed: Missing 'buffer' field in request", action))?;

    Ok(EngineRequest::new(operation, ImageBuffer::new(bytes_of(&buffer))))
}

/// Build the response message and its transfer list.
pub fn encode_response(response: EngineResponse) -> Result<(Object, Array), JsValue> {
    let msg = Object::new();
    let transfer = Array::new();

    match response {
        EngineResponse::Success { metadata, output } => {
            set(&msg, "metadata", &serde_wasm_bindgen::to_value(&metadata)?)?;
            if let Some(output) = output {
                let buffer = into_array_buffer(output);
                set(&msg, "outputBuffer", &buffer)?;
                transfer.push(&buffer);
            }
        }
        EngineResponse::Failure { error } => {
            set(&msg, "error", &error.into())?;
        }
    }

    Ok((msg, transfer))
}

/// Parse a response message. A message that is neither a success nor a
/// failure is a transport error.
pub fn decode_response(data: &JsValue) -> Result<EngineResponse, TransportError> {
    if let Some(error) = get(data, "error") {
        let error = error
            .as_string()
            .ok_or_else(|| TransportError("Response 'error' is not a string".to_string()))?;
        return Ok(EngineResponse::Failure { error });
    }

    let metadata = get(data, "metadata")
        .ok_or_else(|| TransportError("Response is missing 'metadata'".to_string()))?;
    let metadata: ImageMetadata = serde_wasm_bindgen::from_value(metadata)
        .map_err(|e| TransportError(format!("Malformed metadata: {}", e)))?;

    let output = get(data, "outputBuffer").map(|b| ImageBuffer::new(bytes_of(&b)));

    Ok(EngineResponse::Success { metadata, output })
}

pub fn ready_signal() -> Result<Object, JsValue> {
    let msg = Object::new();
    set(&msg, "type", &READY.into())?;
    Ok(msg)
}

pub fn is_ready_signal(data: &JsValue) -> bool {
    get(data, "type").and_then(|v| v.as_string()).as_deref() == Some(READY)
}

/// Readable text for a thrown JS value.
pub fn describe_js_error(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
