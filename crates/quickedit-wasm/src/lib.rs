//! QuickEdit WASM - WebAssembly bindings for QuickEdit
//!
//! This crate runs on both sides of the worker boundary:
//!
//! - `editor` - [`JsEditor`], the controller handle used by the page
//! - `channel` - the worker-backed engine channel the editor talks through
//! - `worker` - [`start_engine_worker`], the engine loop inside the worker
//! - `message` - the request / response wire format shared by both sides
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsEditor } from '@quickedit/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const editor = new JsEditor('./engine-worker.js', undefined);
//! editor.load_file(file.name, file.type, new Uint8Array(await file.arrayBuffer()));
//! ```

use wasm_bindgen::prelude::*;

mod channel;
mod editor;
pub mod message;
mod worker;

pub use channel::WorkerChannel;
pub use editor::JsEditor;
pub use worker::start_engine_worker;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A logger may already be installed when the module is re-initialized
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Parse a log level name as accepted by [`set_log_level`].
pub fn parse_level(name: &str) -> Option<log::LevelFilter> {
    match name.to_ascii_lowercase().as_str() {
        "off" => Some(log::LevelFilter::Off),
        "error" => Some(log::LevelFilter::Error),
        "warn" => Some(log::LevelFilter::Warn),
        "info" => Some(log::LevelFilter::Info),
        "debug" => Some(log::LevelFilter::Debug),
        "trace" => Some(log::LevelFilter::Trace),
        _ => None,
    }
}

/// Change the console log level (`"off"`, `"error"` ... `"trace"`).
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter = parse_level(level)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown log level: {}", level)))?;
    log::set_max_level(filter);
    Ok(())
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Some(log::LevelFilter::Debug));
        assert_eq!(parse_level("WARN"), Some(log::LevelFilter::Warn));
        assert_eq!(parse_level("off"), Some(log::LevelFilter::Off));
        assert_eq!(parse_level("verbose"), None);
    }
}
