//! Engine side of the worker boundary.
//!
//! The worker script loads this module and calls [`start_engine_worker`].
//! Each request is processed to completion before the next message event
//! is handled, so the worker never holds more than one image.

use quickedit_core::{Engine, EngineResponse, LocalEngine};
use wasm_bindgen::prelude::*;
use web_sys::{DedicatedWorkerGlobalScope, MessageEvent};

use crate::message;

/// Install the message handler and tell the controller the engine is ready.
///
/// # Example (JavaScript, worker script)
///
/// ```javascript
/// import init, { start_engine_worker } from './quickedit_wasm.js';
///
/// await init();
/// start_engine_worker();
/// ```
#[wasm_bindgen]
pub fn start_engine_worker() -> Result<(), JsValue> {
    let global: DedicatedWorkerGlobalScope = js_sys::global().dyn_into()?;

    let onmessage = Closure::<dyn Fn(MessageEvent)>::new(move |event: MessageEvent| {
        handle_message(event);
    });
    global.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget(); // Lives as long as the worker

    let ready = message::ready_signal()?;
    global.post_message(&ready)?;
    log::info!("[Worker] Engine ready");
    Ok(())
}

fn handle_message(event: MessageEvent) {
    let response = match message::decode_request(&event.data()) {
        Ok(request) => {
            log::debug!("[Worker] {} ({} bytes)", request.action(), request.buffer.len());
            LocalEngine::new().process(request)
        }
        Err(error) => {
            log::error!("[Worker] Rejected request: {}", error);
            EngineResponse::Failure { error }
        }
    };

    if let Err(e) = post_response(response) {
        let error = format!("Failed to send response: {}", message::describe_js_error(&e));
        log::error!("[Worker] {}", error);
        // Exactly one reply per request
        if let Err(e) = post_response(EngineResponse::Failure { error }) {
            log::error!("[Worker] Failed to send error: {:?}", e);
        }
    }
}

fn post_response(response: EngineResponse) -> Result<(), JsValue> {
    let global: DedicatedWorkerGlobalScope = js_sys::global().dyn_into()?;
    let (msg, transfer) = message::encode_response(response)?;
    global.post_message_with_transfer(&msg, &transfer)
}
