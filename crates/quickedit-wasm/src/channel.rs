//! Controller side of the worker boundary.
//!
//! [`WorkerChannel`] owns the engine worker. Incoming messages are pushed
//! into a shared queue by the `onmessage` / `onerror` handlers and drained by
//! the editor through [`EngineChannel::try_recv`].

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use js_sys::{Array, Object};
use quickedit_core::dispatch::{EngineChannel, TransportError};
use quickedit_core::{EngineRequest, EngineResponse};
use wasm_bindgen::prelude::*;
use web_sys::{ErrorEvent, MessageEvent, Worker, WorkerOptions, WorkerType};

use crate::message;

type Inbox = Rc<RefCell<VecDeque<Result<EngineResponse, TransportError>>>>;

fn transport_error(context: &str, value: &JsValue) -> TransportError {
    TransportError(format!("{}: {}", context, message::describe_js_error(value)))
}

/// Engine channel backed by a module Web Worker.
pub struct WorkerChannel {
    worker: Worker,
    inbox: Inbox,
    /// Set once the worker has posted its ready signal
    ready: Rc<Cell<bool>>,
    /// A request posted before the worker was ready
    queued: Option<(Object, Array)>,
    _onmessage: Closure<dyn Fn(MessageEvent)>,
    _onerror: Closure<dyn Fn(ErrorEvent)>,
}

impl WorkerChannel {
    /// Spawn the engine worker from `script_url`.
    ///
    /// The script must initialize the WASM module and call
    /// `start_engine_worker()`.
    pub fn spawn(script_url: &str) -> Result<Self, TransportError> {
        let options = WorkerOptions::new();
        options.set_type(WorkerType::Module);

        let worker = Worker::new_with_options(script_url, &options)
            .map_err(|e| transport_error("Failed to create worker", &e))?;

        let inbox: Inbox = Rc::new(RefCell::new(VecDeque::new()));
        let ready = Rc::new(Cell::new(false));

        let inbox_clone = Rc::clone(&inbox);
        let ready_clone = Rc::clone(&ready);
        let onmessage = Closure::<dyn Fn(MessageEvent)>::new(move |event: MessageEvent| {
            let data = event.data();
            if message::is_ready_signal(&data) {
                ready_clone.set(true);
                log::info!("Engine worker ready");
                return;
            }
            inbox_clone
                .borrow_mut()
                .push_back(message::decode_response(&data));
        });

        let inbox_clone = Rc::clone(&inbox);
        let onerror = Closure::<dyn Fn(ErrorEvent)>::new(move |event: ErrorEvent| {
            log::error!("Engine worker error: {}", event.message());
            inbox_clone
                .borrow_mut()
                .push_back(Err(TransportError(event.message())));
        });

        worker.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        worker.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        log::info!("Engine worker spawned, waiting for ready signal...");

        Ok(Self {
            worker,
            inbox,
            ready,
            queued: None,
            _onmessage: onmessage,
            _onerror: onerror,
        })
    }

    fn send_message(&self, msg: &Object, transfer: &Array) -> Result<(), TransportError> {
        self.worker
            .post_message_with_transfer(msg, transfer)
            .map_err(|e| transport_error("Failed to post to worker", &e))
    }

    /// Send the request held back before the worker became ready.
    fn flush_queue(&mut self) -> Result<(), TransportError> {
        if !self.ready.get() {
            return Ok(());
        }
        match self.queued.take() {
            Some((msg, transfer)) => {
                log::debug!("Worker ready, sending queued request");
                self.send_message(&msg, &transfer)
            }
            None => Ok(()),
        }
    }
}

impl EngineChannel for WorkerChannel {
    fn post(&mut self, request: EngineRequest) -> Result<(), TransportError> {
        let action = request.action();
        let (msg, transfer) = message::encode_request(request)
            .map_err(|e| transport_error("Failed to encode request", &e))?;

        if !self.ready.get() {
            log::debug!("Worker not ready, queueing {} request", action);
            self.queued = Some((msg, transfer));
            return Ok(());
        }
        self.send_message(&msg, &transfer)
    }

    fn try_recv(&mut self) -> Option<Result<EngineResponse, TransportError>> {
        if let Err(e) = self.flush_queue() {
            return Some(Err(e));
        }
        self.inbox.borrow_mut().pop_front()
    }
}

impl Drop for WorkerChannel {
    fn drop(&mut self) {
        self.worker.terminate();
    }
}
