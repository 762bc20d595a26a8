#![allow(dead_code)]

use brrtdispatch::server::{Request, Response};
use brrtdispatch::{Dispatcher, Schema};
use http::Method;
use serde_json::{json, Value};
use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Run a future to completion on a fresh current-thread runtime.
pub fn block_on<F: Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(fut)
}

pub fn dispatch(dispatcher: &Dispatcher, request: Request) -> Response {
    block_on(dispatcher.dispatch(request))
}

pub fn get(dispatcher: &Dispatcher, target: &str) -> Response {
    dispatch(dispatcher, Request::builder(Method::GET, target).build())
}

pub fn body_of(response: &Response) -> Value {
    response
        .body_json()
        .unwrap_or_else(|| panic!("non-JSON body: {:?}", String::from_utf8_lossy(response.body())))
}

/// `{"name": string, "qty": int >= 0, "tags": [string]}` with `name` required.
pub fn item_schema() -> Schema {
    Schema::new(
        "Item",
        json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string", "minLength": 1 },
                "qty": { "type": "integer", "minimum": 0 },
                "tags": { "type": "array", "items": { "type": "string" } }
            }
        }),
    )
}

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

pub struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter(Arc::clone(&self.buf))
    }
}

impl LogCapture {
    /// Install a thread-local subscriber writing into the returned capture.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(capture.clone())
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}
