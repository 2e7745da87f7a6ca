//! Per-request progress lines.
//!
//! A generation request narrates what it is doing (submission, every poll
//! tick, retries) into a [`LogSink`]. The buffered sink collects lines for a
//! single JSON response; the stream sink forwards them, in emission order,
//! to a consumer reading a chunked text response.

use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub const RESULT_PREFIX: &str = "RESULT:";
pub const ERROR_PREFIX: &str = "ERROR:";

pub trait LogSink: Send + Sync {
    fn emit(&self, line: String);
}

/// Mirrors a progress line into the process log and hands it to the sink.
pub fn progress(sink: &dyn LogSink, line: impl Into<String>) {
    let line = line.into();
    log::info!("{}", line);
    sink.emit(line);
}

#[derive(Debug, Default)]
pub struct BufferedSink {
    lines: Mutex<Vec<String>>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines.into_inner().unwrap_or_default()
    }
}

impl LogSink for BufferedSink {
    fn emit(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

pub struct StreamSink {
    tx: mpsc::UnboundedSender<String>,
}

impl StreamSink {
    /// Returns the sink together with the stream of newline-terminated lines.
    pub fn channel() -> (Self, UnboundedReceiverStream<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UnboundedReceiverStream::new(rx))
    }

    pub fn finish_ok(&self, output_url: &str) {
        self.emit(format!("{}{}", RESULT_PREFIX, output_url));
    }

    pub fn finish_err(&self, message: &str) {
        // A terminal line must stay on one line.
        let flat = message.replace(&['\r', '\n'][..], " ");
        self.emit(format!("{}{}", ERROR_PREFIX, flat));
    }
}

impl LogSink for StreamSink {
    fn emit(&self, line: String) {
        // Consumer hung up; nothing left to tell.
        if self.tx.send(format!("{}\n", line)).is_err() {
            log::debug!("Stream consumer dropped, discarding line");
        }
    }
}
