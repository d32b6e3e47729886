use axum::response::sse::Event;
use project_automator::{run_with, Config, Fetcher, ProgressSink, RunRequest};
use tokio::sync::mpsc::UnboundedSender;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const WAITING_LINE: &str = "Waiting for a free worker...";

pub fn error_line(message: &str) -> String {
    format!("[ERROR] {}", message)
}

pub fn done_line(code: i32) -> String {
    format!("[DONE] Process finished with code {}", code)
}

/// One SSE event per line; carriage returns cannot travel in `data:` fields.
pub fn event_for(line: String) -> Event {
    Event::default().data(line.replace('\r', ""))
}

/// Forwards progress lines into a response stream.
///
/// Sends after the client disconnected are dropped; the job keeps running
/// so its checkout is still cleaned up.
pub struct ChannelSink {
    tx: UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self { tx }
    }

    pub fn error(&self, message: &str) {
        self.emit(&error_line(message));
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, line: &str) {
        let _ = self.tx.send(line.to_string());
    }
}

/// Runs one organize job to completion and returns its exit code.
pub fn run_job(
    request: &RunRequest,
    config: &Config,
    fetcher: &dyn Fetcher,
    tx: &UnboundedSender<String>,
) -> i32 {
    let sink = ChannelSink::new(tx.clone());

    match run_with(request, config, fetcher, &sink) {
        Ok(result) => {
            tracing::info!(
                source = %request.source,
                scanned = result.files_scanned,
                copied = result.files_copied,
                "organize finished"
            );
            EXIT_SUCCESS
        }
        Err(err) => {
            tracing::warn!(source = %request.source, error = %err, "organize failed");
            sink.error(&err.to_string());
            EXIT_FAILURE
        }
    }
}
