//! Telemetry logging
//!
//! Each node appends one line per recorded event to its own log file
//! (`<log_dir>/<hostname>-evlog.txt`) and mirrors the same line to a console
//! sink for live observation. The file is append-only: records are never
//! rewritten, and no other process writes the same path, so no locking is
//! needed.
//!
//! Line format, semicolon-delimited:
//!
//! ```text
//! Thu Aug 20 14:55:02 2026;1755701702;123456;cave003:0.0;cached-postload;/data/blob.bin;0.0999994MB
//! ```
//!
//! The trailing size field is present only on postload records. The human
//! timestamp matches the C `asctime` rendering with the newline stripped,
//! which downstream analysis tooling expects.

use crate::identity::NodeIdentity;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Format string producing the asctime-style human timestamp
const HUMAN_TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// A pass-through observability sink for console output
///
/// Every durable record is mirrored here, and the classifier echoes
/// unrecognized event names here. Production can swap in a silent sink
/// without touching classification or logging logic.
pub trait DiagnosticSink {
    /// Emit one line
    fn line(&mut self, line: &str);
}

/// Default sink: writes to standard output
#[derive(Debug, Default)]
pub struct StdoutSink;

impl DiagnosticSink for StdoutSink {
    fn line(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// Sink that collects lines in memory; used by tests and by callers that
/// want to inspect the console stream after the fact
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all lines emitted so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("sink lock poisoned").clone()
    }
}

impl DiagnosticSink for MemorySink {
    fn line(&mut self, line: &str) {
        self.lines
            .lock()
            .expect("sink lock poisoned")
            .push(line.to_string());
    }
}

/// Appends timestamped records to the per-host event log
pub struct TelemetryLogger {
    log_path: PathBuf,
    host_tag: String,
    sink: Box<dyn DiagnosticSink>,
}

impl TelemetryLogger {
    /// Create a logger for the given node, writing to
    /// `<log_dir>/<hostname>-evlog.txt`
    pub fn new(identity: &NodeIdentity, log_dir: &Path) -> Self {
        let log_path = log_dir.join(format!("{}-evlog.txt", identity.hostname));
        Self {
            log_path,
            host_tag: identity.host_tag(),
            sink: Box::new(StdoutSink),
        }
    }

    /// Replace the console sink
    pub fn with_sink(mut self, sink: Box<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Path of the durable log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Mutable access to the console sink, for collaborators that emit
    /// diagnostics through the same stream
    pub fn sink_mut(&mut self) -> &mut dyn DiagnosticSink {
        self.sink.as_mut()
    }

    /// Record one event
    ///
    /// Captures the wall clock once, mirrors the formatted line to the
    /// console sink, then appends it to the log file. A log file that cannot
    /// be opened costs the durable record only: the console stream continues
    /// and the process never crashes here.
    pub fn record(&mut self, event_type: &str, name: &str, size_mb: Option<&str>) {
        let now = Local::now();
        let human = now.format(HUMAN_TIMESTAMP_FORMAT).to_string();
        let epoch = now.timestamp();
        let micros = now.timestamp_subsec_micros();

        let mut line = format!(
            "{};{};{};{};{};{}",
            human, epoch, micros, self.host_tag, event_type, name
        );
        if let Some(size) = size_mb {
            line.push_str(&format!(";{}MB", size));
        }

        // Console mirror happens regardless of file outcome
        self.sink.line(&line);

        match OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.log_path)
        {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", line) {
                    log::warn!("Failed to append to {:?}: {}", self.log_path, e);
                }
            }
            Err(e) => {
                log::warn!("Failed to open {:?} for append: {}", self.log_path, e);
                self.sink
                    .line(&format!("problem with opening the log file: {}", e));
            }
        }
    }
}
