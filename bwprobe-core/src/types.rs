//! Core types for the bandwidth probe library
//!
//! This module defines the types that flow between the classifier, the probe
//! engine and the telemetry logger. The library is single-threaded per node
//! and keeps no history - every `ProbeResult` is produced and consumed within
//! one tick.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Result type for probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// A single raw input event as delivered by the external input subsystem
///
/// Events arrive once per tick as an ordered batch. Batch order matters:
/// trigger assignment is last-write-wins across the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// Event name (e.g. "Head_Tracker", "Wand_Joystick_X")
    pub name: String,
    /// Optional scalar payload (joystick axis deflection)
    pub scalar: Option<f64>,
}

impl RawEvent {
    /// Create an event with no payload
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scalar: None,
        }
    }

    /// Create an event carrying a scalar payload
    pub fn with_scalar(name: impl Into<String>, scalar: f64) -> Self {
        Self {
            name: name.into(),
            scalar: Some(scalar),
        }
    }
}

/// The classified intent for the current tick
///
/// Replaces the three independently-settable load flags of the original
/// benchmark with a single value: whichever rule fires last in batch order
/// wins, and the consumer clears the trigger after acting on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Trigger {
    /// Nothing pending this tick
    #[default]
    None,
    /// Emit a bare event marker line
    EventMarker,
    /// Timed read of a 1/divisions slice of the target file
    PartialRead,
    /// Timed read of the entire target file
    FullRead,
}

/// Which kind of read a probe performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeKind {
    /// One per-node slice of the file (models a cache-partition access)
    Partial,
    /// The whole file from offset 0 (models a cold access)
    Full,
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeKind::Partial => write!(f, "partial"),
            ProbeKind::Full => write!(f, "full"),
        }
    }
}

/// Outcome of one timed read
///
/// `bytes_read` and `size_mb` reflect bytes actually moved, not bytes
/// requested, so short reads near end-of-file keep the bandwidth figures
/// honest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Partial or full read
    pub kind: ProbeKind,
    /// The file that was probed
    pub file_path: PathBuf,
    /// Bytes the probe asked for
    pub bytes_requested: u64,
    /// Bytes the read call actually returned
    pub bytes_read: u64,
    /// `bytes_read` in mebibytes
    pub size_mb: f64,
    /// Time spent strictly in seek+read (open/close excluded)
    pub elapsed: Duration,
    /// False when the target file could not be opened
    pub succeeded: bool,
}

impl ProbeResult {
    /// Throughput in MB/s, or None if the read took no measurable time
    pub fn throughput_mb_s(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            Some(self.size_mb / secs)
        } else {
            None
        }
    }
}

/// Errors that can occur in the probe library
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Malformed hostname {hostname:?}: no numeric node index at offset {offset}")]
    MalformedHostname { hostname: String, offset: usize },

    #[error("Failed to open {path:?}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Partial read out of bounds: offset {offset} + chunk {chunk} exceeds file size {size}")]
    OutOfBounds { offset: u64, chunk: u64, size: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render a byte count in mebibytes the way the original log fields were
/// written: six significant digits, trailing zeros trimmed
///
/// `1048576` bytes renders as "1", `104857` as "0.0999994".
pub fn format_size_mb(size_mb: f64) -> String {
    if size_mb == 0.0 {
        return "0".to_string();
    }
    let magnitude = size_mb.abs().log10().floor() as i32;
    let decimals = (5 - magnitude).clamp(0, 17) as usize;
    let mut s = format!("{:.*}", decimals, size_mb);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

/// Bytes per mebibyte, the divisor behind every sizeMB field
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_mb_whole() {
        assert_eq!(format_size_mb(1.0), "1");
        assert_eq!(format_size_mb(10.0), "10");
        assert_eq!(format_size_mb(0.0), "0");
    }

    #[test]
    fn test_format_size_mb_fractional() {
        assert_eq!(format_size_mb(0.1), "0.1");
        assert_eq!(format_size_mb(0.5), "0.5");
        // floor(10485760 / 100) = 104857 bytes -> just under 0.1 MB
        assert_eq!(format_size_mb(104857.0 / BYTES_PER_MB), "0.0999994");
    }

    #[test]
    fn test_throughput() {
        let result = ProbeResult {
            kind: ProbeKind::Full,
            file_path: PathBuf::from("/data/blob.bin"),
            bytes_requested: 10 * 1024 * 1024,
            bytes_read: 10 * 1024 * 1024,
            size_mb: 10.0,
            elapsed: Duration::from_millis(500),
            succeeded: true,
        };
        let mb_s = result.throughput_mb_s().unwrap();
        assert!((mb_s - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_trigger_default() {
        assert_eq!(Trigger::default(), Trigger::None);
    }
}
