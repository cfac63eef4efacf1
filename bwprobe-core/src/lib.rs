//! Bandwidth Probe Library
//!
//! A library for distributed, event-triggered I/O bandwidth probing: a set
//! of identical node processes, each identified by a hostname-derived index,
//! reacts to a stream of input events to decide when and what portion of a
//! shared file to read, times the read, and appends a telemetry record to a
//! per-host log.
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on the probe cycle:
//! - Resolves a stable node identity from the process environment
//! - Classifies per-tick event batches into at most one pending trigger
//! - Performs timed partial (per-node slice) or full reads of a target file
//! - Appends semicolon-delimited telemetry records to an append-only log
//!
//! The library does NOT:
//! - Deliver events (an external collaborator supplies an ordered batch per
//!   tick and invokes the tick callback)
//! - Transport telemetry over the network (each node writes its own log)
//! - Coordinate or synchronize clocks across nodes
//!
//! The replay driver, one-shot probe and log analyzer live in the
//! application layer (bwprobe-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use bwprobe_core::{Controller, NodeIdentity, ProbeConfig, RawEvent};
//!
//! let identity = NodeIdentity::resolve("cave003", ":0.0").unwrap();
//! let config = ProbeConfig::new();
//! let mut controller = Controller::new(identity, config, "/data/blob.bin");
//!
//! // Per tick: the collaborator delivers events, then ticks the controller
//! controller.on_events(&[RawEvent::with_scalar("Wand_Joystick_X", 0.8)]);
//! if let Some(result) = controller.on_tick() {
//!     println!("read {} bytes in {:?}", result.bytes_read, result.elapsed);
//! }
//! ```

// Public modules
pub mod classifier;
pub mod config;
pub mod controller;
pub mod identity;
pub mod probe;
pub mod telemetry;
pub mod types;

// Re-export main types for convenience
pub use classifier::{ClassifierState, EventClassifier, JOYSTICK_THRESHOLD};
pub use config::{ProbeConfig, ReadPolicy};
pub use controller::Controller;
pub use identity::NodeIdentity;
pub use probe::BandwidthProbe;
pub use telemetry::{DiagnosticSink, MemorySink, StdoutSink, TelemetryLogger};
pub use types::{
    format_size_mb, ProbeError, ProbeKind, ProbeResult, RawEvent, Result, Trigger,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: identity resolution and default config
        let identity = NodeIdentity::resolve("cave001", "").unwrap();
        assert_eq!(identity.index, 1);
        assert_eq!(ProbeConfig::new().divisions, 100);
    }
}
