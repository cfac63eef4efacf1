//! Per-tick orchestration
//!
//! The controller is the seam between the external collaborator (the render
//! or replay loop that delivers events and calls back once per tick) and the
//! probe machinery. Per tick it consumes the pending trigger and executes at
//! most one branch, in strict precedence order: event marker, then partial
//! read, then full read.

use crate::classifier::EventClassifier;
use crate::config::ProbeConfig;
use crate::identity::NodeIdentity;
use crate::probe::BandwidthProbe;
use crate::telemetry::{DiagnosticSink, TelemetryLogger};
use crate::types::{format_size_mb, ProbeKind, ProbeResult, RawEvent, Trigger};
use std::path::PathBuf;

/// Event type field written for bare markers
const EVENT_TYPE_MARKER: &str = "event";

/// Orchestrates classifier, probe and logger for one node process
pub struct Controller {
    identity: NodeIdentity,
    classifier: EventClassifier,
    probe: BandwidthProbe,
    logger: TelemetryLogger,
    target: PathBuf,
    target_display: String,
}

impl Controller {
    /// Create a controller for one node
    ///
    /// Identity is resolved once at startup and owned here for the process
    /// lifetime. The logger writes under the configured log directory.
    pub fn new(identity: NodeIdentity, config: ProbeConfig, target: impl Into<PathBuf>) -> Self {
        let target = target.into();
        let logger = TelemetryLogger::new(&identity, &config.log_dir);
        Self {
            identity,
            classifier: EventClassifier::new(),
            probe: BandwidthProbe::new(config),
            logger,
            target_display: target.display().to_string(),
            target,
        }
    }

    /// Replace the console sink on the underlying logger
    pub fn with_sink(mut self, sink: Box<dyn DiagnosticSink>) -> Self {
        self.logger = self.logger.with_sink(sink);
        self
    }

    /// The identity this controller runs under
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Record a bare event marker immediately, outside the tick cycle
    ///
    /// Used for the preinit/postinit pair emitted around collaborator
    /// startup.
    pub fn mark_event(&mut self, name: &str) {
        self.logger.record(EVENT_TYPE_MARKER, name, None);
    }

    /// Feed one tick's ordered event batch to the classifier
    pub fn on_events(&mut self, batch: &[RawEvent]) {
        self.classifier.process_batch(batch, self.logger.sink_mut());
    }

    /// Execute at most one pending action for this tick
    ///
    /// Returns the probe result when a read ran, `None` for markers and
    /// idle ticks. The pre-load marker is always written before the open is
    /// attempted, so a missing target file leaves exactly one line behind.
    pub fn on_tick(&mut self) -> Option<ProbeResult> {
        match self.classifier.take_trigger() {
            (Trigger::EventMarker, name) => {
                let name = name.unwrap_or_default();
                self.logger.record(EVENT_TYPE_MARKER, &name, None);
                None
            }
            (Trigger::PartialRead, _) => {
                self.fire_probe(ProbeKind::Partial, "cached-preload", "cached-postload")
            }
            (Trigger::FullRead, _) => {
                self.fire_probe(ProbeKind::Full, "noncached-preload", "noncached-postload")
            }
            (Trigger::None, _) => None,
        }
    }

    fn fire_probe(
        &mut self,
        kind: ProbeKind,
        preload_type: &str,
        postload_type: &str,
    ) -> Option<ProbeResult> {
        self.logger.record(preload_type, &self.target_display, None);

        match self.probe.run(kind, &self.target, self.identity.index) {
            Ok(result) if result.succeeded => {
                let size = format_size_mb(result.size_mb);
                self.logger
                    .record(postload_type, &self.target_display, Some(&size));
                Some(result)
            }
            Ok(result) => {
                // Open failure: the preload marker already went out, the
                // postload record is dropped.
                Some(result)
            }
            Err(e) => {
                log::warn!("{} probe failed: {}", kind, e);
                self.logger.sink_mut().line(&format!("probe failed: {}", e));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemorySink;
    use std::fs;
    use std::io::Write;
    use std::path::Path;

    fn setup(target_len: usize) -> (tempfile::TempDir, Controller, MemorySink) {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.bin");
        let data = vec![0xA5u8; target_len];
        fs::File::create(&target).unwrap().write_all(&data).unwrap();

        let identity = NodeIdentity::resolve("cave002", ":0.0").unwrap();
        let config = ProbeConfig::new().with_log_dir(dir.path());
        let sink = MemorySink::new();
        let controller =
            Controller::new(identity, config, &target).with_sink(Box::new(sink.clone()));
        (dir, controller, sink)
    }

    fn log_lines(dir: &Path) -> Vec<String> {
        let contents = fs::read_to_string(dir.join("cave002-evlog.txt")).unwrap();
        contents.lines().map(String::from).collect()
    }

    fn field(line: &str, idx: usize) -> String {
        line.split(';').nth(idx).unwrap().to_string()
    }

    #[test]
    fn test_marker_tick() {
        let (dir, mut controller, _sink) = setup(10_000);
        controller.on_events(&[RawEvent::named("Head_Tracker")]);
        let result = controller.on_tick();
        assert!(result.is_none());

        let lines = log_lines(dir.path());
        assert_eq!(lines.len(), 1);
        assert_eq!(field(&lines[0], 4), "event");
        assert_eq!(field(&lines[0], 5), "Head_Tracker");
        assert_eq!(lines[0].split(';').count(), 6);
    }

    #[test]
    fn test_partial_tick_writes_pre_and_post() {
        let (dir, mut controller, _sink) = setup(10_000);
        controller.on_events(&[RawEvent::with_scalar("Wand_Joystick_X", 0.8)]);
        let result = controller.on_tick().unwrap();
        assert!(result.succeeded);
        assert_eq!(result.kind, ProbeKind::Partial);
        // floor(10000/100) = 100 bytes at offset 200 for index 2
        assert_eq!(result.bytes_read, 100);

        let lines = log_lines(dir.path());
        assert_eq!(lines.len(), 2);
        assert_eq!(field(&lines[0], 4), "cached-preload");
        assert_eq!(field(&lines[1], 4), "cached-postload");
        // both carry the target path in the name field
        assert_eq!(field(&lines[0], 5), field(&lines[1], 5));
        assert_eq!(lines[0].split(';').count(), 6);
        assert_eq!(lines[1].split(';').count(), 7);
        assert!(lines[1].ends_with("MB"));
    }

    #[test]
    fn test_full_tick_event_types() {
        let (dir, mut controller, _sink) = setup(4_096);
        controller.on_events(&[RawEvent::with_scalar("Wand_Joystick_Y", -0.7)]);
        let result = controller.on_tick().unwrap();
        assert_eq!(result.kind, ProbeKind::Full);
        assert_eq!(result.bytes_read, 4_096);

        let lines = log_lines(dir.path());
        assert_eq!(field(&lines[0], 4), "noncached-preload");
        assert_eq!(field(&lines[1], 4), "noncached-postload");
    }

    #[test]
    fn test_idle_tick_writes_nothing() {
        let (dir, mut controller, _sink) = setup(1_000);
        controller.on_events(&[RawEvent::named("SynchedTime")]);
        assert!(controller.on_tick().is_none());
        assert!(!dir.path().join("cave002-evlog.txt").exists());
    }

    #[test]
    fn test_one_branch_per_tick() {
        let (dir, mut controller, _sink) = setup(10_000);
        // The axis event lands after the marker, so last-write-wins leaves
        // PartialRead pending and only the probe branch fires this tick.
        controller.on_events(&[
            RawEvent::named("Head_Tracker"),
            RawEvent::with_scalar("Wand_Joystick_X", 0.9),
        ]);
        controller.on_tick();
        let lines = log_lines(dir.path());
        assert_eq!(lines.len(), 2);
        assert_eq!(field(&lines[0], 4), "cached-preload");
        assert_eq!(field(&lines[1], 4), "cached-postload");
    }

    #[test]
    fn test_missing_target_preload_only() {
        let dir = tempfile::tempdir().unwrap();
        let identity = NodeIdentity::resolve("cave002", ":0.0").unwrap();
        let config = ProbeConfig::new().with_log_dir(dir.path());
        let mut controller = Controller::new(
            identity,
            config,
            dir.path().join("missing.bin"),
        )
        .with_sink(Box::new(MemorySink::new()));

        controller.on_events(&[RawEvent::with_scalar("Wand_Joystick_Y", 0.9)]);
        let result = controller.on_tick().unwrap();
        assert!(!result.succeeded);

        let lines = log_lines(dir.path());
        assert_eq!(lines.len(), 1);
        assert_eq!(field(&lines[0], 4), "noncached-preload");
    }

    #[test]
    fn test_startup_markers() {
        let (dir, mut controller, _sink) = setup(1_000);
        controller.mark_event("preinit");
        controller.mark_event("postinit");
        let lines = log_lines(dir.path());
        assert_eq!(field(&lines[0], 5), "preinit");
        assert_eq!(field(&lines[1], 5), "postinit");
    }
}
