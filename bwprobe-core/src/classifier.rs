//! Event classification
//!
//! Reduces each tick's batch of raw input events to updated joystick state
//! and at most one pending [`Trigger`]. Dispatch is table-driven: adding a
//! new recognized event name is a table entry, not new control flow.
//!
//! Trigger assignment is deliberately last-write-wins in batch order. Both
//! the marker rule and the joystick threshold rule assign the pending
//! trigger unconditionally, so the final value for a tick depends on event
//! order within the batch. The pending trigger is sticky: it stays set until
//! the consumer takes it.

use crate::telemetry::DiagnosticSink;
use crate::types::{RawEvent, Trigger};

/// Joystick deflection beyond this magnitude arms a read probe
pub const JOYSTICK_THRESHOLD: f64 = 0.5;

/// What the classifier does with a recognized event name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventAction {
    /// Update the persisted X axis from the event scalar
    AxisX,
    /// Update the persisted Y axis from the event scalar
    AxisY,
    /// Arm an event-marker trigger carrying the event name
    Marker,
    /// Recognized but deliberately ignored (buttons, sync markers)
    Ignore,
}

/// Known event names and their classification actions
///
/// Wand and mouse buttons plus tracker sync markers are recognized so they
/// do not flood the diagnostic stream, but they trigger nothing.
const EVENT_ACTIONS: &[(&str, EventAction)] = &[
    ("Wand_Joystick_X", EventAction::AxisX),
    ("Wand_Joystick_Y", EventAction::AxisY),
    ("Head_Tracker", EventAction::Marker),
    ("Wand_Left_Btn_up", EventAction::Ignore),
    ("Wand_Right_Btn_up", EventAction::Ignore),
    ("B03_up", EventAction::Ignore),
    ("B04_up", EventAction::Ignore),
    ("B05_up", EventAction::Ignore),
    ("B06_up", EventAction::Ignore),
    ("B09_up", EventAction::Ignore),
    ("B10_up", EventAction::Ignore),
    ("B11_up", EventAction::Ignore),
    ("B12_up", EventAction::Ignore),
    ("Wand_Tracker", EventAction::Ignore),
    ("SynchedTime", EventAction::Ignore),
];

fn lookup(name: &str) -> Option<EventAction> {
    if let Some((_, action)) = EVENT_ACTIONS.iter().find(|(n, _)| *n == name) {
        return Some(*action);
    }
    // Per-frame tracker chatter (aimo_13, aimo_14, ...) is ignored wholesale
    if name.contains("aimo") {
        return Some(EventAction::Ignore);
    }
    None
}

/// Continuous classifier state, persisted across ticks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierState {
    /// Last-seen X axis deflection
    pub joystick_x: f64,
    /// Last-seen Y axis deflection
    pub joystick_y: f64,
    /// Pending trigger, sticky until consumed
    pub pending: Trigger,
    /// Name carried by a pending event marker
    pub marker_name: Option<String>,
}

/// Consumes raw event batches and maintains [`ClassifierState`]
#[derive(Debug, Default)]
pub struct EventClassifier {
    state: ClassifierState,
}

impl EventClassifier {
    /// Create a classifier with centered axes and no pending trigger
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, for inspection
    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    /// Process one tick's batch in order
    ///
    /// Unrecognized event names are echoed to the diagnostic sink only;
    /// they never reach the durable log. The joystick threshold rule runs
    /// after every event, so a marker earlier in the batch can be
    /// overwritten by a deflected axis later in the batch and vice versa.
    pub fn process_batch(&mut self, batch: &[RawEvent], sink: &mut dyn DiagnosticSink) {
        for event in batch {
            match lookup(&event.name) {
                Some(EventAction::AxisX) => {
                    if let Some(v) = event.scalar {
                        self.state.joystick_x = v;
                    }
                }
                Some(EventAction::AxisY) => {
                    if let Some(v) = event.scalar {
                        self.state.joystick_y = v;
                    }
                }
                Some(EventAction::Marker) => {
                    self.state.pending = Trigger::EventMarker;
                    self.state.marker_name = Some(event.name.clone());
                }
                Some(EventAction::Ignore) => {}
                None => {
                    log::trace!("Unrecognized event: {}", event.name);
                    sink.line(&event.name);
                }
            }

            if self.state.joystick_x.abs() > JOYSTICK_THRESHOLD {
                self.state.pending = Trigger::PartialRead;
            }
            if self.state.joystick_y.abs() > JOYSTICK_THRESHOLD {
                self.state.pending = Trigger::FullRead;
            }
        }
    }

    /// Take the pending trigger and its marker name, clearing the trigger
    ///
    /// Axis state is untouched: a held joystick re-arms on the next batch.
    pub fn take_trigger(&mut self) -> (Trigger, Option<String>) {
        let trigger = std::mem::take(&mut self.state.pending);
        let name = self.state.marker_name.take();
        (trigger, name)
    }
}
