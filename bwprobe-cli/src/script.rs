//! Event script parsing
//!
//! The replay driver stands in for the live input subsystem: it reads a
//! plain-text script describing per-tick event batches and feeds them to the
//! controller in order.
//!
//! Script format, one event per line:
//!
//! ```text
//! # hold the joystick, then a tracker update
//! Wand_Joystick_X 0.8
//! Head_Tracker
//! tick
//! Wand_Joystick_X 0.0
//! tick
//! ```
//!
//! A `tick` line (or a blank line) ends the current batch and fires one tick,
//! including ticks with no events. A trailing batch without a terminator is
//! fired as a final tick.

use anyhow::{bail, Context, Result};
use bwprobe_core::RawEvent;
use std::io::BufRead;

/// Parse an event script into per-tick batches
pub fn parse_script(reader: impl BufRead) -> Result<Vec<Vec<RawEvent>>> {
    let mut batches = Vec::new();
    let mut current: Vec<RawEvent> = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read script line {}", lineno + 1))?;
        let trimmed = line.trim();

        if trimmed.starts_with('#') {
            continue;
        }
        if trimmed.is_empty() || trimmed == "tick" {
            batches.push(std::mem::take(&mut current));
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let name = parts.next().expect("non-empty line has a first token");
        let event = match parts.next() {
            Some(scalar) => {
                let value: f64 = scalar.parse().with_context(|| {
                    format!(
                        "Invalid scalar {:?} for event {:?} on script line {}",
                        scalar,
                        name,
                        lineno + 1
                    )
                })?;
                RawEvent::with_scalar(name, value)
            }
            None => RawEvent::named(name),
        };
        if let Some(extra) = parts.next() {
            bail!(
                "Unexpected token {:?} on script line {}",
                extra,
                lineno + 1
            );
        }
        current.push(event);
    }

    if !current.is_empty() {
        batches.push(current);
    }

    Ok(batches)
}
