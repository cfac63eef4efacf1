//! Minimal embedding of the probe library
//!
//! Drives a controller through a short synthetic session: a tracker marker,
//! a partial read and a full read against the given target file.
//!
//! Usage:
//!   replay_session <target_file> [hostname]

use bwprobe_core::{Controller, NodeIdentity, ProbeConfig, RawEvent};
use std::env;

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let target = match args.next() {
        Some(t) => t,
        None => {
            eprintln!("usage: replay_session <target_file> [hostname]");
            std::process::exit(1);
        }
    };
    let hostname = args.next().unwrap_or_else(|| "cave001".to_string());

    let identity = NodeIdentity::resolve(hostname, ":0.0").expect("hostname with numeric suffix");
    let mut controller = Controller::new(identity, ProbeConfig::new(), target);

    controller.mark_event("preinit");
    controller.mark_event("postinit");

    // Tick 1: head tracker marker
    controller.on_events(&[RawEvent::named("Head_Tracker")]);
    controller.on_tick();

    // Tick 2: joystick X held past the threshold -> partial read
    controller.on_events(&[
        RawEvent::with_scalar("Wand_Joystick_X", 0.8),
        RawEvent::with_scalar("Wand_Joystick_X", 0.0),
    ]);
    if let Some(result) = controller.on_tick() {
        println!(
            "partial: {} bytes in {:?}",
            result.bytes_read, result.elapsed
        );
    }

    // Tick 3: joystick Y -> full read
    controller.on_events(&[
        RawEvent::with_scalar("Wand_Joystick_Y", 0.9),
        RawEvent::with_scalar("Wand_Joystick_Y", 0.0),
    ]);
    if let Some(result) = controller.on_tick() {
        println!("full: {} bytes in {:?}", result.bytes_read, result.elapsed);
    }
}
