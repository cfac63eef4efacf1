//! Bandwidth Probe CLI Application
//!
//! This is the command-line interface for the distributed I/O bandwidth
//! probe. It uses the bwprobe-core library and adds:
//! - An event-script replay driver (stands in for the live input subsystem)
//! - A one-shot probe mode for checking a storage path by hand
//! - An offline analyzer for the per-host event logs
//! - TOML configuration loading

use anyhow::{bail, Context, Result};
use bwprobe_core::{Controller, NodeIdentity, ProbeConfig, ReadPolicy};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

mod analyze;
mod config;
mod oneshot;
mod script;

/// Bandwidth Probe - event-triggered I/O bandwidth measurement per node
#[derive(Parser, Debug)]
#[command(name = "bwprobe-cli")]
#[command(about = "Replay event scripts against a target file and log timed reads", long_about = None)]
#[command(version)]
struct Args {
    /// Target data file the probes read
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Event script to replay ("-" for stdin)
    #[arg(short, long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Hostname override (default: $HOSTNAME)
    #[arg(long, value_name = "NAME")]
    hostname: Option<String>,

    /// Display tag override (default: $DISPLAY)
    #[arg(long, value_name = "TAG")]
    display: Option<String>,

    /// Directory for the per-host event log
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Number of slices for partial reads
    #[arg(long, value_name = "COUNT")]
    divisions: Option<u64>,

    /// Fail partial reads that land past end-of-file instead of clamping
    #[arg(long)]
    strict: bool,

    /// Print probe results as JSON lines
    #[arg(long)]
    json: bool,

    /// Run one timed read of slice PART and exit
    #[arg(long, value_name = "PART")]
    oneshot: Option<u32>,

    /// Analyze evlog file(s) instead of probing (can be repeated)
    #[arg(long, value_name = "FILE")]
    analyze: Vec<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Bandwidth Probe CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using probe library v{}", bwprobe_core::VERSION);

    if !args.analyze.is_empty() {
        // Offline analysis of existing logs
        let report = analyze::analyze_files(&args.analyze)?;
        print!("{}", analyze::render_report(&report));
    } else if let Some(part) = args.oneshot {
        // One-shot timed read
        let file = args
            .file
            .clone()
            .context("--oneshot requires --file <target>")?;
        oneshot::run_oneshot(&file, args.divisions.unwrap_or(100), part)?;
    } else if args.file.is_some() || args.config.is_some() {
        // Replay mode - drive the controller from an event script
        replay_mode(&args)?;
    } else {
        // No arguments - show help
        println!("Bandwidth Probe - No input specified");
        println!("\nQuick Start:");
        println!("  bwprobe-cli --file /data/blob.bin --script session.evs");
        println!("  bwprobe-cli --file /data/blob.bin --oneshot 3");
        println!("  bwprobe-cli --analyze /tmp/cave001-evlog.txt");
        println!("\nFor configured runs:");
        println!("  bwprobe-cli --config config.toml");
        println!("\nUse --help for more options");
    }

    Ok(())
}

/// Replay mode - resolve identity, build the controller, feed it the script
fn replay_mode(args: &Args) -> Result<()> {
    // Config file first, CLI flags override
    let app_config = match &args.config {
        Some(path) => Some(config::load_config(path)?),
        None => None,
    };

    let target = args
        .file
        .clone()
        .or_else(|| app_config.as_ref().map(|c| c.input.file.clone()))
        .context("No target file: pass --file or set [input].file in the config")?;
    let script_path = args
        .script
        .clone()
        .or_else(|| app_config.as_ref().and_then(|c| c.input.script.clone()));

    let mut probe_config = app_config
        .as_ref()
        .map(|c| c.probe.clone())
        .unwrap_or_else(ProbeConfig::new);
    if let Some(divisions) = args.divisions {
        probe_config = probe_config.with_divisions(divisions);
    }
    if args.strict {
        probe_config = probe_config.with_read_policy(ReadPolicy::Strict);
    }
    if let Some(dir) = &args.log_dir {
        probe_config = probe_config.with_log_dir(dir);
    }
    let json = args.json || app_config.as_ref().is_some_and(|c| c.output.json);

    let identity = resolve_identity(args, app_config.as_ref())?;
    log::info!(
        "Node {} (index {}) probing {:?}",
        identity.host_tag(),
        identity.index,
        target
    );

    let mut controller = Controller::new(identity, probe_config, &target);
    controller.mark_event("preinit");

    // Collaborator setup: open the script source
    let batches = match &script_path {
        Some(path) if path.to_str() == Some("-") => script::parse_script(io::stdin().lock())?,
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open script file: {:?}", path))?;
            script::parse_script(BufReader::new(file))?
        }
        None => bail!("No event script: pass --script or set [input].script in the config"),
    };
    controller.mark_event("postinit");

    log::info!("Replaying {} tick(s)", batches.len());
    for batch in &batches {
        controller.on_events(batch);
        let result = controller.on_tick();
        if json {
            if let Some(result) = result {
                println!("{}", serde_json::to_string(&result)?);
            }
        }
    }

    Ok(())
}

/// Identity from flags, then config, then environment
fn resolve_identity(args: &Args, app_config: Option<&config::AppConfig>) -> Result<NodeIdentity> {
    let hostname = args
        .hostname
        .clone()
        .or_else(|| app_config.and_then(|c| c.node.hostname.clone()))
        .or_else(|| std::env::var("HOSTNAME").ok());
    let display = args
        .display
        .clone()
        .or_else(|| app_config.and_then(|c| c.node.display.clone()))
        .or_else(|| std::env::var("DISPLAY").ok())
        .unwrap_or_default();

    let hostname = hostname.context("No hostname: pass --hostname or set $HOSTNAME")?;
    Ok(NodeIdentity::resolve(hostname, display)?)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
