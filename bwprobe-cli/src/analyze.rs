//! Offline evlog analysis
//!
//! Parses one or more per-host event logs (optionally concatenated), pairs
//! preload/postload and preinit/postinit records per host tag, and reports
//! per-node and overall load times and throughput. This is the consumer of
//! the durable telemetry format, so it only relies on the documented
//! semicolon-delimited fields.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// One parsed evlog record
#[derive(Debug, Clone, PartialEq)]
struct LogLine {
    /// Epoch time in microseconds (seconds and micros fields combined)
    time_us: i64,
    /// Host tag (hostname plus display), the per-node grouping key
    host: String,
    /// Record type: "event", "cached-preload", ...
    event_type: String,
    /// Marker name or file path
    name: String,
    /// Size reported by postload records, in MB
    size_mb: Option<f64>,
}

fn parse_line(line: &str) -> Option<LogLine> {
    let fields: Vec<&str> = line.split(';').collect();
    if fields.len() < 6 {
        return None;
    }
    let secs: i64 = fields[1].parse().ok()?;
    let micros: i64 = fields[2].parse().ok()?;
    let size_mb = match fields.get(6) {
        Some(raw) => Some(raw.strip_suffix("MB")?.parse().ok()?),
        None => None,
    };
    Some(LogLine {
        time_us: secs * 1_000_000 + micros,
        host: fields[3].to_string(),
        event_type: fields[4].to_string(),
        name: fields[5].to_string(),
        size_mb,
    })
}

/// Load-time samples for one probe category, grouped per host
#[derive(Debug, Default)]
struct LoadSamples {
    /// Seconds per completed load, per host
    per_host: BTreeMap<String, Vec<f64>>,
    /// Size of the last completed load, in MB
    size_mb: f64,
}

impl LoadSamples {
    fn record(&mut self, host: &str, seconds: f64, size_mb: f64) {
        self.per_host
            .entry(host.to_string())
            .or_default()
            .push(seconds);
        self.size_mb = size_mb;
    }
}

/// Aggregated results of an analysis run
#[derive(Debug, Default)]
pub struct AnalysisReport {
    /// Init duration per host, in seconds
    init: BTreeMap<String, Vec<f64>>,
    /// Partial (cached) load samples
    cached: LoadSamples,
    /// Full (non-cached) load samples
    noncached: LoadSamples,
    /// Head tracker inter-arrival times per host, in seconds
    tracking: BTreeMap<String, Vec<f64>>,
    /// Lines that did not parse
    pub malformed: usize,
}

/// Analyze one or more evlog files
pub fn analyze_files(paths: &[impl AsRef<Path>]) -> Result<AnalysisReport> {
    let mut report = AnalysisReport::default();
    // Pending preload/preinit timestamps and last tracker sighting, per host
    let mut pending_init: BTreeMap<String, i64> = BTreeMap::new();
    let mut pending_cached: BTreeMap<String, i64> = BTreeMap::new();
    let mut pending_noncached: BTreeMap<String, i64> = BTreeMap::new();
    let mut last_tracker: BTreeMap<String, i64> = BTreeMap::new();

    for path in paths {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read log file: {:?}", path))?;
        log::info!("Analyzing {:?}", path);

        for raw in contents.lines() {
            let Some(line) = parse_line(raw) else {
                log::warn!("Skipping malformed log line: {}", raw);
                report.malformed += 1;
                continue;
            };

            match (line.event_type.as_str(), line.name.as_str()) {
                ("event", "preinit") => {
                    pending_init.insert(line.host, line.time_us);
                }
                ("event", "postinit") => {
                    if let Some(start) = pending_init.remove(&line.host) {
                        report
                            .init
                            .entry(line.host)
                            .or_default()
                            .push((line.time_us - start) as f64 * 1e-6);
                    }
                }
                ("event", "Head_Tracker") => {
                    if let Some(prev) = last_tracker.insert(line.host.clone(), line.time_us) {
                        report
                            .tracking
                            .entry(line.host)
                            .or_default()
                            .push((line.time_us - prev) as f64 * 1e-6);
                    }
                }
                ("cached-preload", _) => {
                    pending_cached.insert(line.host, line.time_us);
                }
                ("cached-postload", _) => {
                    if let (Some(start), Some(size)) =
                        (pending_cached.remove(&line.host), line.size_mb)
                    {
                        let secs = (line.time_us - start) as f64 * 1e-6;
                        report.cached.record(&line.host, secs, size);
                    }
                }
                ("noncached-preload", _) => {
                    pending_noncached.insert(line.host, line.time_us);
                }
                ("noncached-postload", _) => {
                    if let (Some(start), Some(size)) =
                        (pending_noncached.remove(&line.host), line.size_mb)
                    {
                        let secs = (line.time_us - start) as f64 * 1e-6;
                        report.noncached.record(&line.host, secs, size);
                    }
                }
                _ => {}
            }
        }
    }

    Ok(report)
}

/// Render the report as the analysis text consumed downstream
pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();

    render_duration_section(&mut out, "Program init time per node", &report.init, "s");
    render_load_section(&mut out, "Cached (partial) load", &report.cached);
    render_load_section(&mut out, "Non-cached (full) load", &report.noncached);
    render_duration_section(
        &mut out,
        "Head tracking interval per node",
        &report.tracking,
        "s",
    );

    if report.malformed > 0 {
        let _ = writeln!(out, "Skipped {} malformed line(s)", report.malformed);
    }
    out
}

fn render_duration_section(
    out: &mut String,
    title: &str,
    per_host: &BTreeMap<String, Vec<f64>>,
    unit: &str,
) {
    if per_host.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}:", title);
    let mut all = Vec::new();
    for (host, samples) in per_host {
        let m = mean(samples);
        all.push(m);
        let _ = writeln!(out, "  {}: {:.6}{}", host, m, unit);
    }
    let _ = writeln!(
        out,
        "  overall mean {:.6}{u}, min {:.6}{u}, max {:.6}{u}, std {:.6}{u}\n",
        mean(&all),
        min(&all),
        max(&all),
        std_dev(&all),
        u = unit,
    );
}

fn render_load_section(out: &mut String, title: &str, samples: &LoadSamples) {
    if samples.per_host.is_empty() {
        return;
    }
    let _ = writeln!(out, "{} ({} MB per read):", title, samples.size_mb);
    let mut speeds = Vec::new();
    for (host, times) in &samples.per_host {
        let avg = mean(times);
        let speed = if avg > 0.0 { samples.size_mb / avg } else { 0.0 };
        speeds.push(speed);
        let _ = writeln!(
            out,
            "  {}: {:.6}s = {:.3} MB/s over {} read(s)",
            host,
            avg,
            speed,
            times.len()
        );
    }
    let _ = writeln!(
        out,
        "  overall mean {:.3} MB/s, min {:.3} MB/s, max {:.3} MB/s, std {:.3} MB/s\n",
        mean(&speeds),
        min(&speeds),
        max(&speeds),
        std_dev(&speeds),
    );
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
