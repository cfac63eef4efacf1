//! One-shot probe mode
//!
//! Reads one slice of the target file outside the tick cycle and prints
//! size, elapsed time and throughput. Useful for checking a storage path by
//! hand before a distributed session, with the same division/part arithmetic
//! the per-tick probes use.

use anyhow::{bail, Result};
use bwprobe_core::{format_size_mb, BandwidthProbe, ProbeConfig, ProbeKind};
use std::path::Path;

/// Run a single timed read of slice `part` (of `divisions`) and print the
/// measurement
pub fn run_oneshot(path: &Path, divisions: u64, part: u32) -> Result<()> {
    let config = ProbeConfig::new().with_divisions(divisions);
    let probe = BandwidthProbe::new(config);

    let kind = if divisions == 1 {
        ProbeKind::Full
    } else {
        ProbeKind::Partial
    };
    let result = probe.run(kind, path, part)?;
    if !result.succeeded {
        bail!("Unable to open file: {:?}", path);
    }

    let secs = result.elapsed.as_secs_f64();
    println!(
        "Read {} MB from {:?} (slice {} of {})",
        format_size_mb(result.size_mb),
        path,
        part,
        divisions
    );
    println!("time taken = {:.6}s", secs);
    match result.throughput_mb_s() {
        Some(mb_s) => println!("{} MB/s", format_size_mb(mb_s)),
        None => println!("read too fast to measure"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_oneshot_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&vec![0u8; 10_000])
            .unwrap();
        run_oneshot(&path, 100, 3).unwrap();
        run_oneshot(&path, 1, 0).unwrap();
    }

    #[test]
    fn test_oneshot_missing_file() {
        let err = run_oneshot(Path::new("/no/such/blob.bin"), 100, 0).unwrap_err();
        assert!(err.to_string().contains("Unable to open file"));
    }
}
