//! Timed read engine
//!
//! Performs the measured work: a partial read of one per-node slice of the
//! target file, or a full read of the whole file. Reads are synchronous and
//! block the tick on purpose - the read latency is the measured quantity,
//! and there is no timeout: a hang in storage is a hang in the node's tick
//! loop, which reflects real I/O conditions.
//!
//! Timing covers seek+read only. Open and close happen outside the timed
//! window, and the read buffer is transient: allocated per probe, dropped as
//! soon as the clock stops.

use crate::config::{ProbeConfig, ReadPolicy};
use crate::types::{ProbeError, ProbeKind, ProbeResult, Result, BYTES_PER_MB};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::{Duration, Instant};

/// Runs timed partial and full reads against a target file
#[derive(Debug, Clone)]
pub struct BandwidthProbe {
    config: ProbeConfig,
}

impl BandwidthProbe {
    /// Create a probe with the given configuration
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// The configuration this probe runs with
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run one timed read
    ///
    /// Partial reads request `floor(size / divisions)` bytes at offset
    /// `chunk * node_index`; full reads request the whole file at offset 0.
    /// A target file that cannot be opened is a silent miss: the result
    /// carries `succeeded = false` and no timing. Out-of-bounds partial
    /// offsets follow the configured [`ReadPolicy`]: clamp to the bytes
    /// remaining (default) or fail with [`ProbeError::OutOfBounds`].
    pub fn run(&self, kind: ProbeKind, path: &Path, node_index: u32) -> Result<ProbeResult> {
        let mut file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                log::warn!("Cannot open probe target {:?}: {}", path, e);
                return Ok(ProbeResult {
                    kind,
                    file_path: path.to_path_buf(),
                    bytes_requested: 0,
                    bytes_read: 0,
                    size_mb: 0.0,
                    elapsed: Duration::ZERO,
                    succeeded: false,
                });
            }
        };

        let size = file.metadata()?.len();
        let (offset, chunk) = match kind {
            ProbeKind::Partial => {
                let chunk = size / self.config.divisions;
                (chunk * u64::from(node_index), chunk)
            }
            ProbeKind::Full => (0, size),
        };

        let to_read = if offset.saturating_add(chunk) > size {
            match self.config.read_policy {
                ReadPolicy::Strict => {
                    return Err(ProbeError::OutOfBounds {
                        offset,
                        chunk,
                        size,
                    });
                }
                ReadPolicy::BestEffort => size.saturating_sub(offset),
            }
        } else {
            chunk
        };

        log::debug!(
            "{} probe: {} bytes at offset {} of {:?} ({} bytes total)",
            kind,
            to_read,
            offset,
            path,
            size
        );

        let mut buffer = vec![0u8; to_read as usize];

        let start = Instant::now();
        file.seek(SeekFrom::Start(offset))?;
        let bytes_read = read_into(&mut file, &mut buffer)? as u64;
        let elapsed = start.elapsed();

        drop(buffer);

        Ok(ProbeResult {
            kind,
            file_path: path.to_path_buf(),
            bytes_requested: chunk,
            bytes_read,
            size_mb: bytes_read as f64 / BYTES_PER_MB,
            elapsed,
            succeeded: true,
        })
    }
}

/// Read until the buffer is full or the file ends, returning bytes read
fn read_into(file: &mut File, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buffer.len() {
        let n = file.read(&mut buffer[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_target(len: usize) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.bin");
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&data)
            .unwrap();
        (dir, path)
    }

    #[test]
    fn test_partial_read_slice() {
        let (_dir, path) = write_target(10_000);
        let probe = BandwidthProbe::new(ProbeConfig::new());
        let result = probe.run(ProbeKind::Partial, &path, 3).unwrap();
        assert!(result.succeeded);
        // floor(10000 / 100) = 100 bytes at offset 300
        assert_eq!(result.bytes_requested, 100);
        assert_eq!(result.bytes_read, 100);
        assert!((result.size_mb - 100.0 / BYTES_PER_MB).abs() < 1e-12);
    }

    #[test]
    fn test_partial_offsets_ten_mb_case() {
        // 10 MB file, index 3: chunk 104857 at offset 314571
        let size: u64 = 10_485_760;
        let divisions = 100u64;
        let chunk = size / divisions;
        assert_eq!(chunk, 104_857);
        assert_eq!(chunk * 3, 314_571);
        let size_mb = chunk as f64 / BYTES_PER_MB;
        assert!((size_mb - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_full_read() {
        let (_dir, path) = write_target(4_096);
        let probe = BandwidthProbe::new(ProbeConfig::new());
        let result = probe.run(ProbeKind::Full, &path, 7).unwrap();
        assert!(result.succeeded);
        assert_eq!(result.bytes_requested, 4_096);
        assert_eq!(result.bytes_read, 4_096);
    }

    #[test]
    fn test_best_effort_clamps_past_eof() {
        // 1050 bytes over 100 divisions: chunk 10, index 104 -> offset 1040,
        // only 10 remain; index 105 -> offset 1050, nothing remains
        let (_dir, path) = write_target(1_050);
        let probe = BandwidthProbe::new(ProbeConfig::new());

        let result = probe.run(ProbeKind::Partial, &path, 104).unwrap();
        assert_eq!(result.bytes_requested, 10);
        assert_eq!(result.bytes_read, 10);

        let result = probe.run(ProbeKind::Partial, &path, 105).unwrap();
        assert_eq!(result.bytes_read, 0);
        assert_eq!(result.size_mb, 0.0);
        assert!(result.succeeded);
    }

    #[test]
    fn test_strict_fails_past_eof() {
        let (_dir, path) = write_target(1_050);
        let probe =
            BandwidthProbe::new(ProbeConfig::new().with_read_policy(ReadPolicy::Strict));
        let err = probe.run(ProbeKind::Partial, &path, 105).unwrap_err();
        assert!(matches!(err, ProbeError::OutOfBounds { .. }));
    }

    #[test]
    fn test_tiny_file_zero_chunk() {
        // Smaller than the division count: chunk floors to zero and the
        // probe still reports a (zero) size.
        let (_dir, path) = write_target(99);
        let probe = BandwidthProbe::new(ProbeConfig::new());
        let result = probe.run(ProbeKind::Partial, &path, 5).unwrap();
        assert!(result.succeeded);
        assert_eq!(result.bytes_requested, 0);
        assert_eq!(result.bytes_read, 0);
        assert_eq!(result.size_mb, 0.0);
    }

    #[test]
    fn test_missing_file_is_silent_miss() {
        let probe = BandwidthProbe::new(ProbeConfig::new());
        let result = probe
            .run(ProbeKind::Full, Path::new("/no/such/file.bin"), 0)
            .unwrap();
        assert!(!result.succeeded);
        assert_eq!(result.bytes_read, 0);
    }

    #[test]
    fn test_custom_divisions() {
        let (_dir, path) = write_target(1_000);
        let probe = BandwidthProbe::new(ProbeConfig::new().with_divisions(10));
        let result = probe.run(ProbeKind::Partial, &path, 2).unwrap();
        assert_eq!(result.bytes_requested, 100);
        assert_eq!(result.bytes_read, 100);
    }
}
