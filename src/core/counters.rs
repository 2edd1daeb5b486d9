//! Raw per-interface byte counters.
//!
//! A [`CounterSource`] returns one consistent snapshot of the cumulative
//! received/transmitted counters of every interface the kernel knows about.
//! Records that cannot be read are left out of the snapshot; they never fail
//! the whole read.

use std::collections::BTreeMap;
use std::ops::AddAssign;
use std::path::PathBuf;

use crate::config;
use crate::error::AppError;

/// Received/transmitted byte pair.
///
/// Holds either a cumulative kernel reading or an accumulated daily delta,
/// depending on where it is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteCounterPair {
    pub received_bytes: u64,
    pub transmitted_bytes: u64,
}

impl ByteCounterPair {
    pub const ZERO: Self = Self {
        received_bytes: 0,
        transmitted_bytes: 0,
    };

    pub fn new(received_bytes: u64, transmitted_bytes: u64) -> Self {
        Self {
            received_bytes,
            transmitted_bytes,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.received_bytes == 0 && self.transmitted_bytes == 0
    }

    pub fn total(&self) -> u64 {
        self.received_bytes.saturating_add(self.transmitted_bytes)
    }

    /// Truncating conversion to whole megabytes, `(received, transmitted)`.
    pub fn to_megabytes(&self) -> (u64, u64) {
        (
            bytes_to_megabytes(self.received_bytes),
            bytes_to_megabytes(self.transmitted_bytes),
        )
    }
}

impl AddAssign for ByteCounterPair {
    fn add_assign(&mut self, rhs: Self) {
        self.received_bytes = self.received_bytes.saturating_add(rhs.received_bytes);
        self.transmitted_bytes = self.transmitted_bytes.saturating_add(rhs.transmitted_bytes);
    }
}

pub fn bytes_to_megabytes(bytes: u64) -> u64 {
    bytes / config::BYTES_PER_MEGABYTE
}

pub fn bytes_to_gigabytes(bytes: u64) -> u64 {
    bytes / config::BYTES_PER_GIGABYTE
}

/// Interface name → cumulative counters, ordered by name.
pub type CounterSnapshot = BTreeMap<String, ByteCounterPair>;

/// Source of cumulative kernel counters.
pub trait CounterSource {
    fn fetch_current_counters(&mut self) -> Result<CounterSnapshot, AppError>;
}

/// Reads `/proc/net/dev` in a single pass.
pub struct ProcNetDevSource {
    path: PathBuf,
}

impl ProcNetDevSource {
    pub fn new() -> Self {
        Self::with_path(config::PROC_NET_DEV)
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcNetDevSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for ProcNetDevSource {
    fn fetch_current_counters(&mut self) -> Result<CounterSnapshot, AppError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| AppError::io(&self.path, e))?;
        Ok(parse_proc_net_dev(&text))
    }
}

/// Parse the text of `/proc/net/dev`.
///
/// ```text
/// Inter-|   Receive                            |  Transmit
///  face |bytes    packets errs drop fifo frame compressed multicast|bytes ...
///   eth0: 2776770   11307    0    0    0     0          0         0  2776770 ...
/// ```
///
/// The first two lines are headers. Received bytes is the first field after the
/// colon and transmitted bytes the ninth; anything shorter or non-numeric is skipped.
pub fn parse_proc_net_dev(text: &str) -> CounterSnapshot {
    let mut snapshot = CounterSnapshot::new();

    for line in text.lines().skip(2) {
        let Some((name, fields)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        let fields: Vec<&str> = fields.split_whitespace().collect();
        if fields.len() < 9 {
            continue;
        }

        if let (Ok(rx), Ok(tx)) = (fields[0].parse::<u64>(), fields[8].parse::<u64>()) {
            snapshot.insert(name.to_string(), ByteCounterPair::new(rx, tx));
        }
    }

    snapshot
}

/// Portable source built on `sysinfo`, used where `/proc/net/dev` does not exist.
pub struct SysinfoSource;

impl CounterSource for SysinfoSource {
    fn fetch_current_counters(&mut self) -> Result<CounterSnapshot, AppError> {
        let networks = sysinfo::Networks::new_with_refreshed_list();
        Ok(networks
            .list()
            .iter()
            .map(|(name, data)| {
                (
                    name.clone(),
                    ByteCounterPair::new(data.total_received(), data.total_transmitted()),
                )
            })
            .collect())
    }
}

/// The counter source for the current platform.
pub fn default_source() -> Box<dyn CounterSource + Send> {
    if cfg!(target_os = "linux") {
        Box::new(ProcNetDevSource::new())
    } else {
        Box::new(SysinfoSource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 2776770   11307    0    0    0     0          0         0  2776770   11307    0    0    0     0       0          0
  eth0:123456789 98765    0    0    0     0          0         0 987654321   54321    0    0    0     0       0          0
wlp3s0: 5000 10 0 0 0 0 0 0 7000 12 0 0 0 0 0 0
";

    #[test]
    fn test_parse_proc_net_dev_reads_rx_and_tx() {
        let snap = parse_proc_net_dev(SAMPLE);
        assert_eq!(snap.len(), 3);
        assert_eq!(snap["lo"], ByteCounterPair::new(2776770, 2776770));
        assert_eq!(snap["wlp3s0"], ByteCounterPair::new(5000, 7000));
    }

    #[test]
    fn test_parse_proc_net_dev_handles_value_glued_to_colon() {
        let snap = parse_proc_net_dev(SAMPLE);
        assert_eq!(snap["eth0"], ByteCounterPair::new(123456789, 987654321));
    }

    #[test]
    fn test_parse_proc_net_dev_skips_headers_and_bad_rows() {
        let text = "\
header one
header two
  eth0: 100 1 0 0 0 0 0 0 200 2 0 0 0 0 0 0
  short: 1 2 3
  junk: abc 1 0 0 0 0 0 0 200 2 0 0 0 0 0 0
no colon here
";
        let snap = parse_proc_net_dev(text);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap["eth0"], ByteCounterPair::new(100, 200));
    }

    #[test]
    fn test_parse_proc_net_dev_empty_input() {
        assert!(parse_proc_net_dev("").is_empty());
    }

    #[test]
    fn test_proc_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev");
        std::fs::write(&path, SAMPLE).unwrap();

        let mut source = ProcNetDevSource::with_path(&path);
        let snap = source.fetch_current_counters().unwrap();
        assert_eq!(snap.len(), 3);
    }

    #[test]
    fn test_proc_source_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ProcNetDevSource::with_path(dir.path().join("absent"));
        let err = source.fetch_current_counters().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_megabyte_conversion_truncates() {
        assert_eq!(bytes_to_megabytes(1_048_575), 0);
        assert_eq!(bytes_to_megabytes(1_048_576), 1);
        assert_eq!(bytes_to_megabytes(3 * 1_048_576 + 1), 3);
        assert_eq!(bytes_to_gigabytes(1_073_741_824 * 2 - 1), 1);
    }

    #[test]
    fn test_pair_add_assign_and_total() {
        let mut pair = ByteCounterPair::new(10, 20);
        pair += ByteCounterPair::new(1, 2);
        assert_eq!(pair, ByteCounterPair::new(11, 22));
        assert_eq!(pair.total(), 33);
        assert!(!pair.is_zero());
        assert!(ByteCounterPair::ZERO.is_zero());
    }
}
