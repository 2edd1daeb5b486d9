//! History file format.
//!
//! One line per day, ascending date order:
//!
//! ```text
//! <date>: Transmitted: <tx>MB , Received: <rx>MB, Total: <tx+rx>MB
//! ```
//!
//! Values are whole megabytes (bytes / 1_048_576, truncated). Loading reads
//! the date (text before the first colon) and the `Transmitted` and `Received`
//! values; `Total` is derived and ignored. Bad lines are skipped one by one.

use std::fmt::Write as _;
use std::path::Path;

use crate::config::BYTES_PER_MEGABYTE;
use crate::core::{ByteCounterPair, UsageHistory};
use crate::error::AppError;

const TRANSMITTED_MARKER: &str = "Transmitted: ";
const RECEIVED_MARKER: &str = "Received: ";
const UNIT_MARKER: &str = "MB";

/// Why a history line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("no date before ':'")]
    MissingDate,
    #[error("missing {0} field")]
    MissingField(&'static str),
    #[error("{field} value {text:?} is not a whole number")]
    InvalidNumber { field: &'static str, text: String },
    #[error("{0} value too large")]
    Overflow(&'static str),
}

/// Render one day's totals.
pub fn format_line(date: &str, totals: &ByteCounterPair) -> String {
    let (rx_mb, tx_mb) = totals.to_megabytes();
    format!(
        "{date}: Transmitted: {tx_mb}MB , Received: {rx_mb}MB, Total: {}MB",
        rx_mb + tx_mb
    )
}

/// Parse one line back into a date and byte totals.
pub fn parse_line(line: &str) -> Result<(String, ByteCounterPair), LineError> {
    let (date, _) = line.split_once(':').ok_or(LineError::MissingDate)?;
    if date.trim().is_empty() {
        return Err(LineError::MissingDate);
    }

    let transmitted = megabyte_field(line, TRANSMITTED_MARKER, "Transmitted")?;
    let received = megabyte_field(line, RECEIVED_MARKER, "Received")?;

    Ok((date.to_string(), ByteCounterPair::new(received, transmitted)))
}

/// Read the number between `marker` and the next `MB`, returned in bytes.
fn megabyte_field(line: &str, marker: &str, field: &'static str) -> Result<u64, LineError> {
    let start = line.find(marker).ok_or(LineError::MissingField(field))? + marker.len();
    let rest = &line[start..];
    let end = rest.find(UNIT_MARKER).ok_or(LineError::MissingField(field))?;
    let text = rest[..end].trim();

    let megabytes: u64 = text.parse().map_err(|_| LineError::InvalidNumber {
        field,
        text: text.to_string(),
    })?;
    megabytes
        .checked_mul(BYTES_PER_MEGABYTE)
        .ok_or(LineError::Overflow(field))
}

/// Render a whole history file.
pub fn render(history: &UsageHistory) -> String {
    let mut out = String::new();
    for (date, totals) in history {
        let _ = writeln!(out, "{}", format_line(date, totals));
    }
    out
}

/// Parse a whole history file, skipping lines that do not parse.
pub fn parse(text: &str, origin: &Path) -> UsageHistory {
    let mut history = UsageHistory::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok((date, totals)) => history.set(date, totals),
            Err(e) => {
                tracing::warn!("Skipping {}:{}: {e}", origin.display(), idx + 1);
            }
        }
    }
    history
}

/// Rewrite `path` with the full history (the file is truncated, not appended).
pub fn save(path: &Path, history: &UsageHistory) -> Result<(), AppError> {
    std::fs::write(path, render(history)).map_err(|e| AppError::io(path, e))
}

/// Load the history stored at `path`; a missing file is an empty history.
pub fn load(path: &Path) -> Result<UsageHistory, AppError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(UsageHistory::new()),
        Err(e) => return Err(AppError::io(path, e)),
    };
    Ok(parse(&String::from_utf8_lossy(&bytes), path))
}
