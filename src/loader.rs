//! Spreadsheet ingestion for honeypot telemetry.
//!
//! Reads a CSV file with a fixed, conventioned header into `HoneypotEvent`
//! records. Rows with unparseable timestamps are skipped with a warning;
//! unrecognized severity labels load as `Severity::Unknown`.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};
use thiserror::Error;

use crate::types::{HoneypotEvent, Severity};

/// Required header columns, in documentation order.
pub const REQUIRED_COLUMNS: [&str; 5] = ["timestamp", "source_ip", "category", "severity", "detail"];

/// Fatal ingestion failures. Anything row-level degrades instead.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("input spreadsheet not found: {path}")]
    Missing { path: PathBuf },

    #[error("failed to read spreadsheet {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("spreadsheet {path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },
}

/// Column indices resolved from the header row.
struct ColumnMap {
    timestamp: usize,
    source_ip: usize,
    category: usize,
    severity: usize,
    detail: usize,
}

impl ColumnMap {
    fn resolve(headers: &csv::StringRecord, path: &Path) -> Result<ColumnMap, DataError> {
        let find = |column: &'static str| -> Result<usize, DataError> {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(column))
                .ok_or_else(|| DataError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                })
        };

        Ok(ColumnMap {
            timestamp: find("timestamp")?,
            source_ip: find("source_ip")?,
            category: find("category")?,
            severity: find("severity")?,
            detail: find("detail")?,
        })
    }
}

/// Load all events from the spreadsheet at `path`.
///
/// Partial-success policy: a malformed row costs that row, never the load.
pub fn load_events(path: &Path) -> Result<Vec<HoneypotEvent>, DataError> {
    if !path.exists() {
        return Err(DataError::Missing {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| DataError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let headers = reader
        .headers()
        .map_err(|source| DataError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let columns = ColumnMap::resolve(&headers, path)?;

    let mut events = Vec::new();
    let mut skipped = 0usize;

    for (row_index, result) in reader.records().enumerate() {
        // Header is row 1 in the file the user sees.
        let line = row_index + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping malformed row at line {}: {}", line, e);
                skipped += 1;
                continue;
            }
        };

        let raw_timestamp = record.get(columns.timestamp).unwrap_or("");
        let timestamp = match parse_timestamp(raw_timestamp) {
            Some(ts) => ts,
            None => {
                warn!(
                    "skipping row at line {}: unparseable timestamp '{}'",
                    line, raw_timestamp
                );
                skipped += 1;
                continue;
            }
        };

        let source_ip = non_empty(record.get(columns.source_ip));
        let category = non_empty(record.get(columns.category));
        let severity_raw = record.get(columns.severity).unwrap_or("");
        let severity = Severity::parse(severity_raw);
        if severity == Severity::Unknown && !severity_raw.trim().is_empty() {
            debug!(
                "unrecognized severity '{}' at line {}, bucketing as unknown",
                severity_raw, line
            );
        }

        let detail = record
            .get(columns.detail)
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        events.push(HoneypotEvent {
            timestamp,
            source_ip,
            category,
            severity,
            detail,
        });
    }

    if skipped > 0 {
        warn!("skipped {} unparseable rows out of {}", skipped, events.len() + skipped);
    }
    debug!("loaded {} events from {}", events.len(), path.display());

    Ok(events)
}

/// Parse an event timestamp, accepting the formats seen in exported
/// honeypot feeds: full datetimes, ISO separators, and bare dates.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn non_empty(cell: Option<&str>) -> String {
    match cell.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "unknown".to_string(),
    }
}
