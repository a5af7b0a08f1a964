//! Parser for grcov's newline-delimited `ade` report
//!
//! Each line is a standalone JSON document. Only lines carrying a `method`
//! object with `name`, `total_covered` and `total_uncovered` become records;
//! anything else (file entries, partial methods, blank or garbled lines) is
//! skipped without error.

use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::trace;

use crate::error::Result;

/// One per-symbol entry from the intermediate report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateRecord {
    /// Symbol name as emitted by the generator (usually mangled)
    pub name: String,
    pub total_covered: u64,
    pub total_uncovered: u64,
}

#[derive(Deserialize)]
struct ReportLine {
    method: Option<MethodEntry>,
}

#[derive(Deserialize)]
struct MethodEntry {
    name: Option<String>,
    total_covered: Option<u64>,
    total_uncovered: Option<u64>,
}

/// Parse a single report line, returning `None` for anything that is not a
/// complete method record
pub fn parse_line(line: &str) -> Option<IntermediateRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let parsed: ReportLine = match serde_json::from_str(line) {
        Ok(parsed) => parsed,
        Err(e) => {
            trace!(error = %e, "skipping unparseable report line");
            return None;
        }
    };

    let method = parsed.method?;
    Some(IntermediateRecord {
        name: method.name?,
        total_covered: method.total_covered?,
        total_uncovered: method.total_uncovered?,
    })
}

/// Parse every record from a reader
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Vec<IntermediateRecord>> {
    let mut records = Vec::new();
    for line in reader.lines() {
        if let Some(record) = parse_line(&line?) {
            records.push(record);
        }
    }
    Ok(records)
}

/// Parse every record from a report file on disk
pub fn parse_file(path: &Path) -> Result<Vec<IntermediateRecord>> {
    let file = File::open(path)?;
    parse_reader(BufReader::new(file))
}
