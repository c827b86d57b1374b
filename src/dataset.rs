//! Tab-separated interaction records.
//!
//! Each input line is `user \t item \t count`, one interaction per line,
//! with `count` a positive integer (a raw play count). Malformed lines stop
//! the parse with the offending line number rather than being skipped, so a
//! truncated or corrupted dump never silently produces a smaller model.

use std::io::BufRead;

use crate::error::{CoplayError, Result};

/// A raw `(user, item, count)` interaction, as read from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Opaque external user identifier.
    pub user: String,
    /// Opaque external item identifier.
    pub item: String,
    /// Raw play count, always >= 1.
    pub count: u32,
}

/// Parse a whole tab-separated interaction log.
///
/// Returns [`CoplayError::EmptyInput`] when the reader yields no records.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        records.push(parse_line(&line, idx + 1)?);
    }
    if records.is_empty() {
        return Err(CoplayError::EmptyInput);
    }
    Ok(records)
}

/// Parse one `user \t item \t count` line. `line_no` is 1-based and only
/// used for error reporting.
pub fn parse_line(line: &str, line_no: usize) -> Result<Record> {
    let mut fields = line.split('\t');
    let (user, item, count) = match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(u), Some(i), Some(c), None) => (u, i, c),
        _ => {
            return Err(CoplayError::MalformedRecord {
                line: line_no,
                reason: format!("expected 3 tab-separated fields, got {}", 1 + line.matches('\t').count()),
            })
        }
    };

    let count: i64 = count.parse().map_err(|_| CoplayError::MalformedRecord {
        line: line_no,
        reason: format!("count field {count:?} is not an integer"),
    })?;
    if count < 1 {
        return Err(CoplayError::InvalidCount { line: line_no, count });
    }
    let count = u32::try_from(count).map_err(|_| CoplayError::MalformedRecord {
        line: line_no,
        reason: format!("count {count} exceeds the supported maximum {}", u32::MAX),
    })?;

    Ok(Record {
        user: user.to_owned(),
        item: item.to_owned(),
        count,
    })
}
