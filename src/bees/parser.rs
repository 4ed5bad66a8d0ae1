//! Status file grammar
//!
//! Turns the raw bytes of one status file into a [`StatusRecord`]. The
//! parser is line oriented and only needs the current line plus the section
//! it is in. It performs no I/O.
//!
//! # Sections
//!
//! - `TOTAL:` - `key=value` counter tokens, several per line
//! - `PROGRESS:` - the extent size table (header, separator, rows, `total`)
//! - anything else (`RATES:`, `THREADS ...:`) - skipped
//!
//! Any line the grammar does not recognize fails the whole file, so a
//! corrupted or drifted status file never yields partial metrics.

use super::types::{Point, ProgressRow, StatusRecord, IDLE_POINT};
use crate::error::{ExporterError, Result};
use regex::Regex;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::LazyLock;

const PROGRESS_COLUMNS: usize = 5;

/// One `key=value` token of a `TOTAL:` line.
static COUNTER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_]+)=([0-9]+)$").expect("invalid counter token pattern")
});

/// Section header name: `TOTAL`, `PROGRESS`, `THREADS`, ...
static SECTION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]+$").expect("invalid section name pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Totals,
    Progress(TableState),
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableState {
    Header,
    Separator,
    Rows,
    Done,
}

/// Parses one status file.
///
/// `filesystem_id` comes from the file name and is copied into the record
/// untouched.
///
/// # Errors
///
/// * [`ExporterError::MalformedLine`] - a line matches no known shape
/// * [`ExporterError::DuplicateKey`] - a counter or extent size repeats
pub fn parse_status(filesystem_id: &str, bytes: &[u8]) -> Result<StatusRecord> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        let line = bytes[..e.valid_up_to()]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1;
        malformed(line, "invalid UTF-8")
    })?;

    let mut record = StatusRecord::new(filesystem_id);
    let mut section = Section::Preamble;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;

        if line.trim().is_empty() {
            continue;
        }

        if let Some(name) = section_header(line) {
            section = match name {
                "TOTAL" => Section::Totals,
                "PROGRESS" => Section::Progress(TableState::Header),
                _ => Section::Skipped,
            };
            continue;
        }

        match &mut section {
            Section::Preamble => {
                return Err(malformed(line_no, "content before the first section header"));
            }
            Section::Skipped => {}
            Section::Totals => parse_counter_line(line, line_no, &mut record.counters)?,
            Section::Progress(state) => {
                parse_table_line(line, line_no, state, &mut record.progress_rows)?
            }
        }
    }

    Ok(record)
}

/// Section name of a header line such as `TOTAL:` or
/// `THREADS (work queue 0 of 8 tasks):`.
///
/// Only upper case names open a section. Any other unindented line ending in
/// `:` is left to the current section, which rejects it.
fn section_header(line: &str) -> Option<&str> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    let trimmed = line.trim_end();
    if !trimmed.ends_with(':') {
        return None;
    }
    trimmed
        .split(|c: char| c == ':' || c.is_whitespace())
        .next()
        .filter(|name| SECTION_NAME.is_match(name))
}

fn parse_counter_line(
    line: &str,
    line_no: usize,
    counters: &mut BTreeMap<String, u64>,
) -> Result<()> {
    for token in line.split_whitespace() {
        let captures = COUNTER_TOKEN
            .captures(token)
            .ok_or_else(|| malformed(line_no, format!("expected key=value, found '{token}'")))?;
        let key = &captures[1];

        let value = captures[2].parse::<u64>().map_err(|_| {
            malformed(line_no, format!("counter '{key}' value '{}' is out of range", &captures[2]))
        })?;

        match counters.entry(key.to_string()) {
            Entry::Vacant(e) => {
                e.insert(value);
            }
            Entry::Occupied(_) => {
                return Err(ExporterError::DuplicateKey {
                    line: line_no,
                    key: key.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn parse_table_line(
    line: &str,
    line_no: usize,
    state: &mut TableState,
    rows: &mut Vec<ProgressRow>,
) -> Result<()> {
    match state {
        TableState::Header => {
            if !line.trim_start().starts_with("extsz") {
                return Err(malformed(
                    line_no,
                    "expected progress table header starting with 'extsz'",
                ));
            }
            *state = TableState::Separator;
        }
        TableState::Separator => {
            if !line.trim().chars().all(|c| c == '-' || c.is_whitespace()) {
                return Err(malformed(line_no, "expected progress table separator"));
            }
            *state = TableState::Rows;
        }
        TableState::Rows => {
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.first() == Some(&"total") {
                *state = TableState::Done;
                return Ok(());
            }

            let row = parse_progress_row(&columns, line_no)?;
            if rows.iter().any(|r| r.extent_size == row.extent_size) {
                return Err(ExporterError::DuplicateKey {
                    line: line_no,
                    key: row.extent_size,
                });
            }
            rows.push(row);
        }
        // Trailer lines after the `total` row carry nothing we export
        TableState::Done => {}
    }
    Ok(())
}

fn parse_progress_row(columns: &[&str], line_no: usize) -> Result<ProgressRow> {
    if columns.len() < PROGRESS_COLUMNS {
        return Err(malformed(
            line_no,
            format!(
                "expected at least {PROGRESS_COLUMNS} progress columns, found {}",
                columns.len()
            ),
        ));
    }

    let extent_size = columns[0];
    if extent_size != "max" && parse_size(extent_size).is_none() {
        return Err(malformed(line_no, format!("invalid extent size '{extent_size}'")));
    }

    let datasz_bytes = parse_size(columns[1])
        .ok_or_else(|| malformed(line_no, format!("invalid datasz '{}'", columns[1])))?;

    let point = match columns[2] {
        IDLE_POINT => Point::Idle,
        token => parse_decimal(token)
            .map(Point::Position)
            .ok_or_else(|| malformed(line_no, format!("unrecognized point '{token}'")))?,
    };

    let gen_min = parse_decimal(columns[3])
        .ok_or_else(|| malformed(line_no, format!("invalid gen_min '{}'", columns[3])))?;
    let gen_max = parse_decimal(columns[4])
        .ok_or_else(|| malformed(line_no, format!("invalid gen_max '{}'", columns[4])))?;

    Ok(ProgressRow {
        extent_size: extent_size.to_string(),
        datasz_bytes,
        point,
        gen_min,
        gen_max,
    })
}

/// Unsigned decimal without sign or whitespace.
fn parse_decimal(token: &str) -> Option<u64> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Decodes the daemon's human readable sizes (`4096`, `512K`, `10.5G`) into bytes.
pub fn parse_size(token: &str) -> Option<u64> {
    let (index, last) = token.char_indices().last()?;
    let (number, multiplier) = if last.is_ascii_digit() {
        (token, 1)
    } else {
        (&token[..index], size_multiplier(last)?)
    };

    if let Some(whole) = parse_decimal(number) {
        return whole.checked_mul(multiplier);
    }

    let (int_part, frac_part) = number.split_once('.')?;
    parse_decimal(int_part)?;
    parse_decimal(frac_part)?;
    let value: f64 = number.parse().ok()?;
    let bytes = value * multiplier as f64;
    if bytes >= u64::MAX as f64 {
        return None;
    }
    Some(bytes as u64)
}

fn size_multiplier(suffix: char) -> Option<u64> {
    let shift = match suffix {
        'K' => 10,
        'M' => 20,
        'G' => 30,
        'T' => 40,
        'P' => 50,
        'E' => 60,
        _ => return None,
    };
    Some(1u64 << shift)
}

fn malformed(line: usize, reason: impl Into<String>) -> ExporterError {
    ExporterError::MalformedLine {
        line,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_suffixes() {
        assert_eq!(parse_size("4096"), Some(4096));
        assert_eq!(parse_size("128K"), Some(128 * 1024));
        assert_eq!(parse_size("32M"), Some(32 * 1024 * 1024));
        assert_eq!(parse_size("1.5G"), Some(1_610_612_736));
        assert_eq!(parse_size("0"), Some(0));
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        assert_eq!(parse_size(""), None);
        assert_eq!(parse_size("max"), None);
        assert_eq!(parse_size("12Q"), None);
        assert_eq!(parse_size("K"), None);
        assert_eq!(parse_size(".5M"), None);
        assert_eq!(parse_size("-1"), None);
    }

    #[test]
    fn test_parse_decimal_rejects_signs() {
        assert_eq!(parse_decimal("+5"), None);
        assert_eq!(parse_decimal("5"), Some(5));
        assert_eq!(parse_decimal("18446744073709551616"), None);
    }

    #[test]
    fn test_section_header_detection() {
        assert_eq!(section_header("TOTAL:"), Some("TOTAL"));
        assert_eq!(
            section_header("THREADS (work queue 0 of 8 tasks, 4 workers):"),
            Some("THREADS")
        );
        assert_eq!(section_header("\taddr_block=1"), None);
        assert_eq!(section_header("extsz  datasz  point"), None);
        assert_eq!(section_header(":"), None);
        assert_eq!(section_header("b=2:"), None);
        assert_eq!(section_header("total:"), None);
    }

    #[test]
    fn test_total_row_with_few_columns_ends_table() {
        let input = b"PROGRESS:\nextsz datasz point gen_min gen_max\n----- ------\n  max 0 idle 1 2\ntotal\nthis line is ignored\n";
        let record = parse_status("fs", input).unwrap();
        assert_eq!(record.progress_rows.len(), 1);
    }
}
