//! Bees status file data model
//!
//! One [`StatusRecord`] is built per status file per scrape and dropped once
//! the response is rendered. Nothing here is shared between scrapes.

use std::collections::BTreeMap;
use std::fmt;

/// Token the daemon writes in the `point` column when nothing is in flight.
pub const IDLE_POINT: &str = "idle";

/// Parsed contents of a single `<uuid>.status` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    /// Identifier taken from the file name, never from the file contents
    pub filesystem_id: String,
    /// `TOTAL:` section counters, keyed by the daemon's counter name
    pub counters: BTreeMap<String, u64>,
    /// `PROGRESS:` table rows in file order, one per extent size
    pub progress_rows: Vec<ProgressRow>,
}

/// One row of the `PROGRESS:` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRow {
    /// Extent size bucket exactly as printed (`max`, `32M`, `4096`, ...)
    pub extent_size: String,
    pub datasz_bytes: u64,
    pub point: Point,
    pub gen_min: u64,
    pub gen_max: u64,
}

/// Crawl position of a progress row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Point {
    Idle,
    Position(u64),
}

impl Point {
    pub fn is_idle(&self) -> bool {
        matches!(self, Point::Idle)
    }

    /// Numeric position, `None` while idle
    pub fn position(&self) -> Option<u64> {
        match self {
            Point::Idle => None,
            Point::Position(p) => Some(*p),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Point::Idle => f.write_str(IDLE_POINT),
            Point::Position(p) => write!(f, "{p}"),
        }
    }
}

impl StatusRecord {
    pub fn new(filesystem_id: impl Into<String>) -> Self {
        Self {
            filesystem_id: filesystem_id.into(),
            counters: BTreeMap::new(),
            progress_rows: Vec::new(),
        }
    }
}

/// Writes the record back in the daemon's status file layout.
///
/// Sizes are written as plain byte counts, so parsing the output yields an
/// equal record.
impl fmt::Display for StatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TOTAL:")?;
        let counters: Vec<_> = self.counters.iter().collect();
        for chunk in counters.chunks(4) {
            let line: Vec<String> = chunk.iter().map(|(k, v)| format!("{k}={v}")).collect();
            writeln!(f, "\t{}", line.join(" "))?;
        }

        writeln!(f, "PROGRESS:")?;
        writeln!(f, "extsz  datasz  point gen_min gen_max")?;
        writeln!(f, "----- -------- ----- ------- -------")?;
        for row in &self.progress_rows {
            writeln!(
                f,
                "{:>5} {:>8} {:>5} {:>7} {:>7}",
                row.extent_size, row.datasz_bytes, row.point, row.gen_min, row.gen_max
            )?;
        }
        writeln!(f, "total")
    }
}
