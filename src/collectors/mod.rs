//! Metrics Collectors
//!
//! This module turns the status files of the bees work directory into
//! metric snapshots, one per filesystem.
//!
//! # Architecture
//!
//! A scrape runs three stages:
//! - Enumerate the `<uuid>.status` files of the [`StatusDir`]
//! - Read and parse each file into a [`StatusRecord`], recording one
//!   [`FileOutcome`] per file
//! - Build a [`Snapshot`] for every successful outcome using the
//!   [`counters`] and [`progress`] collectors
//!
//! # Error Handling
//!
//! Failures are scoped to the file that caused them: they are logged as
//! warnings and the filesystem is left out of this scrape, while every other
//! filesystem is still reported. A scrape that finds nothing yields an empty
//! snapshot list, which is a valid state.

use crate::bees::{parse_status, StatusDir, StatusRecord};
use crate::error::Result;
use crate::metrics::MetricSample;
use tracing::{debug, error, warn};

pub mod counters;
pub mod progress;

pub use counters::counter_samples;
pub use progress::progress_samples;

/// Metrics of one filesystem for one scrape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub filesystem_id: String,
    pub samples: Vec<MetricSample>,
}

/// Result of reading and parsing one status file
#[derive(Debug)]
pub struct FileOutcome {
    pub filesystem_id: String,
    pub result: Result<StatusRecord>,
}

/// Builds the metric block of a single filesystem.
///
/// Never fails: everything that can go wrong is caught while parsing.
pub fn build_snapshot(record: &StatusRecord) -> Snapshot {
    let mut samples = counter_samples(record);
    samples.extend(progress_samples(record));

    Snapshot {
        filesystem_id: record.filesystem_id.clone(),
        samples,
    }
}

/// Reads and parses every status file currently in the directory.
///
/// Returns one outcome per enumerated file, in filesystem id order.
pub fn read_status_files(dir: &StatusDir) -> std::io::Result<Vec<FileOutcome>> {
    let files = dir.status_files()?;

    Ok(files
        .into_iter()
        .map(|file| {
            debug!("Reading stats from {:?}", file.path());
            let result = file
                .read()
                .and_then(|bytes| parse_status(&file.filesystem_id, &bytes));
            FileOutcome {
                filesystem_id: file.filesystem_id,
                result,
            }
        })
        .collect())
}

/// Runs one scrape and returns the snapshots of every readable filesystem.
pub fn collect(dir: &StatusDir) -> Vec<Snapshot> {
    let outcomes = match read_status_files(dir) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            error!("Failed to list status directory {:?}: {}", dir.path(), e);
            return Vec::new();
        }
    };

    let (records, failures): (Vec<_>, Vec<_>) =
        outcomes.into_iter().partition(|o| o.result.is_ok());

    for failure in &failures {
        if let Err(e) = &failure.result {
            warn!(
                "Skipping filesystem {} for this scrape: {}",
                failure.filesystem_id, e
            );
        }
    }

    let snapshots: Vec<Snapshot> = records
        .into_iter()
        .filter_map(|o| o.result.ok())
        .map(|record| {
            if record.counters.is_empty() {
                warn!("No counters found for filesystem {}", record.filesystem_id);
            }
            if record.progress_rows.is_empty() {
                debug!("No progress rows found for filesystem {}", record.filesystem_id);
            }
            build_snapshot(&record)
        })
        .collect();

    debug!(
        "Collected {} filesystems ({} skipped)",
        snapshots.len(),
        failures.len()
    );
    snapshots
}

/// Concatenates the metric blocks of all snapshots.
pub fn samples(snapshots: &[Snapshot]) -> Vec<MetricSample> {
    snapshots
        .iter()
        .flat_map(|s| s.samples.iter().cloned())
        .collect()
}
