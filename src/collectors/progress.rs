//! Progress Summary Metrics Collector
//!
//! Maps the `PROGRESS:` table of a status file onto gauges, one family per
//! column plus a derived idle flag.
//!
//! # Metrics Produced
//! - `bees_progress_summary_datasz_bytes` - Data size covered by the extent size bucket
//! - `bees_progress_summary_point` - Crawl position, omitted while idle
//! - `bees_progress_summary_point_idle` - 1 when the bucket is idle, 0 otherwise
//! - `bees_progress_summary_gen_min` - Lowest transid of the current cycle
//! - `bees_progress_summary_gen_max` - Highest transid of the current cycle
//!
//! All families carry the labels `uuid` and `extent_size`.

use crate::bees::{ProgressRow, StatusRecord};
use crate::metrics::{MetricKind, MetricSample, NAMESPACE};

const SUBSYSTEM: &str = "progress_summary";

/// Builds the gauge samples for every progress row.
pub fn progress_samples(record: &StatusRecord) -> Vec<MetricSample> {
    let mut samples = Vec::with_capacity(record.progress_rows.len() * 5);

    for row in &record.progress_rows {
        let gauge = |column: &str, help: &str, value: u64| MetricSample {
            name: format!("{NAMESPACE}_{SUBSYSTEM}_{column}"),
            help: help.to_string(),
            kind: MetricKind::Gauge,
            labels: row_labels(&record.filesystem_id, row),
            value,
        };

        samples.push(gauge(
            "datasz_bytes",
            "Bees progress summary datasz in bytes",
            row.datasz_bytes,
        ));
        if let Some(position) = row.point.position() {
            samples.push(gauge("point", "Bees progress summary", position));
        }
        samples.push(gauge(
            "point_idle",
            "Bees progress summary idle",
            u64::from(row.point.is_idle()),
        ));
        samples.push(gauge("gen_min", "Bees progress summary gen_min", row.gen_min));
        samples.push(gauge("gen_max", "Bees progress summary gen_max", row.gen_max));
    }

    samples
}

fn row_labels(filesystem_id: &str, row: &ProgressRow) -> Vec<(&'static str, String)> {
    vec![
        ("uuid", filesystem_id.to_string()),
        ("extent_size", row.extent_size.clone()),
    ]
}
