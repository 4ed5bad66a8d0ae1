//! Counter Metrics Collector
//!
//! Maps the `TOTAL:` section of a status file onto Prometheus counters.
//!
//! # Metrics Produced
//! - `bees_<key>_total` - event count as written by the daemon
//!   - Labels: uuid

use crate::bees::StatusRecord;
use crate::metrics::{MetricKind, MetricSample, NAMESPACE};

/// Builds one counter sample per `TOTAL:` key.
///
/// Values are passed through untouched; the daemon owns monotonicity.
pub fn counter_samples(record: &StatusRecord) -> Vec<MetricSample> {
    record
        .counters
        .iter()
        .map(|(key, value)| MetricSample {
            name: format!("{NAMESPACE}_{key}_total"),
            help: format!("Bees metric {key}"),
            kind: MetricKind::Counter,
            labels: vec![("uuid", record.filesystem_id.clone())],
            value: *value,
        })
        .collect()
}
