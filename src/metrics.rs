//! Prometheus Metrics Rendering
//!
//! This module holds the exporter's internal metric representation and turns
//! a scrape's worth of samples into the Prometheus text exposition format.
//!
//! # Metric Families
//!
//! ## Counters (label: `uuid`)
//! - `bees_<key>_total` - one per key of the status file's `TOTAL:` section
//!
//! ## Progress Summary (labels: `uuid`, `extent_size`)
//! - `bees_progress_summary_datasz_bytes`
//! - `bees_progress_summary_point` - only for rows that are not idle
//! - `bees_progress_summary_point_idle` - 1 when idle, 0 otherwise
//! - `bees_progress_summary_gen_min`
//! - `bees_progress_summary_gen_max`
//!
//! # Rendering
//!
//! Every scrape registers its samples into a fresh [`Registry`], so values
//! never linger from a previous scrape and a filesystem that disappears
//! drops out of the output immediately. Labels are written in the order the
//! collectors declare them: `uuid` first, then `extent_size`.

use prometheus::core::{Collector, Desc};
use prometheus::proto::{self, LabelPair, MetricType};
use prometheus::{Encoder, Registry, TextEncoder};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

/// Prefix shared by every exported metric.
pub const NAMESPACE: &str = "bees";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    fn metric_type(self) -> MetricType {
        match self {
            MetricKind::Counter => MetricType::COUNTER,
            MetricKind::Gauge => MetricType::GAUGE,
        }
    }
}

/// One sample of the exporter's internal metric list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSample {
    /// Full metric name, namespace included
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    /// Label names and values, in the order they are written out
    pub labels: Vec<(&'static str, String)>,
    pub value: u64,
}

impl MetricSample {
    /// Value of a label, if present
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    fn to_metric(&self) -> proto::Metric {
        let labels = self
            .labels
            .iter()
            .map(|(name, value)| {
                let mut pair = LabelPair::new();
                pair.set_name(name.to_string());
                pair.set_value(value.clone());
                pair
            })
            .collect();

        let mut metric = proto::Metric::from_label(labels);
        match self.kind {
            MetricKind::Counter => {
                let mut counter = proto::Counter::new();
                counter.set_value(self.value as f64);
                metric.set_counter(counter);
            }
            MetricKind::Gauge => {
                let mut gauge = proto::Gauge::new();
                gauge.set_value(self.value as f64);
                metric.set_gauge(gauge);
            }
        }
        metric
    }
}

/// All samples of one metric name for a single scrape.
///
/// The stock metric vectors sort label pairs by name; this collector keeps
/// them in sample order so series read `{uuid="..",extent_size=".."}`.
struct SampleFamily {
    desc: Desc,
    kind: MetricKind,
    metrics: Vec<proto::Metric>,
}

impl SampleFamily {
    fn new(first: &MetricSample) -> prometheus::Result<Self> {
        let desc = Desc::new(
            first.name.clone(),
            first.help.clone(),
            first.labels.iter().map(|(n, _)| n.to_string()).collect(),
            HashMap::new(),
        )?;
        Ok(Self {
            desc,
            kind: first.kind,
            metrics: Vec::new(),
        })
    }
}

impl Collector for SampleFamily {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.desc]
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        let mut family = proto::MetricFamily::new();
        family.set_name(self.desc.fq_name.clone());
        family.set_help(self.desc.help.clone());
        family.set_field_type(self.kind.metric_type());
        family.set_metric(self.metrics.clone());
        vec![family]
    }
}

/// Content type of [`render`]'s output
pub fn content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

/// Render samples in Prometheus text format
///
/// Samples sharing a name are grouped into one family and labels keep their
/// declared order. An empty slice renders as an empty body.
pub fn render(samples: &[MetricSample]) -> anyhow::Result<String> {
    let registry = Registry::new();

    let mut families: BTreeMap<&str, SampleFamily> = BTreeMap::new();
    for sample in samples {
        let family = match families.entry(sample.name.as_str()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(SampleFamily::new(sample)?),
        };
        if family.kind != sample.kind {
            anyhow::bail!("metric {} is both a counter and a gauge", sample.name);
        }
        family.metrics.push(sample.to_metric());
    }

    for family in families.into_values() {
        registry.register(Box::new(family))?;
    }

    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
