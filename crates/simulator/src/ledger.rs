//! Cross-run metrics.
//!
//! Every completed run is filed under its strategy label: the four scalar
//! metrics go into a [`MetricSeries`], the supplementary ones into parallel
//! vectors, and the run's tick count into a per-label histogram.

use crate::ExperimentError;
use hdrhistogram::Histogram;
use serde::Serialize;
use std::collections::BTreeMap;
use watchman_core::SimulationEvent;
use watchman_types::{MetricSeries, MetricSummary, RunMetrics};

/// Everything recorded for one label.
#[derive(Debug, Clone)]
struct LabelRecord {
    series: MetricSeries,
    router_activity: Vec<f64>,
    reconstruction: Vec<f64>,
    ticks: Histogram<u64>,
}

impl LabelRecord {
    fn new() -> Result<Self, ExperimentError> {
        Ok(Self {
            series: MetricSeries::new(),
            router_activity: Vec::new(),
            reconstruction: Vec::new(),
            ticks: Histogram::new(3).map_err(|e| ExperimentError::Histogram(e.to_string()))?,
        })
    }
}

/// Summary statistics for one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelSummary {
    pub label: String,
    pub runs: usize,
    pub activity: MetricSummary,
    pub detection: MetricSummary,
    pub last_tracking: MetricSummary,
    pub path: MetricSummary,
    pub router_activity: MetricSummary,
    /// Combined path reconstruction score.
    pub reconstruction: MetricSummary,
    pub ticks_p50: u64,
    pub ticks_p99: u64,
    pub ticks_max: u64,
}

/// Label -> per-run metrics, one entry per completed run.
#[derive(Debug, Clone, Default)]
pub struct RunLedger {
    records: BTreeMap<String, LabelRecord>,
}

impl RunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one completed run that lasted `ticks` ticks.
    pub fn record(
        &mut self,
        label: &str,
        metrics: &RunMetrics,
        ticks: u64,
    ) -> Result<(), ExperimentError> {
        if !self.records.contains_key(label) {
            self.records.insert(label.to_string(), LabelRecord::new()?);
        }
        let Some(record) = self.records.get_mut(label) else {
            return Ok(());
        };
        record
            .ticks
            .record(ticks)
            .map_err(|e| ExperimentError::Histogram(e.to_string()))?;
        record.series.push(metrics);
        record.router_activity.push(metrics.router_activity);
        record.reconstruction.push(metrics.reconstruction.score());
        Ok(())
    }

    /// Labels in ledger order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn series(&self, label: &str) -> Option<&MetricSeries> {
        self.records.get(label).map(|r| &r.series)
    }

    /// Runs recorded under `label`.
    pub fn runs(&self, label: &str) -> usize {
        self.records.get(label).map_or(0, |r| r.series.len())
    }

    /// Runs recorded across all labels.
    pub fn total_runs(&self) -> usize {
        self.records.values().map(|r| r.series.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_runs() == 0
    }

    pub fn summary(&self, label: &str) -> Option<LabelSummary> {
        let record = self.records.get(label)?;
        Some(LabelSummary {
            label: label.to_string(),
            runs: record.series.len(),
            activity: record.series.activity_summary(),
            detection: record.series.detection_summary(),
            last_tracking: record.series.last_tracking_summary(),
            path: record.series.path_summary(),
            router_activity: MetricSummary::from_samples(&record.router_activity),
            reconstruction: MetricSummary::from_samples(&record.reconstruction),
            ticks_p50: record.ticks.value_at_quantile(0.5),
            ticks_p99: record.ticks.value_at_quantile(0.99),
            ticks_max: record.ticks.max(),
        })
    }

    pub fn summaries(&self) -> Vec<LabelSummary> {
        self.labels().filter_map(|label| self.summary(label)).collect()
    }

    /// The cross-run event carrying every series.
    pub fn finish(&self) -> SimulationEvent {
        SimulationEvent::MultiRunFinished {
            metrics: self
                .records
                .iter()
                .map(|(label, record)| (label.clone(), record.series.clone()))
                .collect(),
        }
    }

    /// Print a per-label table of means and 95% intervals.
    pub fn print_summary(&self) {
        println!("\n=== Experiment Summary ===");
        if self.is_empty() {
            println!("No runs recorded.");
            return;
        }
        println!(
            "{:<32} {:>5} {:>16} {:>16} {:>14} {:>16} {:>10}",
            "strategy", "runs", "detection", "activity", "last track", "reconstruction", "ticks p50"
        );
        for s in self.summaries() {
            println!(
                "{:<32} {:>5} {:>16} {:>16} {:>14.1} {:>16} {:>10}",
                s.label,
                s.runs,
                format_ci(&s.detection),
                format_ci(&s.activity),
                s.last_tracking.mean,
                format_ci(&s.reconstruction),
                s.ticks_p50,
            );
        }
    }
}

fn format_ci(summary: &MetricSummary) -> String {
    format!("{:.3} ±{:.3}", summary.mean, summary.ci95)
}
