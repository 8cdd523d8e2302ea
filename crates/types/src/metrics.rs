//! Per-run metrics and cross-run series.

use serde::{Deserialize, Serialize};

/// How well the path rebuilt from detection points matches the real one.
///
/// All three values lie in `[0, 1]`, higher is better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PathReconstruction {
    /// Share of the true path length covered by reconstructed edges.
    pub matching: f64,
    /// `1 / (1 + d)` where `d` is the distance between the true and the
    /// reconstructed end points.
    pub target_diff: f64,
    /// `1 / (1 + |L - L'|)` over the true and reconstructed lengths.
    pub length_diff: f64,
}

impl PathReconstruction {
    /// Single score combining the three components.
    pub fn score(&self) -> f64 {
        (self.matching + 2.0 * self.length_diff * self.target_diff) / 3.0
    }
}

/// Scalar outcome of one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Fraction of ticks during which at least one router was active.
    pub activity: f64,
    /// Fraction of attacker transmissions detected by at least one router.
    pub detection: f64,
    /// Tick of the last detection, 0 if the attacker was never detected.
    pub last_tracking: u64,
    /// Length of the planned attacker path in distance units.
    pub path: f64,
    /// Share of router-ticks spent inactive (energy saving).
    pub router_activity: f64,
    /// Path reconstruction quality.
    pub reconstruction: PathReconstruction,
}

/// Parallel per-metric sequences, one entry per completed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub activity: Vec<f64>,
    pub detection: Vec<f64>,
    pub last_tracking: Vec<u64>,
    pub path: Vec<f64>,
}

impl MetricSeries {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one run.
    pub fn push(&mut self, metrics: &RunMetrics) {
        self.activity.push(metrics.activity);
        self.detection.push(metrics.detection);
        self.last_tracking.push(metrics.last_tracking);
        self.path.push(metrics.path);
    }

    /// Number of runs recorded.
    pub fn len(&self) -> usize {
        self.activity.len()
    }

    /// Check if no run has been recorded.
    pub fn is_empty(&self) -> bool {
        self.activity.is_empty()
    }

    pub fn activity_summary(&self) -> MetricSummary {
        MetricSummary::from_samples(&self.activity)
    }

    pub fn detection_summary(&self) -> MetricSummary {
        MetricSummary::from_samples(&self.detection)
    }

    pub fn last_tracking_summary(&self) -> MetricSummary {
        let samples: Vec<f64> = self.last_tracking.iter().map(|&t| t as f64).collect();
        MetricSummary::from_samples(&samples)
    }

    pub fn path_summary(&self) -> MetricSummary {
        MetricSummary::from_samples(&self.path)
    }
}

/// Mean and spread of one metric over several runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std_dev: f64,
    /// Half width of the normal-approximation 95% confidence interval.
    pub ci95: f64,
}

impl MetricSummary {
    /// Summarise a slice of samples. Empty input yields all zeros.
    pub fn from_samples(samples: &[f64]) -> Self {
        let count = samples.len();
        if count == 0 {
            return Self::default();
        }
        let mean = samples.iter().sum::<f64>() / count as f64;
        let std_dev = if count > 1 {
            let var = samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>()
                / (count - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };
        let ci95 = 1.96 * std_dev / (count as f64).sqrt();
        Self {
            count,
            mean,
            std_dev,
            ci95,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(activity: f64, detection: f64, last_tracking: u64, path: f64) -> RunMetrics {
        RunMetrics {
            activity,
            detection,
            last_tracking,
            path,
            ..Default::default()
        }
    }

    #[test]
    fn test_series_push_keeps_sequences_parallel() {
        let mut series = MetricSeries::new();
        series.push(&run(0.5, 1.0, 3, 10.0));
        series.push(&run(0.25, 0.0, 0, 12.0));

        assert_eq!(series.len(), 2);
        assert_eq!(series.detection, vec![1.0, 0.0]);
        assert_eq!(series.last_tracking, vec![3, 0]);
        assert_eq!(series.path, vec![10.0, 12.0]);
    }

    #[test]
    fn test_summary_of_constant_samples() {
        let summary = MetricSummary::from_samples(&[2.0, 2.0, 2.0]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.mean, 2.0);
        assert_eq!(summary.std_dev, 0.0);
        assert_eq!(summary.ci95, 0.0);
    }

    #[test]
    fn test_summary_spread() {
        let summary = MetricSummary::from_samples(&[1.0, 3.0]);
        assert_eq!(summary.mean, 2.0);
        assert!((summary.std_dev - 2f64.sqrt()).abs() < 1e-12);
        assert!(summary.ci95 > 0.0);
        assert_eq!(MetricSummary::from_samples(&[]).count, 0);
    }

    #[test]
    fn test_reconstruction_score() {
        let perfect = PathReconstruction {
            matching: 1.0,
            target_diff: 1.0,
            length_diff: 1.0,
        };
        assert_eq!(perfect.score(), 1.0);
        assert_eq!(PathReconstruction::default().score(), 0.0);
    }
}
