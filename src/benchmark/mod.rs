//! Fixed quality benchmarks and their pass rates across groups.

mod evaluate;

pub use evaluate::{count_passing, evaluate_benchmarks, BenchmarkOptions};

use crate::data::MetricsTable;
use crate::error::{DivError, Result};
use serde::{Deserialize, Serialize};

/// Minimum values a sample must reach on every benchmark metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkThresholds {
    /// Minimum alignment rate (percent).
    pub alignment_rate: f64,
    /// Minimum mean identity (percent).
    pub mean_identity: f64,
    /// Minimum mean read quality (Q-score).
    pub mean_quality: f64,
}

impl Default for BenchmarkThresholds {
    fn default() -> Self {
        Self {
            alignment_rate: 90.0,
            mean_identity: 93.0,
            mean_quality: 11.0,
        }
    }
}

impl BenchmarkThresholds {
    /// `(metric name, threshold)` pairs.
    pub fn checks(&self) -> [(&'static str, f64); 3] {
        [
            ("alignment_rate", self.alignment_rate),
            ("mean_identity", self.mean_identity),
            ("mean_quality", self.mean_quality),
        ]
    }

    /// Benchmark metrics the sample misses or falls short on.
    pub fn failed_checks(&self, metrics: &MetricsTable, sample_id: &str) -> Vec<&'static str> {
        self.checks()
            .into_iter()
            .filter(|(metric, threshold)| {
                metrics
                    .get(sample_id, metric)
                    .map(|v| v < *threshold)
                    .unwrap_or(true)
            })
            .map(|(metric, _)| metric)
            .collect()
    }

    /// A sample passes only if it meets all thresholds; a missing metric fails.
    pub fn passes(&self, metrics: &MetricsTable, sample_id: &str) -> bool {
        self.checks().iter().all(|(metric, threshold)| {
            metrics
                .get(sample_id, metric)
                .map(|v| v >= *threshold)
                .unwrap_or(false)
        })
    }

    /// Reject non-finite thresholds.
    pub fn validate(&self) -> Result<()> {
        for (metric, threshold) in self.checks() {
            if !threshold.is_finite() {
                return Err(DivError::InvalidParameter(format!(
                    "Benchmark threshold for {} must be finite",
                    metric
                )));
            }
        }
        Ok(())
    }
}
