//! Validation run configuration.

use crate::benchmark::{BenchmarkOptions, BenchmarkThresholds};
use crate::error::{DivError, Result};
use crate::test::chi_square::DEFAULT_MIN_EXPECTED;
use crate::test::select::significance_threshold;
use crate::test::{TestMethod, TestOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters of a diversity validation run.
///
/// Every field has a default, so a YAML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Restrict the run to one chemistry (matched case-insensitively).
    pub chemistry: Option<String>,
    /// Minimum samples per group for a test to run.
    pub min_samples: usize,
    /// Confidence level; significance threshold is `1 - confidence_level`.
    pub confidence_level: f64,
    /// Categorical attributes to group by.
    pub categories: Vec<String>,
    /// Metrics compared across groups.
    pub metrics: Vec<String>,
    /// Quality benchmarks.
    pub benchmarks: BenchmarkThresholds,
    /// Group comparison test selection.
    pub test_method: TestMethod,
    /// Shapiro-Wilk rejection level used by automatic test selection.
    pub normality_alpha: f64,
    /// Expected chi-square cell count below which a result is low confidence.
    pub expected_count_threshold: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            chemistry: None,
            min_samples: 3,
            confidence_level: 0.95,
            categories: vec![
                "platform".to_string(),
                "chemistry".to_string(),
                "flow_cell".to_string(),
            ],
            metrics: vec![
                "qscore".to_string(),
                "mean_identity".to_string(),
                "alignment_rate".to_string(),
            ],
            benchmarks: BenchmarkThresholds::default(),
            test_method: TestMethod::Auto,
            normality_alpha: 0.05,
            expected_count_threshold: DEFAULT_MIN_EXPECTED,
        }
    }
}

impl ValidationConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(DivError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(DivError::from)
    }

    /// Load from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.min_samples < 2 {
            return Err(DivError::InvalidParameter(format!(
                "min_samples must be at least 2, got {}",
                self.min_samples
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(DivError::InvalidParameter(format!(
                "confidence_level must be between 0 and 1 (exclusive), got {}",
                self.confidence_level
            )));
        }
        if !(self.normality_alpha > 0.0 && self.normality_alpha < 1.0) {
            return Err(DivError::InvalidParameter(format!(
                "normality_alpha must be between 0 and 1 (exclusive), got {}",
                self.normality_alpha
            )));
        }
        if !(self.expected_count_threshold.is_finite() && self.expected_count_threshold >= 0.0) {
            return Err(DivError::InvalidParameter(format!(
                "expected_count_threshold must be a non-negative number, got {}",
                self.expected_count_threshold
            )));
        }
        if self.categories.is_empty() {
            return Err(DivError::InvalidParameter(
                "At least one category is required".to_string(),
            ));
        }
        if self.categories.iter().chain(&self.metrics).any(|s| s.trim().is_empty()) {
            return Err(DivError::InvalidParameter(
                "Category and metric names must be non-empty".to_string(),
            ));
        }
        if self.chemistry.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(DivError::InvalidParameter(
                "chemistry filter must be non-empty when set".to_string(),
            ));
        }
        self.benchmarks.validate()
    }

    /// Significance threshold.
    pub fn alpha(&self) -> f64 {
        significance_threshold(self.confidence_level)
    }
}

impl From<&ValidationConfig> for TestOptions {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            method: config.test_method,
            min_samples: config.min_samples,
            confidence_level: config.confidence_level,
            normality_alpha: config.normality_alpha,
        }
    }
}

impl From<&ValidationConfig> for BenchmarkOptions {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            min_samples: config.min_samples,
            confidence_level: config.confidence_level,
            expected_count_threshold: config.expected_count_threshold,
        }
    }
}
