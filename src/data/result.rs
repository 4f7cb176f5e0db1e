//! Result types produced by a diversity validation run.

use crate::benchmark::BenchmarkThresholds;
use crate::error::Result;
use crate::profile::GroupStats;
use crate::test::NormalityResult;
use crate::validate::ValidationConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Which hypothesis test produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestKind {
    /// One-way analysis of variance.
    #[serde(rename = "ANOVA")]
    Anova,
    /// Kruskal-Wallis H-test.
    #[serde(rename = "Kruskal-Wallis")]
    KruskalWallis,
    /// Chi-square test of independence.
    #[serde(rename = "chi_square")]
    ChiSquare,
    /// No test was selected (degenerate input).
    #[serde(rename = "none")]
    None,
}

impl TestKind {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Anova => "ANOVA",
            Self::KruskalWallis => "Kruskal-Wallis",
            Self::ChiSquare => "chi_square",
            Self::None => "none",
        }
    }
}

/// Whether a test ran normally or was skipped on degenerate input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// The statistic and p-value were computed.
    Completed,
    /// Fewer than two groups, or a group below the minimum size.
    InsufficientData,
    /// Every pooled observation is identical; no statistic is defined.
    ZeroVariance,
}

impl TestStatus {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::InsufficientData => "insufficient_data",
            Self::ZeroVariance => "zero_variance",
        }
    }
}

/// Outcome of a single hypothesis test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test used.
    pub test: TestKind,
    /// Run status.
    pub status: TestStatus,
    /// Test statistic (F, H, or chi-square).
    pub statistic: Option<f64>,
    /// Degrees of freedom (two entries for ANOVA).
    pub df: Vec<f64>,
    /// Raw p-value.
    pub p_value: Option<f64>,
    /// Benjamini-Hochberg adjusted p-value across the run's metric tests.
    pub q_value: Option<f64>,
    /// `p_value < 1 - confidence_level`.
    pub significant: bool,
    /// Set when the test's validity conditions are only loosely met.
    pub low_confidence: bool,
    /// Human-readable interpretation.
    pub interpretation: String,
}

impl TestResult {
    /// A test that ran to completion.
    pub fn completed(test: TestKind, statistic: f64, df: Vec<f64>, p_value: f64, alpha: f64) -> Self {
        Self {
            test,
            status: TestStatus::Completed,
            statistic: Some(statistic),
            df,
            p_value: Some(p_value),
            q_value: None,
            significant: p_value < alpha,
            low_confidence: false,
            interpretation: String::new(),
        }
    }

    /// A test skipped because of too few groups or samples.
    pub fn insufficient_data(test: TestKind, reason: impl Into<String>) -> Self {
        Self::skipped(test, TestStatus::InsufficientData, reason.into())
    }

    /// A test skipped because all observations are identical.
    pub fn zero_variance(test: TestKind, reason: impl Into<String>) -> Self {
        Self::skipped(test, TestStatus::ZeroVariance, reason.into())
    }

    fn skipped(test: TestKind, status: TestStatus, interpretation: String) -> Self {
        Self {
            test,
            status,
            statistic: None,
            df: Vec::new(),
            p_value: None,
            q_value: None,
            significant: false,
            low_confidence: false,
            interpretation,
        }
    }

    /// Set the interpretation text.
    pub fn with_interpretation(mut self, interpretation: impl Into<String>) -> Self {
        self.interpretation = interpretation.into();
        self
    }

    /// Check if the test ran to completion.
    pub fn is_completed(&self) -> bool {
        self.status == TestStatus::Completed
    }
}

/// Per-group pass/fail counts for the benchmark independence test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContingencyTable {
    /// Group labels, sorted.
    pub categories: Vec<String>,
    /// Passing samples per group.
    pub pass: Vec<usize>,
    /// Failing samples per group.
    pub fail: Vec<usize>,
    /// Pass fraction per group.
    pub pass_rates: Vec<f64>,
    /// Expected `[pass, fail]` counts under independence (empty if not computed).
    pub expected: Vec<[f64; 2]>,
}

impl ContingencyTable {
    /// Samples per group (row sums).
    pub fn row_totals(&self) -> Vec<usize> {
        self.pass.iter().zip(&self.fail).map(|(p, f)| p + f).collect()
    }

    /// Total pass and total fail counts (column sums).
    pub fn column_totals(&self) -> [usize; 2] {
        [self.pass.iter().sum(), self.fail.iter().sum()]
    }

    /// Grand total.
    pub fn total(&self) -> usize {
        let [p, f] = self.column_totals();
        p + f
    }

    /// Observed counts as `[pass, fail]` rows.
    pub fn observed(&self) -> Vec<Vec<usize>> {
        self.pass
            .iter()
            .zip(&self.fail)
            .map(|(&p, &f)| vec![p, f])
            .collect()
    }
}

/// Benchmark pass rates for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkAnalysis {
    /// Group label -> fraction of samples meeting every threshold.
    pub pass_rates: BTreeMap<String, f64>,
    /// Observed (and expected) counts.
    pub contingency_table: ContingencyTable,
    /// Chi-square test of independence between group and pass/fail.
    pub test: TestResult,
}

/// Statistical analysis of one metric within one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAnalysis {
    /// Number of values that entered grouping.
    pub n_values: usize,
    /// Samples with the category attribute but without this metric.
    pub missing_metric: usize,
    /// Group comparison result.
    pub test: TestResult,
    /// Descriptive statistics per group.
    pub group_stats: BTreeMap<String, GroupStats>,
    /// Normality check per group (only for groups that were checked).
    pub normality: BTreeMap<String, NormalityResult>,
}

/// Everything computed for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAnalysis {
    /// Samples carrying this category's attribute.
    pub total_samples: usize,
    /// Analyzed samples without this category's attribute.
    pub missing_attribute: usize,
    /// Group label -> number of samples.
    pub groups: BTreeMap<String, usize>,
    /// Metric name -> analysis.
    pub metrics: BTreeMap<String, MetricAnalysis>,
    /// Benchmark pass-rate analysis.
    pub benchmark_pass_rates: BenchmarkAnalysis,
}

impl CategoryAnalysis {
    /// Every test in this category: metric tests followed by the benchmark test.
    pub fn tests(&self) -> impl Iterator<Item = (&str, &TestResult)> {
        self.metrics
            .iter()
            .map(|(m, a)| (m.as_str(), &a.test))
            .chain(std::iter::once(("benchmark", &self.benchmark_pass_rates.test)))
    }
}

/// Overall status of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// The analysis ran; statistical findings are reported as data.
    Passed,
    /// The analysis could not run (unreadable inputs, nothing left to analyze).
    Failed,
    /// The configuration was rejected.
    Error,
}

impl ValidationStatus {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

/// Run-level counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Samples in the catalog before filtering.
    pub total_samples: usize,
    /// Samples removed by the chemistry filter.
    pub samples_filtered: usize,
    /// Samples that passed the chemistry filter, with or without metrics.
    pub samples_analyzed: usize,
    /// Analyzed samples with no metrics record; these fail every benchmark.
    pub samples_without_metrics: usize,
    /// Categories with at least one observed group.
    pub categories_analyzed: usize,
    /// Analyzed samples meeting every benchmark threshold.
    pub samples_passing: usize,
    /// `samples_passing / samples_analyzed`.
    pub pass_rate: f64,
    /// Completed tests with a significant result.
    pub significant_tests: usize,
    /// Tests skipped on degenerate input.
    pub insufficient_tests: usize,
}

/// Top-level result of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Overall status.
    pub status: ValidationStatus,
    /// Human-readable status message.
    pub message: String,
    /// Run-level counts.
    pub summary: ValidationSummary,
    /// Benchmark thresholds applied.
    pub benchmarks: BenchmarkThresholds,
    /// Effective configuration.
    pub config: ValidationConfig,
    /// Category name -> analysis.
    #[serde(alias = "categories")]
    pub diversity_analysis: BTreeMap<String, CategoryAnalysis>,
    /// When the result was produced, if stamped by the caller.
    pub generated_at: Option<DateTime<Utc>>,
}

impl ValidationResult {
    fn empty(
        status: ValidationStatus,
        message: String,
        config: &ValidationConfig,
        summary: ValidationSummary,
    ) -> Self {
        Self {
            status,
            message,
            summary,
            benchmarks: config.benchmarks.clone(),
            config: config.clone(),
            diversity_analysis: BTreeMap::new(),
            generated_at: None,
        }
    }

    /// A run that could not complete because of its inputs.
    pub fn failed(message: impl Into<String>, config: &ValidationConfig, summary: ValidationSummary) -> Self {
        Self::empty(ValidationStatus::Failed, message.into(), config, summary)
    }

    /// A run rejected because of its configuration.
    pub fn error(message: impl Into<String>, config: &ValidationConfig) -> Self {
        Self::empty(
            ValidationStatus::Error,
            message.into(),
            config,
            ValidationSummary::default(),
        )
    }

    /// Stamp the result with the current time.
    pub fn stamped(mut self) -> Self {
        self.generated_at = Some(Utc::now());
        self
    }

    /// True unless the run failed or was rejected.
    pub fn ran(&self) -> bool {
        self.status == ValidationStatus::Passed
    }

    /// Every test in the run as `(category, metric or "benchmark", result)`.
    pub fn tests(&self) -> impl Iterator<Item = (&str, &str, &TestResult)> {
        self.diversity_analysis
            .iter()
            .flat_map(|(c, a)| a.tests().map(move |(m, t)| (c.as_str(), m, t)))
    }

    /// Completed tests that reported a significant difference.
    pub fn significant_tests(&self) -> Vec<(&str, &str, &TestResult)> {
        self.tests().filter(|(_, _, t)| t.significant).collect()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write pretty JSON to a file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.4}", v),
        Some(v) => v.to_string(),
        None => "N/A".to_string(),
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = &self.summary;
        writeln!(f, "Status: {} ({})", self.status.name(), self.message)?;
        writeln!(f, "Total samples:       {}", s.total_samples)?;
        writeln!(f, "Samples analyzed:    {}", s.samples_analyzed)?;
        writeln!(f, "Categories analyzed: {}", s.categories_analyzed)?;
        writeln!(f, "Benchmark pass rate: {:.1}%", s.pass_rate * 100.0)?;
        writeln!(
            f,
            "Benchmarks: alignment_rate >= {:.1}, mean_identity >= {:.1}, mean_quality >= {:.1}",
            self.benchmarks.alignment_rate, self.benchmarks.mean_identity, self.benchmarks.mean_quality
        )?;

        for (category, analysis) in &self.diversity_analysis {
            writeln!(f)?;
            writeln!(
                f,
                "{}: {} samples in {} groups",
                category,
                analysis.total_samples,
                analysis.groups.len()
            )?;
            for (group, size) in &analysis.groups {
                let rate = analysis.benchmark_pass_rates.pass_rates.get(group).copied();
                writeln!(
                    f,
                    "  {}: {} samples, pass rate {}",
                    group,
                    size,
                    rate.map(|r| format!("{:.1}%", r * 100.0))
                        .unwrap_or_else(|| "N/A".to_string())
                )?;
            }
            for (name, test) in analysis.tests() {
                writeln!(
                    f,
                    "  {:<16} {:<15} {:<18} stat={} p={}{}",
                    name,
                    test.test.name(),
                    test.status.name(),
                    fmt_opt(test.statistic),
                    fmt_opt(test.p_value),
                    if test.significant { " *" } else { "" }
                )?;
            }
        }
        Ok(())
    }
}
