//! Pass-rate evaluation and the chi-square independence test.

use super::BenchmarkThresholds;
use crate::data::{BenchmarkAnalysis, Catalog, ContingencyTable, MetricsTable, TestKind, TestResult};
use crate::error::Result;
use crate::group::partition_samples;
use crate::test::chi_square::{chi_square_independence, DEFAULT_MIN_EXPECTED};
use crate::test::select::{insufficiency, significance_threshold};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Parameters for the benchmark independence test.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkOptions {
    /// Minimum samples per group (never below 2).
    pub min_samples: usize,
    /// Confidence level; significance threshold is `1 - confidence_level`.
    pub confidence_level: f64,
    /// Expected cell count below which the test is flagged low confidence.
    pub expected_count_threshold: f64,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        Self {
            min_samples: 3,
            confidence_level: 0.95,
            expected_count_threshold: DEFAULT_MIN_EXPECTED,
        }
    }
}

/// Number of catalog samples meeting every threshold.
pub fn count_passing(
    catalog: &Catalog,
    metrics: &MetricsTable,
    thresholds: &BenchmarkThresholds,
) -> usize {
    catalog
        .iter()
        .filter(|r| thresholds.passes(metrics, &r.sample_id))
        .count()
}

/// Pass rates per group of `category`, and whether passing depends on the group.
///
/// Samples without the attribute are left out of the table; samples missing a
/// benchmark metric count as fails. The table is
/// always reported; the test is only run when at least two groups each hold
/// `min_samples` samples.
pub fn evaluate_benchmarks(
    catalog: &Catalog,
    metrics: &MetricsTable,
    category: &str,
    thresholds: &BenchmarkThresholds,
    options: &BenchmarkOptions,
) -> Result<BenchmarkAnalysis> {
    let (partition, _) = partition_samples(catalog, category);

    let mut table = ContingencyTable::default();
    let mut pass_rates = BTreeMap::new();
    for (label, samples) in &partition {
        let mut pass = 0;
        for id in samples {
            let failed = thresholds.failed_checks(metrics, id);
            if failed.is_empty() {
                pass += 1;
            } else {
                debug!(
                    category,
                    group = label.as_str(),
                    sample = *id,
                    ?failed,
                    "sample fails benchmarks"
                );
            }
        }
        let rate = pass as f64 / samples.len() as f64;
        table.categories.push(label.clone());
        table.pass.push(pass);
        table.fail.push(samples.len() - pass);
        table.pass_rates.push(rate);
        pass_rates.insert(label.clone(), rate);
    }

    let subject = format!("benchmark pass rate across {}", category);
    let sizes: BTreeMap<String, usize> = partition
        .iter()
        .map(|(label, samples)| (label.clone(), samples.len()))
        .collect();

    if let Some(reason) = insufficiency(&sizes, options.min_samples.max(2), &subject) {
        debug!(category, "{}", reason);
        return Ok(BenchmarkAnalysis {
            pass_rates,
            contingency_table: table,
            test: TestResult::insufficient_data(TestKind::ChiSquare, reason),
        });
    }

    let alpha = significance_threshold(options.confidence_level);
    let test = match chi_square_independence(&table.observed())? {
        Some(chi) => {
            table.expected = chi.expected.iter().map(|row| [row[0], row[1]]).collect();

            let p = chi.p_value;
            let mut text = if p < alpha {
                format!(
                    "Benchmark pass rate depends on {} (chi-square p = {:.4} < {})",
                    category, p, alpha
                )
            } else {
                format!(
                    "Benchmark pass rate is independent of {} (chi-square p = {:.4} >= {})",
                    category, p, alpha
                )
            };

            let low = chi.n_low_expected(options.expected_count_threshold);
            if low > 0 {
                warn!(
                    category,
                    low,
                    cells = chi.n_cells(),
                    "chi-square expected counts below threshold"
                );
                text.push_str(&format!(
                    "; low confidence: {} of {} expected counts are below {}",
                    low,
                    chi.n_cells(),
                    options.expected_count_threshold
                ));
            }

            let mut result =
                TestResult::completed(TestKind::ChiSquare, chi.statistic, vec![chi.df], p, alpha)
                    .with_interpretation(text);
            result.low_confidence = low > 0;
            result
        }
        None => {
            let outcome = if table.column_totals()[1] == 0 {
                "pass"
            } else {
                "fail"
            };
            TestResult::zero_variance(
                TestKind::ChiSquare,
                format!(
                    "All samples {} the benchmarks; pass rate cannot differ across {}",
                    outcome, category
                ),
            )
        }
    };

    Ok(BenchmarkAnalysis {
        pass_rates,
        contingency_table: table,
        test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleRecord, TestStatus};
    use approx::assert_relative_eq;

    fn add_sample(
        catalog: &mut Catalog,
        metrics: &mut MetricsTable,
        id: &str,
        platform: &str,
        quality: f64,
    ) {
        catalog.insert(SampleRecord::new(id).with_attribute("platform", platform));
        metrics.insert(id, "alignment_rate", 95.0);
        metrics.insert(id, "mean_identity", 94.0);
        metrics.insert(id, "mean_quality", quality);
    }

    /// `n_pass` passing and `n_fail` failing samples per platform.
    fn fixture(layout: &[(&str, usize, usize)]) -> (Catalog, MetricsTable) {
        let mut catalog = Catalog::new();
        let mut metrics = MetricsTable::new();
        for (platform, n_pass, n_fail) in layout {
            for i in 0..*n_pass {
                add_sample(&mut catalog, &mut metrics, &format!("{}_p{}", platform, i), platform, 12.0);
            }
            for i in 0..*n_fail {
                add_sample(&mut catalog, &mut metrics, &format!("{}_f{}", platform, i), platform, 10.0);
            }
        }
        (catalog, metrics)
    }

    #[test]
    fn test_count_passing() {
        let (catalog, metrics) = fixture(&[("MinION", 3, 1), ("PromethION", 1, 2)]);
        assert_eq!(count_passing(&catalog, &metrics, &BenchmarkThresholds::default()), 4);
    }

    #[test]
    fn test_pass_rates_and_table() {
        let (catalog, metrics) = fixture(&[("MinION", 3, 1), ("PromethION", 1, 2)]);

        let analysis = evaluate_benchmarks(
            &catalog,
            &metrics,
            "platform",
            &BenchmarkThresholds::default(),
            &BenchmarkOptions::default(),
        )
        .unwrap();

        assert_relative_eq!(analysis.pass_rates["MinION"], 0.75);
        assert_relative_eq!(analysis.pass_rates["PromethION"], 1.0 / 3.0);
        let table = &analysis.contingency_table;
        assert_eq!(table.categories, vec!["MinION", "PromethION"]);
        assert_eq!(table.pass, vec![3, 1]);
        assert_eq!(table.fail, vec![1, 2]);
        assert_eq!(table.total(), catalog.n_samples());
    }

    #[test]
    fn test_dependent_pass_rate() {
        let (catalog, metrics) = fixture(&[("MinION", 20, 0), ("PromethION", 5, 15)]);

        let analysis = evaluate_benchmarks(
            &catalog,
            &metrics,
            "platform",
            &BenchmarkThresholds::default(),
            &BenchmarkOptions::default(),
        )
        .unwrap();

        let test = &analysis.test;
        assert_eq!(test.status, TestStatus::Completed);
        assert_eq!(test.test, TestKind::ChiSquare);
        assert_eq!(test.df, vec![1.0]);
        assert!(test.significant);
        assert!(test.interpretation.starts_with("Benchmark pass rate depends on platform"));
        // Expected counts 12.5 / 7.5 in both rows
        assert!(!test.low_confidence);
        assert_relative_eq!(analysis.contingency_table.expected[0][0], 12.5, epsilon = 1e-12);
        assert_relative_eq!(analysis.contingency_table.expected[1][1], 7.5, epsilon = 1e-12);
    }

    #[test]
    fn test_independent_pass_rate_low_confidence() {
        let (catalog, metrics) = fixture(&[("MinION", 4, 1), ("PromethION", 4, 1)]);

        let analysis = evaluate_benchmarks(
            &catalog,
            &metrics,
            "platform",
            &BenchmarkThresholds::default(),
            &BenchmarkOptions::default(),
        )
        .unwrap();

        let test = &analysis.test;
        assert!(!test.significant);
        assert_relative_eq!(test.statistic.unwrap(), 0.0, epsilon = 1e-12);
        assert!(test.low_confidence);
        assert!(test.interpretation.contains("is independent of platform"));
        assert!(test.interpretation.contains("low confidence"));
    }

    #[test]
    fn test_all_pass_is_zero_variance() {
        let (catalog, metrics) = fixture(&[("MinION", 3, 0), ("PromethION", 4, 0)]);

        let analysis = evaluate_benchmarks(
            &catalog,
            &metrics,
            "platform",
            &BenchmarkThresholds::default(),
            &BenchmarkOptions::default(),
        )
        .unwrap();

        assert_eq!(analysis.test.status, TestStatus::ZeroVariance);
        assert!(analysis.test.interpretation.contains("All samples pass"));
        assert_relative_eq!(analysis.pass_rates["MinION"], 1.0);
    }

    #[test]
    fn test_single_group_reports_rates_only() {
        let (catalog, metrics) = fixture(&[("MinION", 2, 2)]);

        let analysis = evaluate_benchmarks(
            &catalog,
            &metrics,
            "platform",
            &BenchmarkThresholds::default(),
            &BenchmarkOptions::default(),
        )
        .unwrap();

        assert_eq!(analysis.test.status, TestStatus::InsufficientData);
        assert_relative_eq!(analysis.pass_rates["MinION"], 0.5);
    }

    #[test]
    fn test_undersized_group_reports_rates_only() {
        let (catalog, metrics) = fixture(&[("MinION", 4, 4), ("PromethION", 1, 0)]);

        let analysis = evaluate_benchmarks(
            &catalog,
            &metrics,
            "platform",
            &BenchmarkThresholds::default(),
            &BenchmarkOptions::default(),
        )
        .unwrap();

        assert_eq!(analysis.test.status, TestStatus::InsufficientData);
        assert!(analysis.test.interpretation.contains("PromethION (1)"));
        assert_eq!(analysis.pass_rates.len(), 2);
    }

    #[test]
    fn test_samples_without_attribute_excluded() {
        let (mut catalog, mut metrics) = fixture(&[("MinION", 3, 0), ("PromethION", 0, 3)]);
        catalog.insert(SampleRecord::new("loose"));
        metrics.insert("loose", "mean_quality", 12.0);

        let analysis = evaluate_benchmarks(
            &catalog,
            &metrics,
            "platform",
            &BenchmarkThresholds::default(),
            &BenchmarkOptions::default(),
        )
        .unwrap();

        assert_eq!(analysis.contingency_table.total(), 6);
        assert!(analysis.test.is_completed());
    }

    #[test]
    fn test_sample_without_metrics_counts_as_fail() {
        let (mut catalog, metrics) = fixture(&[("MinION", 4, 0), ("PromethION", 3, 0)]);
        catalog.insert(SampleRecord::new("bare").with_attribute("platform", "PromethION"));

        let analysis = evaluate_benchmarks(
            &catalog,
            &metrics,
            "platform",
            &BenchmarkThresholds::default(),
            &BenchmarkOptions::default(),
        )
        .unwrap();

        let table = &analysis.contingency_table;
        assert_eq!(table.pass, vec![4, 3]);
        assert_eq!(table.fail, vec![0, 1]);
        assert_relative_eq!(analysis.pass_rates["PromethION"], 0.75);
        assert!(analysis.test.is_completed());
    }
}
