//! The diversity validator: grouping, testing and benchmark evaluation per category.

use super::config::ValidationConfig;
use crate::benchmark::{count_passing, evaluate_benchmarks, BenchmarkOptions};
use crate::correct::correct_bh;
use crate::data::{
    Catalog, CatalogSource, CategoryAnalysis, MetricAnalysis, MetricsSource, MetricsTable,
    TestStatus, ValidationResult, ValidationStatus, ValidationSummary, CHEMISTRY_ATTRIBUTE,
};
use crate::error::Result;
use crate::group::{group_by_category, partition_samples};
use crate::profile::profile_groups;
use crate::test::{test_groups, TestOptions};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Runs a validation over a catalog and metrics with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct DiversityValidator {
    config: ValidationConfig,
}

impl DiversityValidator {
    /// Create a validator.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Load both inputs, then run.
    ///
    /// Catalog-embedded metrics fill gaps left by the metrics source. A source
    /// that cannot be read produces a `failed` result.
    pub fn run_sources<C, M>(&self, catalog_source: &C, metrics_source: &M) -> ValidationResult
    where
        C: CatalogSource + ?Sized,
        M: MetricsSource + ?Sized,
    {
        if let Err(e) = self.config.validate() {
            warn!("rejected configuration: {}", e);
            return ValidationResult::error(e.to_string(), &self.config);
        }

        let catalog = match catalog_source.load_catalog() {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("failed to load sample catalog: {}", e);
                return ValidationResult::failed(
                    format!("Failed to load sample catalog: {}", e),
                    &self.config,
                    ValidationSummary::default(),
                );
            }
        };
        let mut metrics = match metrics_source.load_metrics() {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!("failed to load metrics: {}", e);
                return ValidationResult::failed(
                    format!("Failed to load metrics: {}", e),
                    &self.config,
                    ValidationSummary {
                        total_samples: catalog.n_samples(),
                        ..ValidationSummary::default()
                    },
                );
            }
        };

        let filled = metrics.fill_from_catalog(&catalog);
        if filled > 0 {
            debug!(filled, "metric values taken from the catalog");
        }

        self.run(&catalog, &metrics)
    }

    /// Validate a loaded catalog and metrics table.
    ///
    /// Never panics on data: structural problems yield `failed`, invalid
    /// configuration yields `error`, and significant differences are reported
    /// inside a `passed` result.
    pub fn run(&self, catalog: &Catalog, metrics: &MetricsTable) -> ValidationResult {
        if let Err(e) = self.config.validate() {
            warn!("rejected configuration: {}", e);
            return ValidationResult::error(e.to_string(), &self.config);
        }

        match self.analyze(catalog, metrics) {
            Ok(result) => result,
            Err(e) => {
                warn!("validation failed: {}", e);
                ValidationResult::failed(
                    format!("Validation failed: {}", e),
                    &self.config,
                    ValidationSummary {
                        total_samples: catalog.n_samples(),
                        ..ValidationSummary::default()
                    },
                )
            }
        }
    }

    fn analyze(&self, catalog: &Catalog, metrics: &MetricsTable) -> Result<ValidationResult> {
        let config = &self.config;
        let mut summary = ValidationSummary {
            total_samples: catalog.n_samples(),
            ..ValidationSummary::default()
        };

        if catalog.is_empty() {
            return Ok(ValidationResult::failed(
                "Sample catalog is empty",
                config,
                summary,
            ));
        }

        let filtered = match &config.chemistry {
            Some(chemistry) => {
                let filtered = catalog.filter_by_attribute(CHEMISTRY_ATTRIBUTE, chemistry);
                info!(
                    chemistry = chemistry.as_str(),
                    kept = filtered.n_samples(),
                    total = catalog.n_samples(),
                    "applied chemistry filter"
                );
                filtered
            }
            None => catalog.clone(),
        };
        summary.samples_filtered = catalog.n_samples() - filtered.n_samples();
        if filtered.is_empty() {
            let chemistry = config.chemistry.as_deref().unwrap_or_default();
            return Ok(ValidationResult::failed(
                format!("No samples match chemistry '{}'", chemistry),
                config,
                summary,
            ));
        }

        let with_metrics = filtered
            .iter()
            .filter(|r| metrics.has_sample(&r.sample_id))
            .count();
        summary.samples_without_metrics = filtered.n_samples() - with_metrics;
        summary.samples_analyzed = filtered.n_samples();
        if summary.samples_without_metrics > 0 {
            warn!(
                missing = summary.samples_without_metrics,
                "samples without metrics count as benchmark fails"
            );
        }
        if with_metrics == 0 {
            return Ok(ValidationResult::failed(
                "No samples have quality metrics",
                config,
                summary,
            ));
        }

        info!(
            samples = filtered.n_samples(),
            categories = config.categories.len(),
            metrics = config.metrics.len(),
            "running diversity validation"
        );

        let mut analyses = BTreeMap::new();
        for category in &config.categories {
            let analysis = self.analyze_category(&filtered, metrics, category)?;
            analyses.insert(category.clone(), analysis);
        }
        self.apply_q_values(&mut analyses);

        summary.categories_analyzed = analyses.values().filter(|a| !a.groups.is_empty()).count();
        summary.samples_passing = count_passing(&filtered, metrics, &config.benchmarks);
        summary.pass_rate = summary.samples_passing as f64 / summary.samples_analyzed as f64;
        for analysis in analyses.values() {
            for (_, test) in analysis.tests() {
                if test.significant {
                    summary.significant_tests += 1;
                }
                if test.status == TestStatus::InsufficientData {
                    summary.insufficient_tests += 1;
                }
            }
        }

        info!(
            categories = summary.categories_analyzed,
            significant = summary.significant_tests,
            pass_rate = summary.pass_rate,
            "diversity validation complete"
        );

        Ok(ValidationResult {
            status: ValidationStatus::Passed,
            message: format!(
                "Analyzed {} samples across {} categories",
                summary.samples_analyzed, summary.categories_analyzed
            ),
            summary,
            benchmarks: config.benchmarks.clone(),
            config: config.clone(),
            diversity_analysis: analyses,
            generated_at: None,
        })
    }

    /// Group, test and benchmark one category.
    ///
    /// Samples without the category attribute are counted and left out.
    /// Samples without a metric are left out of that metric's test but still
    /// count, as fails, in the benchmark table.
    pub fn analyze_category(
        &self,
        catalog: &Catalog,
        metrics: &MetricsTable,
        category: &str,
    ) -> Result<CategoryAnalysis> {
        let (partition, missing_attribute) = partition_samples(catalog, category);
        let groups: BTreeMap<String, usize> = partition
            .iter()
            .map(|(label, samples)| (label.clone(), samples.len()))
            .collect();
        if groups.is_empty() {
            warn!(category, "no samples carry this category");
        }

        let options = TestOptions::from(&self.config);
        let mut metric_analyses = BTreeMap::new();
        for metric in &self.config.metrics {
            let grouping = group_by_category(catalog, metrics, category, metric);
            let subject = format!("{} across {}", metric, category);
            let outcome = test_groups(&grouping.groups, &subject, &options)?;
            debug!(
                category,
                metric = metric.as_str(),
                status = outcome.result.status.name(),
                "metric analyzed"
            );

            metric_analyses.insert(
                metric.clone(),
                MetricAnalysis {
                    n_values: grouping.n_values(),
                    missing_metric: grouping.missing_metric,
                    test: outcome.result,
                    group_stats: profile_groups(&grouping.groups),
                    normality: outcome.normality,
                },
            );
        }

        let benchmark_pass_rates = evaluate_benchmarks(
            catalog,
            metrics,
            category,
            &self.config.benchmarks,
            &BenchmarkOptions::from(&self.config),
        )?;

        Ok(CategoryAnalysis {
            total_samples: groups.values().sum(),
            missing_attribute,
            groups,
            metrics: metric_analyses,
            benchmark_pass_rates,
        })
    }

    /// BH-adjust the p-values of every completed metric test in the run.
    fn apply_q_values(&self, analyses: &mut BTreeMap<String, CategoryAnalysis>) {
        let mut labels = Vec::new();
        let mut p_values = Vec::new();
        for (category, analysis) in analyses.iter() {
            for (metric, m) in &analysis.metrics {
                if let Some(p) = m.test.p_value {
                    labels.push(format!("{}/{}", category, metric));
                    p_values.push(p);
                }
            }
        }
        if p_values.is_empty() {
            return;
        }

        let corrected = correct_bh(&p_values, &labels);
        debug!(
            tests = corrected.n_tests,
            significant = corrected.n_significant(self.config.alpha()),
            "applied Benjamini-Hochberg correction"
        );

        for (category, analysis) in analyses.iter_mut() {
            for (metric, m) in analysis.metrics.iter_mut() {
                if m.test.p_value.is_some() {
                    m.test.q_value = corrected.q_value(&format!("{}/{}", category, metric));
                }
            }
        }
    }
}
