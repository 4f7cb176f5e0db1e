//! Partitioning samples into groups by a categorical attribute.

use crate::data::{Catalog, MetricsTable};
use std::collections::BTreeMap;
use tracing::debug;

/// Metric values grouped by attribute value for one (category, metric) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    /// Category used for grouping.
    pub category: String,
    /// Metric extracted into each group.
    pub metric: String,
    /// Attribute value -> metric values, in catalog order within each group.
    pub groups: BTreeMap<String, Vec<f64>>,
    /// Samples without the category attribute.
    pub missing_attribute: usize,
    /// Samples with the attribute but without the metric.
    pub missing_metric: usize,
}

impl Grouping {
    /// Number of groups.
    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }

    /// Total number of grouped values.
    pub fn n_values(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Samples excluded from grouping.
    pub fn n_skipped(&self) -> usize {
        self.missing_attribute + self.missing_metric
    }

    /// Group label -> size.
    pub fn sizes(&self) -> BTreeMap<String, usize> {
        self.groups
            .iter()
            .map(|(label, values)| (label.clone(), values.len()))
            .collect()
    }

    /// Groups with fewer than `min_samples` values, as `(label, size)`.
    pub fn undersized(&self, min_samples: usize) -> Vec<(&str, usize)> {
        self.groups
            .iter()
            .filter(|(_, values)| values.len() < min_samples)
            .map(|(label, values)| (label.as_str(), values.len()))
            .collect()
    }
}

/// Group one metric's values by a category's attribute values.
///
/// Samples missing the attribute or the metric are excluded and counted.
/// Groups are ordered by label.
pub fn group_by_category(
    catalog: &Catalog,
    metrics: &MetricsTable,
    category: &str,
    metric: &str,
) -> Grouping {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut missing_attribute = 0;
    let mut missing_metric = 0;

    for record in catalog.iter() {
        let Some(label) = record.attribute(category) else {
            missing_attribute += 1;
            continue;
        };
        match metrics.get(&record.sample_id, metric) {
            Some(value) => groups.entry(label.to_string()).or_default().push(value),
            None => missing_metric += 1,
        }
    }

    if missing_attribute + missing_metric > 0 {
        debug!(
            category,
            metric, missing_attribute, missing_metric, "samples excluded from grouping"
        );
    }

    Grouping {
        category: category.to_string(),
        metric: metric.to_string(),
        groups,
        missing_attribute,
        missing_metric,
    }
}

/// Sample IDs per attribute value, ordered by label.
///
/// Returns the partition and the number of samples without the attribute.
pub fn partition_samples<'a>(
    catalog: &'a Catalog,
    category: &str,
) -> (BTreeMap<String, Vec<&'a str>>, usize) {
    let mut partition: BTreeMap<String, Vec<&'a str>> = BTreeMap::new();
    let mut missing = 0;
    for record in catalog.iter() {
        match record.attribute(category) {
            Some(label) => partition
                .entry(label.to_string())
                .or_default()
                .push(record.sample_id.as_str()),
            None => missing += 1,
        }
    }
    (partition, missing)
}
