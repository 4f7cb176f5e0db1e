//! Descriptive statistics for metric groups.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary of the values in one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Number of values.
    pub n: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median.
    pub median: f64,
    /// Sample standard deviation (n - 1 denominator); 0 for fewer than 2 values.
    pub std_dev: f64,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
}

/// Profile one group of values. Returns `None` for an empty group.
pub fn profile_group(values: &[f64]) -> Option<GroupStats> {
    let n = values.len();
    if n == 0 {
        return None;
    }

    let mean = values.iter().sum::<f64>() / n as f64;

    let std_dev = if n > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    } else {
        0.0
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };

    Some(GroupStats {
        n,
        mean,
        median,
        std_dev,
        min: sorted[0],
        max: sorted[n - 1],
    })
}

/// Profile every non-empty group.
pub fn profile_groups(groups: &BTreeMap<String, Vec<f64>>) -> BTreeMap<String, GroupStats> {
    groups
        .iter()
        .filter_map(|(label, values)| profile_group(values).map(|s| (label.clone(), s)))
        .collect()
}
