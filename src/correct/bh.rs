//! Benjamini-Hochberg adjustment across the tests of one run.

use serde::{Deserialize, Serialize};

/// Adjusted p-values for a labelled family of tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BhCorrected {
    /// Test labels, in input order.
    pub labels: Vec<String>,
    /// Raw p-values.
    pub p_values: Vec<f64>,
    /// BH-adjusted p-values, capped at 1.
    pub q_values: Vec<f64>,
    /// Family size.
    pub n_tests: usize,
}

impl BhCorrected {
    /// Adjusted p-value of the test with this label.
    pub fn q_value(&self, label: &str) -> Option<f64> {
        let idx = self.labels.iter().position(|l| l == label)?;
        self.q_values.get(idx).copied()
    }

    /// Tests whose adjusted p-value is below `alpha`.
    pub fn n_significant(&self, alpha: f64) -> usize {
        self.q_values.iter().filter(|&&q| q < alpha).count()
    }
}

/// Step-up BH adjustment: `q(i) = min over j >= i of p(j) * n / j` with p sorted ascending.
///
/// `labels[i]` names `p_values[i]`.
pub fn correct_bh(p_values: &[f64], labels: &[String]) -> BhCorrected {
    let n = p_values.len();

    // Walk from the largest p-value down, carrying the running minimum
    let mut descending: Vec<usize> = (0..n).collect();
    descending.sort_by(|&a, &b| p_values[b].total_cmp(&p_values[a]));

    let mut q_values = vec![1.0; n];
    let mut running = 1.0f64;
    for (k, &idx) in descending.iter().enumerate() {
        let rank = (n - k) as f64;
        running = running.min(p_values[idx] * n as f64 / rank);
        q_values[idx] = running;
    }

    BhCorrected {
        labels: labels.to_vec(),
        p_values: p_values.to_vec(),
        q_values,
        n_tests: n,
    }
}
