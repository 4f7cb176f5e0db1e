//! Choosing and running the group comparison test.
//!
//! With [`TestMethod::Auto`], one-way ANOVA is used only when every group
//! passes the Shapiro-Wilk check; otherwise Kruskal-Wallis is used. Sequencing
//! metrics are often skewed, so the rank-based test is the fallback.

use crate::data::{TestKind, TestResult};
use crate::error::Result;
use crate::test::anova::one_way_anova;
use crate::test::kruskal::kruskal_wallis;
use crate::test::normality::{check_normality, NormalityResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// How the group comparison test is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMethod {
    /// ANOVA if all groups look normal, Kruskal-Wallis otherwise.
    #[default]
    Auto,
    /// Always one-way ANOVA.
    Anova,
    /// Always Kruskal-Wallis.
    KruskalWallis,
}

/// Parameters for a group comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOptions {
    /// Test selection strategy.
    pub method: TestMethod,
    /// Minimum values per group (never below 2).
    pub min_samples: usize,
    /// Confidence level; significance threshold is `1 - confidence_level`.
    pub confidence_level: f64,
    /// Shapiro-Wilk rejection level for the normality precondition.
    pub normality_alpha: f64,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            method: TestMethod::Auto,
            min_samples: 3,
            confidence_level: 0.95,
            normality_alpha: 0.05,
        }
    }
}

impl TestOptions {
    /// Significance threshold.
    pub fn alpha(&self) -> f64 {
        significance_threshold(self.confidence_level)
    }

    /// Minimum group size actually enforced.
    pub fn effective_min_samples(&self) -> usize {
        self.min_samples.max(2)
    }
}

/// Test result plus the normality checks that informed the choice.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTestOutcome {
    pub result: TestResult,
    pub normality: BTreeMap<String, NormalityResult>,
}

/// Reason groups of the given sizes cannot be compared, if any.
pub fn insufficiency(
    sizes: &BTreeMap<String, usize>,
    min_samples: usize,
    subject: &str,
) -> Option<String> {
    match sizes.len() {
        0 => return Some(format!("Insufficient data: no groups with values for {}", subject)),
        1 => {
            let label = sizes.keys().next().map(String::as_str).unwrap_or("");
            return Some(format!(
                "Insufficient data: only one group ('{}') has values for {}; at least 2 are required",
                label, subject
            ));
        }
        _ => {}
    }

    let undersized: Vec<String> = sizes
        .iter()
        .filter(|(_, &n)| n < min_samples)
        .map(|(label, n)| format!("{} ({})", label, n))
        .collect();
    if undersized.is_empty() {
        None
    } else {
        Some(format!(
            "Insufficient data for {}: groups below the minimum of {} samples: {}",
            subject,
            min_samples,
            undersized.join(", ")
        ))
    }
}

/// `1 - confidence_level`, rounded so 0.999 gives 0.001 rather than 0.0010000000000000009.
pub fn significance_threshold(confidence_level: f64) -> f64 {
    ((1.0 - confidence_level) * 1e12).round() / 1e12
}

/// Interpretation text for a completed test.
pub fn interpret(subject: &str, p_value: f64, alpha: f64) -> String {
    if p_value < alpha {
        format!(
            "Significant difference in {} (p = {:.4} < {}): values are not homogeneous \
             across groups, so pooled results should be read with this caveat",
            subject, p_value, alpha
        )
    } else {
        format!(
            "No significant difference in {} (p = {:.4} >= {}): values are consistent \
             across groups",
            subject, p_value, alpha
        )
    }
}

/// Compare metric values across groups.
///
/// `subject` names what is being compared (e.g. "qscore across platform") and is
/// used in the interpretation text. Degenerate input yields an
/// `insufficient_data` or `zero_variance` result, never an error.
pub fn test_groups(
    groups: &BTreeMap<String, Vec<f64>>,
    subject: &str,
    options: &TestOptions,
) -> Result<GroupTestOutcome> {
    let sizes: BTreeMap<String, usize> = groups
        .iter()
        .map(|(label, values)| (label.clone(), values.len()))
        .collect();
    if let Some(reason) = insufficiency(&sizes, options.effective_min_samples(), subject) {
        debug!(subject, "{}", reason);
        return Ok(GroupTestOutcome {
            result: TestResult::insufficient_data(TestKind::None, reason),
            normality: BTreeMap::new(),
        });
    }

    let mut normality = BTreeMap::new();
    let kind = match options.method {
        TestMethod::Anova => TestKind::Anova,
        TestMethod::KruskalWallis => TestKind::KruskalWallis,
        TestMethod::Auto => {
            for (label, values) in groups {
                normality.insert(label.clone(), check_normality(values, options.normality_alpha));
            }
            if normality.values().all(|n| n.normal) {
                TestKind::Anova
            } else {
                TestKind::KruskalWallis
            }
        }
    };
    debug!(subject, test = kind.name(), "selected group comparison test");

    let slices: Vec<&[f64]> = groups.values().map(Vec::as_slice).collect();
    let alpha = options.alpha();

    let result = match kind {
        TestKind::Anova => one_way_anova(&slices)?.map(|r| {
            TestResult::completed(
                kind,
                r.f_statistic,
                vec![r.df_between, r.df_within],
                r.p_value,
                alpha,
            )
        }),
        _ => kruskal_wallis(&slices)?
            .map(|r| TestResult::completed(kind, r.h_statistic, vec![r.df], r.p_value, alpha)),
    };

    let result = match result {
        Some(r) => {
            let text = interpret(subject, r.p_value.unwrap_or(1.0), alpha);
            r.with_interpretation(text)
        }
        None => TestResult::zero_variance(
            kind,
            format!(
                "All values of {} are identical; no test statistic is defined",
                subject
            ),
        ),
    };

    Ok(GroupTestOutcome { result, normality })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TestStatus;

    fn groups(data: &[(&str, &[f64])]) -> BTreeMap<String, Vec<f64>> {
        data.iter()
            .map(|(label, values)| (label.to_string(), values.to_vec()))
            .collect()
    }

    #[test]
    fn test_single_group_insufficient() {
        let g = groups(&[("A", &[1.0, 2.0, 3.0])]);
        let outcome = test_groups(&g, "qscore across platform", &TestOptions::default()).unwrap();

        assert_eq!(outcome.result.status, TestStatus::InsufficientData);
        assert!(outcome.result.interpretation.contains("only one group"));
    }

    #[test]
    fn test_undersized_group_insufficient() {
        let g = groups(&[("A", &[12.0, 12.5]), ("B", &[8.0])]);
        let options = TestOptions {
            min_samples: 2,
            ..TestOptions::default()
        };

        let outcome = test_groups(&g, "qscore", &options).unwrap();

        assert_eq!(outcome.result.status, TestStatus::InsufficientData);
        assert!(outcome.result.statistic.is_none());
        assert!(outcome.result.interpretation.contains("B (1)"));
        assert!(outcome.normality.is_empty());
    }

    #[test]
    fn test_auto_picks_anova_for_normal_groups() {
        let g = groups(&[
            ("A", &[11.8, 12.0, 12.2, 11.9, 12.1]),
            ("B", &[12.1, 11.9, 12.0, 12.3, 11.7]),
            ("C", &[12.0, 12.2, 11.8, 12.1, 11.9]),
        ]);

        let outcome = test_groups(&g, "qscore", &TestOptions::default()).unwrap();

        assert_eq!(outcome.result.test, TestKind::Anova);
        assert_eq!(outcome.result.df, vec![2.0, 12.0]);
        assert_eq!(outcome.normality.len(), 3);
        assert!(!outcome.result.significant);
        assert!(outcome.result.interpretation.starts_with("No significant difference"));
    }

    #[test]
    fn test_auto_falls_back_to_kruskal() {
        let g = groups(&[
            ("A", &[10.0, 10.1, 10.0, 9.9, 10.2, 10.0, 9.8, 10.1, 10.0, 25.0]),
            ("B", &[10.0, 10.2, 10.1, 9.9, 10.0, 10.1, 9.9, 10.0, 10.1, 10.0]),
        ]);

        let outcome = test_groups(&g, "qscore", &TestOptions::default()).unwrap();

        assert_eq!(outcome.result.test, TestKind::KruskalWallis);
        assert!(!outcome.normality["A"].normal);
    }

    #[test]
    fn test_forced_methods_skip_normality() {
        let g = groups(&[("A", &[1.0, 2.0, 3.0]), ("B", &[7.0, 8.0, 9.0])]);

        let anova = TestOptions {
            method: TestMethod::Anova,
            ..TestOptions::default()
        };
        let kruskal = TestOptions {
            method: TestMethod::KruskalWallis,
            ..TestOptions::default()
        };

        let a = test_groups(&g, "x", &anova).unwrap();
        let k = test_groups(&g, "x", &kruskal).unwrap();

        assert_eq!(a.result.test, TestKind::Anova);
        assert_eq!(k.result.test, TestKind::KruskalWallis);
        assert!(a.normality.is_empty());
        assert!(a.result.significant);
    }

    #[test]
    fn test_significant_interpretation() {
        let g = groups(&[
            ("A", &[1.0, 2.0, 3.0, 2.0]),
            ("B", &[7.0, 8.0, 9.0, 8.0]),
            ("C", &[14.0, 15.0, 16.0, 15.0]),
        ]);

        let outcome = test_groups(&g, "qscore across platform", &TestOptions::default()).unwrap();

        assert!(outcome.result.significant);
        assert!(outcome
            .result
            .interpretation
            .starts_with("Significant difference in qscore across platform"));
        assert!(outcome.result.interpretation.contains("not homogeneous"));
    }

    #[test]
    fn test_zero_variance() {
        let g = groups(&[("A", &[5.0, 5.0, 5.0]), ("B", &[5.0, 5.0, 5.0])]);

        let outcome = test_groups(&g, "qscore", &TestOptions::default()).unwrap();

        assert_eq!(outcome.result.status, TestStatus::ZeroVariance);
        assert_eq!(outcome.result.test, TestKind::KruskalWallis);
        assert!(!outcome.result.significant);
    }

    #[test]
    fn test_confidence_level_controls_significance() {
        let g = groups(&[("A", &[1.0, 2.0, 3.0]), ("B", &[2.0, 3.0, 4.5])]);

        let loose = TestOptions {
            method: TestMethod::Anova,
            confidence_level: 0.5,
            ..TestOptions::default()
        };
        let strict = TestOptions {
            method: TestMethod::Anova,
            confidence_level: 0.999,
            ..TestOptions::default()
        };

        let p = test_groups(&g, "x", &loose).unwrap().result.p_value.unwrap();
        assert!(p < 0.5 && p > 0.001, "p = {}", p);
        assert!(test_groups(&g, "x", &loose).unwrap().result.significant);
        assert!(!test_groups(&g, "x", &strict).unwrap().result.significant);
        assert!(test_groups(&g, "x", &strict)
            .unwrap()
            .result
            .interpretation
            .contains(">= 0.001)"));
    }

    #[test]
    fn test_forced_anova_identical_inexact_values() {
        let g = groups(&[("A", &[0.1; 3]), ("B", &[0.1; 7])]);
        let anova = TestOptions {
            method: TestMethod::Anova,
            ..TestOptions::default()
        };

        let outcome = test_groups(&g, "qscore", &anova).unwrap();

        assert_eq!(outcome.result.test, TestKind::Anova);
        assert_eq!(outcome.result.status, TestStatus::ZeroVariance);
        assert!(outcome.result.statistic.is_none());
        assert!(!outcome.result.significant);
    }
}
