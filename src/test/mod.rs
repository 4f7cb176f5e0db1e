//! Hypothesis tests for comparing groups of samples.

pub mod select;

pub use anova::{one_way_anova, AnovaResult};
pub use chi_square::{chi_square_independence, expected_counts, ChiSquareResult, DEFAULT_MIN_EXPECTED};
pub use kruskal::{kruskal_wallis, rank_with_ties, KruskalResult};
pub use normality::{check_normality, shapiro_wilk, NormalityResult, ShapiroWilk};
pub use select::{significance_threshold, test_groups, GroupTestOutcome, TestMethod, TestOptions};
