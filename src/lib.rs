//! Sample Diversity Validation Library
//!
//! Checks that sequencing quality metrics and benchmark pass rates are
//! homogeneous across sample categories such as platform, chemistry and flow cell.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (Catalog, MetricsTable, ValidationResult) and loaders
//! - **group**: Partitioning samples by a categorical attribute
//! - **profile**: Descriptive statistics per group
//! - **test**: Hypothesis testing (Shapiro-Wilk, ANOVA, Kruskal-Wallis, chi-square)
//! - **benchmark**: Quality benchmarks and pass-rate independence
//! - **correct**: Multiple testing correction (Benjamini-Hochberg)
//! - **validate**: Configuration and the end-to-end validator
//!
//! # Example
//!
//! ```no_run
//! use sample_diversity::prelude::*;
//!
//! let validator = DiversityValidator::new(ValidationConfig::default());
//! let result = validator.run_sources(
//!     &CatalogFile::new("samples.json"),
//!     &MetricsDir::new("metrics/"),
//! );
//!
//! println!("{}", result);
//! for (category, metric, test) in result.significant_tests() {
//!     println!("{} / {}: p = {:?}", category, metric, test.p_value);
//! }
//! ```

pub mod benchmark;
pub mod correct;
pub mod data;
pub mod error;
pub mod group;
pub mod profile;
pub mod test;
pub mod validate;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::benchmark::{
        count_passing, evaluate_benchmarks, BenchmarkOptions, BenchmarkThresholds,
    };
    pub use crate::correct::{correct_bh, BhCorrected};
    pub use crate::data::{
        BenchmarkAnalysis, Catalog, CatalogFile, CatalogMetricsOnly, CatalogSource,
        CategoryAnalysis, ContingencyTable, MetricAnalysis, MetricsDir, MetricsFile,
        MetricsSource, MetricsTable, SampleMetrics, SampleRecord, TestKind, TestResult,
        TestStatus, ValidationResult, ValidationStatus, ValidationSummary, CHEMISTRY_ATTRIBUTE,
    };
    pub use crate::error::{DivError, Result};
    pub use crate::group::{group_by_category, partition_samples, Grouping};
    pub use crate::profile::{profile_group, profile_groups, GroupStats};
    pub use crate::test::{
        check_normality, chi_square_independence, kruskal_wallis, one_way_anova, shapiro_wilk,
        test_groups, AnovaResult, ChiSquareResult, GroupTestOutcome, KruskalResult,
        NormalityResult, ShapiroWilk, TestMethod, TestOptions,
    };
    pub use crate::validate::{DiversityValidator, ValidationConfig};
}
