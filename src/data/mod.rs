//! Data structures for diversity validation.

mod catalog;
mod metrics;
mod result;
mod source;

pub use catalog::{Catalog, SampleRecord, CHEMISTRY_ATTRIBUTE};
pub use metrics::{MetricsTable, SampleMetrics};
pub use result::{
    BenchmarkAnalysis, CategoryAnalysis, ContingencyTable, MetricAnalysis, TestKind, TestResult,
    TestStatus, ValidationResult, ValidationStatus, ValidationSummary,
};
pub use source::{
    CatalogFile, CatalogMetricsOnly, CatalogSource, MetricsDir, MetricsFile, MetricsSource,
};
