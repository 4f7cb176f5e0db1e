//! Narrow loader interfaces for the catalog and metrics inputs.
//!
//! The validator only needs "something that produces sample -> attributes" and
//! "something that produces sample -> metrics". In-memory tables implement both
//! traits directly, so tests can pass fixtures without touching the filesystem.

use crate::data::catalog::Catalog;
use crate::data::metrics::MetricsTable;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Produces the sample -> attribute catalog.
pub trait CatalogSource {
    fn load_catalog(&self) -> Result<Catalog>;
}

/// Produces the sample -> metric table.
pub trait MetricsSource {
    fn load_metrics(&self) -> Result<MetricsTable>;
}

impl CatalogSource for Catalog {
    fn load_catalog(&self) -> Result<Catalog> {
        Ok(self.clone())
    }
}

impl MetricsSource for MetricsTable {
    fn load_metrics(&self) -> Result<MetricsTable> {
        Ok(self.clone())
    }
}

/// Catalog file on disk: `.json` is parsed as JSON, anything else as TSV.
#[derive(Debug, Clone)]
pub struct CatalogFile(pub PathBuf);

impl CatalogFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self(path.as_ref().to_path_buf())
    }
}

impl CatalogSource for CatalogFile {
    fn load_catalog(&self) -> Result<Catalog> {
        if has_json_extension(&self.0) {
            Catalog::from_json(&self.0)
        } else {
            Catalog::from_tsv(&self.0)
        }
    }
}

/// Directory of per-sample JSON metric files.
#[derive(Debug, Clone)]
pub struct MetricsDir(pub PathBuf);

impl MetricsDir {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self(path.as_ref().to_path_buf())
    }
}

impl MetricsSource for MetricsDir {
    fn load_metrics(&self) -> Result<MetricsTable> {
        MetricsTable::from_dir(&self.0)
    }
}

/// Single metrics file: `.json` is parsed as JSON, anything else as TSV.
#[derive(Debug, Clone)]
pub struct MetricsFile(pub PathBuf);

impl MetricsFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self(path.as_ref().to_path_buf())
    }
}

impl MetricsSource for MetricsFile {
    fn load_metrics(&self) -> Result<MetricsTable> {
        if has_json_extension(&self.0) {
            MetricsTable::from_json(&self.0)
        } else {
            MetricsTable::from_tsv(&self.0)
        }
    }
}

/// Metrics come only from scalar values embedded in the catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogMetricsOnly;

impl MetricsSource for CatalogMetricsOnly {
    fn load_metrics(&self) -> Result<MetricsTable> {
        Ok(MetricsTable::new())
    }
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
