//! Per-sample numeric quality metrics.

use crate::data::catalog::Catalog;
use crate::error::{DivError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Metric name -> value for one sample.
pub type SampleMetrics = BTreeMap<String, f64>;

/// Metric keys that stand in for each other when the requested key is absent.
const METRIC_ALIASES: &[(&str, &str)] = &[("mean_quality", "qscore"), ("qscore", "mean_quality")];

/// Metrics for all samples, keyed by sample ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsTable {
    data: BTreeMap<String, SampleMetrics>,
}

impl MetricsTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one metric value. Non-finite values are treated as missing.
    pub fn insert(&mut self, sample_id: &str, metric: &str, value: f64) {
        let entry = self.data.entry(sample_id.to_string()).or_default();
        if value.is_finite() {
            entry.insert(metric.to_string(), value);
        }
    }

    /// Builder-style variant of [`MetricsTable::insert`].
    pub fn with(mut self, sample_id: &str, metric: &str, value: f64) -> Self {
        self.insert(sample_id, metric, value);
        self
    }

    /// Merge a full metric map for one sample, overwriting existing keys.
    pub fn insert_sample(&mut self, sample_id: &str, metrics: SampleMetrics) {
        let entry = self.data.entry(sample_id.to_string()).or_default();
        entry.extend(metrics.into_iter().filter(|(_, v)| v.is_finite()));
    }

    /// Look up a metric, falling back to its alias.
    pub fn get(&self, sample_id: &str, metric: &str) -> Option<f64> {
        let sample = self.data.get(sample_id)?;
        sample.get(metric).copied().or_else(|| {
            METRIC_ALIASES
                .iter()
                .find(|(name, _)| *name == metric)
                .and_then(|(_, alias)| sample.get(*alias).copied())
        })
    }

    /// All metrics recorded for a sample.
    pub fn sample(&self, sample_id: &str) -> Option<&SampleMetrics> {
        self.data.get(sample_id)
    }

    /// Check whether a sample has at least one metric.
    pub fn has_sample(&self, sample_id: &str) -> bool {
        self.data
            .get(sample_id)
            .map(|m| !m.is_empty())
            .unwrap_or(false)
    }

    /// Number of samples with a record.
    pub fn n_samples(&self) -> usize {
        self.data.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample IDs, sorted.
    pub fn sample_ids(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Fill gaps with scalar metrics embedded in catalog entries.
    ///
    /// Values already present in the table win. Returns the number of values added.
    pub fn fill_from_catalog(&mut self, catalog: &Catalog) -> usize {
        let mut added = 0;
        for record in catalog.iter() {
            if record.metrics.is_empty() {
                continue;
            }
            let entry = self.data.entry(record.sample_id.clone()).or_default();
            for (metric, value) in &record.metrics {
                if !entry.contains_key(metric) {
                    entry.insert(metric.clone(), *value);
                    added += 1;
                }
            }
        }
        added
    }

    /// Parse a JSON object of sample ID -> metric object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json)?;
        let root = root.as_object().ok_or_else(|| {
            DivError::EmptyData("metrics JSON must be an object keyed by sample ID".to_string())
        })?;

        let mut table = Self::new();
        for (sample_id, entry) in root {
            let entry = entry.as_object().ok_or_else(|| DivError::InvalidMetric {
                sample: sample_id.clone(),
                metric: "*".to_string(),
                value: entry.to_string(),
            })?;
            table.insert_sample(sample_id, flatten_numeric(entry));
        }
        Ok(table)
    }

    /// Load a JSON metrics file.
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Load a directory holding one JSON metrics file per sample.
    ///
    /// The sample ID is taken from a `sample_id` field when present, otherwise
    /// from the file stem with a trailing `_metrics` removed.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map(|ext| ext == "json").unwrap_or(false))
            .collect();
        paths.sort();

        let mut table = Self::new();
        for path in paths {
            let text = fs::read_to_string(&path)?;
            let value: Value = serde_json::from_str(&text)?;
            let Some(object) = value.as_object() else {
                debug!(path = %path.display(), "skipping metrics file without a top-level object");
                continue;
            };

            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let sample_id = object
                .get("sample_id")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| stem.trim_end_matches("_metrics").to_string());

            table.insert_sample(&sample_id, flatten_numeric(object));
        }

        if table.is_empty() {
            return Err(DivError::EmptyData(format!(
                "No metrics files found in {}",
                dir.display()
            )));
        }
        Ok(table)
    }

    /// Load a tab-separated metrics table.
    ///
    /// The first column holds sample IDs; every other column is a metric.
    /// Empty cells and `NA` are missing; anything else must parse as a number.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        if headers.len() < 2 {
            return Err(DivError::MissingColumn(
                "metrics table needs a sample column and at least one metric".to_string(),
            ));
        }

        let mut table = Self::new();
        for record in reader.records() {
            let record = record?;
            let Some(sample_id) = record.get(0).map(str::trim).filter(|s| !s.is_empty()) else {
                continue;
            };
            let mut metrics = SampleMetrics::new();
            for (col_idx, metric) in headers.iter().enumerate().skip(1) {
                let raw = record.get(col_idx).map(str::trim).unwrap_or("");
                if raw.is_empty() || raw == "NA" || raw == "na" {
                    continue;
                }
                let value = raw.parse::<f64>().map_err(|_| DivError::InvalidMetric {
                    sample: sample_id.to_string(),
                    metric: metric.to_string(),
                    value: raw.to_string(),
                })?;
                metrics.insert(metric.trim().to_string(), value);
            }
            table.insert_sample(sample_id, metrics);
        }
        Ok(table)
    }
}

/// Collect numeric leaves by leaf key; shallower keys win over nested ones.
fn flatten_numeric(object: &Map<String, Value>) -> SampleMetrics {
    let mut out = SampleMetrics::new();
    let mut nested = Vec::new();

    for (key, value) in object {
        match value {
            Value::Number(n) => {
                if let Some(v) = n.as_f64() {
                    out.insert(key.clone(), v);
                }
            }
            Value::Object(inner) => nested.push(inner),
            _ => {}
        }
    }

    for inner in nested {
        for (key, value) in flatten_numeric(inner) {
            out.entry(key).or_insert(value);
        }
    }
    out
}
