//! Sample catalog: categorical attributes (and optional precomputed metrics) per sample.

use crate::error::{DivError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Attribute name used by the chemistry filter.
pub const CHEMISTRY_ATTRIBUTE: &str = "chemistry";

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Sample identifier.
    pub sample_id: String,
    /// Categorical attributes (category name -> value).
    pub attributes: BTreeMap<String, String>,
    /// Scalar metrics stored directly in the catalog entry.
    pub metrics: BTreeMap<String, f64>,
}

impl SampleRecord {
    /// Create a record with no attributes.
    pub fn new(sample_id: &str) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            attributes: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    /// Add a categorical attribute.
    pub fn with_attribute(mut self, category: &str, value: &str) -> Self {
        self.attributes
            .insert(category.to_string(), value.to_string());
        self
    }

    /// Add a precomputed metric.
    pub fn with_metric(mut self, metric: &str, value: f64) -> Self {
        if value.is_finite() {
            self.metrics.insert(metric.to_string(), value);
        }
        self
    }

    /// Get an attribute value.
    pub fn attribute(&self, category: &str) -> Option<&str> {
        self.attributes.get(category).map(String::as_str)
    }

    fn from_json_entry(sample_id: &str, entry: &Map<String, Value>) -> Self {
        let mut record = Self::new(sample_id);
        for (key, value) in entry {
            match value {
                Value::String(s) => {
                    let trimmed = s.trim();
                    if !is_missing_token(trimmed) {
                        record.attributes.insert(key.clone(), trimmed.to_string());
                    }
                }
                Value::Bool(b) => {
                    record.attributes.insert(key.clone(), b.to_string());
                }
                Value::Number(n) => {
                    if let Some(v) = n.as_f64() {
                        record = record.with_metric(key, v);
                    }
                }
                Value::Object(nested) if key == "metrics" => {
                    for (metric, v) in nested {
                        if let Some(v) = v.as_f64() {
                            record = record.with_metric(metric, v);
                        }
                    }
                }
                _ => {}
            }
        }
        record
    }
}

/// Sample catalog keyed by sample ID.
///
/// Iteration follows insertion order, which for JSON input is sorted by sample ID.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sample_ids: Vec<String>,
    records: HashMap<String, SampleRecord>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from records. Later duplicates replace earlier ones.
    pub fn from_records(records: impl IntoIterator<Item = SampleRecord>) -> Self {
        let mut catalog = Self::new();
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    /// Insert or replace a record.
    pub fn insert(&mut self, record: SampleRecord) {
        if !self.records.contains_key(&record.sample_id) {
            self.sample_ids.push(record.sample_id.clone());
        }
        self.records.insert(record.sample_id.clone(), record);
    }

    /// Parse a JSON catalog.
    ///
    /// Accepts either `{"samples": {id: {...}}}` or a bare `{id: {...}}` map.
    /// String and boolean fields become attributes, numeric fields and the
    /// entries of a nested `metrics` object become precomputed metrics.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json)?;
        let root = root
            .as_object()
            .ok_or_else(|| DivError::MalformedCatalog("top level must be an object".to_string()))?;

        let samples = match root.get("samples") {
            Some(Value::Object(samples)) => samples,
            Some(_) => {
                return Err(DivError::MalformedCatalog(
                    "'samples' must be an object keyed by sample ID".to_string(),
                ))
            }
            None => root,
        };

        let mut catalog = Self::new();
        for (sample_id, entry) in samples {
            let entry = entry.as_object().ok_or_else(|| {
                DivError::MalformedCatalog(format!("entry for sample '{}' is not an object", sample_id))
            })?;
            catalog.insert(SampleRecord::from_json_entry(sample_id, entry));
        }
        Ok(catalog)
    }

    /// Load a JSON catalog file.
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Load a catalog from a TSV file.
    ///
    /// Expected format:
    /// - First row: header with column names (first column is sample ID)
    /// - Subsequent rows: sample ID followed by attribute values
    ///
    /// Empty cells and `NA` are treated as missing.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| DivError::EmptyData("Empty catalog file".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        if header.len() < 2 {
            return Err(DivError::EmptyData(
                "Catalog must have at least one attribute column".to_string(),
            ));
        }
        let columns: Vec<String> = header[1..].iter().map(|s| s.trim().to_string()).collect();

        let mut catalog = Self::new();
        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let mut record = SampleRecord::new(fields[0].trim());
            for (col_idx, column) in columns.iter().enumerate() {
                let raw = fields.get(col_idx + 1).map(|s| s.trim()).unwrap_or("");
                if !is_missing_token(raw) {
                    record.attributes.insert(column.clone(), raw.to_string());
                }
            }
            catalog.insert(record);
        }

        if catalog.is_empty() {
            return Err(DivError::EmptyData("No samples in catalog".to_string()));
        }
        Ok(catalog)
    }

    /// Sample IDs in order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.sample_ids.is_empty()
    }

    /// Check if a sample exists.
    pub fn has_sample(&self, sample_id: &str) -> bool {
        self.records.contains_key(sample_id)
    }

    /// Get a record.
    pub fn get(&self, sample_id: &str) -> Option<&SampleRecord> {
        self.records.get(sample_id)
    }

    /// Get an attribute value for a specific sample.
    pub fn attribute(&self, sample_id: &str, category: &str) -> Option<&str> {
        self.get(sample_id).and_then(|r| r.attribute(category))
    }

    /// Iterate over records in order.
    pub fn iter(&self) -> impl Iterator<Item = &SampleRecord> {
        self.sample_ids.iter().filter_map(|sid| self.records.get(sid))
    }

    /// Keep only samples whose attribute equals `value` (ASCII case-insensitive).
    ///
    /// Samples without the attribute are dropped.
    pub fn filter_by_attribute(&self, category: &str, value: &str) -> Self {
        Self::from_records(
            self.iter()
                .filter(|r| {
                    r.attribute(category)
                        .map(|v| v.eq_ignore_ascii_case(value))
                        .unwrap_or(false)
                })
                .cloned(),
        )
    }

    /// Keep only samples matching a predicate, preserving order.
    pub fn retain<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&SampleRecord) -> bool,
    {
        Self::from_records(self.iter().filter(|r| keep(r)).cloned())
    }
}

fn is_missing_token(raw: &str) -> bool {
    raw.is_empty() || raw == "NA" || raw == "na"
}
