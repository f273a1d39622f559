//! In-memory result source for deterministic testing.

use crate::source::{ResultSource, SourceError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Result source that serves pre-scripted documents.
///
/// Any document that was not scripted fails with `SourceError::NotFound`,
/// which lets tests exercise every fallback path.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: HashMap<Option<String>, String>,
    coverage: Option<String>,
    summary: Option<String>,
    fetches: Arc<Mutex<Vec<FetchRecord>>>,
}

/// Record of a single fetch against the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRecord {
    Record(Option<String>),
    Coverage,
    Summary,
}

impl StaticSource {
    /// Creates a source with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the root record.
    pub fn with_root(mut self, json: impl Into<String>) -> Self {
        self.records.insert(None, json.into());
        self
    }

    /// Scripts a referenced record.
    pub fn with_record(mut self, reference: &str, json: impl Into<String>) -> Self {
        self.records.insert(Some(reference.to_string()), json.into());
        self
    }

    /// Scripts the coverage export.
    pub fn with_coverage(mut self, json: impl Into<String>) -> Self {
        self.coverage = Some(json.into());
        self
    }

    /// Scripts the authoritative test summary.
    pub fn with_summary(mut self, json: impl Into<String>) -> Self {
        self.summary = Some(json.into());
        self
    }

    /// Returns every fetch made so far, in order.
    pub fn fetches(&self) -> Vec<FetchRecord> {
        self.fetches.lock().map(|f| f.clone()).unwrap_or_default()
    }

    fn log(&self, record: FetchRecord) {
        if let Ok(mut fetches) = self.fetches.lock() {
            fetches.push(record);
        }
    }
}

impl ResultSource for StaticSource {
    fn fetch_record(&self, reference: Option<&str>) -> Result<String, SourceError> {
        let key = reference.map(str::to_string);
        self.log(FetchRecord::Record(key.clone()));
        self.records
            .get(&key)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(reference.unwrap_or("<root>").to_string()))
    }

    fn fetch_coverage(&self) -> Result<String, SourceError> {
        self.log(FetchRecord::Coverage);
        self.coverage
            .clone()
            .ok_or_else(|| SourceError::NotFound("coverage".to_string()))
    }

    fn fetch_test_summary(&self) -> Result<String, SourceError> {
        self.log(FetchRecord::Summary);
        self.summary
            .clone()
            .ok_or_else(|| SourceError::NotFound("summary".to_string()))
    }
}
