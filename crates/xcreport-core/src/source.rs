//! External data sources for result bundle records.
//!
//! The engine never talks to `xcrun` directly; it asks a [`ResultSource`] for
//! raw JSON text and decides locally what to do when a fetch fails.
//!
//! - `XcrunSource`: shells out to `xcresulttool` / `xccov` for a bundle on disk
//! - `DirectorySource`: reads previously exported JSON documents from a folder

use serde_json::Value;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Errors returned by a data source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The external command ran but exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// The requested document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The external command could not be spawned or the file not read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Blocking access to the documents a report is built from.
pub trait ResultSource {
    /// Raw tagged JSON for the root record (`None`) or a referenced record.
    fn fetch_record(&self, reference: Option<&str>) -> Result<String, SourceError>;

    /// Raw code coverage export.
    fn fetch_coverage(&self) -> Result<String, SourceError>;

    /// Raw test summary document carrying authoritative counts.
    fn fetch_test_summary(&self) -> Result<String, SourceError>;

    /// Human-readable origin of the documents, shown in reports.
    fn label(&self) -> String {
        "result bundle".to_string()
    }
}

/// Pass/fail counts from the dedicated summary query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthoritativeCounts {
    pub passed: u64,
    pub failed: u64,
    pub expected_failures: u64,
    pub duration_seconds: Option<f64>,
}

impl AuthoritativeCounts {
    /// Parses a summary document. Returns `None` unless both `passedTests`
    /// and `failedTests` are present and numeric.
    pub fn from_summary_json(text: &str) -> Option<Self> {
        let doc: Value = serde_json::from_str(text).ok()?;
        let passed = doc.get("passedTests").and_then(Value::as_u64)?;
        let failed = doc.get("failedTests").and_then(Value::as_u64)?;
        let expected_failures = doc
            .get("expectedFailures")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let duration_seconds = match (
            doc.get("startTime").and_then(Value::as_f64),
            doc.get("finishTime").and_then(Value::as_f64),
        ) {
            (Some(start), Some(finish)) if finish >= start => Some(finish - start),
            _ => None,
        };
        Some(Self {
            passed,
            failed,
            expected_failures,
            duration_seconds,
        })
    }
}

/// Queries the authoritative counts, treating any failure as absence.
pub fn fetch_authoritative_counts(source: &dyn ResultSource) -> Option<AuthoritativeCounts> {
    match source.fetch_test_summary() {
        Ok(text) => {
            let counts = AuthoritativeCounts::from_summary_json(&text);
            if counts.is_none() {
                debug!("Test summary did not carry pass/fail counts");
            }
            counts
        }
        Err(e) => {
            debug!("Authoritative test summary unavailable: {}", e);
            None
        }
    }
}

/// Reads records from an `.xcresult` bundle through `xcrun`.
#[derive(Debug, Clone)]
pub struct XcrunSource {
    bundle_path: PathBuf,
}

impl XcrunSource {
    pub fn new(bundle_path: impl Into<PathBuf>) -> Self {
        Self {
            bundle_path: bundle_path.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, SourceError> {
        debug!("Running xcrun {}", args.join(" "));
        let output = Command::new("xcrun").args(args).output()?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(SourceError::CommandFailed {
                command: format!("xcrun {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    fn path_arg(&self) -> String {
        self.bundle_path.to_string_lossy().into_owned()
    }
}

impl ResultSource for XcrunSource {
    fn fetch_record(&self, reference: Option<&str>) -> Result<String, SourceError> {
        let path = self.path_arg();
        let mut args = vec![
            "xcresulttool",
            "get",
            "object",
            "--legacy",
            "--path",
            path.as_str(),
            "--format",
            "json",
        ];
        if let Some(id) = reference {
            args.extend(["--id", id]);
        }
        self.run(&args)
    }

    fn fetch_coverage(&self) -> Result<String, SourceError> {
        let path = self.path_arg();
        self.run(&["xccov", "view", "--report", "--json", path.as_str()])
    }

    fn fetch_test_summary(&self) -> Result<String, SourceError> {
        let path = self.path_arg();
        self.run(&[
            "xcresulttool",
            "get",
            "test-results",
            "summary",
            "--path",
            path.as_str(),
            "--format",
            "json",
        ])
    }

    fn label(&self) -> String {
        self.bundle_path.display().to_string()
    }
}

/// Reads previously exported documents from a directory.
///
/// Layout: `root.json`, `<reference>.json`, `coverage.json`, `summary.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub const ROOT_RECORD: &'static str = "root.json";
    pub const COVERAGE: &'static str = "coverage.json";
    pub const SUMMARY: &'static str = "summary.json";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, name: &str) -> Result<String, SourceError> {
        let path = self.root.join(name);
        if !path.is_file() {
            return Err(SourceError::NotFound(path.display().to_string()));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    /// File name for a reference id. Path separators are replaced so an id
    /// can never escape the directory.
    pub fn reference_file_name(reference: &str) -> String {
        let safe: String = reference
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        format!("{safe}.json")
    }
}

impl ResultSource for DirectorySource {
    fn fetch_record(&self, reference: Option<&str>) -> Result<String, SourceError> {
        match reference {
            None => self.read(Self::ROOT_RECORD),
            Some(id) => self.read(&Self::reference_file_name(id)),
        }
    }

    fn fetch_coverage(&self) -> Result<String, SourceError> {
        self.read(Self::COVERAGE)
    }

    fn fetch_test_summary(&self) -> Result<String, SourceError> {
        self.read(Self::SUMMARY)
    }

    fn label(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticSource;
    use tempfile::TempDir;

    #[test]
    fn test_authoritative_counts_parse() {
        let counts = AuthoritativeCounts::from_summary_json(
            r#"{"passedTests": 5, "failedTests": 1, "skippedTests": 9,
                "expectedFailures": 2, "startTime": 100.5, "finishTime": 160.5}"#,
        )
        .unwrap();
        assert_eq!(counts.passed, 5);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.expected_failures, 2);
        assert_eq!(counts.duration_seconds, Some(60.0));
    }

    #[test]
    fn test_authoritative_counts_require_pass_and_fail() {
        assert!(AuthoritativeCounts::from_summary_json(r#"{"passedTests": 5}"#).is_none());
        assert!(AuthoritativeCounts::from_summary_json("not json").is_none());
    }

    #[test]
    fn test_fetch_authoritative_counts_absent_on_failure() {
        let source = StaticSource::new();
        assert!(fetch_authoritative_counts(&source).is_none());
    }

    #[test]
    fn test_directory_source_reads_documents() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("root.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("ref_1.json"), "[1]").unwrap();

        let source = DirectorySource::new(tmp.path());
        assert_eq!(source.fetch_record(None).unwrap(), "{}");
        assert_eq!(source.fetch_record(Some("ref/1")).unwrap(), "[1]");
        assert!(matches!(
            source.fetch_coverage(),
            Err(SourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_reference_file_name_is_flat() {
        assert_eq!(
            DirectorySource::reference_file_name("0~abc/../x:y"),
            "0~abc_.._x_y.json"
        );
    }
}
