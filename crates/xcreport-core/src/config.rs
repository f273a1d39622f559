//! Report configuration (`xcreport.yml`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "xcreport.yml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Options that shape report synthesis and rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Include passing cases in detail tables. Statistics are unaffected.
    pub show_passed_tests: bool,

    pub show_code_coverage: bool,

    /// Fetch failure summaries through `summaryRef` for failing cases that
    /// carry none inline.
    pub resolve_failure_details: bool,

    /// Exit non-zero when the report contains failing tests.
    pub fail_on_test_failures: bool,

    /// Test plan whose `skippedTests` populate the skip list.
    pub test_plan: Option<PathBuf>,

    pub coverage_links: CoverageLinkConfig,

    /// Document title.
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            show_passed_tests: true,
            show_code_coverage: true,
            resolve_failure_details: true,
            fail_on_test_failures: false,
            test_plan: None,
            coverage_links: CoverageLinkConfig::default(),
            title: "Xcode Test Results".to_string(),
        }
    }
}

impl ReportConfig {
    /// Parses a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Loads configuration.
    ///
    /// With `explicit`, that file must exist. Without it, `xcreport.yml` in
    /// `dir` is used when present and defaults otherwise.
    pub fn load(dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = dir.join(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                candidate
            }
        };

        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content)
    }
}

/// How coverage file paths become repository links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageLinkConfig {
    pub repository_url: String,

    /// Directory segment marking the repository root inside absolute paths.
    pub repo_root_marker: String,

    /// Working-directory prefixes stripped verbatim.
    pub ci_prefixes: Vec<String>,

    /// Segments rewritten to this exact casing when matched
    /// case-insensitively.
    pub canonical_segments: Vec<String>,
}

impl Default for CoverageLinkConfig {
    fn default() -> Self {
        Self {
            repository_url: "https://github.com/Iterable/swift-sdk".to_string(),
            repo_root_marker: "swift-sdk".to_string(),
            ci_prefixes: vec!["/Users/runner/work/swift-sdk/swift-sdk/".to_string()],
            canonical_segments: [
                "swift-sdk",
                "Internal",
                "SDK",
                "Tests",
                "ui-components",
                "notification-extension",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}
