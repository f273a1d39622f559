//! Status values for individual tests and for a whole report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single executed test case.
///
/// Deserializes from the strings the result bundle uses (`"Success"`,
/// `"Expected Failure"`, ...). Anything unrecognised becomes `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TestStatus {
    Success,
    Failure,
    Skipped,
    #[serde(rename = "Expected Failure", alias = "ExpectedFailure")]
    ExpectedFailure,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TestStatus {
    /// Icon used in rendered detail rows.
    pub fn icon(self) -> &'static str {
        match self {
            TestStatus::Success => "✅",
            TestStatus::Failure => "❌",
            TestStatus::Skipped => "⏩",
            TestStatus::ExpectedFailure | TestStatus::Unknown => "⚠️",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Success => write!(f, "Success"),
            TestStatus::Failure => write!(f, "Failure"),
            TestStatus::Skipped => write!(f, "Skipped"),
            TestStatus::ExpectedFailure => write!(f, "Expected Failure"),
            TestStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Verdict for a whole report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Success,
    Failure,
    #[default]
    Neutral,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Success => write!(f, "success"),
            OverallStatus::Failure => write!(f, "failure"),
            OverallStatus::Neutral => write!(f, "neutral"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_deserializes_bundle_strings() {
        let status: TestStatus = serde_json::from_str("\"Expected Failure\"").unwrap();
        assert_eq!(status, TestStatus::ExpectedFailure);

        let status: TestStatus = serde_json::from_str("\"Success\"").unwrap();
        assert_eq!(status, TestStatus::Success);
    }

    #[test]
    fn test_status_unrecognised_is_unknown() {
        let status: TestStatus = serde_json::from_str("\"Mixed\"").unwrap();
        assert_eq!(status, TestStatus::Unknown);
    }

    #[test]
    fn test_status_display_round_trips_expected_failure() {
        assert_eq!(TestStatus::ExpectedFailure.to_string(), "Expected Failure");
    }

    #[test]
    fn test_overall_status_serializes_lowercase() {
        let json = serde_json::to_string(&OverallStatus::Failure).unwrap();
        assert_eq!(json, "\"failure\"");
        assert_eq!(OverallStatus::default(), OverallStatus::Neutral);
    }
}
