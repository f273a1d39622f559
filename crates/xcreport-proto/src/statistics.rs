//! The reconciled statistics record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which count source won reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsSource {
    /// Dedicated summary query against the result bundle.
    Authoritative,
    /// At least one section reported its own counts.
    SectionSummary,
    /// Counted leaf by leaf.
    #[default]
    Structural,
}

impl fmt::Display for StatsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsSource::Authoritative => write!(f, "authoritative"),
            StatsSource::SectionSummary => write!(f, "section summary"),
            StatsSource::Structural => write!(f, "structural"),
        }
    }
}

/// Aggregate counts for a run.
///
/// Serializes with the flat key names downstream check-run scripts read
/// (`total_tests`, `passed_tests`, ...). `total == passed + failed + skipped`
/// always holds; `expected_failures` is informational.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(rename = "total_tests")]
    pub total: u64,
    #[serde(rename = "passed_tests")]
    pub passed: u64,
    #[serde(rename = "failed_tests")]
    pub failed: u64,
    #[serde(rename = "skipped_tests")]
    pub skipped: u64,
    pub expected_failures: u64,
    #[serde(rename = "success_rate")]
    pub success_rate_percent: f64,
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
    #[serde(skip)]
    pub source: StatsSource,
}

impl Statistics {
    /// Builds a record from final bucket counts, deriving `total` and the
    /// success rate.
    pub fn from_counts(
        passed: u64,
        failed: u64,
        skipped: u64,
        expected_failures: u64,
        duration_seconds: f64,
        source: StatsSource,
    ) -> Self {
        Self {
            total: passed.saturating_add(failed).saturating_add(skipped),
            passed,
            failed,
            skipped,
            expected_failures,
            success_rate_percent: success_rate(passed, failed),
            duration_seconds: if duration_seconds.is_finite() && duration_seconds > 0.0 {
                duration_seconds
            } else {
                0.0
            },
            source,
        }
    }

    /// True when at least one test failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// `passed / (passed + failed) * 100`, rounded to one decimal place.
/// Skipped tests never enter the denominator.
pub fn success_rate(passed: u64, failed: u64) -> f64 {
    let denominator = passed.saturating_add(failed);
    if denominator == 0 {
        return 0.0;
    }
    let rate = passed as f64 / denominator as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_excludes_skipped() {
        let stats = Statistics::from_counts(3, 1, 10, 0, 1.0, StatsSource::Structural);
        assert_eq!(stats.total, 14);
        assert!((stats.success_rate_percent - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_success_rate_rounds_to_one_decimal() {
        assert!((success_rate(2, 1) - 66.7).abs() < 1e-9);
        assert!((success_rate(0, 0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_counts_near_u64_max_saturate() {
        let stats = Statistics::from_counts(u64::MAX, 1, 2, 0, 1.0, StatsSource::Authoritative);
        assert_eq!(stats.total, u64::MAX);
        assert!((stats.success_rate_percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_duration_clamps_to_zero() {
        let stats = Statistics::from_counts(1, 0, 0, 0, -4.0, StatsSource::Structural);
        assert!(stats.duration_seconds.abs() < f64::EPSILON);
    }

    #[test]
    fn test_statistics_serializes_flat_keys() {
        let stats = Statistics::from_counts(5, 1, 2, 0, 12.5, StatsSource::Authoritative);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_tests"], 8);
        assert_eq!(json["passed_tests"], 5);
        assert_eq!(json["failed_tests"], 1);
        assert_eq!(json["skipped_tests"], 2);
        assert_eq!(json["expected_failures"], 0);
        assert_eq!(json["success_rate"], 83.3);
        assert_eq!(json["duration"], 12.5);
        assert!(json.get("source").is_none());
    }
}
