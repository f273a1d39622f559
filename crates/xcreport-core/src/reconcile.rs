//! Statistics reconciliation.
//!
//! Counts come from up to four places: the flattened leaves of each section,
//! counts a section reported about itself, the authoritative summary query,
//! and the skip list. [`RULES`] is evaluated top to bottom and the first rule
//! that applies produces the record.

use crate::model::{SummaryCounts, TestCase};
use crate::skip_list::SkippedTestSet;
use crate::source::AuthoritativeCounts;
use tracing::debug;
use xcreport_proto::{Statistics, StatsSource, TestStatus};

/// Per-status counts of a run of leaf cases.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatusTally {
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub expected_failures: u64,
    pub duration_seconds: f64,
}

impl StatusTally {
    /// Counts leaves by status. `Unknown` leaves are not counted in any
    /// bucket but their duration still accrues.
    pub fn from_cases(cases: &[TestCase]) -> Self {
        let mut tally = Self::default();
        for case in cases {
            match case.test_status {
                TestStatus::Success => tally.passed += 1,
                TestStatus::Failure => tally.failed += 1,
                TestStatus::Skipped => tally.skipped += 1,
                TestStatus::ExpectedFailure => tally.expected_failures += 1,
                TestStatus::Unknown => {
                    debug!("Not counting {} with unknown status", case.display_name());
                }
            }
            tally.duration_seconds += case.duration;
        }
        tally
    }

    pub fn total(&self) -> u64 {
        self.passed
            .saturating_add(self.failed)
            .saturating_add(self.skipped)
            .saturating_add(self.expected_failures)
    }

    fn add(&mut self, other: &StatusTally) {
        self.passed = self.passed.saturating_add(other.passed);
        self.failed = self.failed.saturating_add(other.failed);
        self.skipped = self.skipped.saturating_add(other.skipped);
        self.expected_failures = self.expected_failures.saturating_add(other.expected_failures);
        self.duration_seconds += other.duration_seconds;
    }
}

/// What one testable section contributes to reconciliation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SectionCounts {
    pub structural: StatusTally,
    pub summary: Option<SummaryCounts>,
}

impl SectionCounts {
    pub fn new(cases: &[TestCase], summary: Option<SummaryCounts>) -> Self {
        Self {
            structural: StatusTally::from_cases(cases),
            summary,
        }
    }

    /// The section's counts after the summary-or-structural choice and the
    /// passed back-fill.
    fn resolved(&self) -> StatusTally {
        let mut tally = match &self.summary {
            Some(summary) => StatusTally {
                passed: 0,
                failed: summary.failures,
                skipped: summary.skipped,
                expected_failures: 0,
                duration_seconds: summary
                    .duration_seconds
                    .unwrap_or(self.structural.duration_seconds),
            },
            None => self.structural,
        };
        let total = match &self.summary {
            Some(summary) => summary.tests,
            None => tally.total(),
        };
        if total > 0 && tally.passed == 0 {
            tally.passed = total
                .saturating_sub(tally.failed)
                .saturating_sub(tally.skipped)
                .saturating_sub(tally.expected_failures);
        }
        tally
    }
}

/// Inputs to [`reconcile`].
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    pub sections: &'a [SectionCounts],
    pub authoritative: Option<&'a AuthoritativeCounts>,
    pub skip_set: Option<&'a SkippedTestSet>,
}

impl<'a> ReconcileInput<'a> {
    /// Input without the authoritative layer, for chapter-local statistics.
    pub fn sections_only(sections: &'a [SectionCounts]) -> Self {
        Self {
            sections,
            authoritative: None,
            skip_set: None,
        }
    }
}

/// A reconciliation rule: produces a record when it applies.
pub type Rule = fn(&ReconcileInput<'_>) -> Option<Statistics>;

/// Rules in priority order. The last rule always applies.
pub const RULES: &[(&str, Rule)] = &[
    ("authoritative", authoritative_rule),
    ("sectioned", sectioned_rule),
];

/// Merges every available count source into one record.
pub fn reconcile(input: &ReconcileInput<'_>) -> Statistics {
    for (name, rule) in RULES {
        if let Some(stats) = rule(input) {
            debug!(
                "Statistics from {} rule: {} passed, {} failed, {} skipped",
                name, stats.passed, stats.failed, stats.skipped
            );
            return stats;
        }
    }
    Statistics::default()
}

/// Authoritative pass/fail counts; skipped is the skip-list size.
fn authoritative_rule(input: &ReconcileInput<'_>) -> Option<Statistics> {
    let counts = input.authoritative?;
    let skipped = input.skip_set.map_or(0, |set| set.len() as u64);
    let duration = counts
        .duration_seconds
        .unwrap_or_else(|| summed(input.sections).duration_seconds);
    Some(Statistics::from_counts(
        counts.passed,
        counts.failed,
        skipped,
        counts.expected_failures,
        duration,
        StatsSource::Authoritative,
    ))
}

/// Per section: embedded summary counts when present, else structural
/// counts. Expected failures are folded into skipped.
fn sectioned_rule(input: &ReconcileInput<'_>) -> Option<Statistics> {
    let tally = summed(input.sections);
    let source = if input.sections.iter().any(|s| s.summary.is_some()) {
        StatsSource::SectionSummary
    } else {
        StatsSource::Structural
    };
    Some(Statistics::from_counts(
        tally.passed,
        tally.failed,
        tally.skipped.saturating_add(tally.expected_failures),
        tally.expected_failures,
        tally.duration_seconds,
        source,
    ))
}

fn summed(sections: &[SectionCounts]) -> StatusTally {
    let mut total = StatusTally::default();
    for section in sections {
        total.add(&section.resolved());
    }
    total
}
