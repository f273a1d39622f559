//! Report model and synthesis.
//!
//! [`Synthesizer`] walks the invocation record, resolves every referenced
//! record it needs, flattens each testable's tree into a section, reconciles
//! statistics and attaches coverage. Ordering policy for rendering (class
//! grouping and sorting) lives here too so every renderer agrees on it.

use crate::config::ReportConfig;
use crate::coverage::{self, CoverageNode};
use crate::flatten::flatten;
use crate::model::{
    ActionRecord, InvocationMetadata, InvocationRecord, RunDestination, SummaryCounts, TestCase,
    TestPlanRunSummaries, TestSummaryDetail,
};
use crate::reconcile::{ReconcileInput, SectionCounts, reconcile};
use crate::resolve::{is_empty_record, resolve};
use crate::skip_list::SkippedTestSet;
use crate::source::{ResultSource, fetch_authoritative_counts};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};
use xcreport_proto::{OverallStatus, Result, Statistics, TestStatus};

/// Title used when an action carries neither a title nor a command name.
pub const FALLBACK_CHAPTER_TITLE: &str = "Tests";

/// The complete document model for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    /// Where the results came from (bundle path or export directory).
    pub source_label: String,
    pub entity_name: Option<String>,
    pub workspace_path: Option<String>,
    pub chapters: Vec<Chapter>,
    pub code_coverage: Option<CoverageNode>,
    pub statistics: Statistics,
    /// Skip-list members to list, sorted. Empty unless a skip list was
    /// supplied and something was reconciled as skipped.
    pub skipped_tests: Vec<String>,
    pub show_passed_tests: bool,
    pub overall_status: OverallStatus,
    /// Set only on a degraded report.
    pub error: Option<String>,
}

impl Report {
    /// A report that only describes why synthesis failed.
    pub fn degraded(title: &str, source_label: &str, error: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            source_label: source_label.to_string(),
            entity_name: None,
            workspace_path: None,
            chapters: Vec::new(),
            code_coverage: None,
            statistics: Statistics::default(),
            skipped_tests: Vec::new(),
            show_passed_tests: true,
            overall_status: OverallStatus::Failure,
            error: Some(error.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    /// Every failing case with the chapter and section it belongs to.
    pub fn failed_cases(&self) -> impl Iterator<Item = (&Chapter, &Section, &TestCase)> {
        self.chapters.iter().flat_map(|chapter| {
            chapter.sections.iter().flat_map(move |section| {
                section
                    .cases
                    .iter()
                    .filter(|case| case.test_status == TestStatus::Failure)
                    .map(move |case| (chapter, section, case))
            })
        })
    }
}

/// One test action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chapter {
    pub title: String,
    pub run_destination: RunDestination,
    /// Testables in first-seen order.
    pub sections: Vec<Section>,
    /// Chapter-local counts (no authoritative layer).
    pub statistics: Statistics,
}

/// One testable within a chapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    pub summary: Option<SummaryCounts>,
    /// Flattened leaves in pre-order.
    pub cases: Vec<TestCase>,
}

/// Cases of one owning class, sorted by display name.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassGroup<'a> {
    pub name: &'a str,
    pub cases: Vec<&'a TestCase>,
}

impl Section {
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty() && self.summary.is_none_or(|s| s.tests == 0)
    }

    fn counts(&self) -> SectionCounts {
        SectionCounts::new(&self.cases, self.summary)
    }

    fn absorb(&mut self, cases: Vec<TestCase>, summary: Option<SummaryCounts>) {
        self.cases.extend(cases);
        self.summary = match (self.summary, summary) {
            (Some(a), Some(b)) => Some(a.merged(b)),
            (a, b) => a.or(b),
        };
    }

    /// Groups cases by owning class for detail rendering.
    ///
    /// Classes are ordered by name and cases by display name, both
    /// case-sensitively. With `show_passed_tests` false, passing cases are
    /// left out.
    pub fn class_groups(&self, show_passed_tests: bool) -> Vec<ClassGroup<'_>> {
        let mut groups: BTreeMap<&str, Vec<&TestCase>> = BTreeMap::new();
        for case in &self.cases {
            if !show_passed_tests && case.test_status == TestStatus::Success {
                continue;
            }
            groups.entry(case.class_name()).or_default().push(case);
        }
        groups
            .into_iter()
            .map(|(name, mut cases)| {
                cases.sort_by(|a, b| {
                    a.display_name()
                        .cmp(b.display_name())
                        .then_with(|| a.identifier.cmp(&b.identifier))
                });
                ClassGroup { name, cases }
            })
            .collect()
    }
}

/// `title`, else `"{command} {entity}"`, else `command`, else `"Tests"`.
pub fn chapter_title(action: &ActionRecord, entity_name: Option<&str>) -> String {
    if let Some(title) = action.title.as_deref().filter(|t| !t.trim().is_empty()) {
        return title.to_string();
    }
    let command = action
        .scheme_command_name
        .as_deref()
        .filter(|c| !c.trim().is_empty());
    match (command, entity_name) {
        (Some(command), Some(entity)) => format!("{command} {entity}"),
        (Some(command), None) => command.to_string(),
        (None, _) => FALLBACK_CHAPTER_TITLE.to_string(),
    }
}

/// `failure` if any case failed, `success` if any chapter has a non-empty
/// section, `neutral` otherwise.
pub fn overall_status(chapters: &[Chapter]) -> OverallStatus {
    let any_failed = chapters
        .iter()
        .flat_map(|c| &c.sections)
        .flat_map(|s| &s.cases)
        .any(|case| case.test_status == TestStatus::Failure);
    if any_failed {
        return OverallStatus::Failure;
    }
    if chapters
        .iter()
        .any(|c| c.sections.iter().any(|s| !s.is_empty()))
    {
        OverallStatus::Success
    } else {
        OverallStatus::Neutral
    }
}

/// Builds a [`Report`] from a result source.
pub struct Synthesizer<'a> {
    source: &'a dyn ResultSource,
    config: &'a ReportConfig,
    commit: Option<String>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(source: &'a dyn ResultSource, config: &'a ReportConfig) -> Self {
        Self {
            source,
            config,
            commit: None,
        }
    }

    /// Commit used to build coverage source links.
    #[must_use]
    pub fn with_commit(mut self, commit: Option<String>) -> Self {
        self.commit = commit.filter(|c| !c.trim().is_empty());
        self
    }

    /// Synthesizes the report. Never fails: any error becomes a degraded
    /// report with a `failure` status.
    pub fn synthesize(&self, skip_set: &SkippedTestSet) -> Report {
        match self.try_synthesize(skip_set) {
            Ok(report) => {
                info!(
                    "Synthesized {} chapters, {} tests, status {}",
                    report.chapters.len(),
                    report.statistics.total,
                    report.overall_status
                );
                report
            }
            Err(e) => {
                error!("Report synthesis failed: {}", e);
                Report::degraded(&self.config.title, &self.source.label(), e.to_string())
            }
        }
    }

    fn try_synthesize(&self, skip_set: &SkippedTestSet) -> Result<Report> {
        let invocation: InvocationRecord = serde_json::from_value(resolve(None, self.source)?)?;
        let metadata = self.metadata(&invocation)?;
        let entity_name = metadata.entity_name().map(str::to_string);

        let mut chapters = Vec::new();
        let mut code_coverage = None;
        for action in &invocation.actions {
            if let Some(tests_ref) = action.tests_ref() {
                chapters.push(self.chapter(action, tests_ref, entity_name.as_deref())?);
            }
            if self.config.show_code_coverage && action.has_coverage() && code_coverage.is_none() {
                code_coverage = self.coverage();
            }
        }

        let section_counts: Vec<SectionCounts> = chapters
            .iter()
            .flat_map(|c| &c.sections)
            .map(Section::counts)
            .collect();
        let authoritative = fetch_authoritative_counts(self.source);
        let statistics = reconcile(&ReconcileInput {
            sections: &section_counts,
            authoritative: authoritative.as_ref(),
            skip_set: Some(skip_set),
        });

        let skipped_tests = if !skip_set.is_empty() && statistics.skipped > 0 {
            skip_set.iter().map(str::to_string).collect()
        } else {
            Vec::new()
        };

        Ok(Report {
            title: self.config.title.clone(),
            source_label: self.source.label(),
            entity_name,
            workspace_path: metadata.creating_workspace_file_path.clone(),
            overall_status: overall_status(&chapters),
            chapters,
            code_coverage,
            statistics,
            skipped_tests,
            show_passed_tests: self.config.show_passed_tests,
            error: None,
        })
    }

    fn metadata(&self, invocation: &InvocationRecord) -> Result<InvocationMetadata> {
        let Some(id) = invocation.metadata_ref.as_ref().and_then(|r| r.id()) else {
            return Ok(InvocationMetadata::default());
        };
        let value = resolve(Some(id), self.source)?;
        Ok(serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Ignoring malformed invocation metadata: {}", e);
            InvocationMetadata::default()
        }))
    }

    fn chapter(
        &self,
        action: &ActionRecord,
        tests_ref: &str,
        entity_name: Option<&str>,
    ) -> Result<Chapter> {
        let summaries: TestPlanRunSummaries =
            serde_json::from_value(resolve(Some(tests_ref), self.source)?)?;

        let mut sections: Vec<Section> = Vec::new();
        for run in &summaries.summaries {
            for testable in &run.testable_summaries {
                let Some(name) = testable.section_name() else {
                    debug!("Skipping unnamed testable");
                    continue;
                };
                let mut cases = flatten(&testable.test_nodes()?);
                if self.config.resolve_failure_details {
                    self.attach_failure_details(&mut cases);
                }
                let summary = testable.summary_counts();
                match sections.iter_mut().find(|s| s.name == name) {
                    Some(existing) => existing.absorb(cases, summary),
                    None => sections.push(Section {
                        name: name.to_string(),
                        summary,
                        cases,
                    }),
                }
            }
        }

        let counts: Vec<SectionCounts> = sections.iter().map(Section::counts).collect();
        Ok(Chapter {
            title: chapter_title(action, entity_name),
            run_destination: action.run_destination.clone(),
            statistics: reconcile(&ReconcileInput::sections_only(&counts)),
            sections,
        })
    }

    /// Adopts failure summaries from `summaryRef` for failing cases that
    /// carry none inline.
    fn attach_failure_details(&self, cases: &mut [TestCase]) {
        for case in cases.iter_mut().filter(|c| {
            c.test_status == TestStatus::Failure && c.failure_summaries.is_empty()
        }) {
            let Some(id) = case.summary_ref.as_ref().and_then(|r| r.id()) else {
                continue;
            };
            let detail = match resolve(Some(id), self.source) {
                Ok(value) if is_empty_record(&value) => continue,
                Ok(value) => serde_json::from_value::<TestSummaryDetail>(value),
                Err(e) => {
                    debug!("No failure details for {}: {}", case.display_name(), e);
                    continue;
                }
            };
            match detail {
                Ok(detail) => case.failure_summaries = detail.failure_summaries,
                Err(e) => debug!("Malformed failure details for {}: {}", case.display_name(), e),
            }
        }
    }

    /// Fetches and transforms the coverage export; absent on any failure.
    fn coverage(&self) -> Option<CoverageNode> {
        let raw = match self.source.fetch_coverage() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Code coverage unavailable: {}", e);
                return None;
            }
        };
        match coverage::transform(&raw, &self.config.coverage_links, self.commit.as_deref()) {
            Ok(tree) => Some(tree),
            Err(e) => {
                warn!("Ignoring unreadable code coverage export: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FailureSummary;
    use crate::testing::fixtures::{self, SampleBundle};
    use crate::testing::{FetchRecord, StaticSource};
    use serde_json::json;
    use xcreport_proto::StatsSource;

    fn synthesize(source: &StaticSource) -> Report {
        Synthesizer::new(source, &ReportConfig::default()).synthesize(&SkippedTestSet::default())
    }

    fn case(identifier: &str, status: TestStatus) -> TestCase {
        TestCase {
            identifier: Some(identifier.to_string()),
            name: identifier.rsplit('/').next().map(str::to_string),
            test_status: status,
            ..TestCase::default()
        }
    }

    #[test]
    fn test_sample_bundle_synthesizes_chapter() {
        let report = synthesize(&SampleBundle::new().source());

        assert!(!report.is_degraded());
        assert_eq!(report.entity_name.as_deref(), Some("swift-sdk"));
        assert_eq!(report.chapters.len(), 1);

        let chapter = &report.chapters[0];
        assert_eq!(chapter.title, "Test swift-sdk");
        assert_eq!(chapter.sections.len(), 1);
        assert_eq!(chapter.sections[0].name, "UnitTests");
        assert_eq!(chapter.sections[0].cases.len(), 5);
        assert_eq!(chapter.statistics.passed, 2);
        assert_eq!(chapter.statistics.failed, 2);
        assert_eq!(chapter.statistics.skipped, 1);

        assert_eq!(report.statistics.total, 5);
        assert_eq!(report.statistics.source, StatsSource::Structural);
        assert_eq!(report.overall_status, OverallStatus::Failure);
        assert!(report.code_coverage.is_some());
    }

    #[test]
    fn test_failure_details_resolved_through_summary_ref() {
        let report = synthesize(&SampleBundle::new().source());
        let retry = report.chapters[0].sections[0]
            .cases
            .iter()
            .find(|c| c.display_name() == "testRetry()")
            .unwrap();
        assert_eq!(retry.failure_summaries.len(), 1);
        assert_eq!(retry.failure_summaries[0].message(), "timed out waiting for response");
        assert_eq!(retry.failure_summaries[0].location(), "Unknown location");
    }

    #[test]
    fn test_failure_details_not_resolved_when_disabled() {
        let source = SampleBundle::new().source();
        let config = ReportConfig {
            resolve_failure_details: false,
            ..ReportConfig::default()
        };
        Synthesizer::new(&source, &config).synthesize(&SkippedTestSet::default());
        assert!(
            !source
                .fetches()
                .contains(&FetchRecord::Record(Some("sum-1".to_string())))
        );
    }

    #[test]
    fn test_authoritative_counts_and_skip_list() {
        let source = SampleBundle::new().with_authoritative(5, 1).source();
        let skip_set: SkippedTestSet = ["ApiTests/testLegacy()", "AuthTests/testOld()"]
            .into_iter()
            .collect();
        let report =
            Synthesizer::new(&source, &ReportConfig::default()).synthesize(&skip_set);

        assert_eq!(report.statistics.total, 8);
        assert_eq!(report.statistics.passed, 5);
        assert_eq!(report.statistics.failed, 1);
        assert_eq!(report.statistics.skipped, 2);
        assert_eq!(
            report.skipped_tests,
            vec!["ApiTests/testLegacy", "AuthTests/testOld"]
        );
        // Chapter tables stay structural.
        assert_eq!(report.chapters[0].statistics.passed, 2);
    }

    #[test]
    fn test_coverage_omitted_when_hidden_or_missing() {
        let source = SampleBundle::new().source();
        let config = ReportConfig {
            show_code_coverage: false,
            ..ReportConfig::default()
        };
        let report = Synthesizer::new(&source, &config).synthesize(&SkippedTestSet::default());
        assert!(report.code_coverage.is_none());
        assert!(!source.fetches().contains(&FetchRecord::Coverage));

        let report = synthesize(&SampleBundle::new().without_coverage().source());
        assert!(!report.is_degraded());
        assert!(report.code_coverage.is_none());
    }

    #[test]
    fn test_empty_invocation_is_neutral() {
        let source = StaticSource::new().with_root(
            fixtures::object("ActionsInvocationRecord", vec![("actions", fixtures::array(vec![]))])
                .to_string(),
        );
        let report = synthesize(&source);
        assert!(report.chapters.is_empty());
        assert_eq!(report.overall_status, OverallStatus::Neutral);
        assert!(!report.is_degraded());
    }

    #[test]
    fn test_unavailable_root_is_neutral() {
        let report = synthesize(&StaticSource::new());
        assert!(report.chapters.is_empty());
        assert_eq!(report.overall_status, OverallStatus::Neutral);
    }

    #[test]
    fn test_malformed_root_degrades() {
        let report = synthesize(&StaticSource::new().with_root("not json at all"));
        assert!(report.is_degraded());
        assert_eq!(report.overall_status, OverallStatus::Failure);
        assert!(report.chapters.is_empty());

        let report = synthesize(&StaticSource::new().with_root(r#"{"actions": 5}"#));
        assert!(report.is_degraded());
    }

    #[test]
    fn test_chapter_title_fallbacks() {
        let mut action = ActionRecord {
            title: Some("Run Unit Tests".to_string()),
            scheme_command_name: Some("Test".to_string()),
            ..ActionRecord::default()
        };
        assert_eq!(chapter_title(&action, Some("swift-sdk")), "Run Unit Tests");

        action.title = None;
        assert_eq!(chapter_title(&action, Some("swift-sdk")), "Test swift-sdk");
        assert_eq!(chapter_title(&action, None), "Test");

        action.scheme_command_name = None;
        assert_eq!(chapter_title(&action, Some("swift-sdk")), "Tests");
    }

    #[test]
    fn test_sections_keep_first_seen_order_and_merge() {
        let tests = fixtures::object(
            "ActionTestPlanRunSummaries",
            vec![(
                "summaries",
                fixtures::array(vec![
                    fixtures::object(
                        "ActionTestPlanRunSummary",
                        vec![(
                            "testableSummaries",
                            fixtures::array(vec![
                                json!({ "name": { "_value": "ZetaTests" }, "tests": { "_values": [] } }),
                                json!({ "name": { "_value": "AlphaTests" }, "tests": { "_values": [] } }),
                            ]),
                        )],
                    ),
                    fixtures::object(
                        "ActionTestPlanRunSummary",
                        vec![(
                            "testableSummaries",
                            fixtures::array(vec![json!({
                                "name": { "_value": "ZetaTests" },
                                "tests": { "_values": [
                                    fixtures::test_case("ZetaTests/ZTests/testOne()", "Success", 0.1)
                                ] }
                            })]),
                        )],
                    ),
                ]),
            )],
        );
        let root = fixtures::object(
            "ActionsInvocationRecord",
            vec![(
                "actions",
                fixtures::array(vec![fixtures::object(
                    "ActionRecord",
                    vec![(
                        "actionResult",
                        fixtures::object(
                            "ActionResult",
                            vec![("testsRef", fixtures::reference("tests"))],
                        ),
                    )],
                )]),
            )],
        );
        let source = StaticSource::new()
            .with_root(root.to_string())
            .with_record("tests", tests.to_string());

        let report = synthesize(&source);
        let chapter = &report.chapters[0];
        let names: Vec<_> = chapter.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["ZetaTests", "AlphaTests"]);
        assert_eq!(chapter.sections[0].cases.len(), 1);
        assert_eq!(chapter.title, "Tests");
        assert_eq!(report.overall_status, OverallStatus::Success);
    }

    #[test]
    fn test_class_groups_sorted_and_filtered() {
        let section = Section {
            name: "UnitTests".to_string(),
            summary: None,
            cases: vec![
                case("UnitTests/bTests/testB()", TestStatus::Success),
                case("UnitTests/ZTests/testZ()", TestStatus::Failure),
                case("UnitTests/ATests/testb()", TestStatus::Success),
                case("UnitTests/ATests/testC()", TestStatus::Failure),
                case("loose()", TestStatus::Skipped),
            ],
        };

        let groups = section.class_groups(true);
        let names: Vec<_> = groups.iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["ATests", "Tests", "ZTests", "bTests"]);
        let a_tests: Vec<_> = groups[0].cases.iter().map(|c| c.display_name()).collect();
        assert_eq!(a_tests, vec!["testC()", "testb()"]);

        let failing_only = section.class_groups(false);
        let names: Vec<_> = failing_only.iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["ATests", "Tests", "ZTests"]);
    }

    #[test]
    fn test_overall_status_failure_from_any_case() {
        let chapter = |cases: Vec<TestCase>| Chapter {
            title: "Tests".to_string(),
            run_destination: RunDestination::default(),
            sections: vec![Section {
                name: "UnitTests".to_string(),
                summary: None,
                cases,
            }],
            statistics: Statistics::default(),
        };

        let mut failing = case("A/testA()", TestStatus::Failure);
        failing.failure_summaries.push(FailureSummary {
            message: Some("assert false".to_string()),
            file_name: Some("A.swift".to_string()),
            line_number: Some(12),
        });
        assert_eq!(
            overall_status(&[chapter(vec![case("A/ok()", TestStatus::Success)]), chapter(vec![failing])]),
            OverallStatus::Failure
        );
        assert_eq!(
            overall_status(&[chapter(vec![case("A/ok()", TestStatus::Success)])]),
            OverallStatus::Success
        );
        assert_eq!(overall_status(&[chapter(vec![])]), OverallStatus::Neutral);
    }

    #[test]
    fn test_failed_cases_iterates_failures_only() {
        let report = synthesize(&SampleBundle::new().source());
        let failed: Vec<_> = report
            .failed_cases()
            .map(|(_, _, case)| case.display_name())
            .collect();
        assert_eq!(failed, vec!["testLogout()", "testRetry()"]);
    }
}
