//! End-to-end synthesis against in-memory and on-disk result sources.

use serde_json::json;
use tempfile::TempDir;
use xcreport_core::testing::fixtures::{self, SampleBundle};
use xcreport_core::testing::StaticSource;
use xcreport_core::{
    DirectorySource, HtmlRenderer, JsonRenderer, ReportConfig, SkippedTestSet, Synthesizer,
    normalize,
};
use xcreport_proto::{OverallStatus, StatsSource};

fn counted_testable_source(failures: serde_json::Value) -> StaticSource {
    let root = fixtures::object(
        "ActionsInvocationRecord",
        vec![(
            "actions",
            fixtures::array(vec![fixtures::object(
                "ActionRecord",
                vec![
                    ("title", fixtures::string("Run unit tests")),
                    (
                        "actionResult",
                        fixtures::object(
                            "ActionResult",
                            vec![("testsRef", fixtures::reference("tests"))],
                        ),
                    ),
                ],
            )]),
        )],
    );
    let tests = fixtures::object(
        "ActionTestPlanRunSummaries",
        vec![(
            "summaries",
            fixtures::array(vec![fixtures::object(
                "ActionTestPlanRunSummary",
                vec![(
                    "testableSummaries",
                    fixtures::array(vec![fixtures::object(
                        "ActionTestableSummary",
                        vec![
                            ("name", fixtures::string("UnitTests")),
                            ("tests", fixtures::int(10)),
                            ("failures", failures),
                            ("skippedTests", fixtures::int(1)),
                            ("duration", fixtures::double(3.5)),
                        ],
                    )]),
                )],
            )]),
        )],
    );
    StaticSource::new()
        .with_root(root.to_string())
        .with_record("tests", tests.to_string())
}

#[test]
fn test_malformed_int_scalar_normalizes_to_zero() {
    let value = normalize(&json!({
        "count": { "_type": { "_name": "Int" }, "_value": "abc" }
    }));
    assert_eq!(value, json!({ "count": 0 }));
}

#[test]
fn test_summary_counts_back_fill_passed() {
    let source = counted_testable_source(fixtures::int(2));
    let report = Synthesizer::new(&source, &ReportConfig::default())
        .synthesize(&SkippedTestSet::default());

    let stats = &report.statistics;
    assert_eq!(
        (stats.total, stats.passed, stats.failed, stats.skipped),
        (10, 7, 2, 1)
    );
    assert_eq!(stats.source, StatsSource::SectionSummary);
    assert!((stats.duration_seconds - 3.5).abs() < f64::EPSILON);
    assert_eq!(report.chapters[0].title, "Run unit tests");
    assert_eq!(report.overall_status, OverallStatus::Success);
}

#[test]
fn test_summary_counts_accept_one_element_lists() {
    let source = counted_testable_source(json!({ "_values": [ { "_value": "2" } ] }));
    let report = Synthesizer::new(&source, &ReportConfig::default())
        .synthesize(&SkippedTestSet::default());
    assert_eq!(report.statistics.failed, 2);
    assert_eq!(report.statistics.passed, 7);
}

#[test]
fn test_authoritative_counts_override_everything() {
    let source = SampleBundle::new().with_authoritative(5, 1).source();
    let skip_set: SkippedTestSet = ["A/one()", "B/two()"].into_iter().collect();
    let report = Synthesizer::new(&source, &ReportConfig::default()).synthesize(&skip_set);

    let stats = &report.statistics;
    assert_eq!(
        (stats.total, stats.passed, stats.failed, stats.skipped),
        (8, 5, 1, 2)
    );
    assert_eq!(report.skipped_tests, vec!["A/one", "B/two"]);
}

#[test]
fn test_huge_authoritative_counts_still_render() {
    let source = SampleBundle::new().with_authoritative(u64::MAX, 1).source();
    let report = Synthesizer::new(&source, &ReportConfig::default())
        .synthesize(&SkippedTestSet::default());

    assert!(!report.is_degraded());
    assert_eq!(report.statistics.total, u64::MAX);
    let stats = JsonRenderer::new().statistics(&report).unwrap();
    assert!(stats.contains(&format!("\"total_tests\": {}", u64::MAX)));
    assert!(HtmlRenderer::new().document(&report).contains("<h2>Summary</h2>"));
}

#[test]
fn test_failing_leaf_renders_location_and_fails_report() {
    let source = SampleBundle::new().source();
    let report = Synthesizer::new(&source, &ReportConfig::default())
        .synthesize(&SkippedTestSet::default());

    assert_eq!(report.overall_status, OverallStatus::Failure);
    let detail = HtmlRenderer::new().detail_fragment(&report);
    assert!(detail.contains("assert false"));
    assert!(detail.contains("A.swift:12"));
}

#[test]
fn test_empty_invocation_is_neutral() {
    let source = StaticSource::new().with_root(
        fixtures::object("ActionsInvocationRecord", vec![]).to_string(),
    );
    let report = Synthesizer::new(&source, &ReportConfig::default())
        .synthesize(&SkippedTestSet::default());
    assert!(report.chapters.is_empty());
    assert_eq!(report.overall_status, OverallStatus::Neutral);
}

#[test]
fn test_directory_source_matches_in_memory_source() {
    let tmp = TempDir::new().unwrap();
    let bundle = SampleBundle::new().with_authoritative(4, 2);
    bundle.write_to(tmp.path()).unwrap();

    let config = ReportConfig::default();
    let from_disk = Synthesizer::new(&DirectorySource::new(tmp.path()), &config)
        .synthesize(&SkippedTestSet::default());
    let in_memory =
        Synthesizer::new(&bundle.source(), &config).synthesize(&SkippedTestSet::default());

    assert_eq!(from_disk.chapters, in_memory.chapters);
    assert_eq!(from_disk.statistics, in_memory.statistics);
    assert_eq!(
        HtmlRenderer::new().detail_fragment(&from_disk),
        HtmlRenderer::new().detail_fragment(&in_memory)
    );

    let stats = JsonRenderer::new().statistics(&from_disk).unwrap();
    assert!(stats.contains("\"passed_tests\": 4"));
}
