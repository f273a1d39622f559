//! Tagged-JSON fixtures shaped like `xcresulttool --legacy` output.

use super::StaticSource;
use crate::source::DirectorySource;
use serde_json::{Map, Value, json};
use std::path::Path;

/// Typed scalar node.
pub fn scalar(type_name: &str, value: impl ToString) -> Value {
    json!({ "_type": { "_name": type_name }, "_value": value.to_string() })
}

pub fn string(value: &str) -> Value {
    scalar("String", value)
}

pub fn int(value: u64) -> Value {
    scalar("Int", value)
}

pub fn double(value: f64) -> Value {
    scalar("Double", value)
}

/// Sequence node.
pub fn array(items: Vec<Value>) -> Value {
    json!({ "_type": { "_name": "Array" }, "_values": items })
}

/// Object node with a type tag.
pub fn object(type_name: &str, fields: Vec<(&str, Value)>) -> Value {
    let mut map = Map::new();
    map.insert("_type".to_string(), json!({ "_name": type_name }));
    for (key, value) in fields {
        map.insert(key.to_string(), value);
    }
    Value::Object(map)
}

pub fn reference(id: &str) -> Value {
    object("Reference", vec![("id", string(id))])
}

/// Leaf test node.
pub fn test_case(identifier: &str, status: &str, duration: f64) -> Value {
    let name = identifier.rsplit('/').next().unwrap_or(identifier);
    object(
        "ActionTestMetadata",
        vec![
            ("identifier", string(identifier)),
            ("name", string(name)),
            ("testStatus", string(status)),
            ("duration", double(duration)),
        ],
    )
}

/// Leaf test node with inline failure summaries.
pub fn failing_case(identifier: &str, duration: f64, failures: Vec<Value>) -> Value {
    let mut case = test_case(identifier, "Failure", duration);
    if let Value::Object(map) = &mut case {
        map.insert("failureSummaries".to_string(), array(failures));
    }
    case
}

/// Leaf test node whose details live behind `summaryRef`.
pub fn referenced_case(identifier: &str, status: &str, duration: f64, summary_ref: &str) -> Value {
    let mut case = test_case(identifier, status, duration);
    if let Value::Object(map) = &mut case {
        map.insert("summaryRef".to_string(), reference(summary_ref));
    }
    case
}

pub fn failure(message: &str, file: Option<&str>, line: Option<u64>) -> Value {
    let mut fields = vec![("message", string(message))];
    if let Some(file) = file {
        fields.push(("fileName", string(file)));
    }
    if let Some(line) = line {
        fields.push(("lineNumber", int(line)));
    }
    object("ActionTestFailureSummary", fields)
}

pub fn test_group(name: &str, subtests: Vec<Value>) -> Value {
    object(
        "ActionTestSummaryGroup",
        vec![("name", string(name)), ("subtests", array(subtests))],
    )
}

/// A result bundle: documents keyed by reference (`None` for the root),
/// plus the optional coverage export and summary document.
#[derive(Debug, Clone)]
pub struct SampleBundle {
    pub records: Vec<(Option<String>, Value)>,
    pub coverage: Option<Value>,
    pub summary: Option<Value>,
}

impl SampleBundle {
    /// One test action with a `UnitTests` section: two passes, two
    /// failures (one inline, one behind `summaryRef`) and one skip, plus a
    /// coverage export.
    pub fn new() -> Self {
        let root = object(
            "ActionsInvocationRecord",
            vec![
                ("metadataRef", reference("meta-1")),
                (
                    "actions",
                    array(vec![object(
                        "ActionRecord",
                        vec![
                            ("schemeCommandName", string("Test")),
                            (
                                "runDestination",
                                object(
                                    "ActionRunDestinationRecord",
                                    vec![
                                        ("displayName", string("iPhone 15")),
                                        ("targetArchitecture", string("arm64")),
                                        (
                                            "targetDeviceRecord",
                                            object(
                                                "ActionDeviceRecord",
                                                vec![
                                                    ("modelName", string("iPhone 15")),
                                                    ("operatingSystemVersion", string("17.5")),
                                                ],
                                            ),
                                        ),
                                    ],
                                ),
                            ),
                            (
                                "actionResult",
                                object(
                                    "ActionResult",
                                    vec![
                                        ("testsRef", reference("tests-1")),
                                        (
                                            "coverage",
                                            object(
                                                "CodeCoverageInfo",
                                                vec![("hasCoverageData", scalar("Bool", true))],
                                            ),
                                        ),
                                    ],
                                ),
                            ),
                        ],
                    )]),
                ),
            ],
        );

        let metadata = object(
            "ActionsInvocationMetadata",
            vec![
                (
                    "schemeIdentifier",
                    object("EntityIdentifier", vec![("entityName", string("swift-sdk"))]),
                ),
                (
                    "creatingWorkspaceFilePath",
                    string("/Users/runner/work/swift-sdk/swift-sdk/swift-sdk.xcodeproj"),
                ),
            ],
        );

        let tests = object(
            "ActionTestPlanRunSummaries",
            vec![(
                "summaries",
                array(vec![object(
                    "ActionTestPlanRunSummary",
                    vec![
                        ("name", string("Test Scheme Action")),
                        (
                            "testableSummaries",
                            array(vec![object(
                                "ActionTestableSummary",
                                vec![
                                    ("name", string("UnitTests")),
                                    ("targetName", string("unit-tests")),
                                    (
                                        "tests",
                                        array(vec![test_group(
                                            "All tests",
                                            vec![test_group(
                                                "UnitTests.xctest",
                                                vec![
                                                    test_group(
                                                        "AuthTests",
                                                        vec![
                                                            test_case(
                                                                "UnitTests/AuthTests/testLogin()",
                                                                "Success",
                                                                0.5,
                                                            ),
                                                            failing_case(
                                                                "UnitTests/AuthTests/testLogout()",
                                                                1.25,
                                                                vec![failure(
                                                                    "assert false",
                                                                    Some("A.swift"),
                                                                    Some(12),
                                                                )],
                                                            ),
                                                        ],
                                                    ),
                                                    test_group(
                                                        "ApiTests",
                                                        vec![
                                                            test_case(
                                                                "UnitTests/ApiTests/testFetch()",
                                                                "Success",
                                                                0.25,
                                                            ),
                                                            referenced_case(
                                                                "UnitTests/ApiTests/testRetry()",
                                                                "Failure",
                                                                0.75,
                                                                "sum-1",
                                                            ),
                                                            test_case(
                                                                "UnitTests/ApiTests/testLegacy()",
                                                                "Skipped",
                                                                0.0,
                                                            ),
                                                        ],
                                                    ),
                                                ],
                                            )],
                                        )]),
                                    ),
                                ],
                            )]),
                        ),
                    ],
                )]),
            )],
        );

        let retry_summary = object(
            "ActionTestSummary",
            vec![(
                "failureSummaries",
                array(vec![failure("timed out waiting for response", None, None)]),
            )],
        );

        let coverage = json!({
            "coveredLines": 30,
            "executableLines": 60,
            "lineCoverage": 0.5,
            "targets": [
                {
                    "name": "swift-sdk.framework",
                    "coveredLines": 30,
                    "executableLines": 60,
                    "files": [
                        {
                            "name": "IterableAPI.swift",
                            "path": "/Users/runner/work/swift-sdk/swift-sdk/swift-sdk/SDK/IterableAPI.swift",
                            "coveredLines": 30,
                            "executableLines": 60
                        },
                        {
                            "name": "Constants.swift",
                            "path": "/Users/runner/work/swift-sdk/swift-sdk/swift-sdk/SDK/Constants.swift",
                            "coveredLines": 0,
                            "executableLines": 0
                        }
                    ]
                },
                { "name": "EmptyHeaders.framework", "coveredLines": 0, "executableLines": 0 }
            ]
        });

        Self {
            records: vec![
                (None, root),
                (Some("meta-1".to_string()), metadata),
                (Some("tests-1".to_string()), tests),
                (Some("sum-1".to_string()), retry_summary),
            ],
            coverage: Some(coverage),
            summary: None,
        }
    }

    /// Adds an authoritative summary document.
    pub fn with_authoritative(mut self, passed: u64, failed: u64) -> Self {
        self.summary = Some(json!({
            "title": "Test - swift-sdk",
            "result": if failed > 0 { "Failed" } else { "Passed" },
            "totalTestCount": passed.saturating_add(failed),
            "passedTests": passed,
            "failedTests": failed,
            "skippedTests": 0,
            "expectedFailures": 0,
            "startTime": 1_700_000_000.0,
            "finishTime": 1_700_000_042.5
        }));
        self
    }

    pub fn without_coverage(mut self) -> Self {
        self.coverage = None;
        self
    }

    /// Serves the bundle from memory.
    pub fn source(&self) -> StaticSource {
        let mut source = StaticSource::new();
        for (reference, record) in &self.records {
            source = match reference {
                None => source.with_root(record.to_string()),
                Some(id) => source.with_record(id, record.to_string()),
            };
        }
        if let Some(coverage) = &self.coverage {
            source = source.with_coverage(coverage.to_string());
        }
        if let Some(summary) = &self.summary {
            source = source.with_summary(summary.to_string());
        }
        source
    }

    /// Writes the bundle in the layout `DirectorySource` reads.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<()> {
        for (reference, record) in &self.records {
            let name = match reference {
                None => DirectorySource::ROOT_RECORD.to_string(),
                Some(id) => DirectorySource::reference_file_name(id),
            };
            std::fs::write(dir.join(name), record.to_string())?;
        }
        if let Some(coverage) = &self.coverage {
            std::fs::write(dir.join(DirectorySource::COVERAGE), coverage.to_string())?;
        }
        if let Some(summary) = &self.summary {
            std::fs::write(dir.join(DirectorySource::SUMMARY), summary.to_string())?;
        }
        Ok(())
    }
}

impl Default for SampleBundle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn test_fixture_case_normalizes_to_plain_record() {
        let case = normalize(&test_case("A/B/testC()", "Success", 0.5));
        assert_eq!(
            case,
            json!({
                "identifier": "A/B/testC()",
                "name": "testC()",
                "testStatus": "Success",
                "duration": 0.5
            })
        );
    }

    #[test]
    fn test_sample_bundle_round_trips_through_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        SampleBundle::new().write_to(tmp.path()).unwrap();
        assert!(tmp.path().join("root.json").is_file());
        assert!(tmp.path().join("tests-1.json").is_file());
        assert!(tmp.path().join("coverage.json").is_file());
        assert!(!tmp.path().join("summary.json").exists());
    }
}
