//! Typed views over normalized result bundle records.
//!
//! Normalized values are plain JSON, so every record here is a `serde`
//! projection with defaults for anything the bundle may omit. Numeric fields
//! accept either numbers or numeric strings.

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;
use xcreport_proto::TestStatus;

/// Pointer to another record, resolved through a `ResultSource`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    pub id: String,
}

impl Reference {
    /// The id, unless it is blank.
    pub fn id(&self) -> Option<&str> {
        let id = self.id.trim();
        (!id.is_empty()).then_some(id)
    }
}

/// Root record of a result bundle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationRecord {
    pub metadata_ref: Option<Reference>,
    pub actions: Vec<ActionRecord>,
}

/// One action (build, test, ...) of the invocation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionRecord {
    pub title: Option<String>,
    pub scheme_command_name: Option<String>,
    pub run_destination: RunDestination,
    pub action_result: ActionResult,
}

impl ActionRecord {
    /// Reference to the action's test plan summaries, when it ran tests.
    pub fn tests_ref(&self) -> Option<&str> {
        self.action_result.tests_ref.as_ref().and_then(Reference::id)
    }

    /// Whether the action recorded code coverage.
    pub fn has_coverage(&self) -> bool {
        self.action_result
            .coverage
            .as_ref()
            .is_some_and(|c| !c.is_null())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionResult {
    pub tests_ref: Option<Reference>,
    pub coverage: Option<Value>,
}

/// Device, OS and architecture an action ran on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunDestination {
    pub display_name: Option<String>,
    pub target_architecture: Option<String>,
    pub target_device_record: Option<DeviceRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceRecord {
    pub name: Option<String>,
    pub model_name: Option<String>,
    pub operating_system_version: Option<String>,
    pub platform_record: Option<PlatformRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformRecord {
    pub user_description: Option<String>,
}

/// Invocation metadata (scheme, workspace).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationMetadata {
    pub scheme_identifier: Option<SchemeIdentifier>,
    pub creating_workspace_file_path: Option<String>,
}

impl InvocationMetadata {
    pub fn entity_name(&self) -> Option<&str> {
        self.scheme_identifier
            .as_ref()
            .and_then(|s| s.entity_name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemeIdentifier {
    pub entity_name: Option<String>,
}

/// Everything a test action's `testsRef` points at.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TestPlanRunSummaries {
    pub summaries: Vec<TestPlanRunSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestPlanRunSummary {
    pub name: Option<String>,
    pub testable_summaries: Vec<TestableSummary>,
}

/// One testable (test bundle) within a test plan run.
///
/// `tests` is normally the list of test nodes, but some tool versions put a
/// count there instead, alongside `failures` and `skippedTests`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestableSummary {
    pub name: Option<String>,
    pub target_name: Option<String>,
    pub tests: Value,
    pub failures: Option<Value>,
    pub skipped_tests: Option<Value>,
    pub duration: Option<Value>,
}

/// Counts a testable reported about itself.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SummaryCounts {
    pub tests: u64,
    pub failures: u64,
    pub skipped: u64,
    pub duration_seconds: Option<f64>,
}

impl SummaryCounts {
    /// Combines counts of two runs of the same testable.
    pub fn merged(self, other: SummaryCounts) -> SummaryCounts {
        let duration_seconds = match (self.duration_seconds, other.duration_seconds) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
        };
        SummaryCounts {
            tests: self.tests.saturating_add(other.tests),
            failures: self.failures.saturating_add(other.failures),
            skipped: self.skipped.saturating_add(other.skipped),
            duration_seconds,
        }
    }
}

impl TestableSummary {
    /// Section name, ignoring blanks.
    pub fn section_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// The test tree, unless `tests` carries a count.
    pub fn test_nodes(&self) -> Result<Vec<TestNode>, serde_json::Error> {
        match &self.tests {
            Value::Array(items) if count_value(&self.tests).is_none() => items
                .iter()
                .filter(|item| item.is_object())
                .map(|item| TestNode::deserialize(item.clone()))
                .collect(),
            _ => Ok(Vec::new()),
        }
    }

    /// Embedded counts, present only when `tests` is itself a count.
    pub fn summary_counts(&self) -> Option<SummaryCounts> {
        let tests = count_value(&self.tests)?;
        Some(SummaryCounts {
            tests,
            failures: self.failures.as_ref().and_then(count_value).unwrap_or(0),
            skipped: self.skipped_tests.as_ref().and_then(count_value).unwrap_or(0),
            duration_seconds: self.duration.as_ref().map(|d| seconds_value(d).unwrap_or(0.0)),
        })
    }
}

/// A count that may be a scalar or a one-element list wrapping a scalar.
pub fn count_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.trunc() as u64)
            })
        }
        Value::Array(items) if items.len() == 1 => match &items[0] {
            Value::Object(map) if map.len() == 1 => map.get("_value").and_then(count_value),
            Value::Object(_) => None,
            other => count_value(other),
        },
        _ => None,
    }
}

/// Seconds as a float from a number or numeric string.
pub fn seconds_value(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    seconds.filter(|s| s.is_finite())
}

/// A node in the recursive test hierarchy: a group with subtests, or a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum TestNode {
    Group(TestGroup),
    Case(TestCase),
}

impl<'de> Deserialize<'de> for TestNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.get("subtests").is_some() {
            TestGroup::deserialize(value)
                .map(TestNode::Group)
                .map_err(D::Error::custom)
        } else {
            TestCase::deserialize(value)
                .map(TestNode::Case)
                .map_err(D::Error::custom)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TestGroup {
    pub name: Option<String>,
    pub identifier: Option<String>,
    pub subtests: Vec<TestNode>,
}

/// A leaf test case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestCase {
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub test_status: TestStatus,
    #[serde(deserialize_with = "lenient_seconds")]
    pub duration: f64,
    pub failure_summaries: Vec<FailureSummary>,
    pub summary_ref: Option<Reference>,
}

impl TestCase {
    pub const DEFAULT_CLASS: &'static str = "Tests";

    /// Owning class: the second-to-last segment of the slash-delimited
    /// identifier.
    pub fn class_name(&self) -> &str {
        self.identifier
            .as_deref()
            .and_then(|id| {
                let parts: Vec<&str> = id.split('/').collect();
                (parts.len() >= 2).then(|| parts[parts.len() - 2])
            })
            .filter(|class| !class.is_empty())
            .unwrap_or(Self::DEFAULT_CLASS)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown Test")
    }
}

/// One recorded failure of a test case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FailureSummary {
    pub message: Option<String>,
    pub file_name: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub line_number: Option<u64>,
}

impl FailureSummary {
    /// `"<file>:<line>"`, or `"Unknown location"` when either is missing.
    pub fn location(&self) -> String {
        match (self.file_name.as_deref(), self.line_number) {
            (Some(file), Some(line)) if !file.is_empty() && line > 0 => {
                format!("{file}:{line}")
            }
            _ => "Unknown location".to_string(),
        }
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("Unknown failure")
    }
}

/// Record a test's `summaryRef` points at.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestSummaryDetail {
    pub failure_summaries: Vec<FailureSummary>,
}

fn lenient_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(seconds_value(&value).filter(|s| *s >= 0.0).unwrap_or(0.0))
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(count_value(&value))
}
