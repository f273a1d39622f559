//! Intentionally skipped tests declared by an Xcode test plan.
//!
//! A test plan (`*.xctestplan`) lists, per test target, identifiers that the
//! plan never runs:
//!
//! ```json
//! { "testTargets": [ { "target": { "name": "unit-tests" },
//!                      "skippedTests": [ "AuthTests/testLegacy()" ] } ] }
//! ```

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while reading a test plan.
#[derive(Debug, Error)]
pub enum SkipListError {
    #[error("failed to read test plan: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse test plan: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TestPlanDocument {
    test_targets: Vec<TestPlanTarget>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TestPlanTarget {
    target: TargetRef,
    skipped_tests: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TargetRef {
    name: Option<String>,
}

/// Membership set of skipped test identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkippedTestSet {
    by_target: BTreeMap<String, Vec<String>>,
    all: BTreeSet<String>,
}

impl SkippedTestSet {
    /// Parses a test plan document.
    pub fn from_test_plan_json(text: &str) -> Result<Self, SkipListError> {
        let plan: TestPlanDocument = serde_json::from_str(text)?;
        let mut set = Self::default();
        for target in plan.test_targets {
            let name = target.target.name.unwrap_or_else(|| "Tests".to_string());
            let identifiers: Vec<String> = target
                .skipped_tests
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(strip_call_parens)
                .filter(|id| !id.is_empty())
                .collect();
            set.insert_target(&name, identifiers);
        }
        Ok(set)
    }

    /// Loads the test plan at `path`. A missing path yields an empty set; an
    /// unreadable or malformed plan is logged and yields an empty set.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        let result = std::fs::read_to_string(path)
            .map_err(SkipListError::from)
            .and_then(|text| Self::from_test_plan_json(&text));
        match result {
            Ok(set) => {
                debug!(
                    "Loaded {} skipped tests across {} targets from {}",
                    set.len(),
                    set.by_target.len(),
                    path.display()
                );
                set
            }
            Err(e) => {
                warn!("Ignoring test plan {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Adds a target's ordered skip list.
    pub fn insert_target(&mut self, target: &str, identifiers: Vec<String>) {
        self.all.extend(identifiers.iter().cloned());
        self.by_target
            .entry(target.to_string())
            .or_default()
            .extend(identifiers);
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.all.contains(strip_call_parens(identifier).as_str())
    }

    /// Identifiers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.all.iter().map(String::as_str)
    }

    /// Per-target lists in declaration order.
    pub fn targets(&self) -> &BTreeMap<String, Vec<String>> {
        &self.by_target
    }
}

impl<S: Into<String>> FromIterator<S> for SkippedTestSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::default();
        let identifiers = iter
            .into_iter()
            .map(|id| strip_call_parens(&id.into()))
            .collect();
        set.insert_target("Tests", identifiers);
        set
    }
}

/// `"AuthTests/testLogin()"` → `"AuthTests/testLogin"`.
pub fn strip_call_parens(identifier: &str) -> String {
    let trimmed = identifier.trim();
    trimmed.strip_suffix("()").unwrap_or(trimmed).to_string()
}
