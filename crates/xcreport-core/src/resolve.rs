//! Reference resolution: fetch a record and normalize it.

use crate::normalize::normalize;
use crate::source::ResultSource;
use serde_json::{Map, Value};
use tracing::warn;
use xcreport_proto::Result;

/// Fetches the record behind `reference` (the root record for `None`) and
/// normalizes it.
///
/// A failed fetch yields an empty object: callers treat that as "no data
/// available". Text that was fetched but is not JSON is an error.
pub fn resolve(reference: Option<&str>, source: &dyn ResultSource) -> Result<Value> {
    let text = match source.fetch_record(reference) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                "Could not fetch record {}: {}",
                reference.unwrap_or("<root>"),
                e
            );
            return Ok(Value::Object(Map::new()));
        }
    };

    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let raw: Value = serde_json::from_str(&text)?;
    Ok(normalize(&raw))
}

/// Returns true for the empty object a failed resolution produces.
pub fn is_empty_record(value: &Value) -> bool {
    value.as_object().is_some_and(Map::is_empty)
}
