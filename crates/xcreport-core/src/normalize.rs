//! Normalization of the result bundle's self-describing JSON.
//!
//! `xcresulttool` emits every value wrapped in a tagged envelope:
//!
//! ```text
//! { "_type": { "_name": "Int" }, "_value": "42" }          scalar
//! { "_type": { "_name": "Array" }, "_values": [ ... ] }     sequence
//! { "_type": { "_name": "ActionRecord" }, "title": ... }    object
//! ```
//!
//! [`normalize`] strips the envelopes and returns plain JSON: objects,
//! arrays, numbers, strings, booleans and null. It never fails; shapes it
//! does not recognise pass through unchanged and malformed numeric literals
//! degrade to zero.

use serde_json::{Map, Value};
use tracing::debug;

const SCALAR_KEY: &str = "_value";
const SEQUENCE_KEY: &str = "_values";
const TYPE_KEY: &str = "_type";
const TYPE_NAME_KEY: &str = "_name";

/// A borrowed view of one node in the tagged wire format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawNode<'a> {
    /// Literal value with an optional declared type (`Int`, `Double`, ...).
    Scalar {
        value: &'a Value,
        type_name: Option<&'a str>,
    },
    /// Ordered list of record nodes.
    Sequence(&'a [Value]),
    /// Mapping whose values are themselves nodes.
    Object(&'a Map<String, Value>),
    /// Anything that carries no envelope.
    Plain(&'a Value),
}

impl<'a> RawNode<'a> {
    /// Classifies a JSON value by the marker keys it carries.
    pub fn classify(value: &'a Value) -> Self {
        let Value::Object(map) = value else {
            return RawNode::Plain(value);
        };

        if let Some(scalar) = map.get(SCALAR_KEY) {
            let type_name = map
                .get(TYPE_KEY)
                .and_then(|t| t.get(TYPE_NAME_KEY))
                .and_then(Value::as_str);
            return RawNode::Scalar {
                value: scalar,
                type_name,
            };
        }

        if let Some(Value::Array(items)) = map.get(SEQUENCE_KEY) {
            return RawNode::Sequence(items);
        }

        RawNode::Object(map)
    }
}

/// Converts a tagged node (and everything beneath it) into plain JSON.
///
/// Normalizing an already-normalized value returns it unchanged.
pub fn normalize(value: &Value) -> Value {
    match RawNode::classify(value) {
        RawNode::Scalar { value, type_name } => coerce_scalar(value, type_name),
        RawNode::Sequence(items) => normalize_sequence(items),
        RawNode::Object(map) => Value::Object(normalize_fields(map, false)),
        RawNode::Plain(value) => value.clone(),
    }
}

/// Every element of a sequence is a record. Inside an element a bare `_value`
/// envelope key is dropped rather than recursed.
fn normalize_sequence(items: &[Value]) -> Value {
    Value::Array(
        items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Value::Object(normalize_fields(map, true)),
                other => normalize(other),
            })
            .collect(),
    )
}

fn normalize_fields(map: &Map<String, Value>, in_sequence: bool) -> Map<String, Value> {
    let mut out = Map::with_capacity(map.len());
    for (key, child) in map {
        if key == TYPE_KEY {
            continue;
        }
        if in_sequence && key == SCALAR_KEY && child.is_object() {
            continue;
        }
        let normalized = if child.is_object() {
            normalize(child)
        } else {
            child.clone()
        };
        out.insert(key.clone(), normalized);
    }
    out
}

/// Applies the declared scalar type. `Int` and `Double` literals that do not
/// parse become `0` / `0.0`; every other type passes the literal through.
pub fn coerce_scalar(value: &Value, type_name: Option<&str>) -> Value {
    match type_name {
        Some("Int") => Value::from(parse_int(value).unwrap_or_else(|| {
            debug!("Int scalar {} did not parse, using 0", value);
            0
        })),
        Some("Double") => Value::from(parse_double(value).unwrap_or_else(|| {
            debug!("Double scalar {} did not parse, using 0.0", value);
            0.0
        })),
        _ => normalize(value),
    }
}

fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn parse_double(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}
