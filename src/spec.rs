//! Boundary types for nested parameter specs.
//!
//! A spec entry is either a *leaf spec* (a mapping with a `type` field and a
//! `value` field) or a *group spec* (a mapping of further specs, with no
//! `type` field at its level). The shape dispatch happens here, once, so the
//! tree builder only ever sees an explicit [`ParamSpec`].

use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::errors::{ParameterError, ParameterResult};
use crate::value::ParameterValue;

/// One parsed spec entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSpec {
    /// Scalar leaf, coerced to its tagged value at parse time
    Leaf(ParameterValue),
    /// Nested group of child specs, in document order
    Group(Vec<(String, ParamSpec)>),
}

/// Intermediate shape for leaf parsing (`value` stays optional so a missing
/// field can be reported as a malformed spec rather than a serde error).
#[derive(Debug, Deserialize)]
struct RawLeaf {
    #[serde(rename = "type")]
    type_tag: String,
    value: Option<Value>,
}

impl ParamSpec {
    /// Parse one spec entry from a JSON value.
    ///
    /// A mapping with a `type` field is a leaf spec; a mapping without one
    /// is a group spec whose entries are parsed recursively. Anything else
    /// fails with [`ParameterError::MalformedSpec`] naming the key.
    #[instrument(level = "trace", skip(raw))]
    pub fn from_json(key: &str, raw: &Value) -> ParameterResult<Self> {
        let map = raw.as_object().ok_or_else(|| malformed(
            key,
            "expected a mapping (leaf spec or group spec)",
        ))?;

        if map.contains_key("type") {
            Self::parse_leaf(key, raw)
        } else {
            let mut children = Vec::with_capacity(map.len());
            for (child_key, child_raw) in map {
                children.push((child_key.clone(), Self::from_json(child_key, child_raw)?));
            }
            Ok(Self::Group(children))
        }
    }

    fn parse_leaf(key: &str, raw: &Value) -> ParameterResult<Self> {
        let leaf: RawLeaf = serde_json::from_value(raw.clone())
            .map_err(|e| malformed(key, &e.to_string()))?;
        let value = leaf
            .value
            .ok_or_else(|| malformed(key, "leaf spec carries a 'type' but no 'value'"))?;
        Ok(Self::Leaf(ParameterValue::coerce(
            key,
            Some(leaf.type_tag.as_str()),
            &value,
        )?))
    }
}

fn malformed(key: &str, reason: &str) -> ParameterError {
    ParameterError::MalformedSpec {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a whole parameter document (a top-level mapping of specs) from
/// JSON text. Entries come back in document order.
#[instrument(level = "debug", skip(doc))]
pub fn parse_json_document(doc: &str) -> ParameterResult<Vec<(String, ParamSpec)>> {
    let raw: Value = serde_json::from_str(doc)?;
    parse_document_value(&raw)
}

/// Parse a whole parameter document from TOML text. Tables map to groups
/// and leaf specs exactly as in JSON documents.
#[instrument(level = "debug", skip(doc))]
pub fn parse_toml_document(doc: &str) -> ParameterResult<Vec<(String, ParamSpec)>> {
    let raw: toml::Value = doc.parse()?;
    parse_document_value(&toml_to_json(&raw))
}

fn parse_document_value(raw: &Value) -> ParameterResult<Vec<(String, ParamSpec)>> {
    let map = raw
        .as_object()
        .ok_or_else(|| malformed("<document>", "expected a top-level mapping of specs"))?;

    map.iter()
        .map(|(key, value)| Ok((key.clone(), ParamSpec::from_json(key, value)?)))
        .collect()
}

/// Lossless-enough TOML→JSON conversion for spec documents: tables become
/// objects (insertion order kept on both sides), datetimes become their
/// string rendering.
fn toml_to_json(raw: &toml::Value) -> Value {
    match raw {
        toml::Value::String(s) => Value::from(s.as_str()),
        toml::Value::Integer(n) => Value::from(*n),
        toml::Value::Float(f) => Value::from(*f),
        toml::Value::Boolean(b) => Value::from(*b),
        toml::Value::Datetime(dt) => Value::from(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leaf_spec_dispatch() {
        let spec = ParamSpec::from_json("cpu", &json!({"type": "integer", "value": "2"})).unwrap();
        assert_eq!(spec, ParamSpec::Leaf(ParameterValue::Integer(2)));
    }

    #[test]
    fn test_group_spec_keeps_document_order() {
        let raw = json!({
            "size": {"type": "string", "value": "large"},
            "count": {"type": "integer", "value": 3},
        });
        let spec = ParamSpec::from_json("machine", &raw).unwrap();
        match spec {
            ParamSpec::Group(children) => {
                let keys: Vec<&str> = children.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, ["size", "count"]);
            }
            other => panic!("expected a group, got {:?}", other),
        }
    }

    #[test]
    fn test_type_without_value_is_malformed() {
        let err = ParamSpec::from_json("cpu", &json!({"type": "integer"})).unwrap_err();
        match err {
            ParameterError::MalformedSpec { key, reason } => {
                assert_eq!(key, "cpu");
                assert!(reason.contains("no 'value'"), "unexpected reason: {}", reason);
            }
            other => panic!("expected MalformedSpec, got {:?}", other),
        }
    }

    #[test]
    fn test_scalar_entry_is_malformed() {
        let err = ParamSpec::from_json("cpu", &json!(5)).unwrap_err();
        assert!(matches!(err, ParameterError::MalformedSpec { ref key, .. } if key == "cpu"));
    }

    #[test]
    fn test_non_string_type_tag_is_malformed() {
        let err = ParamSpec::from_json("cpu", &json!({"type": 1, "value": 2})).unwrap_err();
        assert!(matches!(err, ParameterError::MalformedSpec { ref key, .. } if key == "cpu"));
    }
}
