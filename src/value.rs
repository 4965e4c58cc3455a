//! Typed scalar payloads carried by leaf parameters.
//!
//! The catalog API tags every scalar with a type (`integer`, `string`, or
//! anything else, which is passed through as text). Coercion happens once,
//! when the value enters the tree, so a malformed value fails before a
//! request is ever composed from it.

use std::fmt;

use serde_json::Value;

use crate::errors::{ParameterError, ParameterResult};

/// Scalar payload of a leaf parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    /// Tagged `integer`
    Integer(i64),
    /// Tagged `string`
    Text(String),
    /// Untagged, or tagged with a type the service does not recognize
    Untyped(String),
}

impl ParameterValue {
    /// Coerce a raw scalar according to its type tag.
    ///
    /// `integer` accepts JSON integers and base-10 integer strings; anything
    /// else is a [`ParameterError::TypeCoercion`] naming the parameter.
    /// All other tags (and the absence of a tag) canonicalize to text.
    pub fn coerce(key: &str, type_tag: Option<&str>, raw: &Value) -> ParameterResult<Self> {
        match type_tag {
            Some("integer") => Ok(Self::Integer(coerce_integer(key, raw)?)),
            Some("string") => Ok(Self::Text(canonical_string(raw))),
            _ => Ok(Self::Untyped(canonical_string(raw))),
        }
    }

    /// JSON rendering used by the serialization walks.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Integer(n) => Value::from(*n),
            Self::Text(s) | Self::Untyped(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Text(s) | Self::Untyped(s) => write!(f, "{}", s),
        }
    }
}

fn coerce_integer(key: &str, raw: &Value) -> ParameterResult<i64> {
    let parsed = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ParameterError::TypeCoercion {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

/// Canonical text form of a raw scalar: strings yield their contents,
/// `null` yields the empty string, everything else its JSON rendering.
fn canonical_string(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!("42"), 42)]
    #[case(json!(" -7 "), -7)]
    #[case(json!(42), 42)]
    fn test_integer_coercion(#[case] raw: Value, #[case] expected: i64) {
        let value = ParameterValue::coerce("count", Some("integer"), &raw).unwrap();
        assert_eq!(value, ParameterValue::Integer(expected));
    }

    #[rstest]
    #[case(json!("fourty-two"))]
    #[case(json!(4.5))]
    #[case(json!(true))]
    #[case(json!(null))]
    fn test_integer_coercion_rejects_non_integers(#[case] raw: Value) {
        let err = ParameterValue::coerce("count", Some("integer"), &raw).unwrap_err();
        assert!(matches!(err, ParameterError::TypeCoercion { ref key, .. } if key == "count"));
    }

    #[test]
    fn test_string_coercion_canonicalizes_numbers() {
        let value = ParameterValue::coerce("name", Some("string"), &json!(123)).unwrap();
        assert_eq!(value, ParameterValue::Text("123".to_string()));
        assert_eq!(value.to_json(), json!("123"));
    }

    #[test]
    fn test_unknown_tag_passes_through_as_text() {
        let value = ParameterValue::coerce("flag", Some("boolean"), &json!(true)).unwrap();
        assert_eq!(value, ParameterValue::Untyped("true".to_string()));
    }

    #[test]
    fn test_untagged_value_is_untyped() {
        let value = ParameterValue::coerce("note", None, &json!("keep")).unwrap();
        assert_eq!(value, ParameterValue::Untyped("keep".to_string()));
    }

    #[test]
    fn test_null_canonicalizes_to_empty_string() {
        let value = ParameterValue::coerce("empty", Some("string"), &json!(null)).unwrap();
        assert_eq!(value.to_json(), json!(""));
    }
}
