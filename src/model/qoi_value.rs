//! Typed attribute values
//!
//! Attributes and user-defined fields of ranks, phases and objects hold one
//! of a closed set of scalar types. Every consumer matches exhaustively.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named attribute values, ordered by key
pub type QoiMap = BTreeMap<String, QoiValue>;

/// One attribute or QOI value
///
/// Serialized untagged, so a value round-trips as a plain JSON scalar.
/// Variant order matters for decoding: integers that fit `i64` come back
/// as [`QoiValue::Int`], larger unsigned ones as [`QoiValue::ElementId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QoiValue {
    Int(i64),
    ElementId(u64),
    Double(f64),
    Str(String),
}

impl QoiValue {
    /// Decode a JSON scalar
    ///
    /// Returns `None` for booleans, null, arrays and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(QoiValue::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Some(QoiValue::ElementId(u))
                } else {
                    n.as_f64().map(QoiValue::Double)
                }
            }
            serde_json::Value::String(s) => Some(QoiValue::Str(s.clone())),
            _ => None,
        }
    }

    /// Identifier value, as `Int` when it fits
    pub fn from_id(id: u64) -> Self {
        match i64::try_from(id) {
            Ok(i) => QoiValue::Int(i),
            Err(_) => QoiValue::ElementId(id),
        }
    }

    /// Numeric view of the value; `None` for strings
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            QoiValue::Int(i) => Some(*i as f64),
            QoiValue::ElementId(u) => Some(*u as f64),
            QoiValue::Double(d) => Some(*d),
            QoiValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            QoiValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, QoiValue::Str(_))
    }

    /// Short type name used in messages
    pub fn type_name(&self) -> &'static str {
        match self {
            QoiValue::Int(_) => "int",
            QoiValue::ElementId(_) => "element_id",
            QoiValue::Double(_) => "double",
            QoiValue::Str(_) => "string",
        }
    }
}

impl fmt::Display for QoiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QoiValue::Int(i) => write!(f, "{}", i),
            QoiValue::ElementId(u) => write!(f, "{}", u),
            QoiValue::Double(d) => write!(f, "{}", d),
            QoiValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for QoiValue {
    fn from(value: i64) -> Self {
        QoiValue::Int(value)
    }
}

impl From<f64> for QoiValue {
    fn from(value: f64) -> Self {
        QoiValue::Double(value)
    }
}

impl From<&str> for QoiValue {
    fn from(value: &str) -> Self {
        QoiValue::Str(value.to_string())
    }
}

impl From<String> for QoiValue {
    fn from(value: String) -> Self {
        QoiValue::Str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_picks_narrowest_numeric_variant() {
        assert_eq!(QoiValue::from_json(&json!(7)), Some(QoiValue::Int(7)));
        assert_eq!(QoiValue::from_json(&json!(-3)), Some(QoiValue::Int(-3)));
        assert_eq!(
            QoiValue::from_json(&json!(u64::MAX)),
            Some(QoiValue::ElementId(u64::MAX))
        );
        assert_eq!(QoiValue::from_json(&json!(2.5)), Some(QoiValue::Double(2.5)));
        assert_eq!(
            QoiValue::from_json(&json!("block")),
            Some(QoiValue::Str("block".to_string()))
        );
    }

    #[test]
    fn test_from_json_rejects_non_scalars() {
        assert_eq!(QoiValue::from_json(&json!(true)), None);
        assert_eq!(QoiValue::from_json(&json!(null)), None);
        assert_eq!(QoiValue::from_json(&json!([1, 2])), None);
        assert_eq!(QoiValue::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn test_serializes_as_plain_scalar() {
        let map: QoiMap = [
            ("a".to_string(), QoiValue::Int(1)),
            ("b".to_string(), QoiValue::Str("x".into())),
        ]
        .into_iter()
        .collect();
        let text = serde_json::to_string(&map).unwrap();
        assert_eq!(text, r#"{"a":1,"b":"x"}"#);

        let back: QoiMap = serde_json::from_str(&text).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_from_id_falls_back_to_element_id() {
        assert_eq!(QoiValue::from_id(12), QoiValue::Int(12));
        assert_eq!(QoiValue::from_id(u64::MAX), QoiValue::ElementId(u64::MAX));
        assert_eq!(QoiValue::from_id(u64::MAX).as_f64(), Some(u64::MAX as f64));
    }
}
