use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Number, Value};

/// A value in an installation's free-form `context` map.
///
/// The wire format is arbitrary JSON; this keeps it typed so decoding stays
/// total and callers can match on what they find instead of probing a blob.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<ContextValue>),
    Mapping(BTreeMap<String, ContextValue>),
}

impl ContextValue {
    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ContextValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// The nested mapping, if this is one.
    pub const fn as_mapping(&self) -> Option<&BTreeMap<String, ContextValue>> {
        match self {
            ContextValue::Mapping(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&Value> for ContextValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => ContextValue::Null,
            Value::Bool(value) => ContextValue::Bool(*value),
            Value::Number(value) => ContextValue::Number(value.clone()),
            Value::String(value) => ContextValue::String(value.clone()),
            Value::Array(items) => {
                ContextValue::Sequence(items.iter().map(ContextValue::from).collect())
            }
            Value::Object(fields) => ContextValue::Mapping(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), ContextValue::from(value)))
                    .collect(),
            ),
        }
    }
}
