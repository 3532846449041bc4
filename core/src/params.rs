//! Request parameters.
//!
//! A `ParameterSet` is an insertion-ordered JSON object (`serde_json` is
//! built with `preserve_order`), so nesting, lists and key order survive
//! every encoder.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::EncodeError;

/// Ordered mapping from parameter name to a scalar, list or nested mapping.
pub type ParameterSet = Map<String, Value>;

/// What a caller hands to the encoder: structured parameters or a body that
/// has already been built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Parameters {
    Set(ParameterSet),
    /// Sent verbatim, never merged with anything else.
    Raw(String),
}

impl Parameters {
    /// Accept any JSON value that can stand for request parameters:
    /// an object becomes a `Set`, a string becomes `Raw`, `null` is empty.
    pub fn from_json(value: Value) -> Result<Self, EncodeError> {
        match value {
            Value::Object(map) => Ok(Parameters::Set(map)),
            Value::String(raw) => Ok(Parameters::Raw(raw)),
            Value::Null => Ok(Parameters::default()),
            Value::Bool(_) => Err(EncodeError::InvalidParameters("a boolean")),
            Value::Number(_) => Err(EncodeError::InvalidParameters("a number")),
            Value::Array(_) => Err(EncodeError::InvalidParameters("an array")),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Parameters::Set(set) => set.is_empty(),
            Parameters::Raw(raw) => raw.is_empty(),
        }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters::Set(ParameterSet::new())
    }
}

impl From<ParameterSet> for Parameters {
    fn from(set: ParameterSet) -> Self {
        Parameters::Set(set)
    }
}

impl From<String> for Parameters {
    fn from(raw: String) -> Self {
        Parameters::Raw(raw)
    }
}

impl From<&str> for Parameters {
    fn from(raw: &str) -> Self {
        Parameters::Raw(raw.to_string())
    }
}
