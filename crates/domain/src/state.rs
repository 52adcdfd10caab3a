//! Host state records — what the state store returns for an entity id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Attribute key carrying a cover's reported position.
pub const ATTR_CURRENT_POSITION: &str = "current_position";

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
}

impl AttributeValue {
    /// Numeric view of the attribute; numeric strings are accepted.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::String(value) => value.trim().parse().ok(),
            Self::Json(value) => value.as_f64(),
            Self::Bool(_) => None,
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Snapshot of one host entity: a state string plus attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub state: String,
    #[serde(default)]
    pub attributes: HashMap<String, AttributeValue>,
}

impl StateSnapshot {
    #[must_use]
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            attributes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn attribute_f64(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(AttributeValue::as_f64)
    }

    /// Reported `current_position`, rounded and saturated into `0..=100`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn current_position(&self) -> Option<crate::position::Position> {
        self.attribute_f64(ATTR_CURRENT_POSITION)
            .filter(|value| value.is_finite())
            .map(|value| crate::position::Position::saturating(value.round() as i64))
    }
}
