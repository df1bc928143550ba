//! Typed page property values.

use serde::{Deserialize, Serialize};

/// Value type declared by a property definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Number,
    String,
}

impl PropertyType {
    /// Two-letter code stored in `Property.type`.
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Number => "NU",
            Self::String => "ST",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "NU" => Some(Self::Number),
            "ST" => Some(Self::String),
            _ => None,
        }
    }
}

/// A property value; serialized as `{"type": "number", "value": 1.5}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    Number(f64),
    String(String),
}

impl PropertyValue {
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Number(_) => PropertyType::Number,
            Self::String(_) => PropertyType::String,
        }
    }
}

/// A keyed property value attached to a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageProperty {
    pub key: String,
    #[serde(flatten)]
    pub value: PropertyValue,
}

impl PageProperty {
    pub fn number(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value: PropertyValue::Number(value),
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: PropertyValue::String(value.into()),
        }
    }
}
