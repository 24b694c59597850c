//! Primary keys for mirrored entities.
//!
//! Remote records identify themselves either by a numeric `id` (outputs,
//! inputs, group actions, ...) or by a `name` (apps). Both are folded into a
//! single [`EntityKey`] so the reconciler can stay generic over the key field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Primary key of a remote record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKey {
    /// Numeric identifier (e.g. an output or input id).
    Id(i64),
    /// Textual identifier (e.g. an app name).
    Name(String),
}

impl EntityKey {
    /// Extracts a key from a JSON value.
    ///
    /// Integers become [`EntityKey::Id`], strings become [`EntityKey::Name`].
    /// Anything else (floats, booleans, null, containers) is not a key.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Id),
            Value::String(s) => Some(Self::Name(s.clone())),
            _ => None,
        }
    }

    /// Reads the key stored under `field` in a remote record.
    #[must_use]
    pub fn from_record(record: &Value, field: &str) -> Option<Self> {
        record.get(field).and_then(Self::from_value)
    }

    /// Returns the numeric identifier, if this is an `Id` key.
    #[must_use]
    pub const fn as_id(&self) -> Option<i64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Name(_) => None,
        }
    }

    /// Returns the textual identifier, if this is a `Name` key.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Name(name) => Some(name),
        }
    }

    /// Converts the key back into the JSON value a remote record carries.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Id(id) => Value::from(*id),
            Self::Name(name) => Value::from(name.as_str()),
        }
    }

    /// Returns true if `value` denotes this key.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        Self::from_value(value).as_ref() == Some(self)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl FromStr for EntityKey {
    type Err = crate::Error;

    /// Parses digits (with optional sign) as an `Id`, everything else as a `Name`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(crate::Error::InvalidKey(s.to_string()));
        }
        Ok(s.parse::<i64>()
            .map_or_else(|_| Self::Name(s.to_string()), Self::Id))
    }
}

impl From<i64> for EntityKey {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<u32> for EntityKey {
    fn from(id: u32) -> Self {
        Self::Id(i64::from(id))
    }
}

impl From<&str> for EntityKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for EntityKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}
