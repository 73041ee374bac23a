//! Cache Value Module
//!
//! Tagged representation of the four value shapes a key can hold.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered sequence of strings, duplicates allowed.
pub type List = Vec<String>;

/// String-to-string dictionary with unique keys.
pub type Dict = HashMap<String, String>;

/// The key space guarded by the cache lock.
pub(crate) type Entries = HashMap<String, Value>;

// == Value ==
/// A stored value. Exactly one variant is active per key.
///
/// Serializes adjacently tagged, e.g. `{"type":"list","value":["a","b"]}`,
/// so callers can tell which shape came back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    String(String),
    Int(i64),
    List(List),
    Dict(Dict),
}

impl Value {
    /// Returns the discriminator of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Int(_) => ValueKind::Int,
            Value::List(_) => ValueKind::List,
            Value::Dict(_) => ValueKind::Dict,
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<List> for Value {
    fn from(value: List) -> Self {
        Value::List(value)
    }
}

impl From<Dict> for Value {
    fn from(value: Dict) -> Self {
        Value::Dict(value)
    }
}

// == Value Kind ==
/// Shape of a [`Value`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Int,
    List,
    Dict,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Int => "int",
            ValueKind::List => "list",
            ValueKind::Dict => "dict",
        };
        f.write_str(name)
    }
}
