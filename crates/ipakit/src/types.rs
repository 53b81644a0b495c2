//! Value model for command arguments and query results.
//!
//! The directory backend accepts and returns loosely shaped attribute
//! dictionaries. [`Value`] pins that down to the four shapes the backend
//! actually produces so callers can match on them instead of probing at
//! runtime.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single attribute value as sent to or returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean flag (`nonposix`, `external`, `all`, ...)
    Bool(bool),
    /// Integer argument
    Int(i64),
    /// Single string value
    Scalar(String),
    /// Multi-valued attribute
    Sequence(Vec<String>),
}

impl Value {
    /// Whether this value is multi-valued.
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    /// Borrow the string of a scalar value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the items of a sequence value.
    pub fn as_sequence(&self) -> Option<&[String]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Wrap a single value into a one-element sequence.
    ///
    /// Sequences are returned unchanged. Booleans use the LDAP spelling
    /// (`TRUE`/`FALSE`).
    pub fn into_sequence(self) -> Self {
        match self {
            Self::Sequence(_) => self,
            Self::Scalar(s) => Self::Sequence(vec![s]),
            Self::Int(n) => Self::Sequence(vec![n.to_string()]),
            Self::Bool(b) => Self::Sequence(vec![ldap_bool(b).to_string()]),
        }
    }

    /// All string items carried by this value.
    ///
    /// A scalar yields one item; booleans yield nothing.
    pub fn items(&self) -> Vec<String> {
        match self {
            Self::Sequence(items) => items.clone(),
            Self::Scalar(s) => vec![s.clone()],
            Self::Int(n) => vec![n.to_string()],
            Self::Bool(_) => Vec::new(),
        }
    }
}

fn ldap_bool(b: bool) -> &'static str {
    if b { "TRUE" } else { "FALSE" }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Sequence(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Scalar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Scalar(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::Sequence(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Self::Sequence(items.into_iter().map(str::to_string).collect())
    }
}

/// Attribute name to value mapping, ordered for stable output.
pub type AttributeMap = BTreeMap<String, Value>;

/// Acknowledgement returned by a mutating backend command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Human-readable summary, e.g. `Added group "ops"`
    pub summary: Option<String>,
}

impl Response {
    /// Create a response carrying a summary line.
    pub fn with_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
        }
    }
}
