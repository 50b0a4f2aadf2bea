//! Scalar values
//!
//! A scalar is either text or an integer; which one is decided by the
//! command that wrote it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value bound to a key in the scalar namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarValue {
    /// Text written by SET / SETSTR
    Str(String),

    /// Integer written by SETNUM and the INCR family
    Int(i64),
}

impl ScalarValue {
    /// Integer view of the value
    ///
    /// Strings are parsed as trimmed decimal; anything else yields `None`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(n) => Some(*n),
            ScalarValue::Str(s) => s.trim().parse().ok(),
        }
    }

    /// The text, if this is a string scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Str(s) => Some(s),
            ScalarValue::Int(_) => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Str(s) => f.write_str(s),
            ScalarValue::Int(n) => write!(f, "{}", n),
        }
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::Str(s)
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::Str(s.to_string())
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        ScalarValue::Int(n)
    }
}
