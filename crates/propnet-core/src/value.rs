//! Cell contents: the tagged [`Value`] type and its [`Scalar`] payload.

use std::cmp::Ordering;
use std::fmt;

use crate::id::GroupId;

/// A plain data value stored in a cell.
///
/// Equality is structural and tag-sensitive: `Int(1)` and `Float(1.0)` are
/// different values, so writing one over the other raises a conflict.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// Signed integer.
    Int(i64),
    /// IEEE-754 double. `NaN` never equals itself, so a cell written with
    /// `NaN` twice conflicts with itself.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 text.
    Text(String),
}

impl Scalar {
    /// Numeric view used for mixed `Int`/`Float` comparisons.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }

    /// Short tag name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
        }
    }

    /// Order two scalars, comparing numbers across the `Int`/`Float` tags.
    ///
    /// Not `PartialOrd`: `Int(1)` and `Float(1.0)` compare `Equal` here but
    /// are unequal values.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Contents of a filled cell.
///
/// Values are either plain data or a reference to a group. Group-valued
/// cells are how resolution strategies are handed to a context's
/// conflict-handler capability, and how structured values are unified
/// port by port.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Plain data.
    Scalar(Scalar),
    /// A group living in the same network.
    Group(GroupId),
}

impl Value {
    /// Shorthand for `Value::Scalar(Scalar::Int(v))`.
    pub fn int(v: i64) -> Self {
        Self::Scalar(Scalar::Int(v))
    }

    /// Shorthand for `Value::Scalar(Scalar::Float(v))`.
    pub fn float(v: f64) -> Self {
        Self::Scalar(Scalar::Float(v))
    }

    /// The scalar payload, if this is not a group.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Group(_) => None,
        }
    }

    /// The referenced group, if this is a group value.
    pub fn as_group(&self) -> Option<GroupId> {
        match self {
            Self::Group(g) => Some(*g),
            Self::Scalar(_) => None,
        }
    }

    /// The integer payload, if this is `Scalar::Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Scalar(Scalar::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Short tag name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(s) => s.kind(),
            Self::Group(_) => "group",
        }
    }

    /// Order two values. Groups are unordered.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a.compare(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Group(g) => write!(f, "<group {g}>"),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<GroupId> for Value {
    fn from(g: GroupId) -> Self {
        Self::Group(g)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Scalar(Scalar::Bool(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Scalar(Scalar::Text(v.to_string()))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Scalar(Scalar::Text(v))
    }
}
