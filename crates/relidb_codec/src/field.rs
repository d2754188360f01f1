//! Typed in-memory field values.

use chrono::{DateTime, Utc};
use std::fmt;

/// A typed field value as held by an entity.
///
/// Entities expose their persisted properties as `Field`s through a by-name
/// accessor table, which is what lets the condition resolver and the row
/// hydrator look properties up dynamically while the rest of the program
/// stays statically typed.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Absent value (a nullable property that is unset).
    Null,
    /// Signed 64-bit integer.
    Int(i64),
    /// Double-precision float.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Boolean.
    Bool(bool),
    /// UTC timestamp.
    DateTime(DateTime<Utc>),
    /// Reference to another entity, by its identifier.
    Reference(Identifier),
}

impl Field {
    /// Check if this field is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    /// Get this field as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Field::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this field as a float, if it is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Field::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get this field as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Field::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this field as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Field::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this field as a timestamp, if it is one.
    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Field::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Get this field as an entity reference, if it is one.
    pub fn as_reference(&self) -> Option<&Identifier> {
        match self {
            Field::Reference(id) => Some(id),
            _ => None,
        }
    }

    /// A short description of the field's shape, for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Field::Null => "null",
            Field::Int(_) => "int",
            Field::Float(_) => "float",
            Field::Text(_) => "text",
            Field::Bool(_) => "bool",
            Field::DateTime(_) => "datetime",
            Field::Reference(_) => "reference",
        }
    }
}

impl From<i64> for Field {
    fn from(n: i64) -> Self {
        Field::Int(n)
    }
}

impl From<i32> for Field {
    fn from(n: i32) -> Self {
        Field::Int(i64::from(n))
    }
}

impl From<f64> for Field {
    fn from(f: f64) -> Self {
        Field::Float(f)
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::Text(s)
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::Text(s.to_string())
    }
}

impl From<bool> for Field {
    fn from(b: bool) -> Self {
        Field::Bool(b)
    }
}

impl From<DateTime<Utc>> for Field {
    fn from(dt: DateTime<Utc>) -> Self {
        Field::DateTime(dt)
    }
}

impl From<Identifier> for Field {
    fn from(id: Identifier) -> Self {
        Field::Reference(id)
    }
}

impl<T: Into<Field>> From<Option<T>> for Field {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Field::Null,
        }
    }
}

/// An entity identifier, as declared by its schema.
///
/// Identifiers are either integers or text; which one an entity type uses
/// is fixed by the transformer of its identifier property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identifier {
    /// Integer identifier.
    Int(i64),
    /// Text identifier.
    Text(String),
}

impl Identifier {
    /// Extracts an identifier from a field value.
    ///
    /// Integer and text fields become identifiers directly; a reference
    /// field yields the identifier it points at.
    pub fn from_field(field: &Field) -> Option<Self> {
        match field {
            Field::Int(n) => Some(Identifier::Int(*n)),
            Field::Text(s) => Some(Identifier::Text(s.clone())),
            Field::Reference(id) => Some(id.clone()),
            _ => None,
        }
    }

    /// The identifier as a field value.
    pub fn to_field(&self) -> Field {
        match self {
            Identifier::Int(n) => Field::Int(*n),
            Identifier::Text(s) => Field::Text(s.clone()),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Int(n) => write!(f, "{n}"),
            Identifier::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Identifier::Int(n)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::Text(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Identifier::Text(s)
    }
}
