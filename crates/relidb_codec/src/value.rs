//! Storage-safe scalar value type.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A storage-safe value.
///
/// This is the only value shape that crosses the storage port: every typed
/// field is transformed into a `Scalar` before it reaches a backend, and
/// every row read back is a mapping of column names to `Scalar`s.
///
/// Equality is strict per variant: `Int(5)` does not equal `Float(5.0)`.
/// For ordering rows, use [`Scalar::cmp_stored`], which compares integers
/// and floats numerically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Absent value (SQL NULL).
    Null,
    /// Signed 64-bit integer.
    Int(i64),
    /// Double-precision float.
    Float(f64),
    /// UTF-8 text.
    Text(String),
}

impl Scalar {
    /// Check if this scalar is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Get this scalar as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this scalar as a float, if it is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get this scalar as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this scalar as a number, widening integers to `f64`.
    ///
    /// Returns `None` for null and text values. Comparison predicates use
    /// this: a row value only participates in an ordering comparison when
    /// it is numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Int(n) => Some(*n as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the kind of this scalar.
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Null => ScalarKind::Null,
            Scalar::Int(_) => ScalarKind::Int,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Text(_) => ScalarKind::Text,
        }
    }

    /// Compare two scalars in stored order.
    ///
    /// Stored order is the total order backends sort rows by:
    /// null < numbers < text. Integers and floats compare numerically
    /// against each other, text compares lexicographically.
    pub fn cmp_stored(&self, other: &Self) -> Ordering {
        use Scalar::{Float, Int, Null, Text};
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Less,
            (_, Null) => Ordering::Greater,
            (Text(a), Text(b)) => a.cmp(b),
            (Text(_), _) => Ordering::Greater,
            (_, Text(_)) => Ordering::Less,
            (Int(a), Int(b)) => a.cmp(b),
            (Int(a), Float(b)) => (*a as f64).total_cmp(b),
            (Float(a), Int(b)) => a.total_cmp(&(*b as f64)),
            (Float(a), Float(b)) => a.total_cmp(b),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Int(i64::from(n))
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Scalar::Null,
        }
    }
}

/// The kind of a [`Scalar`], without its payload.
///
/// Used in error messages and predicate type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Absent value.
    Null,
    /// Signed integer.
    Int,
    /// Double-precision float.
    Float,
    /// UTF-8 text.
    Text,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Null => write!(f, "null"),
            ScalarKind::Int => write!(f, "int"),
            ScalarKind::Float => write!(f, "float"),
            ScalarKind::Text => write!(f, "text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_strict_per_variant() {
        assert_ne!(Scalar::Int(5), Scalar::Float(5.0));
        assert_ne!(Scalar::Text("5".into()), Scalar::Int(5));
        assert_eq!(Scalar::Null, Scalar::Null);
    }

    #[test]
    fn stored_order_null_numbers_text() {
        let mut values = vec![
            Scalar::Text("a".into()),
            Scalar::Int(3),
            Scalar::Null,
            Scalar::Float(1.5),
        ];
        values.sort_by(Scalar::cmp_stored);
        assert_eq!(
            values,
            vec![
                Scalar::Null,
                Scalar::Float(1.5),
                Scalar::Int(3),
                Scalar::Text("a".into()),
            ]
        );
    }

    #[test]
    fn stored_order_mixes_int_and_float_numerically() {
        assert_eq!(
            Scalar::Int(5).cmp_stored(&Scalar::Float(5.0)),
            Ordering::Equal
        );
        assert_eq!(
            Scalar::Int(2).cmp_stored(&Scalar::Float(2.5)),
            Ordering::Less
        );
        assert_eq!(
            Scalar::Float(3.5).cmp_stored(&Scalar::Int(3)),
            Ordering::Greater
        );
    }

    #[test]
    fn as_number_widens_ints() {
        assert_eq!(Scalar::Int(4).as_number(), Some(4.0));
        assert_eq!(Scalar::Float(4.5).as_number(), Some(4.5));
        assert_eq!(Scalar::Text("4".into()).as_number(), None);
        assert_eq!(Scalar::Null.as_number(), None);
    }

    #[test]
    fn accessors() {
        assert!(Scalar::Null.is_null());
        assert_eq!(Scalar::Int(42).as_int(), Some(42));
        assert_eq!(Scalar::Float(1.0).as_int(), None);
        assert_eq!(Scalar::Text("hi".into()).as_text(), Some("hi"));
    }

    #[test]
    fn from_impls() {
        assert_eq!(Scalar::from(42i64), Scalar::Int(42));
        assert_eq!(Scalar::from(42i32), Scalar::Int(42));
        assert_eq!(Scalar::from(2.5), Scalar::Float(2.5));
        assert_eq!(Scalar::from("hi"), Scalar::Text("hi".into()));
        assert_eq!(Scalar::from(None::<i64>), Scalar::Null);
        assert_eq!(Scalar::from(Some(7i64)), Scalar::Int(7));
    }

    #[test]
    fn serde_round_trip() {
        let values = vec![
            Scalar::Null,
            Scalar::Int(-3),
            Scalar::Float(0.5),
            Scalar::Text("row".into()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,-3,0.5,"row"]"#);
        let back: Vec<Scalar> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
