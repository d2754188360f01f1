//! Bidirectional codecs between typed fields and storage scalars.

use crate::error::{TransformError, TransformResult};
use crate::field::Field;
use crate::value::Scalar;
use chrono::DateTime;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A bidirectional codec between a typed [`Field`] and a storage [`Scalar`].
///
/// Transformers are stateless and object-safe; a schema descriptor holds one
/// per persisted property. Both directions fail with
/// [`TransformError::InvalidTransform`] when the input does not belong to
/// the codec's domain.
///
/// # Round-trip Law
///
/// `from_scalar(&to_scalar(&v)?)? == v` for every valid `v`.
pub trait Transform: Send + Sync {
    /// Encode a typed field into its storage scalar.
    fn to_scalar(&self, value: &Field) -> TransformResult<Scalar>;

    /// Decode a storage scalar back into a typed field.
    fn from_scalar(&self, scalar: &Scalar) -> TransformResult<Field>;
}

/// Transformers for a table, keyed by column name.
///
/// Passed to bulk-capable backends so they can interpret typed data
/// themselves when pushing an operation down.
pub type TransformSet = BTreeMap<String, Arc<dyn Transform>>;

/// Passes integers along unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntTransform;

impl Transform for IntTransform {
    fn to_scalar(&self, value: &Field) -> TransformResult<Scalar> {
        match value {
            Field::Int(n) => Ok(Scalar::Int(*n)),
            other => Err(TransformError::invalid("int field", other.describe())),
        }
    }

    fn from_scalar(&self, scalar: &Scalar) -> TransformResult<Field> {
        match scalar {
            Scalar::Int(n) => Ok(Field::Int(*n)),
            other => Err(TransformError::invalid("int scalar", other.kind())),
        }
    }
}

/// Passes floats along unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatTransform;

impl Transform for FloatTransform {
    fn to_scalar(&self, value: &Field) -> TransformResult<Scalar> {
        match value {
            Field::Float(f) => Ok(Scalar::Float(*f)),
            other => Err(TransformError::invalid("float field", other.describe())),
        }
    }

    fn from_scalar(&self, scalar: &Scalar) -> TransformResult<Field> {
        match scalar {
            Scalar::Float(f) => Ok(Field::Float(*f)),
            other => Err(TransformError::invalid("float scalar", other.kind())),
        }
    }
}

/// Passes text along unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringTransform;

impl Transform for StringTransform {
    fn to_scalar(&self, value: &Field) -> TransformResult<Scalar> {
        match value {
            Field::Text(s) => Ok(Scalar::Text(s.clone())),
            other => Err(TransformError::invalid("text field", other.describe())),
        }
    }

    fn from_scalar(&self, scalar: &Scalar) -> TransformResult<Field> {
        match scalar {
            Scalar::Text(s) => Ok(Field::Text(s.clone())),
            other => Err(TransformError::invalid("text scalar", other.kind())),
        }
    }
}

/// Stores booleans as the integers 1 and 0.
///
/// Decoding accepts exactly `Int(1)` and `Int(0)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolTransform;

impl Transform for BoolTransform {
    fn to_scalar(&self, value: &Field) -> TransformResult<Scalar> {
        match value {
            Field::Bool(b) => Ok(Scalar::Int(i64::from(*b))),
            other => Err(TransformError::invalid("bool field", other.describe())),
        }
    }

    fn from_scalar(&self, scalar: &Scalar) -> TransformResult<Field> {
        match scalar {
            Scalar::Int(1) => Ok(Field::Bool(true)),
            Scalar::Int(0) => Ok(Field::Bool(false)),
            other => Err(TransformError::invalid("0 or 1 scalar", other)),
        }
    }
}

/// Stores timestamps as integer Unix seconds.
///
/// Sub-second precision is dropped on encode; use
/// [`MicroDateTimeTransform`] when microseconds matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeTransform;

impl Transform for DateTimeTransform {
    fn to_scalar(&self, value: &Field) -> TransformResult<Scalar> {
        match value {
            Field::DateTime(dt) => Ok(Scalar::Int(dt.timestamp())),
            other => Err(TransformError::invalid("datetime field", other.describe())),
        }
    }

    fn from_scalar(&self, scalar: &Scalar) -> TransformResult<Field> {
        match scalar {
            Scalar::Int(secs) => DateTime::from_timestamp(*secs, 0)
                .map(Field::DateTime)
                .ok_or_else(|| {
                    TransformError::out_of_range(format!("{secs} is not a valid Unix timestamp"))
                }),
            other => Err(TransformError::invalid("int scalar", other.kind())),
        }
    }
}

/// Stores timestamps as a single integer packing seconds and microseconds:
/// `seconds * 1_000_000 + micros`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroDateTimeTransform;

impl Transform for MicroDateTimeTransform {
    fn to_scalar(&self, value: &Field) -> TransformResult<Scalar> {
        match value {
            Field::DateTime(dt) => Ok(Scalar::Int(dt.timestamp_micros())),
            other => Err(TransformError::invalid("datetime field", other.describe())),
        }
    }

    fn from_scalar(&self, scalar: &Scalar) -> TransformResult<Field> {
        match scalar {
            Scalar::Int(micros) => DateTime::from_timestamp_micros(*micros)
                .map(Field::DateTime)
                .ok_or_else(|| {
                    TransformError::out_of_range(format!(
                        "{micros} is not a valid microsecond timestamp"
                    ))
                }),
            other => Err(TransformError::invalid("int scalar", other.kind())),
        }
    }
}

/// Wraps another transformer to admit null.
///
/// Null passes through untouched in both directions; everything else is
/// delegated to the inner codec.
#[derive(Clone)]
pub struct NullableTransform {
    inner: Arc<dyn Transform>,
}

impl NullableTransform {
    /// Wraps `inner` so that null values pass through.
    pub fn new(inner: impl Transform + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Wraps an already shared transformer.
    pub fn from_arc(inner: Arc<dyn Transform>) -> Self {
        Self { inner }
    }
}

impl Transform for NullableTransform {
    fn to_scalar(&self, value: &Field) -> TransformResult<Scalar> {
        match value {
            Field::Null => Ok(Scalar::Null),
            other => self.inner.to_scalar(other),
        }
    }

    fn from_scalar(&self, scalar: &Scalar) -> TransformResult<Field> {
        match scalar {
            Scalar::Null => Ok(Field::Null),
            other => self.inner.from_scalar(other),
        }
    }
}

impl std::fmt::Debug for NullableTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NullableTransform").finish_non_exhaustive()
    }
}
