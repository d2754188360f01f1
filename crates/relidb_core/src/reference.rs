//! Entity-reference codec.

use relidb_codec::{Field, Identifier, Scalar, Transform, TransformError, TransformResult};
use std::sync::Arc;

/// Codec for a property referencing another entity.
///
/// The reference is stored as the referenced entity's identifier; encoding
/// and decoding of that identifier are delegated to the inner transformer
/// (the one the referenced type uses for its own identifier property).
///
/// Hydration stops at [`Field::Reference`] - dereferencing to a live entry
/// is an explicit query (see [`crate::query::deref`]), performed against an
/// explicitly chosen backend.
#[derive(Clone)]
pub struct ReferenceTransform {
    inner: Arc<dyn Transform>,
}

impl ReferenceTransform {
    /// Builds a reference codec around the referenced type's identifier
    /// transformer.
    pub fn new(inner: impl Transform + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Builds a reference codec around an already shared transformer.
    pub fn from_arc(inner: Arc<dyn Transform>) -> Self {
        Self { inner }
    }
}

impl Transform for ReferenceTransform {
    fn to_scalar(&self, value: &Field) -> TransformResult<Scalar> {
        match value {
            Field::Reference(id) => self.inner.to_scalar(&id.to_field()),
            other => Err(TransformError::invalid("reference field", other.describe())),
        }
    }

    fn from_scalar(&self, scalar: &Scalar) -> TransformResult<Field> {
        let field = self.inner.from_scalar(scalar)?;
        Identifier::from_field(&field)
            .map(Field::Reference)
            .ok_or_else(|| TransformError::invalid("int or text identifier", field.describe()))
    }
}

impl std::fmt::Debug for ReferenceTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceTransform").finish_non_exhaustive()
    }
}
