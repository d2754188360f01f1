//! The entity trait.

use crate::error::CoreResult;
use crate::schema::Schema;
use relidb_codec::{Field, Identifier, TransformError};
use std::collections::BTreeMap;

/// A mapping of property names to typed field values.
///
/// Used to hydrate entities from rows and to describe bulk updates.
pub type FieldMap = BTreeMap<String, Field>;

/// A persisted entity type.
///
/// Implementing `Entity` registers a type with the mapping layer: a static
/// schema plus a by-name field accessor table. The accessor table is what
/// lets condition resolution and row hydration address properties
/// dynamically while the entity itself stays an ordinary typed struct.
///
/// # Implementing
///
/// ```rust,ignore
/// use std::sync::OnceLock;
///
/// struct Track {
///     id: i64,
///     title: String,
/// }
///
/// impl Entity for Track {
///     fn schema() -> &'static Schema {
///         static SCHEMA: OnceLock<Schema> = OnceLock::new();
///         SCHEMA.get_or_init(|| {
///             Schema::builder("tracks")
///                 .identifier("id", "id", IntTransform)
///                 .property("title", "title", StringTransform)
///                 .build()
///         })
///     }
///     // field / set_field / from_fields dispatch on the property name
/// }
/// ```
///
/// The `OnceLock` gives each type one schema for the process lifetime,
/// initialized lazily on first access and never invalidated.
pub trait Entity: Sized + Send + 'static {
    /// The type's schema descriptor.
    ///
    /// Must return the same instance on every call.
    fn schema() -> &'static Schema;

    /// Reads a property by name.
    ///
    /// Returns `None` for names the type does not declare. For declared
    /// properties this must always return a value; nullable properties
    /// that are unset return [`Field::Null`].
    fn field(&self, property: &str) -> Option<Field>;

    /// Writes a property by name.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownProperty` for undeclared names and with
    /// `InvalidTransform` when the field's shape doesn't fit the property.
    fn set_field(&mut self, property: &str, value: Field) -> CoreResult<()>;

    /// Constructs an instance from hydrated field values.
    ///
    /// The map holds one entry per declared property that was present in
    /// the stored row.
    ///
    /// # Errors
    ///
    /// Fails when a required property is missing or has the wrong shape.
    fn from_fields(fields: &FieldMap) -> CoreResult<Self>;

    /// The entity's current identifier.
    ///
    /// Derived from the schema's identifier property; entity types do not
    /// normally override this.
    fn identifier(&self) -> CoreResult<Identifier> {
        let property = Self::schema().identifier_property();
        let field = self
            .field(property)
            .ok_or_else(|| TransformError::invalid("identifier field", "missing"))?;
        Identifier::from_field(&field)
            .ok_or_else(|| TransformError::invalid("int or text identifier", field.describe()).into())
    }
}
