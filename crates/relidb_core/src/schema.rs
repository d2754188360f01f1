//! Explicit schema descriptors.

use crate::error::{CoreError, CoreResult};
use relidb_codec::{Field, Scalar, Transform, TransformSet};
use std::collections::HashMap;
use std::sync::Arc;

/// A static descriptor for one entity type.
///
/// The schema is the single source of truth for the two bijective mappings
/// the mapping layer needs: property name to column name, and property
/// name to transformer. It is registered explicitly through
/// [`Schema::builder`] - there is no runtime discovery - and memoized per
/// entity type for the process lifetime through [`crate::Entity::schema`].
#[derive(Clone)]
pub struct Schema {
    table: String,
    identifier: &'static str,
    properties: Vec<PropertySpec>,
    by_property: HashMap<&'static str, usize>,
    by_column: HashMap<String, usize>,
}

/// One persisted property: its column name and transformer.
#[derive(Clone)]
pub struct PropertySpec {
    property: &'static str,
    column: String,
    transform: Arc<dyn Transform>,
}

impl PropertySpec {
    /// The property name.
    pub fn property(&self) -> &'static str {
        self.property
    }

    /// The column the property is stored under.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// The property's transformer.
    pub fn transform(&self) -> &Arc<dyn Transform> {
        &self.transform
    }
}

impl Schema {
    /// Starts building a schema for a table.
    pub fn builder(table: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            table: table.into(),
            identifier: None,
            properties: Vec::new(),
        }
    }

    /// The table this schema describes.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The identifier property's name.
    pub fn identifier_property(&self) -> &'static str {
        self.identifier
    }

    /// The column the identifier property is stored under.
    pub fn identifier_column(&self) -> &str {
        // The builder guarantees the identifier property exists.
        &self.properties[self.by_property[self.identifier]].column
    }

    /// All declared properties, in registration order.
    pub fn properties(&self) -> impl Iterator<Item = &PropertySpec> {
        self.properties.iter()
    }

    /// Looks up the column a property is stored under.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::UnknownProperty`] if the property is not
    /// declared.
    pub fn column_for(&self, property: &str) -> CoreResult<&str> {
        self.spec_for(property).map(|spec| spec.column.as_str())
    }

    /// Looks up the property stored under a column.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::UnknownColumn`] if no property maps to the
    /// column.
    pub fn property_for(&self, column: &str) -> CoreResult<&'static str> {
        self.by_column
            .get(column)
            .map(|&index| self.properties[index].property)
            .ok_or_else(|| CoreError::unknown_column(column, &self.table))
    }

    /// Looks up a property's full spec.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::UnknownProperty`] if the property is not
    /// declared.
    pub fn spec_for(&self, property: &str) -> CoreResult<&PropertySpec> {
        self.by_property
            .get(property)
            .map(|&index| &self.properties[index])
            .ok_or_else(|| CoreError::unknown_property(property, &self.table))
    }

    /// Transforms a property's typed value into its storage scalar.
    pub fn to_scalar(&self, property: &str, value: &Field) -> CoreResult<Scalar> {
        Ok(self.spec_for(property)?.transform.to_scalar(value)?)
    }

    /// Transforms a stored scalar back into a property's typed value.
    pub fn from_scalar(&self, property: &str, scalar: &Scalar) -> CoreResult<Field> {
        Ok(self.spec_for(property)?.transform.from_scalar(scalar)?)
    }

    /// The table's transformers, keyed by column name.
    ///
    /// This is what bulk-capable backends receive alongside pre-transformed
    /// data.
    pub fn transform_set(&self) -> TransformSet {
        self.properties
            .iter()
            .map(|spec| (spec.column.clone(), Arc::clone(&spec.transform)))
            .collect()
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("table", &self.table)
            .field("identifier", &self.identifier)
            .field(
                "properties",
                &self
                    .properties
                    .iter()
                    .map(|spec| (spec.property, spec.column.as_str()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builds a [`Schema`].
///
/// Registration is the one place schema invariants are enforced:
/// duplicate property or column names and a missing identifier are
/// programming errors and panic in `build`.
pub struct SchemaBuilder {
    table: String,
    identifier: Option<&'static str>,
    properties: Vec<PropertySpec>,
}

impl SchemaBuilder {
    /// Declares a persisted property.
    #[must_use]
    pub fn property(
        mut self,
        property: &'static str,
        column: impl Into<String>,
        transform: impl Transform + 'static,
    ) -> Self {
        self.properties.push(PropertySpec {
            property,
            column: column.into(),
            transform: Arc::new(transform),
        });
        self
    }

    /// Declares the identifier property.
    ///
    /// Every schema has exactly one; it is also a regular persisted
    /// property.
    #[must_use]
    pub fn identifier(
        mut self,
        property: &'static str,
        column: impl Into<String>,
        transform: impl Transform + 'static,
    ) -> Self {
        self.identifier = Some(property);
        self.property(property, column, transform)
    }

    /// Finalizes the schema.
    ///
    /// # Panics
    ///
    /// Panics if no identifier property was declared, or if two properties
    /// share a name or a column.
    #[must_use]
    pub fn build(self) -> Schema {
        let identifier = self
            .identifier
            .unwrap_or_else(|| panic!("schema for `{}` has no identifier property", self.table));

        let mut by_property = HashMap::with_capacity(self.properties.len());
        let mut by_column = HashMap::with_capacity(self.properties.len());
        for (index, spec) in self.properties.iter().enumerate() {
            if by_property.insert(spec.property, index).is_some() {
                panic!(
                    "schema for `{}` declares property `{}` twice",
                    self.table, spec.property
                );
            }
            if by_column.insert(spec.column.clone(), index).is_some() {
                panic!(
                    "schema for `{}` declares column `{}` twice",
                    self.table, spec.column
                );
            }
        }

        Schema {
            table: self.table,
            identifier,
            properties: self.properties,
            by_property,
            by_column,
        }
    }
}
