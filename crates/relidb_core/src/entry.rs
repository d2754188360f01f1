//! Entry lifecycle and synchronization.

use crate::entity::{Entity, FieldMap};
use crate::error::{CoreError, CoreResult};
use relidb_codec::{Field, Identifier, Scalar};
use relidb_storage::{ResolvedCondition, Row, StorageBackend};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A live instance of an entity, bound to one backend.
///
/// An entry owns its entity value and tracks which properties have been
/// written since the last synchronization (the dirty set). The backend
/// reference is fixed at construction; an entry cannot migrate between
/// backends.
///
/// # Lifecycle
///
/// - [`Entry::create`] transforms every declared property and inserts the
///   row immediately; the entry starts fresh.
/// - [`Entry::set`] records the write in the dirty set; nothing reaches
///   the backend until [`Entry::sync`].
/// - [`Entry::sync`] flushes the dirty set in one update keyed by the
///   entry's identifier, then refreshes the cached identifier (the
///   identifier itself may have been part of the update).
/// - [`Entry::delete`] removes the backing row; every subsequent
///   operation fails with `UseAfterDelete`.
///
/// Entries fetched by the query executor are constructed without the
/// insert ([`Entry::hydrate`]) and start fresh with an empty dirty set.
///
/// # Dropping
///
/// Dropping a dirty entry flushes it as a safety net. A flush failure at
/// drop time is reported through `tracing::warn!` - it cannot reach the
/// caller, so explicit [`Entry::sync`] remains the primary persistence
/// path and the only one that surfaces errors.
pub struct Entry<E: Entity> {
    entity: E,
    backend: Arc<dyn StorageBackend>,
    /// Identifier as last seen by the backend; refreshed on sync.
    identifier: Identifier,
    /// Modified properties, already transformed to scalars.
    dirty: BTreeMap<&'static str, Scalar>,
    deleted: bool,
}

impl<E: Entity> Entry<E> {
    /// Creates an entry, inserting its row immediately.
    ///
    /// # Errors
    ///
    /// Fails when a property does not transform, or when the backend
    /// rejects the insert (for example with `DuplicateEntry`).
    pub fn create(entity: E, backend: Arc<dyn StorageBackend>) -> CoreResult<Self> {
        let schema = E::schema();
        let mut row = Row::new();
        for spec in schema.properties() {
            let value = entity.field(spec.property()).ok_or_else(|| {
                CoreError::unknown_property(spec.property(), schema.table())
            })?;
            row.insert(spec.column().to_string(), spec.transform().to_scalar(&value)?);
        }
        backend.create(schema.table(), row)?;
        let identifier = entity.identifier()?;
        debug!(table = schema.table(), id = %identifier, "created entry");
        Ok(Self {
            entity,
            backend,
            identifier,
            dirty: BTreeMap::new(),
            deleted: false,
        })
    }

    /// Builds an entry from a stored row without inserting.
    ///
    /// This is the query executor's hydration path: columns are mapped
    /// back to properties (columns the schema does not know are ignored),
    /// scalars are decoded through each property's transformer, and the
    /// entry starts fresh with an empty dirty set.
    pub fn hydrate(row: &Row, backend: Arc<dyn StorageBackend>) -> CoreResult<Self> {
        let schema = E::schema();
        let mut fields = FieldMap::new();
        for (column, scalar) in row {
            let Ok(property) = schema.property_for(column) else {
                continue;
            };
            fields.insert(property.to_string(), schema.from_scalar(property, scalar)?);
        }
        let entity = E::from_fields(&fields)?;
        let identifier = entity.identifier()?;
        Ok(Self {
            entity,
            backend,
            identifier,
            dirty: BTreeMap::new(),
            deleted: false,
        })
    }

    /// Reads a property's current (possibly unsynced) value.
    ///
    /// # Errors
    ///
    /// Fails with `UseAfterDelete` on a deleted entry and
    /// `UnknownProperty` for undeclared names.
    pub fn get(&self, property: &str) -> CoreResult<Field> {
        if self.deleted {
            return Err(CoreError::use_after_delete("get a property on"));
        }
        self.entity
            .field(property)
            .ok_or_else(|| CoreError::unknown_property(property, E::schema().table()))
    }

    /// Writes a property, recording it in the dirty set.
    ///
    /// The value is transformed eagerly, so a value that does not fit the
    /// property fails here and leaves the entry untouched. Nothing reaches
    /// the backend until [`Entry::sync`].
    pub fn set(&mut self, property: &str, value: impl Into<Field>) -> CoreResult<()> {
        if self.deleted {
            return Err(CoreError::use_after_delete("set a property on"));
        }
        let value = value.into();
        let spec = E::schema().spec_for(property)?;
        let scalar = spec.transform().to_scalar(&value)?;
        self.entity.set_field(spec.property(), value)?;
        self.dirty.insert(spec.property(), scalar);
        Ok(())
    }

    /// Flushes the dirty set to the backend.
    ///
    /// A clean entry is a no-op. Otherwise one update is issued, keyed by
    /// the identifier the backend currently knows; on success the cached
    /// identifier is refreshed and the dirty set cleared.
    pub fn sync(&mut self) -> CoreResult<()> {
        if self.deleted {
            return Err(CoreError::use_after_delete("synchronize"));
        }
        self.flush()
    }

    /// Deletes the backing row.
    ///
    /// On success the entry is dead: every operation except dropping it
    /// fails with `UseAfterDelete`.
    pub fn delete(&mut self) -> CoreResult<()> {
        if self.deleted {
            return Err(CoreError::use_after_delete("delete"));
        }
        let schema = E::schema();
        let condition = self.identifier_condition()?;
        self.backend.delete(schema.table(), &condition)?;
        self.deleted = true;
        debug!(table = schema.table(), id = %self.identifier, "deleted entry");
        Ok(())
    }

    /// Borrows the entity value.
    ///
    /// # Errors
    ///
    /// Fails with `UseAfterDelete` on a deleted entry.
    pub fn entity(&self) -> CoreResult<&E> {
        if self.deleted {
            return Err(CoreError::use_after_delete("read"));
        }
        Ok(&self.entity)
    }

    /// The identifier as last synchronized with the backend.
    ///
    /// # Errors
    ///
    /// Fails with `UseAfterDelete` on a deleted entry.
    pub fn identifier(&self) -> CoreResult<&Identifier> {
        if self.deleted {
            return Err(CoreError::use_after_delete("read the identifier of"));
        }
        Ok(&self.identifier)
    }

    /// Whether the entry has unsynchronized writes.
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Whether the backing row has been deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// The update/delete key: equality on the identifier column with the
    /// identifier the backend currently knows.
    fn identifier_condition(&self) -> CoreResult<ResolvedCondition> {
        let schema = E::schema();
        let scalar = schema.to_scalar(schema.identifier_property(), &self.identifier.to_field())?;
        Ok(ResolvedCondition::EqualTo {
            column: schema.identifier_column().to_string(),
            value: scalar,
        })
    }

    fn flush(&mut self) -> CoreResult<()> {
        if self.dirty.is_empty() {
            return Ok(());
        }
        let schema = E::schema();
        let condition = self.identifier_condition()?;
        let mut data = Row::new();
        for (property, scalar) in &self.dirty {
            data.insert(schema.column_for(property)?.to_string(), scalar.clone());
        }
        self.backend.update(schema.table(), &condition, data)?;
        self.identifier = self.entity.identifier()?;
        self.dirty.clear();
        debug!(table = schema.table(), id = %self.identifier, "synchronized entry");
        Ok(())
    }
}

impl<E: Entity> Drop for Entry<E> {
    fn drop(&mut self) {
        if self.deleted || self.dirty.is_empty() {
            return;
        }
        if let Err(error) = self.flush() {
            warn!(
                table = E::schema().table(),
                id = %self.identifier,
                %error,
                "failed to flush dirty entry on drop; call sync() to observe errors"
            );
        }
    }
}

impl<E: Entity + std::fmt::Debug> std::fmt::Debug for Entry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("entity", &self.entity)
            .field("identifier", &self.identifier)
            .field("dirty", &self.dirty.keys().collect::<Vec<_>>())
            .field("deleted", &self.deleted)
            .finish_non_exhaustive()
    }
}
