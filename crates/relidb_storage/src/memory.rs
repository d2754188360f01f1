//! In-memory storage backend for testing.

use crate::backend::{BulkStorageBackend, StorageBackend};
use crate::condition::ResolvedCondition;
use crate::error::{StorageError, StorageResult};
use crate::row::{compare_rows, OrderKey, Row};
use crate::stream::RowStream;
use parking_lot::RwLock;
use relidb_codec::TransformSet;
use std::collections::HashMap;

/// An in-memory storage backend.
///
/// Rows live in a `Vec` per table; every read materializes, filters and
/// sorts a snapshot, so the backend is suitable for:
///
/// - Unit and integration tests
/// - Ephemeral data that doesn't need persistence
///
/// Tables come into existence on first `create`; reading an unknown table
/// yields no rows, and updating or deleting on one is a no-op.
///
/// Uniqueness is only enforced for columns registered through
/// [`MemoryBackend::unique_columns`] - typically the identifier column of
/// the entity type stored in the table.
///
/// # Thread Safety
///
/// The backend is thread-safe and can be shared across threads.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    unique: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryBackend {
    /// Creates a new empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers columns whose values must be unique within a table.
    ///
    /// `create` and `update` fail with `DuplicateEntry` when a non-null
    /// value for one of these columns already exists in another row.
    pub fn unique_columns<I, S>(&self, table: impl Into<String>, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique
            .write()
            .insert(table.into(), columns.into_iter().map(Into::into).collect());
    }

    /// Returns a snapshot of all rows in a table.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables.read().get(table).cloned().unwrap_or_default()
    }

    /// Clears all tables.
    pub fn clear(&self) {
        self.tables.write().clear();
    }

    /// Checks `candidate` against every row except `skip` for unique
    /// column clashes. Null values never clash.
    fn check_unique(
        &self,
        table: &str,
        rows: &[Row],
        candidate: &Row,
        skip: Option<usize>,
    ) -> StorageResult<()> {
        let unique = self.unique.read();
        let Some(columns) = unique.get(table) else {
            return Ok(());
        };
        for column in columns {
            let Some(value) = candidate.get(column) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let clash = rows
                .iter()
                .enumerate()
                .filter(|(index, _)| Some(*index) != skip)
                .any(|(_, row)| row.get(column) == Some(value));
            if clash {
                return Err(StorageError::duplicate_entry(table, column.clone()));
            }
        }
        Ok(())
    }
}

impl StorageBackend for MemoryBackend {
    fn create(&self, table: &str, row: Row) -> StorageResult<Option<i64>> {
        let mut tables = self.tables.write();
        let rows = tables.entry(table.to_string()).or_default();
        self.check_unique(table, rows, &row, None)?;
        rows.push(row);
        Ok(None)
    }

    fn read(
        &self,
        table: &str,
        condition: &ResolvedCondition,
        limit: Option<usize>,
        offset: usize,
        order: &[OrderKey],
        _prefetch: bool,
    ) -> StorageResult<RowStream> {
        // The snapshot is materialized either way, so prefetch is moot.
        let tables = self.tables.read();
        let Some(rows) = tables.get(table) else {
            return Ok(RowStream::empty());
        };
        let mut matching: Vec<Row> = rows
            .iter()
            .filter(|row| condition.check(row))
            .cloned()
            .collect();
        if !order.is_empty() {
            matching.sort_by(|a, b| compare_rows(a, b, order));
        }
        let matching: Vec<Row> = matching
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .collect();
        Ok(RowStream::from_rows(matching))
    }

    fn update(&self, table: &str, condition: &ResolvedCondition, data: Row) -> StorageResult<()> {
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(());
        };
        let matching: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| condition.check(row))
            .map(|(index, _)| index)
            .collect();
        for index in matching {
            let mut updated = rows[index].clone();
            for (column, value) in &data {
                updated.insert(column.clone(), value.clone());
            }
            self.check_unique(table, rows, &updated, Some(index))?;
            rows[index] = updated;
        }
        Ok(())
    }

    fn delete(&self, table: &str, condition: &ResolvedCondition) -> StorageResult<()> {
        let mut tables = self.tables.write();
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !condition.check(row));
        }
        Ok(())
    }

    fn as_bulk(&self) -> Option<&dyn BulkStorageBackend> {
        Some(self)
    }
}

impl BulkStorageBackend for MemoryBackend {
    fn bulk_update(
        &self,
        table: &str,
        condition: &ResolvedCondition,
        _transforms: &TransformSet,
        data: Row,
    ) -> StorageResult<bool> {
        self.update(table, condition, data)?;
        Ok(true)
    }

    fn bulk_delete(
        &self,
        table: &str,
        condition: &ResolvedCondition,
        _transforms: &TransformSet,
    ) -> StorageResult<bool> {
        self.delete(table, condition)?;
        Ok(true)
    }
}
