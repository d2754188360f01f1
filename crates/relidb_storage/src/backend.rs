//! Storage port trait definitions.

use crate::condition::ResolvedCondition;
use crate::error::StorageResult;
use crate::row::{OrderKey, Row};
use crate::stream::RowStream;
use relidb_codec::TransformSet;

/// The narrow contract a storage backend must implement.
///
/// This is the only boundary between the mapping layer and the engine that
/// holds the rows. Backends see column names and scalars, never entity
/// types or transformers.
///
/// # Invariants
///
/// - `create` either stores the full row or fails; partial writes are not
///   observable.
/// - `read` returns rows matching the condition, ordered by `order`, with
///   `offset`/`limit` applied after ordering.
/// - Row streams may be lazy and single-pass; `prefetch` requests eager
///   materialization.
///
/// # Implementors
///
/// - [`super::MemoryBackend`] - for tests and ephemeral data.
pub trait StorageBackend: Send + Sync {
    /// Stores a new row.
    ///
    /// Returns the auto-generated row id when the table has one.
    ///
    /// # Errors
    ///
    /// Fails with `DuplicateEntry` when a uniqueness constraint is
    /// violated; the error names the conflicting column.
    fn create(&self, table: &str, row: Row) -> StorageResult<Option<i64>>;

    /// Reads rows matching a condition.
    ///
    /// `order` is applied before `offset` and `limit`. With
    /// `prefetch = true` the backend materializes the result eagerly;
    /// otherwise the stream may hold backend resources until dropped or
    /// exhausted.
    fn read(
        &self,
        table: &str,
        condition: &ResolvedCondition,
        limit: Option<usize>,
        offset: usize,
        order: &[OrderKey],
        prefetch: bool,
    ) -> StorageResult<RowStream>;

    /// Updates every row matching a condition with the given columns.
    ///
    /// # Errors
    ///
    /// Fails with `DuplicateEntry` when the update would violate a
    /// uniqueness constraint.
    fn update(&self, table: &str, condition: &ResolvedCondition, data: Row) -> StorageResult<()>;

    /// Deletes every row matching a condition.
    fn delete(&self, table: &str, condition: &ResolvedCondition) -> StorageResult<()>;

    /// Probes for the bulk extension.
    ///
    /// Backends that can push multi-row mutations down natively override
    /// this to return themselves; callers fall back to per-row iteration
    /// otherwise.
    fn as_bulk(&self) -> Option<&dyn BulkStorageBackend> {
        None
    }
}

impl std::fmt::Debug for dyn StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("dyn StorageBackend").finish_non_exhaustive()
    }
}

/// Optional bulk extension of the storage port.
///
/// Both operations return whether the backend handled the mutation
/// natively; `false` tells the caller to fall back to fetching the
/// matching rows and mutating them one by one.
pub trait BulkStorageBackend: StorageBackend {
    /// Updates matching rows in one backend-side operation.
    ///
    /// `data` is already transformed to scalars; `transforms` carries the
    /// table's codecs for backends that need to interpret values.
    fn bulk_update(
        &self,
        table: &str,
        condition: &ResolvedCondition,
        transforms: &TransformSet,
        data: Row,
    ) -> StorageResult<bool>;

    /// Deletes matching rows in one backend-side operation.
    fn bulk_delete(
        &self,
        table: &str,
        condition: &ResolvedCondition,
        transforms: &TransformSet,
    ) -> StorageResult<bool>;
}
