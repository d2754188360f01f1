//! # RELIDB Storage
//!
//! Storage port, resolved predicates and the in-memory backend for RELIDB.
//!
//! This crate is the boundary between the mapping layer and whatever
//! actually holds the rows:
//!
//! - [`StorageBackend`] - the narrow create/read/update/delete contract a
//!   backend must implement, with an optional bulk extension
//!   ([`BulkStorageBackend`]).
//! - [`ResolvedCondition`] - a column-named predicate tree a backend can
//!   either evaluate in memory ([`ResolvedCondition::check`]) or translate
//!   into its native query language (see the [`sql`] module).
//! - [`MemoryBackend`] - a table-per-`Vec` backend for tests and ephemeral
//!   data.
//! - [`ReplayRows`] - a memoizing adapter that lets several consumers
//!   iterate one single-pass row stream independently.
//!
//! Backends are deliberately unaware of entity types, property names and
//! transformers; they only ever see column names and [`Scalar`]s.
//!
//! [`Scalar`]: relidb_codec::Scalar

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod condition;
mod error;
mod memory;
mod row;
pub mod sql;
mod stream;

pub use backend::{BulkStorageBackend, StorageBackend};
pub use condition::ResolvedCondition;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use row::{compare_rows, row_of, OrderKey, Row, SortOrder};
pub use stream::{ReplayCursor, ReplayRows, RowStream};
