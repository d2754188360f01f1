//! # RELIDB Core
//!
//! Condition resolution and entry lifecycle engine for RELIDB.
//!
//! This crate provides:
//! - [`Schema`] - explicit, builder-registered descriptors mapping entity
//!   properties to columns and transformers
//! - [`Entity`] - the trait an entity type implements to participate in
//!   the mapping layer
//! - [`Condition`] - property-named, composable query predicates and
//!   their resolution into backend-checkable form
//! - [`Entry`] - a live instance of an entity, bound to one backend, with
//!   dirty tracking and explicit synchronization
//! - [`query`] - get/get_all and the bulk operations across one or many
//!   backends
//!
//! ## A Complete Round Trip
//!
//! ```rust,ignore
//! use relidb_core::{query, Condition, Context, Entry, ReadOptions, Source};
//!
//! let context = Context::with_default_backend(backend);
//! let mut entry = Entry::create(track, backend.clone())?;
//! entry.set("title", "Blue in Green")?;
//! entry.sync()?;
//!
//! let found = query::get_all::<Track>(
//!     &Condition::greater_than_or_equal_to("plays", 5),
//!     Source::Default(&context),
//!     ReadOptions::default(),
//! )?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod condition;
mod context;
mod entity;
mod entry;
mod error;
pub mod query;
mod reference;
mod schema;

#[cfg(test)]
pub(crate) mod fixtures;

pub use condition::Condition;
pub use context::Context;
pub use entity::{Entity, FieldMap};
pub use entry::Entry;
pub use error::{CoreError, CoreResult};
pub use query::{EntryIter, ReadOptions, ReplayedEntries, Source};
pub use reference::ReferenceTransform;
pub use schema::{PropertySpec, Schema, SchemaBuilder};

// The value and storage vocabulary, re-exported for downstream crates.
pub use relidb_codec::{Field, Identifier, Scalar, Transform};
pub use relidb_storage::{ResolvedCondition, SortOrder, StorageBackend};
