//! Explicit execution context.

use crate::error::{CoreError, CoreResult};
use parking_lot::RwLock;
use relidb_storage::StorageBackend;
use std::sync::Arc;

/// Holds the default storage backend for query execution.
///
/// The context replaces ambient global state: callers construct one during
/// setup, hand it to the query functions through
/// [`Source::Default`](crate::query::Source::Default), and isolated test
/// runs simply build their own. The default backend is written during
/// setup and read for the rest of the run (single-writer, many-reader).
#[derive(Default)]
pub struct Context {
    default_backend: RwLock<Option<Arc<dyn StorageBackend>>>,
}

impl Context {
    /// Creates a context with no default backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context with a default backend already configured.
    #[must_use]
    pub fn with_default_backend(backend: Arc<dyn StorageBackend>) -> Self {
        let context = Self::new();
        context.set_default_backend(Some(backend));
        context
    }

    /// Sets or clears the default backend.
    pub fn set_default_backend(&self, backend: Option<Arc<dyn StorageBackend>>) {
        *self.default_backend.write() = backend;
    }

    /// The configured default backend.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::NoDefaultBackend`] when none is configured.
    pub fn default_backend(&self) -> CoreResult<Arc<dyn StorageBackend>> {
        self.default_backend
            .read()
            .clone()
            .ok_or(CoreError::NoDefaultBackend)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("has_default_backend", &self.default_backend.read().is_some())
            .finish()
    }
}
