//! Query execution across one or many backends.

use crate::condition::Condition;
use crate::context::Context;
use crate::entity::{Entity, FieldMap};
use crate::entry::Entry;
use crate::error::{CoreError, CoreResult};
use crate::schema::Schema;
use relidb_codec::{Identifier, Scalar};
use relidb_storage::{OrderKey, ReplayRows, Row, SortOrder, StorageBackend};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Where a query executes.
///
/// Backends are always chosen explicitly; `Default` routes through a
/// [`Context`] rather than any ambient global, so isolated test runs can
/// each carry their own.
#[derive(Clone, Copy)]
pub enum Source<'a> {
    /// The context's default backend.
    Default(&'a Context),
    /// One explicit backend.
    Backend(&'a Arc<dyn StorageBackend>),
    /// Several backends, fanned out in sequence.
    Backends(&'a [Arc<dyn StorageBackend>]),
}

impl Source<'_> {
    fn backends(&self) -> CoreResult<Vec<Arc<dyn StorageBackend>>> {
        match self {
            Source::Default(context) => Ok(vec![context.default_backend()?]),
            Source::Backend(backend) => Ok(vec![Arc::clone(backend)]),
            Source::Backends(backends) => Ok(backends.to_vec()),
        }
    }
}

/// Pagination, ordering and fetching options for a read.
///
/// `order` names *properties*, not columns; the executor translates them
/// through the schema. Ordering keys are positional.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Maximum number of rows per backend.
    pub limit: Option<usize>,
    /// Rows to skip per backend, after ordering.
    pub offset: usize,
    /// Ordering keys over property names.
    pub order: Vec<(String, SortOrder)>,
    /// Ask backends to materialize results eagerly.
    pub prefetch: bool,
}

impl ReadOptions {
    /// Sets the row limit.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the row offset.
    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Appends an ordering key.
    #[must_use]
    pub fn order_by(mut self, property: impl Into<String>, direction: SortOrder) -> Self {
        self.order.push((property.into(), direction));
        self
    }

    /// Requests eager materialization.
    #[must_use]
    pub fn prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }
}

/// A lazy sequence of hydrated entries.
///
/// Hydration happens as the iterator advances; dropping the iterator early
/// releases the underlying row streams.
pub struct EntryIter<E: Entity> {
    inner: Box<dyn Iterator<Item = CoreResult<Entry<E>>>>,
}

impl<E: Entity> EntryIter<E> {
    fn new(inner: impl Iterator<Item = CoreResult<Entry<E>>> + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    fn from_entries(entries: Vec<Entry<E>>) -> Self {
        Self::new(entries.into_iter().map(Ok))
    }
}

impl<E: Entity> std::fmt::Debug for EntryIter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryIter").finish_non_exhaustive()
    }
}

impl<E: Entity> Iterator for EntryIter<E> {
    type Item = CoreResult<Entry<E>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Fetches every entry matching a condition.
///
/// With several backends and no ordering, per-backend streams are
/// concatenated lazily in backend order. With several backends *and* an
/// ordering, results are fully materialized and merged with a stable
/// multi-key sort over the transformed property scalars. Limit and offset
/// apply per backend in both cases.
///
/// # Errors
///
/// Fails during setup for resolution errors (`UnknownProperty`,
/// `NotOrderable`, ...) and `NoDefaultBackend`; hydration errors surface
/// per item while iterating.
pub fn get_all<E: Entity>(
    condition: &Condition,
    source: Source<'_>,
    options: ReadOptions,
) -> CoreResult<EntryIter<E>> {
    let schema = E::schema();
    let resolved = condition.resolve_for(schema)?;
    let order = resolve_order(schema, &options.order)?;
    let backends = source.backends()?;
    let ReadOptions {
        limit,
        offset,
        order: order_properties,
        prefetch,
    } = options;

    if backends.len() > 1 && !order.is_empty() {
        // A global ordering across backends requires materializing.
        let mut entries = Vec::new();
        for backend in &backends {
            let stream = backend.read(schema.table(), &resolved, limit, offset, &order, prefetch)?;
            for row in stream {
                entries.push(Entry::hydrate(&row, Arc::clone(backend))?);
            }
        }
        let entries = merge_sorted(schema, entries, &order_properties)?;
        return Ok(EntryIter::from_entries(entries));
    }

    let table = schema.table();
    let iter = backends.into_iter().flat_map(
        move |backend| -> Box<dyn Iterator<Item = CoreResult<Entry<E>>>> {
            match backend.read(table, &resolved, limit, offset, &order, prefetch) {
                Ok(stream) => Box::new(
                    stream.map(move |row| Entry::hydrate(&row, Arc::clone(&backend))),
                ),
                Err(error) => Box::new(std::iter::once(Err(CoreError::Storage(error)))),
            }
        },
    );
    Ok(EntryIter::new(iter))
}

/// Fetches the first entry matching a condition, or `None`.
pub fn get<E: Entity>(
    condition: &Condition,
    source: Source<'_>,
    options: ReadOptions,
) -> CoreResult<Option<Entry<E>>> {
    let options = ReadOptions {
        limit: Some(1),
        prefetch: false,
        ..options
    };
    get_all(condition, source, options)?.next().transpose()
}

/// Fetches an entry by its identifier.
pub fn get_from_identifier<E: Entity>(
    identifier: impl Into<Identifier>,
    source: Source<'_>,
) -> CoreResult<Option<Entry<E>>> {
    let identifier = identifier.into();
    let condition = Condition::equal_to(E::schema().identifier_property(), identifier.to_field());
    get(&condition, source, ReadOptions::default())
}

/// Dereferences an entity reference to a live entry.
///
/// This is the explicit counterpart of reference hydration: rows decode a
/// reference property to its identifier, and following it is a query.
pub fn deref<E: Entity>(
    reference: &Identifier,
    source: Source<'_>,
) -> CoreResult<Option<Entry<E>>> {
    get_from_identifier::<E>(reference.clone(), source)
}

/// The result of [`replayable`]: hands out any number of independent
/// entry iterations over a single backend read.
///
/// Rows are memoized as the first iteration pulls them, so later
/// iterations (or several interleaved ones) never force the backends to
/// re-execute the read. Per-backend order is preserved; a global ordering
/// across backends still requires [`get_all`].
pub struct ReplayedEntries<E: Entity> {
    sources: Vec<(Arc<dyn StorageBackend>, ReplayRows)>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> ReplayedEntries<E> {
    /// Opens a fresh iteration from the beginning.
    pub fn iter(&self) -> EntryIter<E> {
        let parts: Vec<_> = self
            .sources
            .iter()
            .map(|(backend, replay)| (Arc::clone(backend), replay.cursor()))
            .collect();
        EntryIter::new(parts.into_iter().flat_map(|(backend, cursor)| {
            cursor.map(move |row| Entry::hydrate(&row, Arc::clone(&backend)))
        }))
    }
}

/// Fetches matching entries behind a replayable cursor.
///
/// Backend row streams may be single-pass; this wraps them in a memoizing
/// replay buffer so independent consumers can each walk the full result.
/// Use this instead of `prefetch` when consumers may stop early - only
/// the rows actually reached are pulled and cached.
pub fn replayable<E: Entity>(
    condition: &Condition,
    source: Source<'_>,
    options: ReadOptions,
) -> CoreResult<ReplayedEntries<E>> {
    let schema = E::schema();
    let resolved = condition.resolve_for(schema)?;
    let order = resolve_order(schema, &options.order)?;
    let mut sources = Vec::new();
    for backend in source.backends()? {
        let stream = backend.read(
            schema.table(),
            &resolved,
            options.limit,
            options.offset,
            &order,
            options.prefetch,
        )?;
        sources.push((backend, ReplayRows::new(stream)));
    }
    Ok(ReplayedEntries {
        sources,
        _marker: PhantomData,
    })
}

/// Updates every entry matching a condition.
///
/// Each backend is offered the operation through its bulk extension
/// first; when a backend lacks one (or declines), the matching entries
/// are fetched, mutated property by property and synchronized one at a
/// time.
pub fn update_many<E: Entity>(
    data: &FieldMap,
    condition: &Condition,
    source: Source<'_>,
) -> CoreResult<()> {
    let schema = E::schema();
    let resolved = condition.resolve_for(schema)?;
    let mut row = Row::new();
    for (property, value) in data {
        row.insert(
            schema.column_for(property)?.to_string(),
            schema.to_scalar(property, value)?,
        );
    }
    let transforms = schema.transform_set();

    for backend in source.backends()? {
        if let Some(bulk) = backend.as_bulk() {
            if bulk.bulk_update(schema.table(), &resolved, &transforms, row.clone())? {
                continue;
            }
        }
        debug!(
            table = schema.table(),
            "backend lacks native bulk update; syncing matching entries one by one"
        );
        let entries =
            get_all::<E>(condition, Source::Backend(&backend), ReadOptions::default().prefetch(true))?;
        for entry in entries {
            let mut entry = entry?;
            for (property, value) in data {
                entry.set(property, value.clone())?;
            }
            entry.sync()?;
        }
    }
    Ok(())
}

/// Deletes every entry matching a condition.
///
/// Mirrors [`update_many`]: bulk path first, per-entry fallback otherwise.
pub fn delete_many<E: Entity>(condition: &Condition, source: Source<'_>) -> CoreResult<()> {
    let schema = E::schema();
    let resolved = condition.resolve_for(schema)?;
    let transforms = schema.transform_set();

    for backend in source.backends()? {
        if let Some(bulk) = backend.as_bulk() {
            if bulk.bulk_delete(schema.table(), &resolved, &transforms)? {
                continue;
            }
        }
        debug!(
            table = schema.table(),
            "backend lacks native bulk delete; deleting matching entries one by one"
        );
        let entries =
            get_all::<E>(condition, Source::Backend(&backend), ReadOptions::default().prefetch(true))?;
        for entry in entries {
            entry?.delete()?;
        }
    }
    Ok(())
}

/// Translates property-named ordering keys into column-named ones.
fn resolve_order(schema: &Schema, order: &[(String, SortOrder)]) -> CoreResult<Vec<OrderKey>> {
    order
        .iter()
        .map(|(property, direction)| {
            Ok((schema.column_for(property)?.to_string(), *direction))
        })
        .collect()
}

/// Stable multi-key sort of materialized entries by transformed property
/// scalars.
fn merge_sorted<E: Entity>(
    schema: &Schema,
    entries: Vec<Entry<E>>,
    order: &[(String, SortOrder)],
) -> CoreResult<Vec<Entry<E>>> {
    let mut keyed: Vec<(Vec<Scalar>, Entry<E>)> = Vec::with_capacity(entries.len());
    for entry in entries {
        let mut key = Vec::with_capacity(order.len());
        for (property, _) in order {
            key.push(schema.to_scalar(property, &entry.get(property)?)?);
        }
        keyed.push((key, entry));
    }
    keyed.sort_by(|(a, _), (b, _)| {
        for (index, (_, direction)) in order.iter().enumerate() {
            let ordering = direction.apply(a[index].cmp_stored(&b[index]));
            if ordering != std::cmp::Ordering::Equal {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
    Ok(keyed.into_iter().map(|(_, entry)| entry).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{track_backend, Track};
    use relidb_codec::Field;
    use relidb_storage::{
        MemoryBackend, ResolvedCondition, RowStream, StorageError, StorageResult,
    };

    fn seeded() -> Arc<MemoryBackend> {
        let backend = track_backend();
        for (id, s, n) in [(1, "foo", 4), (2, "bar", 5), (3, "far", 6)] {
            Entry::create(Track::new(id, s, n), backend.clone()).unwrap();
        }
        backend
    }

    fn str_cols(iter: EntryIter<Track>) -> Vec<String> {
        iter.map(|entry| entry.unwrap().entity().unwrap().str_col.clone())
            .collect()
    }

    #[test]
    fn get_all_filters_and_orders() {
        let backend: Arc<dyn StorageBackend> = seeded();
        let entries = get_all::<Track>(
            &Condition::greater_than_or_equal_to("int_col", 5),
            Source::Backend(&backend),
            ReadOptions::default().order_by("int_col", SortOrder::Ascending),
        )
        .unwrap();
        assert_eq!(str_cols(entries), vec!["bar", "far"]);
    }

    #[test]
    fn get_all_on_an_unknown_property_fails_up_front() {
        let backend: Arc<dyn StorageBackend> = seeded();
        let err = get_all::<Track>(
            &Condition::equal_to("invalid-prop", "x"),
            Source::Backend(&backend),
            ReadOptions::default(),
        )
        .unwrap_err();
        match err {
            CoreError::UnknownProperty { property, .. } => assert_eq!(property, "invalid-prop"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn get_returns_the_first_match_or_none() {
        let backend: Arc<dyn StorageBackend> = seeded();
        let entry = get::<Track>(
            &Condition::equal_to("str_col", "bar"),
            Source::Backend(&backend),
            ReadOptions::default(),
        )
        .unwrap()
        .expect("bar exists");
        assert_eq!(entry.entity().unwrap().int_col, 5);

        let missing = get::<Track>(
            &Condition::equal_to("str_col", "nope"),
            Source::Backend(&backend),
            ReadOptions::default(),
        )
        .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn get_from_identifier_keys_on_the_identifier_property() {
        let backend: Arc<dyn StorageBackend> = seeded();
        let entry = get_from_identifier::<Track>(2i64, Source::Backend(&backend))
            .unwrap()
            .expect("id 2 exists");
        assert_eq!(entry.entity().unwrap().str_col, "bar");
    }

    #[test]
    fn default_source_requires_a_configured_backend() {
        let context = Context::new();
        let err = get_all::<Track>(
            &Condition::AlwaysTrue,
            Source::Default(&context),
            ReadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::NoDefaultBackend));
    }

    #[test]
    fn default_source_uses_the_context_backend() {
        let backend = seeded();
        let context = Context::with_default_backend(backend);
        let entries = get_all::<Track>(
            &Condition::AlwaysTrue,
            Source::Default(&context),
            ReadOptions::default(),
        )
        .unwrap();
        assert_eq!(entries.count(), 3);
    }

    #[test]
    fn multi_backend_without_order_concatenates() {
        let first = track_backend();
        let second = track_backend();
        Entry::create(Track::new(1, "val2", 1), second.clone()).unwrap();
        Entry::create(Track::new(2, "val1", 2), first.clone()).unwrap();

        let backends: Vec<Arc<dyn StorageBackend>> = vec![first, second];
        let entries = get_all::<Track>(
            &Condition::AlwaysTrue,
            Source::Backends(&backends),
            ReadOptions::default(),
        )
        .unwrap();
        // Backend order is preserved when no global order is requested.
        assert_eq!(str_cols(entries), vec!["val1", "val2"]);
    }

    #[test]
    fn multi_backend_with_order_merges_globally() {
        let first = track_backend();
        let second = track_backend();
        Entry::create(Track::new(1, "val2", 1), first.clone()).unwrap();
        Entry::create(Track::new(2, "val1", 2), second.clone()).unwrap();

        let backends: Vec<Arc<dyn StorageBackend>> = vec![first, second];
        let entries = get_all::<Track>(
            &Condition::AlwaysTrue,
            Source::Backends(&backends),
            ReadOptions::default().order_by("str_col", SortOrder::Ascending),
        )
        .unwrap();
        // Global order wins over physical backend order.
        assert_eq!(str_cols(entries), vec!["val1", "val2"]);
    }

    #[test]
    fn update_many_uses_the_bulk_path() {
        let backend: Arc<dyn StorageBackend> = seeded();
        let mut data = FieldMap::new();
        data.insert("str_col".into(), Field::Text("bulk".into()));

        update_many::<Track>(
            &data,
            &Condition::greater_than_or_equal_to("int_col", 5),
            Source::Backend(&backend),
        )
        .unwrap();

        let entries = get_all::<Track>(
            &Condition::equal_to("str_col", "bulk"),
            Source::Backend(&backend),
            ReadOptions::default(),
        )
        .unwrap();
        assert_eq!(entries.count(), 2);
    }

    #[test]
    fn delete_many_uses_the_bulk_path() {
        let backend: Arc<dyn StorageBackend> = seeded();
        delete_many::<Track>(
            &Condition::less_than("int_col", 6),
            Source::Backend(&backend),
        )
        .unwrap();

        let entries = get_all::<Track>(
            &Condition::AlwaysTrue,
            Source::Backend(&backend),
            ReadOptions::default(),
        )
        .unwrap();
        assert_eq!(str_cols(entries), vec!["far"]);
    }

    /// Delegates to a memory backend but hides the bulk capability.
    struct NonBulk(MemoryBackend);

    impl StorageBackend for NonBulk {
        fn create(&self, table: &str, row: Row) -> StorageResult<Option<i64>> {
            self.0.create(table, row)
        }

        fn read(
            &self,
            table: &str,
            condition: &ResolvedCondition,
            limit: Option<usize>,
            offset: usize,
            order: &[OrderKey],
            prefetch: bool,
        ) -> StorageResult<RowStream> {
            self.0.read(table, condition, limit, offset, order, prefetch)
        }

        fn update(&self, table: &str, condition: &ResolvedCondition, data: Row) -> StorageResult<()> {
            self.0.update(table, condition, data)
        }

        fn delete(&self, table: &str, condition: &ResolvedCondition) -> StorageResult<()> {
            self.0.delete(table, condition)
        }
    }

    fn seeded_non_bulk() -> Arc<dyn StorageBackend> {
        let backend = Arc::new(NonBulk(MemoryBackend::new()));
        for (id, s, n) in [(1, "foo", 4), (2, "bar", 5), (3, "far", 6)] {
            Entry::create(Track::new(id, s, n), backend.clone()).unwrap();
        }
        backend
    }

    #[test]
    fn update_many_falls_back_to_per_entry_sync() {
        let backend = seeded_non_bulk();
        let mut data = FieldMap::new();
        data.insert("str_col".into(), Field::Text("looped".into()));

        update_many::<Track>(
            &data,
            &Condition::greater_than("int_col", 4),
            Source::Backend(&backend),
        )
        .unwrap();

        let entries = get_all::<Track>(
            &Condition::equal_to("str_col", "looped"),
            Source::Backend(&backend),
            ReadOptions::default(),
        )
        .unwrap();
        assert_eq!(entries.count(), 2);
    }

    #[test]
    fn delete_many_falls_back_to_per_entry_delete() {
        let backend = seeded_non_bulk();
        delete_many::<Track>(&Condition::AlwaysTrue, Source::Backend(&backend)).unwrap();

        let entries = get_all::<Track>(
            &Condition::AlwaysTrue,
            Source::Backend(&backend),
            ReadOptions::default(),
        )
        .unwrap();
        assert_eq!(entries.count(), 0);
    }

    #[test]
    fn replayable_iterations_are_independent() {
        let backend: Arc<dyn StorageBackend> = seeded();
        let replay = replayable::<Track>(
            &Condition::AlwaysTrue,
            Source::Backend(&backend),
            ReadOptions::default(),
        )
        .unwrap();

        let mut first = replay.iter();
        let _ = first.next();
        let _ = first.next();
        // A second iteration still starts from the beginning.
        let all: Vec<String> = str_cols(replay.iter());
        assert_eq!(all, vec!["foo", "bar", "far"]);
        assert_eq!(str_cols(replay.iter()).len(), 3);
    }

    #[test]
    fn storage_failure_mid_stream_surfaces_per_item() {
        /// Fails every read.
        struct FailingReads;

        impl StorageBackend for FailingReads {
            fn create(&self, _: &str, _: Row) -> StorageResult<Option<i64>> {
                Ok(None)
            }
            fn read(
                &self,
                _: &str,
                _: &ResolvedCondition,
                _: Option<usize>,
                _: usize,
                _: &[OrderKey],
                _: bool,
            ) -> StorageResult<RowStream> {
                Err(StorageError::unsupported("reads refused"))
            }
            fn update(&self, _: &str, _: &ResolvedCondition, _: Row) -> StorageResult<()> {
                Ok(())
            }
            fn delete(&self, _: &str, _: &ResolvedCondition) -> StorageResult<()> {
                Ok(())
            }
        }

        let backend: Arc<dyn StorageBackend> = Arc::new(FailingReads);
        let mut entries = get_all::<Track>(
            &Condition::AlwaysTrue,
            Source::Backend(&backend),
            ReadOptions::default(),
        )
        .unwrap();
        let first = entries.next().expect("one error item");
        assert!(matches!(first, Err(CoreError::Storage(_))));
    }
}
