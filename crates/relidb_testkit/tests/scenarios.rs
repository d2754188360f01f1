//! End-to-end scenarios across the codec, storage and core crates.

use chrono::{TimeZone, Utc};
use relidb_codec::{Field, Identifier, Scalar};
use relidb_core::{
    query, Condition, Context, CoreError, Entry, ReadOptions, SortOrder, Source, StorageBackend,
};
use relidb_storage::StorageError;
use relidb_testkit::fixtures::{
    fixture_backend, seeded_track_backend, NonBulkBackend, Note, Track,
};
use relidb_testkit::init_tracing;
use std::collections::BTreeMap;
use std::sync::Arc;

fn str_cols(iter: query::EntryIter<Track>) -> Vec<String> {
    iter.map(|entry| entry.unwrap().entity().unwrap().str_col.clone())
        .collect()
}

#[test]
fn comparison_with_ordering_selects_and_sorts() {
    init_tracing();
    let backend: Arc<dyn StorageBackend> = seeded_track_backend();

    let entries = query::get_all::<Track>(
        &Condition::greater_than_or_equal_to("int_col", 5),
        Source::Backend(&backend),
        ReadOptions::default().order_by("int_col", SortOrder::Ascending),
    )
    .unwrap();

    assert_eq!(str_cols(entries), vec!["bar", "far"]);
}

#[test]
fn unknown_property_fails_naming_the_property() {
    let backend: Arc<dyn StorageBackend> = seeded_track_backend();

    let err = query::get_all::<Track>(
        &Condition::equal_to("invalid-prop", "strCol"),
        Source::Backend(&backend),
        ReadOptions::default(),
    )
    .unwrap_err();

    assert!(err.to_string().contains("invalid-prop"));
    match err {
        CoreError::UnknownProperty { property, table } => {
            assert_eq!(property, "invalid-prop");
            assert_eq!(table, "tracks");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ordered_fan_out_merges_across_backends() {
    // "val2" is inserted first and its backend listed first; the requested
    // ordering must still win over physical placement.
    let first = fixture_backend();
    let second = fixture_backend();
    Entry::create(Track::new(1, "val2", 1), first.clone()).unwrap();
    Entry::create(Track::new(2, "val1", 2), second.clone()).unwrap();

    let backends: Vec<Arc<dyn StorageBackend>> = vec![first, second];
    let entries = query::get_all::<Track>(
        &Condition::AlwaysTrue,
        Source::Backends(&backends),
        ReadOptions::default().order_by("str_col", SortOrder::Ascending),
    )
    .unwrap();

    assert_eq!(str_cols(entries), vec!["val1", "val2"]);
}

#[test]
fn creation_inserts_one_row_matching_the_identifier() {
    let backend = fixture_backend();
    let entry = Entry::create(Track::new(42, "foo", 4), backend.clone()).unwrap();

    assert_eq!(entry.get("str_col").unwrap(), Field::Text("foo".into()));
    assert_eq!(entry.get("int_col").unwrap(), Field::Int(4));

    let rows = backend.rows("tracks");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], Scalar::Int(42));
}

#[test]
fn set_then_sync_is_visible_to_a_refetch() {
    let backend: Arc<dyn StorageBackend> = seeded_track_backend();

    let mut entry = query::get_from_identifier::<Track>(2i64, Source::Backend(&backend))
        .unwrap()
        .expect("track 2 exists");
    entry.set("int_col", 50i64).unwrap();
    entry.sync().unwrap();

    let refetched = query::get_from_identifier::<Track>(2i64, Source::Backend(&backend))
        .unwrap()
        .expect("track 2 still exists");
    assert_eq!(refetched.get("int_col").unwrap(), Field::Int(50));
}

#[test]
fn deleted_entries_refuse_every_operation() {
    let backend = fixture_backend();
    let mut entry = Entry::create(Track::new(1, "foo", 4), backend.clone()).unwrap();

    entry.delete().unwrap();

    assert!(matches!(
        entry.get("str_col").unwrap_err(),
        CoreError::UseAfterDelete { .. }
    ));
    assert!(matches!(
        entry.set("str_col", "x").unwrap_err(),
        CoreError::UseAfterDelete { .. }
    ));
    assert!(matches!(
        entry.sync().unwrap_err(),
        CoreError::UseAfterDelete { .. }
    ));
    assert!(matches!(
        entry.delete().unwrap_err(),
        CoreError::UseAfterDelete { .. }
    ));
    assert!(backend.rows("tracks").is_empty());
}

#[test]
fn duplicate_identifier_is_reported_with_the_column() {
    let backend = fixture_backend();
    let _first = Entry::create(Track::new(1, "foo", 4), backend.clone()).unwrap();

    let err = Entry::create(Track::new(1, "bar", 5), backend).unwrap_err();
    match err {
        CoreError::Storage(StorageError::DuplicateEntry { table, column }) => {
            assert_eq!(table, "tracks");
            assert_eq!(column, "id");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn default_backend_routes_through_the_context() {
    let backend = seeded_track_backend();
    let context = Context::with_default_backend(backend);

    let entry = query::get::<Track>(
        &Condition::equal_to("str_col", "far"),
        Source::Default(&context),
        ReadOptions::default(),
    )
    .unwrap()
    .expect("far exists");
    assert_eq!(entry.entity().unwrap().int_col, 6);

    let empty = Context::new();
    let err = query::get::<Track>(
        &Condition::AlwaysTrue,
        Source::Default(&empty),
        ReadOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::NoDefaultBackend));
}

#[test]
fn empty_combinators_follow_the_documented_policy() {
    let backend: Arc<dyn StorageBackend> = seeded_track_backend();

    let all = query::get_all::<Track>(
        &Condition::all(vec![]),
        Source::Backend(&backend),
        ReadOptions::default(),
    )
    .unwrap();
    assert_eq!(all.count(), 3);

    let any = query::get_all::<Track>(
        &Condition::any(vec![]),
        Source::Backend(&backend),
        ReadOptions::default(),
    )
    .unwrap();
    assert_eq!(any.count(), 0);
}

#[test]
fn bulk_fallback_completes_without_backend_support() {
    init_tracing();
    let backend: Arc<dyn StorageBackend> = Arc::new(NonBulkBackend::new());
    for (id, s, n) in [(1, "foo", 4), (2, "bar", 5), (3, "far", 6)] {
        Entry::create(Track::new(id, s, n), backend.clone()).unwrap();
    }

    let mut data = BTreeMap::new();
    data.insert("str_col".to_string(), Field::Text("renamed".into()));
    query::update_many::<Track>(
        &data,
        &Condition::greater_than("int_col", 4),
        Source::Backend(&backend),
    )
    .unwrap();

    let renamed = query::get_all::<Track>(
        &Condition::equal_to("str_col", "renamed"),
        Source::Backend(&backend),
        ReadOptions::default(),
    )
    .unwrap();
    assert_eq!(renamed.count(), 2);

    query::delete_many::<Track>(&Condition::AlwaysTrue, Source::Backend(&backend)).unwrap();
    let remaining = query::get_all::<Track>(
        &Condition::AlwaysTrue,
        Source::Backend(&backend),
        ReadOptions::default(),
    )
    .unwrap();
    assert_eq!(remaining.count(), 0);
}

#[test]
fn notes_round_trip_through_the_richer_codecs() {
    let backend = fixture_backend();
    let track_entry = Entry::create(Track::new(7, "subject", 1), backend.clone()).unwrap();
    drop(track_entry);

    let created = Utc.with_ymd_and_hms(2023, 3, 15, 9, 0, 0).unwrap();
    let note = Note {
        id: 1,
        body: "first listen".to_string(),
        created,
        edited: None,
        track: Some(Identifier::Int(7)),
    };
    let _entry = Entry::create(note.clone(), backend.clone()).unwrap();

    // The stored row carries scalars only.
    let rows = backend.rows("notes");
    assert_eq!(rows[0]["created_at"], Scalar::Int(created.timestamp()));
    assert_eq!(rows[0]["edited_at"], Scalar::Null);
    assert_eq!(rows[0]["track_id"], Scalar::Int(7));

    let backend: Arc<dyn StorageBackend> = backend;
    let fetched = query::get_from_identifier::<Note>(1i64, Source::Backend(&backend))
        .unwrap()
        .expect("note exists");
    assert_eq!(fetched.entity().unwrap(), &note);

    // Hydration stops at the identifier; following it is an explicit query.
    let reference = fetched.entity().unwrap().track.clone().unwrap();
    let track = query::deref::<Track>(&reference, Source::Backend(&backend))
        .unwrap()
        .expect("referenced track exists");
    assert_eq!(track.entity().unwrap().str_col, "subject");
}

#[test]
fn nullable_columns_support_null_checks() {
    let backend = fixture_backend();
    let created = Utc.with_ymd_and_hms(2023, 3, 15, 9, 0, 0).unwrap();
    let edited = Utc.with_ymd_and_hms(2023, 3, 16, 10, 30, 0).unwrap();
    for (id, edited) in [(1, None), (2, Some(edited))] {
        let note = Note {
            id,
            body: format!("note {id}"),
            created,
            edited,
            track: None,
        };
        Entry::create(note, backend.clone()).unwrap();
    }

    let backend: Arc<dyn StorageBackend> = backend;
    let unedited = query::get_all::<Note>(
        &Condition::is_null("edited"),
        Source::Backend(&backend),
        ReadOptions::default(),
    )
    .unwrap();
    let ids: Vec<i64> = unedited
        .map(|entry| entry.unwrap().entity().unwrap().id)
        .collect();
    assert_eq!(ids, vec![1]);

    let edited_notes = query::get_all::<Note>(
        &Condition::is_not_null("edited"),
        Source::Backend(&backend),
        ReadOptions::default(),
    )
    .unwrap();
    assert_eq!(edited_notes.count(), 1);
}

#[test]
fn regex_conditions_match_stored_text() {
    let backend: Arc<dyn StorageBackend> = seeded_track_backend();

    let entries = query::get_all::<Track>(
        &Condition::matches_regex("str_col", "ar$"),
        Source::Backend(&backend),
        ReadOptions::default().order_by("int_col", SortOrder::Ascending),
    )
    .unwrap();
    assert_eq!(str_cols(entries), vec!["bar", "far"]);
}

#[test]
fn stored_rows_serialize_for_inspection() {
    let backend = seeded_track_backend();
    let rows = backend.rows("tracks");
    let json = serde_json::to_string(&rows[0]).unwrap();
    assert_eq!(json, r#"{"id":1,"int_col":4,"str_col":"foo"}"#);
}
