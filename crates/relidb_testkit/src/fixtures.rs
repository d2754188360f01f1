//! Sample entity types and seeded backends.
//!
//! `Track` is the minimal two-column entity most scenarios use; `Note`
//! exercises the richer codecs (timestamps, nullable properties and an
//! entity reference).

use chrono::{DateTime, Utc};
use relidb_codec::{
    DateTimeTransform, Field, Identifier, IntTransform, MicroDateTimeTransform, NullableTransform,
    StringTransform, TransformError,
};
use relidb_core::{
    CoreError, CoreResult, Entity, Entry, FieldMap, ReferenceTransform, Schema,
};
use relidb_storage::{
    MemoryBackend, OrderKey, ResolvedCondition, Row, RowStream, StorageBackend, StorageResult,
};
use std::sync::{Arc, OnceLock};

/// A track row: a string column and an int column.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Identifier.
    pub id: i64,
    /// A plain string column.
    pub str_col: String,
    /// A plain int column.
    pub int_col: i64,
}

impl Track {
    /// Builds a track.
    #[must_use]
    pub fn new(id: i64, str_col: &str, int_col: i64) -> Self {
        Self {
            id,
            str_col: str_col.to_string(),
            int_col,
        }
    }
}

impl Entity for Track {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("tracks")
                .identifier("id", "id", IntTransform)
                .property("str_col", "str_col", StringTransform)
                .property("int_col", "int_col", IntTransform)
                .build()
        })
    }

    fn field(&self, property: &str) -> Option<Field> {
        match property {
            "id" => Some(Field::Int(self.id)),
            "str_col" => Some(Field::Text(self.str_col.clone())),
            "int_col" => Some(Field::Int(self.int_col)),
            _ => None,
        }
    }

    fn set_field(&mut self, property: &str, value: Field) -> CoreResult<()> {
        match property {
            "id" => self.id = expect_int(&value)?,
            "str_col" => self.str_col = expect_text(&value)?,
            "int_col" => self.int_col = expect_int(&value)?,
            other => return Err(CoreError::unknown_property(other, "tracks")),
        }
        Ok(())
    }

    fn from_fields(fields: &FieldMap) -> CoreResult<Self> {
        Ok(Self {
            id: expect_int(require(fields, "id")?)?,
            str_col: expect_text(require(fields, "str_col")?)?,
            int_col: expect_int(require(fields, "int_col")?)?,
        })
    }
}

/// A note row: timestamps, a nullable column and a reference to a track.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Identifier.
    pub id: i64,
    /// Body text.
    pub body: String,
    /// Creation time, stored as Unix seconds.
    pub created: DateTime<Utc>,
    /// Last edit time with microsecond precision, if ever edited.
    pub edited: Option<DateTime<Utc>>,
    /// The track this note is about, if any.
    pub track: Option<Identifier>,
}

impl Entity for Note {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("notes")
                .identifier("id", "id", IntTransform)
                .property("body", "body", StringTransform)
                .property("created", "created_at", DateTimeTransform)
                .property(
                    "edited",
                    "edited_at",
                    NullableTransform::new(MicroDateTimeTransform),
                )
                .property(
                    "track",
                    "track_id",
                    NullableTransform::new(ReferenceTransform::new(IntTransform)),
                )
                .build()
        })
    }

    fn field(&self, property: &str) -> Option<Field> {
        match property {
            "id" => Some(Field::Int(self.id)),
            "body" => Some(Field::Text(self.body.clone())),
            "created" => Some(Field::DateTime(self.created)),
            "edited" => Some(self.edited.map_or(Field::Null, Field::DateTime)),
            "track" => Some(
                self.track
                    .clone()
                    .map_or(Field::Null, Field::Reference),
            ),
            _ => None,
        }
    }

    fn set_field(&mut self, property: &str, value: Field) -> CoreResult<()> {
        match property {
            "id" => self.id = expect_int(&value)?,
            "body" => self.body = expect_text(&value)?,
            "created" => {
                self.created = value
                    .as_date_time()
                    .ok_or_else(|| TransformError::invalid("datetime field", value.describe()))?;
            }
            "edited" => {
                self.edited = match &value {
                    Field::Null => None,
                    other => Some(other.as_date_time().ok_or_else(|| {
                        TransformError::invalid("datetime field", other.describe())
                    })?),
                };
            }
            "track" => {
                self.track = match &value {
                    Field::Null => None,
                    other => Some(
                        other
                            .as_reference()
                            .cloned()
                            .ok_or_else(|| {
                                TransformError::invalid("reference field", other.describe())
                            })?,
                    ),
                };
            }
            other => return Err(CoreError::unknown_property(other, "notes")),
        }
        Ok(())
    }

    fn from_fields(fields: &FieldMap) -> CoreResult<Self> {
        let created = require(fields, "created")?
            .as_date_time()
            .ok_or_else(|| TransformError::invalid("datetime field", "created"))?;
        let edited = match fields.get("edited") {
            None | Some(Field::Null) => None,
            Some(other) => Some(other.as_date_time().ok_or_else(|| {
                TransformError::invalid("datetime field", other.describe())
            })?),
        };
        let track = match fields.get("track") {
            None | Some(Field::Null) => None,
            Some(other) => Some(other.as_reference().cloned().ok_or_else(|| {
                TransformError::invalid("reference field", other.describe())
            })?),
        };
        Ok(Self {
            id: expect_int(require(fields, "id")?)?,
            body: expect_text(require(fields, "body")?)?,
            created,
            edited,
            track,
        })
    }
}

fn require<'a>(fields: &'a FieldMap, property: &str) -> CoreResult<&'a Field> {
    fields
        .get(property)
        .ok_or_else(|| TransformError::invalid("present field", property).into())
}

fn expect_int(value: &Field) -> CoreResult<i64> {
    value
        .as_int()
        .ok_or_else(|| TransformError::invalid("int field", value.describe()).into())
}

fn expect_text(value: &Field) -> CoreResult<String> {
    value
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| TransformError::invalid("text field", value.describe()).into())
}

/// An empty memory backend with unique identifiers registered for both
/// fixture tables.
#[must_use]
pub fn fixture_backend() -> Arc<MemoryBackend> {
    let backend = MemoryBackend::new();
    backend.unique_columns("tracks", ["id"]);
    backend.unique_columns("notes", ["id"]);
    Arc::new(backend)
}

/// A backend seeded with the three standard tracks:
/// `("foo", 4)`, `("bar", 5)` and `("far", 6)`.
#[must_use]
pub fn seeded_track_backend() -> Arc<MemoryBackend> {
    let backend = fixture_backend();
    for (id, s, n) in [(1, "foo", 4), (2, "bar", 5), (3, "far", 6)] {
        Entry::create(Track::new(id, s, n), backend.clone()).expect("seeding cannot clash");
    }
    backend
}

/// Delegates to an inner memory backend while hiding its bulk capability.
///
/// Forces the update-many/delete-many fallback loop in tests.
#[derive(Debug, Default)]
pub struct NonBulkBackend {
    inner: MemoryBackend,
}

impl NonBulkBackend {
    /// Creates an empty non-bulk backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped memory backend.
    #[must_use]
    pub fn inner(&self) -> &MemoryBackend {
        &self.inner
    }
}

impl StorageBackend for NonBulkBackend {
    fn create(&self, table: &str, row: Row) -> StorageResult<Option<i64>> {
        self.inner.create(table, row)
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
        self.inner.read(table, condition, limit, offset, order, prefetch)
    }

    fn update(&self, table: &str, condition: &ResolvedCondition, data: Row) -> StorageResult<()> {
        self.inner.update(table, condition, data)
    }

    fn delete(&self, table: &str, condition: &ResolvedCondition) -> StorageResult<()> {
        self.inner.delete(table, condition)
    }
}
