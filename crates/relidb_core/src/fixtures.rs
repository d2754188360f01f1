//! Crate-internal test fixtures.

use crate::entity::{Entity, FieldMap};
use crate::error::{CoreError, CoreResult};
use crate::schema::Schema;
use relidb_codec::{Field, IntTransform, StringTransform, TransformError};
use relidb_storage::MemoryBackend;
use std::sync::{Arc, OnceLock};

/// A minimal entity with a string column and an int column.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Track {
    pub id: i64,
    pub str_col: String,
    pub int_col: i64,
}

impl Track {
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
            "id" => {
                self.id = value
                    .as_int()
                    .ok_or_else(|| TransformError::invalid("int field", value.describe()))?;
            }
            "str_col" => {
                self.str_col = value
                    .as_text()
                    .ok_or_else(|| TransformError::invalid("text field", value.describe()))?
                    .to_string();
            }
            "int_col" => {
                self.int_col = value
                    .as_int()
                    .ok_or_else(|| TransformError::invalid("int field", value.describe()))?;
            }
            other => return Err(CoreError::unknown_property(other, "tracks")),
        }
        Ok(())
    }

    fn from_fields(fields: &FieldMap) -> CoreResult<Self> {
        let int_of = |name: &str| -> CoreResult<i64> {
            fields
                .get(name)
                .and_then(Field::as_int)
                .ok_or_else(|| TransformError::invalid("int field", name).into())
        };
        let str_col = fields
            .get("str_col")
            .and_then(Field::as_text)
            .ok_or_else(|| TransformError::invalid("text field", "str_col"))?
            .to_string();
        Ok(Self {
            id: int_of("id")?,
            str_col,
            int_col: int_of("int_col")?,
        })
    }
}

/// A memory backend with the track table's identifier registered unique.
pub(crate) fn track_backend() -> Arc<MemoryBackend> {
    let backend = MemoryBackend::new();
    backend.unique_columns("tracks", ["id"]);
    Arc::new(backend)
}
