//! # RELIDB Codec
//!
//! Scalar value model and field transformers for RELIDB.
//!
//! This crate defines the two value domains of the mapping layer and the
//! codecs between them:
//!
//! - [`Scalar`] - a storage-safe value (integer, float, text or null),
//!   the only shape a backend ever sees.
//! - [`Field`] - a typed in-memory value as held by an entity (booleans,
//!   timestamps, references to other entities, ...).
//! - [`Transform`] - a bidirectional codec between the two.
//!
//! ## Round-trip Law
//!
//! For every transformer `t` and every value `v` in its domain:
//!
//! ```text
//! t.from_scalar(&t.to_scalar(&v)?)? == v
//! ```
//!
//! ## Usage
//!
//! ```
//! use relidb_codec::{BoolTransform, Field, Scalar, Transform};
//!
//! let codec = BoolTransform;
//! let stored = codec.to_scalar(&Field::Bool(true)).unwrap();
//! assert_eq!(stored, Scalar::Int(1));
//! assert_eq!(codec.from_scalar(&stored).unwrap(), Field::Bool(true));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod field;
mod transform;
mod value;

pub use error::{TransformError, TransformResult};
pub use field::{Field, Identifier};
pub use transform::{
    BoolTransform, DateTimeTransform, FloatTransform, IntTransform, MicroDateTimeTransform,
    NullableTransform, StringTransform, Transform, TransformSet,
};
pub use value::{Scalar, ScalarKind};
