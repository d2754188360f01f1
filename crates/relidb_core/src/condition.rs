//! Property-named query conditions and their resolution.

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::schema::Schema;
use relidb_codec::{Field, Scalar};
use relidb_storage::ResolvedCondition;

/// A composable, property-named query predicate.
///
/// Conditions are built by the caller over property names and typed
/// values, then resolved against an entity's schema into a
/// [`ResolvedCondition`] over column names and storage scalars. Leaves are
/// immutable once built; the `All`/`Any` combinators support [`add`].
///
/// ```
/// use relidb_core::Condition;
///
/// let cond = Condition::all(vec![
///     Condition::greater_than_or_equal_to("plays", 5),
///     Condition::is_not_null("released"),
/// ]);
/// ```
///
/// [`add`]: Condition::add
#[derive(Debug, Clone)]
pub enum Condition {
    /// Matches every row.
    AlwaysTrue,
    /// Matches no row.
    AlwaysFalse,
    /// The property equals a value.
    EqualTo {
        /// Property to compare.
        property: String,
        /// Value the property must equal.
        value: Field,
    },
    /// The property differs from a value.
    NotEqualTo {
        /// Property to compare.
        property: String,
        /// Value the property must differ from.
        value: Field,
    },
    /// The property is strictly greater than a value.
    GreaterThan {
        /// Property to compare.
        property: String,
        /// Lower bound, exclusive.
        value: Field,
    },
    /// The property is greater than or equal to a value.
    GreaterThanOrEqualTo {
        /// Property to compare.
        property: String,
        /// Lower bound, inclusive.
        value: Field,
    },
    /// The property is strictly less than a value.
    LessThan {
        /// Property to compare.
        property: String,
        /// Upper bound, exclusive.
        value: Field,
    },
    /// The property is less than or equal to a value.
    LessThanOrEqualTo {
        /// Property to compare.
        property: String,
        /// Upper bound, inclusive.
        value: Field,
    },
    /// The property matches a regex pattern.
    MatchesRegex {
        /// Property to match.
        property: String,
        /// Pattern, compiled at resolution time.
        pattern: String,
    },
    /// Every child matches. Empty resolves to always-true.
    All(Vec<Condition>),
    /// At least one child matches. Empty resolves to always-false.
    Any(Vec<Condition>),
}

impl Condition {
    /// Equality against a value.
    ///
    /// Use [`Condition::is_null`] for null checks - equality against an
    /// explicit null is how the null check is represented, and backends
    /// are told so rather than being handed an ill-defined scalar
    /// comparison.
    pub fn equal_to(property: impl Into<String>, value: impl Into<Field>) -> Self {
        Self::EqualTo {
            property: property.into(),
            value: value.into(),
        }
    }

    /// Inequality against a value.
    pub fn not_equal_to(property: impl Into<String>, value: impl Into<Field>) -> Self {
        Self::NotEqualTo {
            property: property.into(),
            value: value.into(),
        }
    }

    /// Strictly-greater comparison.
    pub fn greater_than(property: impl Into<String>, value: impl Into<Field>) -> Self {
        Self::GreaterThan {
            property: property.into(),
            value: value.into(),
        }
    }

    /// Greater-or-equal comparison.
    pub fn greater_than_or_equal_to(property: impl Into<String>, value: impl Into<Field>) -> Self {
        Self::GreaterThanOrEqualTo {
            property: property.into(),
            value: value.into(),
        }
    }

    /// Strictly-less comparison.
    pub fn less_than(property: impl Into<String>, value: impl Into<Field>) -> Self {
        Self::LessThan {
            property: property.into(),
            value: value.into(),
        }
    }

    /// Less-or-equal comparison.
    pub fn less_than_or_equal_to(property: impl Into<String>, value: impl Into<Field>) -> Self {
        Self::LessThanOrEqualTo {
            property: property.into(),
            value: value.into(),
        }
    }

    /// Regex match over a text property.
    pub fn matches_regex(property: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::MatchesRegex {
            property: property.into(),
            pattern: pattern.into(),
        }
    }

    /// Null check; sugar for equality with a literal null.
    pub fn is_null(property: impl Into<String>) -> Self {
        Self::equal_to(property, Field::Null)
    }

    /// Non-null check; sugar for inequality with a literal null.
    pub fn is_not_null(property: impl Into<String>) -> Self {
        Self::not_equal_to(property, Field::Null)
    }

    /// Conjunction of children.
    pub fn all(children: Vec<Condition>) -> Self {
        Self::All(children)
    }

    /// Disjunction of children.
    pub fn any(children: Vec<Condition>) -> Self {
        Self::Any(children)
    }

    /// Conjunction of equality checks, one per map entry.
    pub fn all_equal<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Field>,
    {
        Self::All(
            pairs
                .into_iter()
                .map(|(property, value)| Self::equal_to(property, value))
                .collect(),
        )
    }

    /// Appends a child to an `All` or `Any` combinator.
    ///
    /// # Panics
    ///
    /// Panics when called on a leaf condition; only the combinators grow.
    pub fn add(&mut self, condition: Condition) {
        match self {
            Self::All(children) | Self::Any(children) => children.push(condition),
            _ => panic!("add is only supported on All and Any conditions"),
        }
    }

    /// Resolves this condition against an entity type's schema.
    ///
    /// Convenience over [`Condition::resolve_for`].
    pub fn resolve<E: Entity>(&self) -> CoreResult<ResolvedCondition> {
        self.resolve_for(E::schema())
    }

    /// Resolves property names and typed values into a backend-checkable
    /// predicate over column names and storage scalars.
    ///
    /// Resolution is pure: the same condition and schema always produce
    /// the same tree.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UnknownProperty`] when a leaf names a property the
    ///   schema does not declare.
    /// - [`CoreError::NotOrderable`] when an ordering comparison's value
    ///   does not transform to a numeric scalar.
    /// - [`CoreError::Transform`] when a value does not fit its property's
    ///   transformer.
    /// - [`CoreError::Storage`] when a regex pattern does not compile.
    pub fn resolve_for(&self, schema: &Schema) -> CoreResult<ResolvedCondition> {
        match self {
            Self::AlwaysTrue => Ok(ResolvedCondition::AlwaysTrue),
            Self::AlwaysFalse => Ok(ResolvedCondition::AlwaysFalse),
            Self::EqualTo { property, value } => {
                let (column, value) = resolve_leaf(schema, property, value)?;
                Ok(ResolvedCondition::EqualTo { column, value })
            }
            Self::NotEqualTo { property, value } => {
                let (column, value) = resolve_leaf(schema, property, value)?;
                Ok(ResolvedCondition::NotEqualTo { column, value })
            }
            Self::GreaterThan { property, value } => {
                let (column, value) = resolve_ordered_leaf(schema, property, value)?;
                Ok(ResolvedCondition::GreaterThan { column, value })
            }
            Self::GreaterThanOrEqualTo { property, value } => {
                let (column, value) = resolve_ordered_leaf(schema, property, value)?;
                Ok(ResolvedCondition::GreaterThanOrEqualTo { column, value })
            }
            Self::LessThan { property, value } => {
                let (column, value) = resolve_ordered_leaf(schema, property, value)?;
                Ok(ResolvedCondition::LessThan { column, value })
            }
            Self::LessThanOrEqualTo { property, value } => {
                let (column, value) = resolve_ordered_leaf(schema, property, value)?;
                Ok(ResolvedCondition::LessThanOrEqualTo { column, value })
            }
            Self::MatchesRegex { property, pattern } => {
                let column = schema.column_for(property)?.to_string();
                Ok(ResolvedCondition::matches_regex(column, pattern)?)
            }
            Self::All(children) => {
                if children.is_empty() {
                    return Ok(ResolvedCondition::AlwaysTrue);
                }
                let resolved = children
                    .iter()
                    .map(|child| child.resolve_for(schema))
                    .collect::<CoreResult<Vec<_>>>()?;
                Ok(ResolvedCondition::All(resolved))
            }
            Self::Any(children) => {
                if children.is_empty() {
                    return Ok(ResolvedCondition::AlwaysFalse);
                }
                let resolved = children
                    .iter()
                    .map(|child| child.resolve_for(schema))
                    .collect::<CoreResult<Vec<_>>>()?;
                Ok(ResolvedCondition::Any(resolved))
            }
        }
    }
}

fn resolve_leaf(schema: &Schema, property: &str, value: &Field) -> CoreResult<(String, Scalar)> {
    let column = schema.column_for(property)?.to_string();
    let value = schema.to_scalar(property, value)?;
    Ok((column, value))
}

/// Like [`resolve_leaf`], but the transformed scalar must be numeric.
fn resolve_ordered_leaf(
    schema: &Schema,
    property: &str,
    value: &Field,
) -> CoreResult<(String, Scalar)> {
    let (column, value) = resolve_leaf(schema, property, value)?;
    if value.as_number().is_none() {
        return Err(CoreError::not_orderable(property));
    }
    Ok((column, value))
}
