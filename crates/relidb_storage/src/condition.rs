//! Resolved, backend-checkable predicates.

use crate::error::{StorageError, StorageResult};
use crate::row::Row;
use regex::Regex;
use relidb_codec::Scalar;

/// A column-named predicate over stored rows.
///
/// Resolved conditions are what backends consume: every leaf names a
/// column and carries a storage scalar. They are produced by resolving a
/// property-named condition against an entity schema, though backends can
/// also be driven with hand-built trees.
///
/// A backend may evaluate the tree in memory with [`check`], or walk it to
/// build a predicate in its native query language (see [`crate::sql`]).
///
/// [`check`]: ResolvedCondition::check
#[derive(Debug, Clone)]
pub enum ResolvedCondition {
    /// Matches every row.
    AlwaysTrue,
    /// Matches no row.
    AlwaysFalse,
    /// The column's value equals the scalar exactly.
    ///
    /// With a null scalar this is the null-or-absent check.
    EqualTo {
        /// Column to compare.
        column: String,
        /// Value the column must equal.
        value: Scalar,
    },
    /// Negation of [`ResolvedCondition::EqualTo`].
    NotEqualTo {
        /// Column to compare.
        column: String,
        /// Value the column must differ from.
        value: Scalar,
    },
    /// The column is numeric and strictly greater than the scalar.
    GreaterThan {
        /// Column to compare.
        column: String,
        /// Lower bound, exclusive.
        value: Scalar,
    },
    /// The column is numeric and greater than or equal to the scalar.
    GreaterThanOrEqualTo {
        /// Column to compare.
        column: String,
        /// Lower bound, inclusive.
        value: Scalar,
    },
    /// The column is numeric and strictly less than the scalar.
    LessThan {
        /// Column to compare.
        column: String,
        /// Upper bound, exclusive.
        value: Scalar,
    },
    /// The column is numeric and less than or equal to the scalar.
    LessThanOrEqualTo {
        /// Column to compare.
        column: String,
        /// Upper bound, inclusive.
        value: Scalar,
    },
    /// The column is text and matches the compiled regex.
    MatchesRegex {
        /// Column to match.
        column: String,
        /// Compiled pattern.
        regex: Regex,
    },
    /// Every child matches. Empty means always true.
    All(Vec<ResolvedCondition>),
    /// At least one child matches. Empty means always false.
    Any(Vec<ResolvedCondition>),
}

impl ResolvedCondition {
    /// Equality against a scalar.
    pub fn equal_to(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::EqualTo {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Inequality against a scalar.
    pub fn not_equal_to(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::NotEqualTo {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Null-or-absent check; sugar for equality with a null scalar.
    pub fn is_null(column: impl Into<String>) -> Self {
        Self::equal_to(column, Scalar::Null)
    }

    /// Present-and-non-null check; sugar for inequality with a null scalar.
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::not_equal_to(column, Scalar::Null)
    }

    /// Regex match; compiles the pattern eagerly.
    ///
    /// # Errors
    ///
    /// Fails with [`StorageError::InvalidRegex`] if the pattern does not
    /// compile.
    pub fn matches_regex(column: impl Into<String>, pattern: &str) -> StorageResult<Self> {
        let regex = Regex::new(pattern).map_err(|source| StorageError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::MatchesRegex {
            column: column.into(),
            regex,
        })
    }

    /// Checks whether a row satisfies this predicate.
    ///
    /// A column absent from the row evaluates as null: equality against a
    /// non-null scalar is false, inequality against one is true, and the
    /// ordered comparisons and regex matches are false.
    pub fn check(&self, row: &Row) -> bool {
        match self {
            Self::AlwaysTrue => true,
            Self::AlwaysFalse => false,
            Self::EqualTo { column, value } => row.get(column).unwrap_or(&Scalar::Null) == value,
            Self::NotEqualTo { column, value } => row.get(column).unwrap_or(&Scalar::Null) != value,
            Self::GreaterThan { column, value } => check_ordered(row, column, value, false, false),
            Self::GreaterThanOrEqualTo { column, value } => {
                check_ordered(row, column, value, false, true)
            }
            Self::LessThan { column, value } => check_ordered(row, column, value, true, false),
            Self::LessThanOrEqualTo { column, value } => {
                check_ordered(row, column, value, true, true)
            }
            Self::MatchesRegex { column, regex } => row
                .get(column)
                .and_then(Scalar::as_text)
                .is_some_and(|text| regex.is_match(text)),
            Self::All(children) => children.iter().all(|c| c.check(row)),
            Self::Any(children) => children.iter().any(|c| c.check(row)),
        }
    }
}

/// Ordered comparison of a row value against a bound.
///
/// Both sides must be numeric; integers and floats compare against each
/// other by value.
fn check_ordered(row: &Row, column: &str, value: &Scalar, expect_less: bool, allow_equal: bool) -> bool {
    let Some(lhs) = row.get(column).and_then(Scalar::as_number) else {
        return false;
    };
    let Some(rhs) = value.as_number() else {
        return false;
    };
    match lhs.partial_cmp(&rhs) {
        Some(std::cmp::Ordering::Equal) => allow_equal,
        Some(std::cmp::Ordering::Less) => expect_less,
        Some(std::cmp::Ordering::Greater) => !expect_less,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Scalar)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn equal_to_is_strict() {
        let cond = ResolvedCondition::equal_to("n", 5i64);
        assert!(cond.check(&row(&[("n", Scalar::Int(5))])));
        assert!(!cond.check(&row(&[("n", Scalar::Float(5.0))])));
        assert!(!cond.check(&row(&[("n", Scalar::Int(6))])));
    }

    #[test]
    fn equal_to_missing_column_is_false_unless_null() {
        let cond = ResolvedCondition::equal_to("n", 5i64);
        assert!(!cond.check(&row(&[])));

        let null_check = ResolvedCondition::is_null("n");
        assert!(null_check.check(&row(&[])));
        assert!(null_check.check(&row(&[("n", Scalar::Null)])));
        assert!(!null_check.check(&row(&[("n", Scalar::Int(0))])));
    }

    #[test]
    fn not_equal_to_missing_column_is_true_for_non_null() {
        let cond = ResolvedCondition::not_equal_to("n", 5i64);
        assert!(cond.check(&row(&[])));
        assert!(cond.check(&row(&[("n", Scalar::Int(4))])));
        assert!(!cond.check(&row(&[("n", Scalar::Int(5))])));

        let not_null = ResolvedCondition::is_not_null("n");
        assert!(!not_null.check(&row(&[])));
        assert!(not_null.check(&row(&[("n", Scalar::Int(5))])));
    }

    #[test]
    fn ordered_comparisons_are_numeric() {
        let gte = ResolvedCondition::GreaterThanOrEqualTo {
            column: "n".into(),
            value: Scalar::Int(5),
        };
        assert!(gte.check(&row(&[("n", Scalar::Int(5))])));
        assert!(gte.check(&row(&[("n", Scalar::Float(5.0))])));
        assert!(gte.check(&row(&[("n", Scalar::Int(6))])));
        assert!(!gte.check(&row(&[("n", Scalar::Int(4))])));
        // Non-numeric or missing row values never satisfy a comparison.
        assert!(!gte.check(&row(&[("n", Scalar::Text("9".into()))])));
        assert!(!gte.check(&row(&[])));
    }

    #[test]
    fn strict_comparisons_exclude_equal() {
        let gt = ResolvedCondition::GreaterThan {
            column: "n".into(),
            value: Scalar::Float(5.0),
        };
        assert!(!gt.check(&row(&[("n", Scalar::Int(5))])));
        assert!(gt.check(&row(&[("n", Scalar::Int(6))])));

        let lt = ResolvedCondition::LessThan {
            column: "n".into(),
            value: Scalar::Int(5),
        };
        assert!(lt.check(&row(&[("n", Scalar::Float(4.5))])));
        assert!(!lt.check(&row(&[("n", Scalar::Int(5))])));
    }

    #[test]
    fn regex_matches_text_only() {
        let cond = ResolvedCondition::matches_regex("s", "^ba").unwrap();
        assert!(cond.check(&row(&[("s", Scalar::Text("bar".into()))])));
        assert!(!cond.check(&row(&[("s", Scalar::Text("foo".into()))])));
        assert!(!cond.check(&row(&[("s", Scalar::Int(1))])));
        assert!(!cond.check(&row(&[])));
    }

    #[test]
    fn invalid_regex_fails_at_construction() {
        let err = ResolvedCondition::matches_regex("s", "(unclosed").unwrap_err();
        assert!(matches!(err, StorageError::InvalidRegex { .. }));
    }

    #[test]
    fn empty_all_is_true_empty_any_is_false() {
        let r = row(&[("n", Scalar::Int(1))]);
        assert!(ResolvedCondition::All(vec![]).check(&r));
        assert!(!ResolvedCondition::Any(vec![]).check(&r));
    }

    #[test]
    fn combinators_recurse() {
        let r = row(&[("n", Scalar::Int(5)), ("s", Scalar::Text("bar".into()))]);
        let both = ResolvedCondition::All(vec![
            ResolvedCondition::equal_to("n", 5i64),
            ResolvedCondition::equal_to("s", "bar"),
        ]);
        assert!(both.check(&r));

        let either = ResolvedCondition::Any(vec![
            ResolvedCondition::equal_to("n", 99i64),
            ResolvedCondition::equal_to("s", "bar"),
        ]);
        assert!(either.check(&r));

        let neither = ResolvedCondition::Any(vec![
            ResolvedCondition::equal_to("n", 99i64),
            ResolvedCondition::AlwaysFalse,
        ]);
        assert!(!neither.check(&r));
    }
}
