//! Row and ordering types.

use relidb_codec::Scalar;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A stored row: a mapping of column names to scalars.
pub type Row = BTreeMap<String, Scalar>;

/// Sort direction for one ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    /// Applies the direction to a comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// One ordering key: a column name and a direction.
///
/// Multi-key ordering is positional, so an ordering is a slice of keys,
/// not a map.
pub type OrderKey = (String, SortOrder);

/// Compares two rows by a sequence of ordering keys.
///
/// Columns absent from a row compare as null, consistent with predicate
/// evaluation. Rows equal under every key compare as equal, so a stable
/// sort preserves their relative order.
pub fn compare_rows(a: &Row, b: &Row, order: &[OrderKey]) -> Ordering {
    for (column, direction) in order {
        let left = a.get(column).unwrap_or(&Scalar::Null);
        let right = b.get(column).unwrap_or(&Scalar::Null);
        let ordering = left.cmp_stored(right);
        if ordering != Ordering::Equal {
            return direction.apply(ordering);
        }
    }
    Ordering::Equal
}

/// Builds a row literal from column/scalar pairs.
///
/// Convenience for tests and fixtures.
#[must_use]
pub fn row_of(pairs: &[(&str, Scalar)]) -> Row {
    pairs
        .iter()
        .map(|(column, value)| ((*column).to_string(), value.clone()))
        .collect()
}
