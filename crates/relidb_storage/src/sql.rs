//! Rendering resolved conditions as parameterized SQL predicates.
//!
//! SQL-flavored backends built on the storage port can translate a
//! [`ResolvedCondition`] into a `WHERE` clause instead of filtering rows
//! in memory. Values are never interpolated - the rendered predicate uses
//! `?` placeholders and the parameters come back in order.

use crate::condition::ResolvedCondition;
use crate::row::{OrderKey, SortOrder};
use relidb_codec::Scalar;

/// Quotes an identifier for interpolation into a statement.
///
/// Wraps the identifier in backticks, escaping embedded backticks and
/// stripping NUL bytes.
#[must_use]
pub fn escape_identifier(identifier: &str) -> String {
    let mut escaped = String::with_capacity(identifier.len() + 2);
    escaped.push('`');
    for ch in identifier.chars() {
        match ch {
            '`' => escaped.push_str("\\`"),
            '\0' => {}
            other => escaped.push(other),
        }
    }
    escaped.push('`');
    escaped
}

/// Renders a condition as a SQL predicate with `?` placeholders.
///
/// Returns the predicate text and the parameters in placeholder order.
/// Null comparisons render as `IS NULL` / `IS NOT NULL` rather than
/// binding a null parameter, since scalar equality to null is ill-defined
/// in SQL.
#[must_use]
pub fn predicate(condition: &ResolvedCondition) -> (String, Vec<Scalar>) {
    let mut params = Vec::new();
    let text = render(condition, &mut params);
    (text, params)
}

/// Renders an `ORDER BY` clause body for a sequence of ordering keys.
///
/// Returns `None` when there are no keys.
#[must_use]
pub fn order_by(order: &[OrderKey]) -> Option<String> {
    if order.is_empty() {
        return None;
    }
    let keys: Vec<String> = order
        .iter()
        .map(|(column, direction)| {
            let dir = match direction {
                SortOrder::Ascending => "ASC",
                SortOrder::Descending => "DESC",
            };
            format!("{} {dir}", escape_identifier(column))
        })
        .collect();
    Some(keys.join(", "))
}

fn render(condition: &ResolvedCondition, params: &mut Vec<Scalar>) -> String {
    use ResolvedCondition as C;
    match condition {
        C::AlwaysTrue => "1".to_string(),
        C::AlwaysFalse => "0".to_string(),
        C::EqualTo { column, value } => match value {
            Scalar::Null => format!("{} IS NULL", escape_identifier(column)),
            other => {
                params.push(other.clone());
                format!("{}=?", escape_identifier(column))
            }
        },
        C::NotEqualTo { column, value } => match value {
            Scalar::Null => format!("{} IS NOT NULL", escape_identifier(column)),
            other => {
                params.push(other.clone());
                format!("{}<>?", escape_identifier(column))
            }
        },
        C::GreaterThan { column, value } => comparison(column, ">", value, params),
        C::GreaterThanOrEqualTo { column, value } => comparison(column, ">=", value, params),
        C::LessThan { column, value } => comparison(column, "<", value, params),
        C::LessThanOrEqualTo { column, value } => comparison(column, "<=", value, params),
        C::MatchesRegex { column, regex } => {
            params.push(Scalar::Text(regex.as_str().to_string()));
            format!("{} REGEXP ?", escape_identifier(column))
        }
        C::All(children) => combine(children, "AND", "1", params),
        C::Any(children) => combine(children, "OR", "0", params),
    }
}

fn comparison(column: &str, operator: &str, value: &Scalar, params: &mut Vec<Scalar>) -> String {
    params.push(value.clone());
    format!("{}{operator}?", escape_identifier(column))
}

fn combine(
    children: &[ResolvedCondition],
    joiner: &str,
    empty: &str,
    params: &mut Vec<Scalar>,
) -> String {
    if children.is_empty() {
        return empty.to_string();
    }
    let parts: Vec<String> = children
        .iter()
        .map(|child| render(child, params))
        .collect();
    format!("({})", parts.join(&format!(" {joiner} ")))
}
