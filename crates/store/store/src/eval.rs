//! In-process evaluation of filters and sort orders over [`Entity`] values.
//!
//! Backends that cannot push queries down (the in-memory store, test doubles)
//! use these helpers. The rules mirror the SQL the Postgres backend renders:
//!
//! - a missing field behaves like JSON `null` for `eq`/`ne`;
//! - `contains` matches string fields only, case-sensitively;
//! - ordering operators compare numbers with numbers and strings with strings
//!   and are false for any other pairing;
//! - when sorting, missing and `null` values go last ascending and first
//!   descending, with creation order breaking ties.

use std::cmp::Ordering;

use serde_json::Value;

use quire_core::{Condition, Entity, Filter, FilterOp, SortDirection};

use crate::query::{SortKey, SortSpec};

/// Whether `entity` satisfies `filter`.
pub fn matches(filter: &Filter, entity: &Entity) -> bool {
    match filter {
        Filter::And(clauses) => clauses.iter().all(|c| matches(c, entity)),
        Filter::Or(clauses) => clauses.iter().any(|c| matches(c, entity)),
        Filter::Condition(condition) => matches_condition(condition, entity),
    }
}

/// Whether `entity` satisfies an optional filter; `None` matches everything.
pub fn matches_opt(filter: Option<&Filter>, entity: &Entity) -> bool {
    filter.is_none_or(|f| matches(f, entity))
}

fn matches_condition(condition: &Condition, entity: &Entity) -> bool {
    let actual = entity.get(&condition.field).unwrap_or(Value::Null);
    let expected = &condition.value;

    match condition.op {
        FilterOp::Eq => json_eq(&actual, expected),
        FilterOp::Ne => !json_eq(&actual, expected),
        FilterOp::Contains => match (&actual, expected) {
            (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
            _ => false,
        },
        FilterOp::Lt => scalar_cmp(&actual, expected).is_some_and(Ordering::is_lt),
        FilterOp::Lte => scalar_cmp(&actual, expected).is_some_and(Ordering::is_le),
        FilterOp::Gt => scalar_cmp(&actual, expected).is_some_and(Ordering::is_gt),
        FilterOp::Gte => scalar_cmp(&actual, expected).is_some_and(Ordering::is_ge),
    }
}

/// JSON equality with numbers compared by value (`1 == 1.0`).
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Compare two scalars of the same kind. Mixed kinds are incomparable.
fn scalar_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.as_bytes().cmp(y.as_bytes())),
        _ => None,
    }
}

/// Rank of each JSON kind when values of different kinds are sorted together.
fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::String(_) => 0,
        Value::Number(_) => 1,
        Value::Bool(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

/// Total order used for sorting by a field value. `None` and `null` sort
/// after every present value.
pub fn compare_sort_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    kind_rank(a)
        .cmp(&kind_rank(b))
        .then_with(|| match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => scalar_cmp(a, b).unwrap_or(Ordering::Equal),
        })
}

/// Compare two stored entities under `sort`. `seq_*` is each entity's
/// creation sequence number.
pub fn compare_entities(
    sort: &SortSpec,
    (a, seq_a): (&Entity, u64),
    (b, seq_b): (&Entity, u64),
) -> Ordering {
    match &sort.key {
        SortKey::CreationOrder => directed(seq_a.cmp(&seq_b), sort.direction),
        SortKey::Field(field) => {
            let primary = compare_sort_values(a.get(field).as_ref(), b.get(field).as_ref());
            directed(primary, sort.direction).then_with(|| seq_a.cmp(&seq_b))
        }
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}
