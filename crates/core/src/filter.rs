use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operators available in filter leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    /// Substring match on string fields.
    Contains,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl FilterOp {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Contains => "contains",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
        }
    }

    /// Whether the operator orders values (`lt`, `lte`, `gt`, `gte`).
    #[must_use]
    pub fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Lte | Self::Gt | Self::Gte)
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `field op value` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

/// A structural filter: a tree of conjunctions and disjunctions over
/// [`Condition`] leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Condition(Condition),
}

impl Filter {
    fn leaf(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self::Condition(Condition {
            field: field.into(),
            op,
            value: value.into(),
        })
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOp::Ne, value)
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::leaf(field, FilterOp::Contains, Value::String(value.into()))
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOp::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOp::Lte, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, FilterOp::Gte, value)
    }

    #[must_use]
    pub fn and(clauses: Vec<Filter>) -> Self {
        Self::And(clauses)
    }

    #[must_use]
    pub fn or(clauses: Vec<Filter>) -> Self {
        Self::Or(clauses)
    }

    /// Nesting depth; a bare condition has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Condition(_) => 1,
            Self::And(clauses) | Self::Or(clauses) => {
                1 + clauses.iter().map(Self::depth).max().unwrap_or(0)
            }
        }
    }

    /// All leaf conditions, depth-first.
    #[must_use]
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect_conditions(&mut out);
        out
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            Self::Condition(c) => out.push(c),
            Self::And(clauses) | Self::Or(clauses) => {
                for clause in clauses {
                    clause.collect_conditions(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn depth_counts_groups() {
        assert_eq!(Filter::eq("a", 1).depth(), 1);
        let f = Filter::and(vec![
            Filter::eq("a", 1),
            Filter::or(vec![Filter::gt("b", 2), Filter::lt("b", 0)]),
        ]);
        assert_eq!(f.depth(), 3);
        assert_eq!(Filter::and(vec![]).depth(), 1);
    }

    #[test]
    fn conditions_are_collected_in_order() {
        let f = Filter::or(vec![
            Filter::contains("name", "ac"),
            Filter::and(vec![Filter::gte("n", 1), Filter::ne("n", 3)]),
        ]);
        let fields: Vec<_> = f.conditions().iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "n", "n"]);
    }

    #[test]
    fn serde_shape() {
        let f = Filter::and(vec![Filter::eq("active", true)]);
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(
            v,
            json!({"and": [{"condition": {"field": "active", "op": "eq", "value": true}}]})
        );
        let back: Filter = serde_json::from_value(v).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn ordering_ops() {
        assert!(FilterOp::Lt.is_ordering());
        assert!(FilterOp::Gte.is_ordering());
        assert!(!FilterOp::Eq.is_ordering());
        assert!(!FilterOp::Contains.is_ordering());
    }
}
