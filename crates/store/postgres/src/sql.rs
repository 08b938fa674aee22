//! Rendering of filter trees and sort specs into parameterized SQL over a
//! JSONB `data` column.
//!
//! Field names are validated identifiers and are inlined as JSON keys; every
//! operand travels as a bind parameter.

use serde_json::Value;

use quire_core::{Condition, Filter, FilterOp, ID_FIELD, SortDirection, validate_field_name};
use quire_store::error::StoreError;
use quire_store::query::{SortKey, SortSpec};

/// A bind parameter produced while rendering.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SqlValue {
    Json(Value),
    Text(String),
    Float(f64),
}

/// A rendered `WHERE` clause (empty when there is no filter) and its binds,
/// numbered from `$1`.
#[derive(Debug, Default)]
pub(crate) struct WhereClause {
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

impl WhereClause {
    /// Index of the next free bind placeholder.
    pub fn next_bind(&self) -> usize {
        self.binds.len() + 1
    }
}

/// Bind every [`SqlValue`] onto a `sqlx` query, in order.
macro_rules! bind_values {
    ($query:expr, $binds:expr) => {{
        let mut query = $query;
        for value in $binds {
            query = match value {
                $crate::sql::SqlValue::Json(v) => query.bind(v),
                $crate::sql::SqlValue::Text(s) => query.bind(s),
                $crate::sql::SqlValue::Float(f) => query.bind(*f),
            };
        }
        query
    }};
}
pub(crate) use bind_values;

fn json_expr(field: &str) -> String {
    if field == ID_FIELD {
        "to_jsonb(id)".to_owned()
    } else {
        format!("data->'{field}'")
    }
}

fn text_expr(field: &str) -> String {
    if field == ID_FIELD {
        "id".to_owned()
    } else {
        format!("(data->>'{field}')")
    }
}

pub(crate) fn render_where(filter: Option<&Filter>) -> Result<WhereClause, StoreError> {
    let Some(filter) = filter else {
        return Ok(WhereClause::default());
    };
    let mut binds = Vec::new();
    let predicate = render_filter(filter, &mut binds)?;
    Ok(WhereClause {
        sql: format!("WHERE {predicate}"),
        binds,
    })
}

fn render_filter(filter: &Filter, binds: &mut Vec<SqlValue>) -> Result<String, StoreError> {
    match filter {
        Filter::And(clauses) => render_group(clauses, " AND ", "TRUE", binds),
        Filter::Or(clauses) => render_group(clauses, " OR ", "FALSE", binds),
        Filter::Condition(condition) => render_condition(condition, binds),
    }
}

fn render_group(
    clauses: &[Filter],
    joiner: &str,
    empty: &str,
    binds: &mut Vec<SqlValue>,
) -> Result<String, StoreError> {
    if clauses.is_empty() {
        return Ok(empty.to_owned());
    }
    let parts = clauses
        .iter()
        .map(|c| render_filter(c, binds))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("({})", parts.join(joiner)))
}

fn push(binds: &mut Vec<SqlValue>, value: SqlValue) -> usize {
    binds.push(value);
    binds.len()
}

fn render_condition(
    condition: &Condition,
    binds: &mut Vec<SqlValue>,
) -> Result<String, StoreError> {
    let field = condition.field.as_str();
    validate_field_name(field)?;
    let json = json_expr(field);
    let text = text_expr(field);

    let sql = match (condition.op, &condition.value) {
        (FilterOp::Eq, value) => {
            let n = push(binds, SqlValue::Json(value.clone()));
            format!("COALESCE({json}, 'null'::jsonb) = ${n}")
        }
        (FilterOp::Ne, value) => {
            let n = push(binds, SqlValue::Json(value.clone()));
            format!("COALESCE({json}, 'null'::jsonb) <> ${n}")
        }
        (FilterOp::Contains, Value::String(needle)) => {
            let n = push(binds, SqlValue::Text(needle.clone()));
            format!(
                "CASE WHEN jsonb_typeof({json}) = 'string' THEN strpos({text}, ${n}) > 0 ELSE FALSE END"
            )
        }
        (op, Value::Number(number)) => {
            let (Some(cmp), Some(number)) = (comparison(op), number.as_f64()) else {
                return Err(invalid_operand(condition));
            };
            let n = push(binds, SqlValue::Float(number));
            format!(
                "CASE WHEN jsonb_typeof({json}) = 'number' THEN {text}::double precision {cmp} ${n} ELSE FALSE END"
            )
        }
        (op, Value::String(s)) => {
            let Some(cmp) = comparison(op) else {
                return Err(invalid_operand(condition));
            };
            let n = push(binds, SqlValue::Text(s.clone()));
            format!(
                "CASE WHEN jsonb_typeof({json}) = 'string' THEN {text} COLLATE \"C\" {cmp} ${n} ELSE FALSE END"
            )
        }
        _ => return Err(invalid_operand(condition)),
    };
    Ok(sql)
}

fn comparison(op: FilterOp) -> Option<&'static str> {
    match op {
        FilterOp::Lt => Some("<"),
        FilterOp::Lte => Some("<="),
        FilterOp::Gt => Some(">"),
        FilterOp::Gte => Some(">="),
        FilterOp::Eq | FilterOp::Ne | FilterOp::Contains => None,
    }
}

fn invalid_operand(condition: &Condition) -> StoreError {
    StoreError::Validation(quire_core::ValidationError::InvalidOperand {
        field: condition.field.clone(),
        op: condition.op.to_string(),
        reason: "operand type not supported".to_owned(),
    })
}

/// `ORDER BY` body for `sort`. Creation order (`seq`) always breaks ties.
pub(crate) fn render_order(sort: &SortSpec) -> Result<String, StoreError> {
    match &sort.key {
        SortKey::CreationOrder => Ok(format!("seq {}", sort.direction.as_sql())),
        SortKey::Field(field) => {
            validate_field_name(field)?;
            let nulls = match sort.direction {
                SortDirection::Asc => "NULLS LAST",
                SortDirection::Desc => "NULLS FIRST",
            };
            Ok(format!(
                "NULLIF({}, 'null'::jsonb) {} {nulls}, seq ASC",
                json_expr(field),
                sort.direction.as_sql()
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn no_filter_renders_nothing() {
        let clause = render_where(None).unwrap();
        assert!(clause.sql.is_empty());
        assert_eq!(clause.next_bind(), 1);
    }

    #[test]
    fn equality_binds_json() {
        let clause = render_where(Some(&Filter::eq("active", true))).unwrap();
        assert_eq!(
            clause.sql,
            "WHERE COALESCE(data->'active', 'null'::jsonb) = $1"
        );
        assert_eq!(clause.binds, vec![SqlValue::Json(json!(true))]);
    }

    #[test]
    fn groups_number_binds_in_order() {
        let filter = Filter::or(vec![
            Filter::gt("employees", 20),
            Filter::and(vec![
                Filter::contains("name", "tech"),
                Filter::lte("name", "m"),
            ]),
        ]);
        let clause = render_where(Some(&filter)).unwrap();
        assert_eq!(
            clause.sql,
            "WHERE (CASE WHEN jsonb_typeof(data->'employees') = 'number' THEN (data->>'employees')::double precision > $1 ELSE FALSE END OR \
             (CASE WHEN jsonb_typeof(data->'name') = 'string' THEN strpos((data->>'name'), $2) > 0 ELSE FALSE END AND \
             CASE WHEN jsonb_typeof(data->'name') = 'string' THEN (data->>'name') COLLATE \"C\" <= $3 ELSE FALSE END))"
        );
        assert_eq!(
            clause.binds,
            vec![
                SqlValue::Float(20.0),
                SqlValue::Text("tech".into()),
                SqlValue::Text("m".into()),
            ]
        );
        assert_eq!(clause.next_bind(), 4);
    }

    #[test]
    fn id_field_maps_to_key_column() {
        let clause = render_where(Some(&Filter::ne("id", "x"))).unwrap();
        assert_eq!(
            clause.sql,
            "WHERE COALESCE(to_jsonb(id), 'null'::jsonb) <> $1"
        );
    }

    #[test]
    fn rejects_unsafe_field_names() {
        let err = render_where(Some(&Filter::eq("x'; drop table t; --", 1))).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn rejects_unsupported_operands() {
        let err = render_where(Some(&Filter::gt("n", true))).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn order_clauses() {
        assert_eq!(
            render_order(&SortSpec::creation_order()).unwrap(),
            "seq ASC"
        );
        let desc = SortSpec {
            key: SortKey::Field("name".into()),
            direction: SortDirection::Desc,
        };
        assert_eq!(
            render_order(&desc).unwrap(),
            "NULLIF(data->'name', 'null'::jsonb) DESC NULLS FIRST, seq ASC"
        );
    }
}
