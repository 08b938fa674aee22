//! Translation of a [`PageRequest`] into store-level queries.
//!
//! [`PaginatedQueryBuilder`] validates a request against a
//! [`CollectionSchema`] and produces a [`PaginatedQuery`]: a bounded, sorted
//! [`ListQuery`] plus the filter for the matching count. Both halves read the
//! filter from the same place, so the data and count predicates cannot drift.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use quire_core::{
    Condition, Filter, FilterOp, PageRequest, SortDirection, ValidationError, validate_field_name,
};

use crate::schema::{CollectionSchema, MAX_FILTER_DEPTH};

/// What a list is ordered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Insertion order. Used when the request names no sort field.
    CreationOrder,
    /// A document field; ties fall back to creation order.
    Field(String),
}

/// A sort key plus direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    #[must_use]
    pub fn creation_order() -> Self {
        Self {
            key: SortKey::CreationOrder,
            direction: SortDirection::Asc,
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::creation_order()
    }
}

/// A bounded, sorted, offset-limited selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    pub filter: Option<Filter>,
    pub sort: SortSpec,
    pub offset: u64,
    pub limit: u32,
}

impl ListQuery {
    /// Unfiltered selection in creation order.
    #[must_use]
    pub fn all(offset: u64, limit: u32) -> Self {
        Self {
            filter: None,
            sort: SortSpec::creation_order(),
            offset,
            limit,
        }
    }

    /// The predicate of the count query matching this selection.
    pub fn count_filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }
}

/// A validated page request, ready to run against an entity store.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedQuery {
    page: u32,
    list: ListQuery,
}

impl PaginatedQuery {
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.list.limit
    }

    pub fn offset(&self) -> u64 {
        self.list.offset
    }

    /// The data query.
    pub fn list(&self) -> &ListQuery {
        &self.list
    }

    /// The unbounded count query's filter; always the data query's filter.
    pub fn count_filter(&self) -> Option<&Filter> {
        self.list.count_filter()
    }
}

/// Validates page requests for one collection and turns them into queries.
#[derive(Debug, Clone)]
pub struct PaginatedQueryBuilder {
    schema: CollectionSchema,
}

impl PaginatedQueryBuilder {
    pub fn new(schema: CollectionSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    /// Validate `request` and build the data and count queries.
    pub fn build(&self, request: &PageRequest) -> Result<PaginatedQuery, ValidationError> {
        if request.page() < 1 {
            return Err(ValidationError::InvalidPage(request.page()));
        }
        let max = self.schema.max_page_size();
        if request.limit() < 1 || request.limit() > max {
            return Err(ValidationError::InvalidLimit {
                limit: request.limit(),
                max,
            });
        }

        let key = match request.sort_field() {
            Some(field) => {
                validate_field_name(field)?;
                if !self.schema.is_sortable(field) {
                    return Err(ValidationError::UnknownSortField(field.to_owned()));
                }
                SortKey::Field(field.to_owned())
            }
            None => SortKey::CreationOrder,
        };

        if let Some(filter) = request.filter() {
            self.validate_filter(filter)?;
        }

        Ok(PaginatedQuery {
            page: request.page(),
            list: ListQuery {
                filter: request.filter().cloned(),
                sort: SortSpec {
                    key,
                    direction: request.sort_direction(),
                },
                offset: request.offset(),
                limit: request.limit(),
            },
        })
    }

    /// Check a filter tree for structure, field names, and operand types.
    pub fn validate_filter(&self, filter: &Filter) -> Result<(), ValidationError> {
        let depth = filter.depth();
        if depth > MAX_FILTER_DEPTH {
            return Err(ValidationError::FilterTooDeep {
                depth,
                max: MAX_FILTER_DEPTH,
            });
        }
        self.validate_node(filter)
    }

    fn validate_node(&self, filter: &Filter) -> Result<(), ValidationError> {
        match filter {
            Filter::And(clauses) | Filter::Or(clauses) => {
                if clauses.is_empty() {
                    return Err(ValidationError::EmptyFilterGroup);
                }
                clauses.iter().try_for_each(|c| self.validate_node(c))
            }
            Filter::Condition(condition) => self.validate_condition(condition),
        }
    }

    fn validate_condition(&self, condition: &Condition) -> Result<(), ValidationError> {
        validate_field_name(&condition.field)?;
        if !self.schema.is_known(&condition.field) {
            return Err(ValidationError::UnknownField(condition.field.clone()));
        }

        let invalid = |reason: &str| ValidationError::InvalidOperand {
            field: condition.field.clone(),
            op: condition.op.to_string(),
            reason: reason.to_owned(),
        };

        match condition.op {
            FilterOp::Eq | FilterOp::Ne => Ok(()),
            FilterOp::Contains => match &condition.value {
                Value::String(_) => Ok(()),
                _ => Err(invalid("expected a string")),
            },
            FilterOp::Lt | FilterOp::Lte | FilterOp::Gt | FilterOp::Gte => {
                match &condition.value {
                    Value::String(_) => Ok(()),
                    Value::Number(n) if n.as_f64().is_some() => Ok(()),
                    _ => Err(invalid("expected a number or string")),
                }
            }
        }
    }
}
