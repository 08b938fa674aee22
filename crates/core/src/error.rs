use thiserror::Error;

/// A malformed request rejected before any backend is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("page must be >= 1, got {0}")]
    InvalidPage(u32),

    #[error("limit must be between 1 and {max}, got {limit}")]
    InvalidLimit { limit: u32, max: u32 },

    #[error("unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("invalid field name: {0:?}")]
    InvalidFieldName(String),

    #[error("invalid collection name: {0:?}")]
    InvalidCollectionName(String),

    #[error("filter group must contain at least one clause")]
    EmptyFilterGroup,

    #[error("filter nesting depth {depth} exceeds maximum of {max}")]
    FilterTooDeep { depth: usize, max: usize },

    #[error("invalid operand for `{field} {op}`: {reason}")]
    InvalidOperand {
        field: String,
        op: String,
        reason: String,
    },

    #[error("field cannot be modified: {0}")]
    ImmutableField(String),

    #[error("invalid entity: {0}")]
    InvalidEntity(String),
}
