pub mod error;
pub mod eval;
pub mod query;
pub mod schema;
pub mod store;
pub mod testing;

pub use error::StoreError;
pub use query::{ListQuery, PaginatedQuery, PaginatedQueryBuilder, SortKey, SortSpec};
pub use schema::{CollectionSchema, DEFAULT_MAX_PAGE_SIZE, MAX_FILTER_DEPTH};
pub use store::{EntityStore, prepare_insert};
