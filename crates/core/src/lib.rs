pub mod canonical;
pub mod entity;
pub mod error;
pub mod filter;
pub mod naming;
pub mod page;
pub mod types;

pub use canonical::{canonicalize, to_canonical_string};
pub use entity::{ACTIVE_FIELD, Entity, ID_FIELD, ensure_key_untouched};
pub use error::ValidationError;
pub use filter::{Condition, Filter, FilterOp};
pub use naming::{validate_collection_name, validate_field_name};
pub use page::{PageRequest, PageResult, SortDirection};
pub use types::{EntityId, UserId};
