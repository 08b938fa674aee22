pub mod error;
pub mod key;
pub mod store;
pub mod testing;

pub use error::CacheError;
pub use key::CacheKey;
pub use store::CacheStore;
