pub mod config;
pub mod migrations;
mod sql;
pub mod store;

pub use config::{PostgresStoreConfig, table_name};
pub use store::{PostgresEntityStore, connect_pool};
