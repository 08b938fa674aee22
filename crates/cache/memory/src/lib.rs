mod store;
mod sweeper;

pub use store::MemoryCacheStore;
pub use sweeper::spawn_sweeper;
