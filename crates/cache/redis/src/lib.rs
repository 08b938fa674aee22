mod config;
mod key_render;
mod store;

pub use config::RedisCacheConfig;
pub use store::RedisCacheStore;
