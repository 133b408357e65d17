//! Content-addressed cache of parsed suggestions.

mod key;
mod persistence;
mod store;

pub use key::CacheKey;
pub use persistence::{CACHE_FORMAT_VERSION, CacheEntry};
pub use store::{CacheConfig, CacheStats, ResultCache};
