//! Bucket-based response cache.
//!
//! This module provides the storage side of the interceptor:
//! - Named buckets of request → response entries, persisted in SQLite
//! - Cache-first and network-first fetch strategies over one bucket
//! - Provenance for every served response (network, cache, offline)

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{CacheStorage, CachedResponse, SqliteStorage};
pub use traits::{CacheResult, CacheSource};
