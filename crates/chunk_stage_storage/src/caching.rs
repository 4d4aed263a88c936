//! Pools and caches that keep chunks in memory.

pub mod chunk_cache;
pub mod lru_cache;
pub mod stash;

pub use chunk_cache::*;
pub use lru_cache::*;
pub use stash::*;
