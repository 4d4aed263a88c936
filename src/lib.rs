//! Chunked spatial indexing, caching and transactional persistence for sparse worlds on 2D and 3D integer lattices.
//!
//! This library is organized into two crates:
//! - **core**: lattice index and bounds types, Morton codes
//! - **storage**: arrays, trees and views; the binary codec; chunks, the chunk cache and the transactional stores
//!
//! A typical stage is a `ChunkCache` over a `TransactionalStore` opened by a `PartitionedStoreFactory`:
//!
//! ```
//! use chunk_stage::prelude::*;
//! use std::sync::Arc;
//!
//! # futures::executor::block_on(async {
//! let chunk_config = RasterChunkConfig3::for_payload::<u8>(4).unwrap();
//! assert_eq!(chunk_config.side_length(), 16);
//!
//! let store = Arc::new(TransactionalStore::new("chunks", MemoryBackend::new()));
//! let cache = ChunkCache::new(
//!     chunk_config,
//!     CacheConfig::default(),
//!     0u8,
//!     store,
//!     ArrayChunkCodec::new(PrimitiveSerializer::<u8>::little()),
//!     |chunk: &mut ArrayChunk<3, u8>| {
//!         let bounds = chunk.stage_bounds();
//!         chunk.stage_view_mut().write_with(&bounds, |i| (i.y() < 0) as u8);
//!     },
//! )
//! .unwrap();
//!
//! let handle = cache.get_or_load(ChunkKey3::new(IndexN([0, -1, 0])), &CancelToken::new()).await.unwrap();
//! assert_eq!(handle.read().await.stage_view().get(IndexN([3, -5, 7])).unwrap(), 1);
//! # });
//! ```

pub use chunk_stage_core as core;
pub use chunk_stage_storage as storage;

pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::storage::prelude::*;
}
