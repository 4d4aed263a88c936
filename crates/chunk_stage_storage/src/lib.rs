#![allow(clippy::type_complexity, clippy::len_without_is_empty)]

//! Storage for chunked integer lattices in 2, 3 or 4 dimensions.
//!
//! The storage types are:
//!   - `ArrayN`: dense N-dimensional array
//!   - `IndexableTree`: multi-resolution 2^N-tree where uniform regions are a single node
//!   - `OffsetView` and `SubRegionView`: borrowing views that translate or restrict any indexable
//!
//! All of them implement the `Indexable` and `IndexableMut` capability traits.
//!
//! A stage is divided into fixed-size `Chunk`s. The `ChunkCache` keeps at most one live instance of each chunk, materializing
//! them from a `TransactionalStore` (decoded with a `ChunkCodec`) or from a `ChunkPopulator`, and recycling their storage
//! through a `ResourceStash`. The binary codec in `codec` writes an indexable as its dimensions followed by its values in
//! row-major order, in either byte order.

pub mod access_traits;
pub mod array;
pub mod caching;
pub mod cancel;
pub mod chunk;
pub mod codec;
pub mod config;
pub mod database;
pub mod error;
pub mod raster;
pub mod tree;
pub mod view;

pub use access_traits::*;
pub use array::*;
pub use caching::*;
pub use cancel::*;
pub use chunk::*;
pub use codec::*;
pub use config::*;
pub use database::*;
pub use error::*;
pub use raster::*;
pub use tree::*;
pub use view::*;

// Hash types to use for small keys like `IndexN` and `ChunkKey`.
pub type SmallKeyHashMap<K, V> = ahash::AHashMap<K, V>;
pub type SmallKeyBuildHasher = ahash::RandomState;

pub mod prelude {
    pub use super::{
        copy_bounds, Aabb, Array2, Array3, Array4, ArrayChunk, ArrayChunkCodec, ArrayN, AsyncChunkPopulator, Ball,
        CacheConfig, CancelToken, Chunk, ChunkCache, ChunkCodec, ChunkContourer, ChunkHandle, ChunkKey, ChunkKey2,
        ChunkKey3, ChunkOverheadKey, ChunkPopulator, ChunkStorage, Composite2, Composite3, Composite4, ConstLength,
        Endianness, IndexSerializer, Indexable, IndexableMut, IndexableSerializer, IndexableTree, IndexableTree2,
        IndexableTree3, MemoryBackend, NeighborhoodView, OffsetView, PrimitiveSerializer, RasterChunkConfig,
        RasterChunkConfig2, RasterChunkConfig3, Rasterizable, ReadOnlyChunkCache, ReadOnlyChunkHandle, ResourceStash,
        Serializer, StageError, StageResult, StashConfig, StoreBackend, StoreConfig, StoreKey, SubRegionView,
        TransactionalStore, TreeChunk, TreeChunkCodec,
    };

    #[cfg(feature = "sled")]
    pub use super::{EntityType, PartitionStore, PartitionedStoreFactory, SledBackend};
}
