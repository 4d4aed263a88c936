//! Chunks: fixed-size blocks of the stage, each owning one storage.
//!
//! A chunk exposes its storage in two coordinate spaces. The local view is the storage itself, indexed from zero. The stage
//! view is an `OffsetView` borrowing the storage, translated by `key * side_length`. Both are borrows of the chunk, so
//! neither can outlive it.

pub mod config;
mod key;
pub mod neighborhood;
pub mod populate;

pub use config::*;
pub use key::*;
pub use neighborhood::*;
pub use populate::*;

use crate::{ArrayN, Indexable, IndexableMut, IndexableTree, OffsetView};

use chunk_stage_core::prelude::*;

/// Storage that can back a pooled chunk.
pub trait ChunkStorage<const D: usize>: IndexableMut<D> + Send + Sync + 'static {
    /// A chunk-sized storage with every value equal to `ambient`, at local (0-based) bounds.
    fn blank(config: &RasterChunkConfig<D>, ambient: Self::Value) -> Self;

    /// Overwrite every value with `ambient` so the storage can be reused for a different key.
    fn reset(&mut self, ambient: Self::Value);
}

impl<const D: usize, T> ChunkStorage<D> for ArrayN<D, T>
where
    T: Clone + Send + Sync + 'static,
{
    #[inline]
    fn blank(config: &RasterChunkConfig<D>, ambient: T) -> Self {
        ArrayN::fill(config.local_bounds(), ambient)
    }

    #[inline]
    fn reset(&mut self, ambient: T) {
        self.set_lower_bounds(IndexN::ZERO);
        self.reset_values(ambient);
    }
}

impl<const D: usize, T> ChunkStorage<D> for IndexableTree<D, T>
where
    T: Clone + Send + Sync + 'static,
{
    #[inline]
    fn blank(config: &RasterChunkConfig<D>, ambient: T) -> Self {
        // The configured depth was validated against the same limit.
        IndexableTree::new_clamped(IndexN::ZERO, config.tree_depth(), ambient)
    }

    #[inline]
    fn reset(&mut self, ambient: T) {
        self.set_lower_bounds(IndexN::ZERO);
        self.fill(ambient);
    }
}

/// A chunk of the stage at `key`.
#[derive(Clone, Debug)]
pub struct Chunk<const D: usize, S> {
    key: ChunkKey<D>,
    stage_offset: IndexN<D>,
    storage: S,
}

/// A chunk with dense array storage.
pub type ArrayChunk<const D: usize, T> = Chunk<D, ArrayN<D, T>>;
/// A chunk with multi-resolution tree storage.
pub type TreeChunk<const D: usize, T> = Chunk<D, IndexableTree<D, T>>;

impl<const D: usize, S> Chunk<D, S> {
    /// `storage` must be indexed from zero, covering `config.local_bounds()`.
    #[inline]
    pub fn new(key: ChunkKey<D>, storage: S, config: &RasterChunkConfig<D>) -> Self {
        Self {
            key,
            stage_offset: config.stage_offset(key),
            storage,
        }
    }

    #[inline]
    pub fn key(&self) -> ChunkKey<D> {
        self.key
    }

    /// The stage index of this chunk's local zero.
    #[inline]
    pub fn stage_offset(&self) -> IndexN<D> {
        self.stage_offset
    }

    /// The storage in 0-based chunk coordinates.
    #[inline]
    pub fn local_view(&self) -> &S {
        &self.storage
    }

    #[inline]
    pub fn local_view_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// The storage in stage coordinates.
    #[inline]
    pub fn stage_view(&self) -> OffsetView<&S, D> {
        OffsetView::new(&self.storage, self.stage_offset)
    }

    #[inline]
    pub fn stage_view_mut(&mut self) -> OffsetView<&mut S, D> {
        OffsetView::new(&mut self.storage, self.stage_offset)
    }

    #[inline]
    pub fn into_storage(self) -> S {
        self.storage
    }
}

impl<const D: usize, S: Indexable<D>> Chunk<D, S> {
    /// The stage indices covered by this chunk.
    #[inline]
    pub fn stage_bounds(&self) -> BoundsN<D> {
        self.storage.bounds().translated(self.stage_offset)
    }
}

/// The persisted form of a chunk. Immutable once built.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SerializedChunk<const D: usize> {
    key: ChunkKey<D>,
    bytes: Box<[u8]>,
}

impl<const D: usize> SerializedChunk<D> {
    #[inline]
    pub fn new(key: ChunkKey<D>, bytes: impl Into<Box<[u8]>>) -> Self {
        Self {
            key,
            bytes: bytes.into(),
        }
    }

    #[inline]
    pub fn key(&self) -> ChunkKey<D> {
        self.key
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn into_parts(self) -> (ChunkKey<D>, Box<[u8]>) {
        (self.key, self.bytes)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
