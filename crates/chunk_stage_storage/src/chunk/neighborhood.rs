use crate::{Chunk, ChunkKey, Indexable, RasterChunkConfig, SmallKeyHashMap};

use chunk_stage_core::prelude::*;
use tokio::sync::OwnedRwLockReadGuard;

/// A read-only window over a chunk and all of its neighbors, in stage coordinates.
///
/// Holding the view keeps every chunk in it shared, so none of them can be evicted or written to until it is dropped.
pub struct NeighborhoodView<const D: usize, S> {
    center: ChunkKey<D>,
    config: RasterChunkConfig<D>,
    chunks: SmallKeyHashMap<ChunkKey<D>, OwnedRwLockReadGuard<Chunk<D, S>>>,
}

impl<const D: usize, S> NeighborhoodView<D, S> {
    /// `chunks` must contain every key of `center.neighborhood()`.
    pub(crate) fn new(
        center: ChunkKey<D>,
        config: RasterChunkConfig<D>,
        chunks: SmallKeyHashMap<ChunkKey<D>, OwnedRwLockReadGuard<Chunk<D, S>>>,
    ) -> Self {
        debug_assert!(center.neighborhood().all(|k| chunks.contains_key(&k)));

        Self {
            center,
            config,
            chunks,
        }
    }

    #[inline]
    pub fn center(&self) -> ChunkKey<D> {
        self.center
    }

    #[inline]
    pub fn center_chunk(&self) -> Option<&Chunk<D, S>> {
        self.chunk(self.center)
    }

    #[inline]
    pub fn chunk(&self, key: ChunkKey<D>) -> Option<&Chunk<D, S>> {
        self.chunks.get(&key).map(|guard| &**guard)
    }

    /// The stage bounds of the center chunk.
    #[inline]
    pub fn center_bounds(&self) -> BoundsN<D> {
        self.config.stage_bounds(self.center)
    }
}

impl<const D: usize, S: Indexable<D>> Indexable<D> for NeighborhoodView<D, S> {
    type Value = S::Value;

    #[inline]
    fn bounds(&self) -> BoundsN<D> {
        self.center_bounds().padded(self.config.side_length())
    }

    #[inline]
    fn get_unchecked(&self, index: IndexN<D>) -> S::Value {
        let key = self.config.key_containing(index);
        let chunk = &self.chunks[&key];

        chunk.stage_view().get_unchecked(index)
    }
}

/// Turns a neighborhood of chunks into some derived product of the center chunk, like a mesh.
///
/// The neighbors are there so the product can be seamless across chunk boundaries.
pub trait ChunkContourer<const D: usize, S>: Send + Sync {
    type Output;

    fn contour(&self, view: &NeighborhoodView<D, S>) -> Self::Output;
}
