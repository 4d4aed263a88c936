use chunk_stage_core::prelude::*;

use core::ops::{Add, Sub};
use serde::{Deserialize, Serialize};

/// The position of a chunk among chunks. Chunk `k` covers the stage indices `k * side_length + [0, side_length)`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ChunkKey<const D: usize>(pub IndexN<D>);

/// A key for 2D (map) stages.
pub type ChunkKey2 = ChunkKey<2>;
/// A key for 3D (volumetric) stages.
pub type ChunkKey3 = ChunkKey<3>;
/// Identifies the column of volumetric chunks above and below a point on the map.
pub type ChunkOverheadKey = ChunkKey2;

impl<const D: usize> ChunkKey<D> {
    #[inline]
    pub fn new(index: IndexN<D>) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(&self) -> IndexN<D> {
        self.0
    }

    /// This key and all keys that differ from it by at most one along every axis, in row-major order. There are `3^D` of
    /// them.
    pub fn neighborhood(&self) -> impl Iterator<Item = Self> {
        let center = self.0;
        BoundsN::new(center - IndexN::ONES, IndexN::fill(3))
            .iter_indices()
            .map(ChunkKey)
    }

    /// The `3^D - 1` keys surrounding this one.
    pub fn neighbors(&self) -> impl Iterator<Item = Self> {
        let center = *self;
        self.neighborhood().filter(move |k| *k != center)
    }
}

impl ChunkKey3 {
    /// Drops the vertical (Y) axis.
    #[inline]
    pub fn overhead_key(&self) -> ChunkOverheadKey {
        ChunkKey(self.0.xz())
    }
}

impl ChunkOverheadKey {
    /// The volumetric key at height `y` in this column.
    #[inline]
    pub fn at_height(&self, y: i32) -> ChunkKey3 {
        ChunkKey(self.0.with_y(y))
    }
}

impl<const D: usize> From<IndexN<D>> for ChunkKey<D> {
    #[inline]
    fn from(index: IndexN<D>) -> Self {
        Self(index)
    }
}

impl<const D: usize> Add<IndexN<D>> for ChunkKey<D> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: IndexN<D>) -> Self {
        Self(self.0 + rhs)
    }
}

impl<const D: usize> Sub<IndexN<D>> for ChunkKey<D> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: IndexN<D>) -> Self {
        Self(self.0 - rhs)
    }
}

/// The offset between two keys.
impl<const D: usize> Sub for ChunkKey<D> {
    type Output = IndexN<D>;

    #[inline]
    fn sub(self, rhs: Self) -> IndexN<D> {
        self.0 - rhs.0
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn neighborhood_sizes() {
        let key = ChunkKey3::new(IndexN([1, -2, 3]));

        assert_eq!(key.neighborhood().count(), 27);
        assert_eq!(key.neighbors().count(), 26);
        assert!(key.neighbors().all(|k| (k - key).abs().max_component() == 1));
        assert_eq!(ChunkKey2::new(IndexN([0, 0])).neighbors().count(), 8);
    }

    #[test]
    fn overhead_key_drops_y() {
        let key = ChunkKey3::new(IndexN([4, -7, 9]));

        assert_eq!(key.overhead_key(), ChunkKey(IndexN([4, 9])));
        assert_eq!(key.overhead_key().at_height(-7), key);
    }

    #[test]
    fn arithmetic() {
        let key = ChunkKey2::new(IndexN([1, 1]));

        assert_eq!(key + IndexN([1, -1]), ChunkKey(IndexN([2, 0])));
        assert_eq!(key - IndexN([1, 1]), ChunkKey(IndexN([0, 0])));
        assert_eq!(key - ChunkKey(IndexN([3, 0])), IndexN([-2, 1]));
    }
}
