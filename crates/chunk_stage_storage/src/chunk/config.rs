use crate::{ChunkKey, IndexableTree, StageError, StageResult};

use chunk_stage_core::prelude::*;
use chunk_stage_core::{ceil_log2, round_down_multiple_of_pow2, round_up_multiple_of_pow2};
use serde::{Deserialize, Serialize};

/// Relates a chunk's tree depth to its shape and memory footprint.
///
/// The side length is always `2^tree_depth`, so a stage index splits into a chunk key (high bits) and a chunk-local index
/// (low bits) with shifts and masks.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct RasterChunkConfig<const D: usize> {
    tree_depth: u8,
    side_length: i32,
    approximate_size_in_bytes: usize,
}

/// Configuration of 2D map chunks.
pub type RasterChunkConfig2 = RasterChunkConfig<2>;
/// Configuration of 3D voxel chunks.
pub type RasterChunkConfig3 = RasterChunkConfig<3>;

impl<const D: usize> RasterChunkConfig<D> {
    /// `value_size` is the size of one payload value in bytes.
    pub fn new(tree_depth: u8, value_size: usize) -> StageResult<Self> {
        let depth_limit = IndexableTree::<D, ()>::DEPTH_LIMIT;
        if tree_depth > depth_limit {
            return Err(StageError::invalid_argument(format!(
                "tree depth {} exceeds the limit of {} for rank {}",
                tree_depth, depth_limit, D
            )));
        }

        let side_length = 1i32 << tree_depth;
        let approximate_size_in_bytes = (0..D)
            .try_fold(value_size, |acc, _| acc.checked_mul(side_length as usize))
            .ok_or_else(|| {
                StageError::invalid_argument(format!(
                    "chunks of side {} with {}-byte values overflow the address space",
                    side_length, value_size
                ))
            })?;

        Ok(Self {
            tree_depth,
            side_length,
            approximate_size_in_bytes,
        })
    }

    /// Sized for values of type `V`.
    pub fn for_payload<V>(tree_depth: u8) -> StageResult<Self> {
        Self::new(tree_depth, std::mem::size_of::<V>())
    }

    /// The shallowest configuration whose chunks are at least `min_side_length` long.
    pub fn with_min_side_length(min_side_length: i32, value_size: usize) -> StageResult<Self> {
        if min_side_length <= 0 {
            return Err(StageError::invalid_argument(format!(
                "chunk side length must be positive, got {}",
                min_side_length
            )));
        }
        let tree_depth = u8::try_from(ceil_log2(min_side_length))
            .map_err(|_| StageError::invalid_argument("chunk side length is too large"))?;

        Self::new(tree_depth, value_size)
    }

    #[inline]
    pub fn tree_depth(&self) -> u8 {
        self.tree_depth
    }

    #[inline]
    pub fn side_length(&self) -> i32 {
        self.side_length
    }

    #[inline]
    pub fn approximate_size_in_bytes(&self) -> usize {
        self.approximate_size_in_bytes
    }

    /// Number of values in one chunk.
    #[inline]
    pub fn values_per_chunk(&self) -> usize {
        self.local_bounds().length()
    }

    /// The bounds of a chunk in its own 0-based coordinates.
    #[inline]
    pub fn local_bounds(&self) -> BoundsN<D> {
        BoundsN::from_dimensions(IndexN::fill(self.side_length))
    }

    /// The least stage index of the chunk at `key`.
    #[inline]
    pub fn stage_offset(&self, key: ChunkKey<D>) -> IndexN<D> {
        key.0 << self.tree_depth as i32
    }

    #[inline]
    pub fn stage_bounds(&self, key: ChunkKey<D>) -> BoundsN<D> {
        self.local_bounds().translated(self.stage_offset(key))
    }

    /// The key of the chunk containing the stage index.
    #[inline]
    pub fn key_containing(&self, stage_index: IndexN<D>) -> ChunkKey<D> {
        ChunkKey(stage_index >> self.tree_depth as i32)
    }

    /// The position of a stage index inside its chunk.
    #[inline]
    pub fn local_index(&self, stage_index: IndexN<D>) -> IndexN<D> {
        stage_index & (self.side_length - 1)
    }

    #[inline]
    pub fn stage_index(&self, key: ChunkKey<D>, local_index: IndexN<D>) -> IndexN<D> {
        self.stage_offset(key) + local_index
    }

    /// The smallest union of whole chunks containing `stage_bounds`. Empty bounds stay empty.
    pub fn chunk_aligned_bounds(&self, stage_bounds: &BoundsN<D>) -> BoundsN<D> {
        if stage_bounds.is_empty() {
            return *stage_bounds;
        }
        let lub = stage_bounds.lower_bounds + stage_bounds.dimensions;
        let lower = IndexN(stage_bounds.lower_bounds.0.map(|c| round_down_multiple_of_pow2(c, self.side_length)));
        let upper = IndexN(lub.0.map(|c| round_up_multiple_of_pow2(c, self.side_length)));

        BoundsN::new(lower, upper - lower)
    }

    /// Keys of all chunks intersecting `stage_bounds`, in row-major order.
    pub fn keys_covering(&self, stage_bounds: &BoundsN<D>) -> impl Iterator<Item = ChunkKey<D>> {
        let keys = if stage_bounds.is_empty() {
            BoundsN::new(IndexN::ZERO, IndexN::ZERO)
        } else {
            BoundsN::from_lower_and_upper(
                self.key_containing(stage_bounds.lower_bounds).0,
                self.key_containing(stage_bounds.upper_bounds()).0,
            )
        };

        keys.iter_indices().map(ChunkKey)
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
    fn depth_four_voxel_chunks() {
        let config = RasterChunkConfig3::for_payload::<u32>(4).unwrap();

        assert_eq!(config.side_length(), 16);
        assert_eq!(
            config.approximate_size_in_bytes(),
            16 * 16 * 16 * std::mem::size_of::<u32>()
        );
        assert_eq!(config.values_per_chunk(), 4096);
    }

    #[test]
    fn zero_depth_is_a_single_value() {
        let config = RasterChunkConfig2::new(0, 2).unwrap();

        assert_eq!(config.side_length(), 1);
        assert_eq!(config.approximate_size_in_bytes(), 2);
    }

    #[test]
    fn excessive_depth_is_rejected() {
        assert!(matches!(
            RasterChunkConfig3::new(22, 1),
            Err(StageError::InvalidArgument(_))
        ));
    }

    #[test]
    fn stage_index_splits_into_key_and_local_index() {
        let config = RasterChunkConfig3::new(4, 1).unwrap();

        for &stage in [
            IndexN([0, 0, 0]),
            IndexN([-1, 15, 16]),
            IndexN([-17, 33, -32]),
        ]
        .iter()
        {
            let key = config.key_containing(stage);
            let local = config.local_index(stage);

            assert!(config.local_bounds().contains(local));
            assert!(config.stage_bounds(key).contains(stage));
            assert_eq!(config.stage_index(key, local), stage);
        }

        assert_eq!(
            config.key_containing(IndexN([-1, 15, 16])),
            ChunkKey(IndexN([-1, 0, 1]))
        );
    }

    #[test]
    fn min_side_length_rounds_up_to_a_power_of_two() {
        assert_eq!(RasterChunkConfig3::with_min_side_length(1, 1).unwrap().side_length(), 1);
        assert_eq!(RasterChunkConfig3::with_min_side_length(16, 1).unwrap().side_length(), 16);
        assert_eq!(RasterChunkConfig3::with_min_side_length(17, 1).unwrap().tree_depth(), 5);
        assert!(RasterChunkConfig3::with_min_side_length(0, 1).is_err());
    }

    #[test]
    fn aligned_bounds_are_whole_chunks() {
        let config = RasterChunkConfig2::new(3, 1).unwrap();
        let region = Bounds2::from_lower_and_upper(IndexN([-1, 0]), IndexN([8, 7]));

        let aligned = config.chunk_aligned_bounds(&region);
        assert_eq!(aligned, Bounds2::from_lower_and_upper(IndexN([-8, 0]), IndexN([15, 7])));
        assert_eq!(
            aligned.length(),
            config.keys_covering(&region).count() * config.values_per_chunk()
        );
    }

    #[test]
    fn keys_covering_a_region() {
        let config = RasterChunkConfig2::new(3, 1).unwrap();
        let region = Bounds2::from_lower_and_upper(IndexN([-1, 0]), IndexN([8, 7]));

        let keys: Vec<_> = config.keys_covering(&region).collect();
        assert_eq!(
            keys,
            vec![
                ChunkKey(IndexN([-1, 0])),
                ChunkKey(IndexN([0, 0])),
                ChunkKey(IndexN([1, 0]))
            ]
        );
    }
}
