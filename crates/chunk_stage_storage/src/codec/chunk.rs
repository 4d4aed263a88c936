//! Byte encodings of chunk storage, used to persist chunks in a store.

use super::{ConstLength, IndexableSerializer, Serializer};
use crate::{ArrayN, Indexable, IndexableTree, StageError, StageResult};

use chunk_stage_core::IndexN;

/// Encodes one kind of chunk storage.
///
/// `decode_into` overwrites an existing (usually pooled) storage instead of allocating a new one.
pub trait ChunkCodec<const D: usize, S>: Send + Sync {
    fn encode(&self, storage: &S, out: &mut Vec<u8>);

    /// On error, the contents of `storage` are unspecified and it should be reset before reuse.
    fn decode_into(&self, bytes: &[u8], storage: &mut S) -> StageResult<()>;
}

fn check_dimensions<const D: usize>(found: IndexN<D>, expected: IndexN<D>) -> StageResult<()> {
    if found == expected {
        Ok(())
    } else {
        Err(StageError::invalid_argument(format!(
            "encoded chunk has dimensions {:?}, expected {:?}",
            found.0, expected.0
        )))
    }
}

fn check_consumed(rest: &[u8]) -> StageResult<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(StageError::invalid_argument(format!(
            "{} trailing bytes after encoded chunk",
            rest.len()
        )))
    }
}

/// Encodes `ArrayN` chunks with an `IndexableSerializer`.
#[derive(Clone, Copy, Debug)]
pub struct ArrayChunkCodec<const D: usize, Ser> {
    serializer: IndexableSerializer<D, Ser>,
}

impl<const D: usize, Ser: Serializer> ArrayChunkCodec<D, Ser> {
    pub fn new(values: Ser) -> Self {
        Self {
            serializer: IndexableSerializer::new(values),
        }
    }
}

impl<const D: usize, Ser> ChunkCodec<D, ArrayN<D, Ser::Value>> for ArrayChunkCodec<D, Ser>
where
    Ser: Serializer + ConstLength + Send + Sync,
    Ser::Value: Clone,
{
    fn encode(&self, storage: &ArrayN<D, Ser::Value>, out: &mut Vec<u8>) {
        self.serializer.serialize(storage, out)
    }

    fn decode_into(&self, bytes: &[u8], storage: &mut ArrayN<D, Ser::Value>) -> StageResult<()> {
        let mut input = bytes;
        let dimensions = self.serializer.read_dimensions(&mut input)?;
        check_dimensions(dimensions, storage.dimensions())?;
        self.serializer
            .value_serializer()
            .deserialize_into(&mut input, storage.values_mut_slice())?;

        check_consumed(input)
    }
}

/// Encodes `IndexableTree` chunks at full resolution. Decoding rebuilds the tree with uniform regions collapsed, so a tree
/// that was not fully merged when encoded may come back with fewer nodes.
#[derive(Clone, Copy, Debug)]
pub struct TreeChunkCodec<const D: usize, Ser> {
    serializer: IndexableSerializer<D, Ser>,
}

impl<const D: usize, Ser: Serializer> TreeChunkCodec<D, Ser> {
    pub fn new(values: Ser) -> Self {
        Self {
            serializer: IndexableSerializer::new(values),
        }
    }
}

impl<const D: usize, Ser> ChunkCodec<D, IndexableTree<D, Ser::Value>> for TreeChunkCodec<D, Ser>
where
    Ser: Serializer + ConstLength + Send + Sync,
    Ser::Value: Clone + PartialEq,
{
    fn encode(&self, storage: &IndexableTree<D, Ser::Value>, out: &mut Vec<u8>) {
        self.serializer.serialize_indexable(storage, out)
    }

    fn decode_into(
        &self,
        bytes: &[u8],
        storage: &mut IndexableTree<D, Ser::Value>,
    ) -> StageResult<()> {
        let mut input = bytes;
        let cube = storage.cube();
        let dimensions = self.serializer.read_dimensions(&mut input)?;
        check_dimensions(dimensions, cube.dimensions)?;

        let values = self
            .serializer
            .value_serializer()
            .deserialize_vec(&mut input, cube.length())?;
        check_consumed(input)?;
        let values = ArrayN::from_values(cube, values)?;

        let background = storage.get_unchecked(cube.lower_bounds);
        storage.assign_from(&values, background);

        Ok(())
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
    use crate::{ChunkStorage, IndexableMut, PrimitiveSerializer, RasterChunkConfig3};

    use chunk_stage_core::prelude::*;

    fn config() -> RasterChunkConfig3 {
        RasterChunkConfig3::for_payload::<u16>(3).unwrap()
    }

    #[test]
    fn array_chunk_decodes_into_pooled_storage() {
        let codec = ArrayChunkCodec::<3, _>::new(PrimitiveSerializer::<u16>::little());
        let original = ArrayN::fill_with(config().local_bounds(), |i| (i.x() + i.y() * 8 + i.z() * 64) as u16);

        let mut bytes = Vec::new();
        codec.encode(&original, &mut bytes);

        let mut pooled = ArrayN::<3, u16>::blank(&config(), 9);
        codec.decode_into(&bytes, &mut pooled).unwrap();
        assert_eq!(pooled, original);
    }

    #[test]
    fn array_chunk_with_wrong_dimensions_is_rejected() {
        let codec = ArrayChunkCodec::<3, _>::new(PrimitiveSerializer::<u16>::little());
        let small = ArrayN::fill(Bounds3::from_dimensions(IndexN::fill(4)), 1u16);

        let mut bytes = Vec::new();
        codec.encode(&small, &mut bytes);

        let mut pooled = ArrayN::<3, u16>::blank(&config(), 0);
        assert!(matches!(
            codec.decode_into(&bytes, &mut pooled),
            Err(StageError::InvalidArgument(_))
        ));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let codec = ArrayChunkCodec::<3, _>::new(PrimitiveSerializer::<u16>::little());
        let mut storage = ArrayN::<3, u16>::blank(&config(), 5);

        let mut bytes = Vec::new();
        codec.encode(&storage, &mut bytes);
        bytes.push(0);

        assert!(codec.decode_into(&bytes, &mut storage).is_err());
    }

    #[test]
    fn corrupt_tree_dimensions_are_rejected_before_decoding_values() {
        let codec = TreeChunkCodec::<3, _>::new(PrimitiveSerializer::<u16>::big());
        let mut pooled = IndexableTree::<3, u16>::blank(&config(), 0);

        let huge = [i32::MAX.to_be_bytes(); 3].concat();
        assert!(matches!(
            codec.decode_into(&huge, &mut pooled),
            Err(StageError::InvalidArgument(_))
        ));

        let mut truncated = [8i32.to_be_bytes(); 3].concat();
        truncated.extend_from_slice(&[0; 10]);
        assert!(matches!(
            codec.decode_into(&truncated, &mut pooled),
            Err(StageError::Truncated { .. })
        ));
    }

    #[test]
    fn tree_chunk_round_trip_collapses_uniform_regions() {
        let codec = TreeChunkCodec::<3, _>::new(PrimitiveSerializer::<u16>::big());
        let mut original = IndexableTree::<3, u16>::blank(&config(), 0);
        original.set(IndexN([1, 1, 1]), 7).unwrap();
        original.set(IndexN([6, 6, 6]), 3).unwrap();

        let mut bytes = Vec::new();
        codec.encode(&original, &mut bytes);
        assert_eq!(bytes.len(), 12 + 512 * 2);

        let mut pooled = IndexableTree::<3, u16>::blank(&config(), 42);
        codec.decode_into(&bytes, &mut pooled).unwrap();

        for i in config().local_bounds().iter_indices() {
            assert_eq!(pooled.get(i).unwrap(), original.get(i).unwrap());
        }
        assert!(pooled.num_nodes() <= original.num_nodes());
    }
}
