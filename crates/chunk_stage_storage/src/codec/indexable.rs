use super::{ConstLength, Endianness, IndexSerializer, Serializer};
use crate::{ArrayN, Indexable, StageError, StageResult};

use chunk_stage_core::{BoundsN, IndexN};

/// Serializes a whole indexable as its dimensions (an `IndexN<D>`) followed by every value in row-major order.
///
/// Only the dimensions are stored, so decoding always yields an array whose lower bounds are zero.
#[derive(Clone, Copy, Debug)]
pub struct IndexableSerializer<const D: usize, S> {
    index: IndexSerializer<D>,
    values: S,
}

impl<const D: usize, S: Serializer> IndexableSerializer<D, S> {
    /// The dimensions are written with the same byte order as `values`.
    #[inline]
    pub fn new(values: S) -> Self {
        Self {
            index: IndexSerializer::new(values.endianness()),
            values,
        }
    }

    #[inline]
    pub fn value_serializer(&self) -> &S {
        &self.values
    }

    /// Write any indexable over its own bounds, e.g. a view or a tree, without first copying it into an array.
    pub fn serialize_indexable<I>(&self, indexable: &I, out: &mut Vec<u8>)
    where
        I: Indexable<D, Value = S::Value>,
    {
        let bounds = indexable.bounds();
        self.index.serialize(&bounds.dimensions, out);
        indexable.for_each(&bounds, |_, value| self.values.serialize(&value, out));
    }

    /// Read the leading dimensions, rejecting negative components.
    pub fn read_dimensions(&self, input: &mut &[u8]) -> StageResult<IndexN<D>> {
        let dimensions = self.index.deserialize(input)?;
        if dimensions.min_component() < 0 {
            return Err(StageError::invalid_argument(format!(
                "negative dimensions {:?} in encoded indexable",
                dimensions.0
            )));
        }

        Ok(dimensions)
    }

    /// Number of values an indexable of `dimensions` holds, or `InvalidArgument` if that overflows `usize`.
    pub fn checked_length(dimensions: IndexN<D>) -> StageResult<usize> {
        dimensions
            .0
            .iter()
            .try_fold(1usize, |acc, &d| {
                usize::try_from(d).ok().and_then(|d| acc.checked_mul(d))
            })
            .ok_or_else(|| {
                StageError::invalid_argument(format!(
                    "encoded indexable with dimensions {:?} is too large",
                    dimensions.0
                ))
            })
    }
}

impl<const D: usize, S> Serializer for IndexableSerializer<D, S>
where
    S: Serializer + ConstLength,
    S::Value: Clone,
{
    type Value = ArrayN<D, S::Value>;

    #[inline]
    fn endianness(&self) -> Endianness {
        self.values.endianness()
    }

    #[inline]
    fn encoded_len(&self, value: &Self::Value) -> usize {
        self.index.constant_len() + value.values_slice().len() * self.values.constant_len()
    }

    fn serialize(&self, value: &Self::Value, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len(value));
        self.index.serialize(&value.dimensions(), out);
        self.values.serialize_slice(value.values_slice(), out);
    }

    fn deserialize(&self, input: &mut &[u8]) -> StageResult<Self::Value> {
        let dimensions = self.read_dimensions(input)?;
        let length = Self::checked_length(dimensions)?;

        // Check the payload length before allocating, since the dimensions may be garbage.
        let needed = length
            .checked_mul(self.values.constant_len())
            .ok_or_else(|| StageError::invalid_argument("encoded indexable is too large"))?;
        if input.len() < needed {
            return Err(StageError::Truncated {
                needed,
                remaining: input.len(),
            });
        }

        let values = self.values.deserialize_vec(input, length)?;

        ArrayN::from_values(BoundsN::from_dimensions(dimensions), values)
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
    use crate::{IndexableMut, OffsetView, PrimitiveSerializer};

    use chunk_stage_core::prelude::*;
    use rand::Rng;

    #[test]
    fn two_by_two_big_endian() {
        let codec = IndexableSerializer::<2, _>::new(PrimitiveSerializer::<u8>::big());
        let mut array = ArrayN::fill(Bounds2::from_dimensions(IndexN([2, 2])), 0u8);
        array.set(IndexN([0, 0]), 1).unwrap();
        array.set(IndexN([1, 0]), 2).unwrap();
        array.set(IndexN([0, 1]), 3).unwrap();
        array.set(IndexN([1, 1]), 4).unwrap();

        let mut bytes = Vec::new();
        codec.serialize(&array, &mut bytes);

        assert_eq!(bytes, [0, 0, 0, 2, 0, 0, 0, 2, 1, 2, 3, 4]);
        assert_eq!(codec.deserialize(&mut bytes.as_slice()).unwrap(), array);
    }

    #[test]
    fn random_arrays_survive_both_byte_orders() {
        let mut rng = rand::thread_rng();
        for endianness in [Endianness::Big, Endianness::Little] {
            let codec = IndexableSerializer::<3, _>::new(PrimitiveSerializer::<i32>::new(endianness));
            let dims = IndexN([rng.gen_range(1..8), rng.gen_range(1..8), rng.gen_range(1..8)]);
            let array = ArrayN::fill_with(Bounds3::from_dimensions(dims), |_| rng.gen::<i32>());

            let mut bytes = Vec::new();
            codec.serialize(&array, &mut bytes);
            assert_eq!(bytes.len(), codec.encoded_len(&array));

            let mut input = bytes.as_slice();
            assert_eq!(codec.deserialize(&mut input).unwrap(), array);
            assert!(input.is_empty());
        }
    }

    #[test]
    fn decoded_lower_bounds_are_zero() {
        let codec = IndexableSerializer::<2, _>::new(PrimitiveSerializer::<u16>::little());
        let array = ArrayN::fill_with(Bounds2::new(IndexN([-5, 7]), IndexN([3, 2])), |i| {
            (i.x() + 10 * i.y()) as u16
        });

        let mut bytes = Vec::new();
        codec.serialize(&array, &mut bytes);
        let decoded = codec.deserialize(&mut bytes.as_slice()).unwrap();

        assert_eq!(decoded.bounds(), Bounds2::from_dimensions(IndexN([3, 2])));
        assert_eq!(decoded.values_slice(), array.values_slice());
    }

    #[test]
    fn views_serialize_like_arrays() {
        let codec = IndexableSerializer::<2, _>::new(PrimitiveSerializer::<u8>::big());
        let array = ArrayN::fill_with(Bounds2::from_dimensions(IndexN([3, 3])), |i| {
            (i.x() * 3 + i.y()) as u8
        });
        let view = OffsetView::new(&array, IndexN([100, -100]));

        let mut from_view = Vec::new();
        codec.serialize_indexable(&view, &mut from_view);
        let mut from_array = Vec::new();
        codec.serialize(&array, &mut from_array);

        assert_eq!(from_view, from_array);
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let codec = IndexableSerializer::<2, _>::new(PrimitiveSerializer::<u8>::big());
        let bytes = [0, 0, 0, 2, 0, 0, 0, 2, 1, 2, 3];

        assert!(matches!(
            codec.deserialize(&mut &bytes[..]),
            Err(StageError::Truncated {
                needed: 4,
                remaining: 3
            })
        ));
    }

    #[test]
    fn overflowing_dimensions_are_rejected() {
        let codec = IndexableSerializer::<3, _>::new(PrimitiveSerializer::<u16>::big());
        let bytes = [i32::MAX.to_be_bytes(); 3].concat();

        assert!(matches!(
            codec.deserialize(&mut bytes.as_slice()),
            Err(StageError::InvalidArgument(_))
        ));
        assert_eq!(
            IndexableSerializer::<2, PrimitiveSerializer<u8>>::checked_length(IndexN([3, 5])).unwrap(),
            15
        );
    }

    #[test]
    fn negative_dimensions_are_rejected() {
        let codec = IndexableSerializer::<2, _>::new(PrimitiveSerializer::<u8>::big());
        let bytes = [0xff, 0xff, 0xff, 0xff, 0, 0, 0, 2];

        assert!(matches!(
            codec.deserialize(&mut &bytes[..]),
            Err(StageError::InvalidArgument(_))
        ));
    }
}
