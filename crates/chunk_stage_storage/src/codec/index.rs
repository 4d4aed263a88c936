use super::{ConstLength, Endianness, PrimitiveSerializer, Serializer};
use crate::StageResult;

use chunk_stage_core::IndexN;

/// Serializes an `IndexN<D>` as `D` 32-bit signed components, dimension 0 first.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IndexSerializer<const D: usize> {
    component: PrimitiveSerializer<i32>,
}

impl<const D: usize> IndexSerializer<D> {
    #[inline]
    pub const fn new(endianness: Endianness) -> Self {
        Self {
            component: PrimitiveSerializer::new(endianness),
        }
    }

    #[inline]
    pub const fn big() -> Self {
        Self::new(Endianness::Big)
    }

    #[inline]
    pub const fn little() -> Self {
        Self::new(Endianness::Little)
    }
}

impl<const D: usize> ConstLength for IndexSerializer<D> {
    #[inline]
    fn constant_len(&self) -> usize {
        4 * D
    }
}

impl<const D: usize> Serializer for IndexSerializer<D> {
    type Value = IndexN<D>;

    #[inline]
    fn endianness(&self) -> Endianness {
        self.component.endianness()
    }

    #[inline]
    fn encoded_len(&self, _value: &IndexN<D>) -> usize {
        self.constant_len()
    }

    #[inline]
    fn serialize(&self, value: &IndexN<D>, out: &mut Vec<u8>) {
        self.component.serialize_slice(&value.0, out)
    }

    #[inline]
    fn deserialize(&self, input: &mut &[u8]) -> StageResult<IndexN<D>> {
        let mut index = IndexN::ZERO;
        self.component.deserialize_into(input, &mut index.0)?;

        Ok(index)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
