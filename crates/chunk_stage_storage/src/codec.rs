//! Endianness-aware, constant-length binary serializers.
//!
//! Every primitive has a fixed encoded length, so the length of an encoded indexable is known from its dimensions alone.
//! Serializers compose: `Composite2`/`3`/`4` build a struct serializer from field serializers, and `IndexableSerializer`
//! writes a whole indexable as its dimensions followed by every value in row-major order.
//!
//! ```
//! use chunk_stage_core::prelude::*;
//! use chunk_stage_storage::prelude::*;
//!
//! let codec = IndexableSerializer::<2, _>::new(PrimitiveSerializer::<u8>::big());
//! let array = ArrayN::from_values(Bounds2::from_dimensions(IndexN([2, 2])), vec![1, 2, 3, 4]).unwrap();
//!
//! let mut bytes = Vec::new();
//! codec.serialize(&array, &mut bytes);
//! assert_eq!(bytes, [0, 0, 0, 2, 0, 0, 0, 2, 1, 2, 3, 4]);
//!
//! let decoded = codec.deserialize(&mut bytes.as_slice()).unwrap();
//! assert_eq!(decoded, array);
//! ```

pub mod chunk;
pub mod composite;
pub mod index;
pub mod indexable;
pub mod primitive;

pub use self::chunk::*;
pub use composite::*;
pub use index::*;
pub use indexable::*;
pub use primitive::*;

use crate::{StageError, StageResult};

use serde::{Deserialize, Serialize};

/// Byte order of multi-byte values.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    /// The byte order of the running machine.
    #[inline]
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    #[inline]
    pub fn is_native(&self) -> bool {
        *self == Self::native()
    }
}

/// Converts values of one type to and from bytes.
pub trait Serializer {
    type Value;

    fn endianness(&self) -> Endianness;

    /// The exact number of bytes `serialize` will append for `value`.
    fn encoded_len(&self, value: &Self::Value) -> usize;

    /// Append the encoding of `value` to `out`.
    fn serialize(&self, value: &Self::Value, out: &mut Vec<u8>);

    /// Decode one value from the front of `input`, advancing it past the consumed bytes.
    fn deserialize(&self, input: &mut &[u8]) -> StageResult<Self::Value>;

    #[inline]
    fn serialize_slice(&self, values: &[Self::Value], out: &mut Vec<u8>) {
        for value in values {
            self.serialize(value, out);
        }
    }

    /// Decode exactly `dst.len()` values into `dst`.
    #[inline]
    fn deserialize_into(&self, input: &mut &[u8], dst: &mut [Self::Value]) -> StageResult<()> {
        for d in dst.iter_mut() {
            *d = self.deserialize(input)?;
        }
        Ok(())
    }

    #[inline]
    fn deserialize_vec(&self, input: &mut &[u8], count: usize) -> StageResult<Vec<Self::Value>> {
        (0..count).map(|_| self.deserialize(input)).collect()
    }
}

/// A serializer whose encoded length does not depend on the value.
pub trait ConstLength {
    fn constant_len(&self) -> usize;
}

/// Split `n` bytes off the front of `input`.
#[inline]
pub(crate) fn take<'a>(input: &mut &'a [u8], n: usize) -> StageResult<&'a [u8]> {
    if input.len() < n {
        return Err(StageError::Truncated {
            needed: n,
            remaining: input.len(),
        });
    }
    let (head, tail) = input.split_at(n);
    *input = tail;

    Ok(head)
}

/// Fails with `InconsistentEndianness` unless all of `parts` agree.
pub(crate) fn common_endianness(parts: &[Endianness]) -> StageResult<Endianness> {
    let first = *parts.first().ok_or_else(|| {
        StageError::invalid_argument("a composite serializer needs at least one field")
    })?;
    if parts.iter().all(|&e| e == first) {
        Ok(first)
    } else {
        Err(StageError::InconsistentEndianness)
    }
}
