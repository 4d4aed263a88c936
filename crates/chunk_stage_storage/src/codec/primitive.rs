use super::{take, ConstLength, Endianness, Serializer};
use crate::StageResult;

use bytemuck::Pod;
use core::marker::PhantomData;

/// A fixed-size number with both byte orders.
pub trait Primitive: Pod + Send + Sync + 'static {
    const SIZE: usize;

    fn write(self, endianness: Endianness, out: &mut Vec<u8>);

    /// `bytes` has exactly `SIZE` bytes.
    fn read(bytes: &[u8], endianness: Endianness) -> Self;
}

macro_rules! impl_primitive {
    ($($t:ty),*) => {
        $(
            impl Primitive for $t {
                const SIZE: usize = std::mem::size_of::<$t>();

                #[inline]
                fn write(self, endianness: Endianness, out: &mut Vec<u8>) {
                    match endianness {
                        Endianness::Big => out.extend_from_slice(&self.to_be_bytes()),
                        Endianness::Little => out.extend_from_slice(&self.to_le_bytes()),
                    }
                }

                #[inline]
                fn read(bytes: &[u8], endianness: Endianness) -> Self {
                    let mut buf = [0; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    match endianness {
                        Endianness::Big => <$t>::from_be_bytes(buf),
                        Endianness::Little => <$t>::from_le_bytes(buf),
                    }
                }
            }
        )*
    };
}

impl_primitive!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Serializes one primitive type in one byte order.
///
/// Slices in native byte order are copied as raw bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PrimitiveSerializer<T> {
    endianness: Endianness,
    marker: PhantomData<fn() -> T>,
}

impl<T: Primitive> PrimitiveSerializer<T> {
    #[inline]
    pub const fn new(endianness: Endianness) -> Self {
        Self {
            endianness,
            marker: PhantomData,
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

    #[inline]
    pub const fn native() -> Self {
        Self::new(Endianness::native())
    }

    // Single bytes have no byte order.
    #[inline]
    fn is_raw(&self) -> bool {
        T::SIZE == 1 || self.endianness.is_native()
    }
}

impl<T: Primitive> ConstLength for PrimitiveSerializer<T> {
    #[inline]
    fn constant_len(&self) -> usize {
        T::SIZE
    }
}

impl<T: Primitive> Serializer for PrimitiveSerializer<T> {
    type Value = T;

    #[inline]
    fn endianness(&self) -> Endianness {
        self.endianness
    }

    #[inline]
    fn encoded_len(&self, _value: &T) -> usize {
        T::SIZE
    }

    #[inline]
    fn serialize(&self, value: &T, out: &mut Vec<u8>) {
        value.write(self.endianness, out)
    }

    #[inline]
    fn deserialize(&self, input: &mut &[u8]) -> StageResult<T> {
        Ok(T::read(take(input, T::SIZE)?, self.endianness))
    }

    #[inline]
    fn serialize_slice(&self, values: &[T], out: &mut Vec<u8>) {
        if self.is_raw() {
            out.extend_from_slice(bytemuck::cast_slice(values));
        } else {
            out.reserve(values.len() * T::SIZE);
            for &v in values {
                v.write(self.endianness, out);
            }
        }
    }

    #[inline]
    fn deserialize_into(&self, input: &mut &[u8], dst: &mut [T]) -> StageResult<()> {
        let bytes = take(input, dst.len() * T::SIZE)?;
        if self.is_raw() {
            bytemuck::cast_slice_mut::<T, u8>(dst).copy_from_slice(bytes);
        } else {
            for (d, chunk) in dst.iter_mut().zip(bytes.chunks_exact(T::SIZE)) {
                *d = T::read(chunk, self.endianness);
            }
        }

        Ok(())
    }

    #[inline]
    fn deserialize_vec(&self, input: &mut &[u8], count: usize) -> StageResult<Vec<T>> {
        let mut values = vec![T::zeroed(); count];
        self.deserialize_into(input, &mut values)?;

        Ok(values)
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
    use crate::StageError;

    use rand::{Rng, SeedableRng};

    #[test]
    fn byte_orders() {
        let mut big = Vec::new();
        PrimitiveSerializer::<u32>::big().serialize(&0x0102_0304, &mut big);
        assert_eq!(big, [1, 2, 3, 4]);

        let mut little = Vec::new();
        PrimitiveSerializer::<u32>::little().serialize(&0x0102_0304, &mut little);
        assert_eq!(little, [4, 3, 2, 1]);

        assert_eq!(PrimitiveSerializer::<i16>::big().constant_len(), 2);
        assert_eq!(PrimitiveSerializer::<f64>::little().constant_len(), 8);
    }

    #[test]
    fn floats_round_trip_bitwise() {
        let ser = PrimitiveSerializer::<f32>::big();
        for value in [0.0f32, -0.0, f32::MIN_POSITIVE, f32::NAN, f32::NEG_INFINITY, 1.5e-42] {
            let mut bytes = Vec::new();
            ser.serialize(&value, &mut bytes);
            let decoded = ser.deserialize(&mut bytes.as_slice()).unwrap();
            assert_eq!(decoded.to_bits(), value.to_bits());
        }
    }

    #[test]
    fn slice_paths_agree_across_byte_orders() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let values: Vec<i64> = (0..100).map(|_| rng.gen()).collect();

        for ser in [PrimitiveSerializer::<i64>::big(), PrimitiveSerializer::<i64>::little()] {
            let mut bulk = Vec::new();
            ser.serialize_slice(&values, &mut bulk);

            let mut one_by_one = Vec::new();
            for v in values.iter() {
                ser.serialize(v, &mut one_by_one);
            }
            assert_eq!(bulk, one_by_one);

            let decoded = ser.deserialize_vec(&mut bulk.as_slice(), values.len()).unwrap();
            assert_eq!(decoded, values);
        }
    }

    #[test]
    fn truncated_input_is_reported() {
        let ser = PrimitiveSerializer::<u64>::little();
        let bytes = [0u8; 5];

        assert!(matches!(
            ser.deserialize(&mut &bytes[..]),
            Err(StageError::Truncated {
                needed: 8,
                remaining: 5
            })
        ));

        let mut dst = [0u64; 2];
        assert!(ser.deserialize_into(&mut &[0u8; 12][..], &mut dst).is_err());
    }
}
