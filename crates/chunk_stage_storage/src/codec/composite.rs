//! Serializers for values made of a fixed sequence of fields.
//!
//! A composite serializer splits a value into fields with a `decompose` function, serializes the fields in declared order,
//! and rebuilds the value with a `compose` function. All field serializers must share one byte order.
//!
//! ```
//! use chunk_stage_storage::prelude::*;
//!
//! #[derive(Debug, PartialEq)]
//! struct Voxel {
//!     material: u8,
//!     density: f32,
//! }
//!
//! let codec = Composite2::new(
//!     PrimitiveSerializer::<u8>::little(),
//!     PrimitiveSerializer::<f32>::little(),
//!     |v: &Voxel| (v.material, v.density),
//!     |material, density| Voxel { material, density },
//! )
//! .unwrap();
//! assert_eq!(codec.constant_len(), 5);
//!
//! let mut bytes = Vec::new();
//! codec.serialize(&Voxel { material: 3, density: 0.5 }, &mut bytes);
//! assert_eq!(codec.deserialize(&mut bytes.as_slice()).unwrap(), Voxel { material: 3, density: 0.5 });
//! ```

use super::{common_endianness, ConstLength, Endianness, Serializer};
use crate::StageResult;

use core::marker::PhantomData;

macro_rules! impl_composite {
    ($name:ident, $($field:ident: $ser:ident),+) => {
        pub struct $name<T, $($ser),+, Dec, Com> {
            $($field: $ser,)+
            decompose: Dec,
            compose: Com,
            endianness: Endianness,
            marker: PhantomData<fn() -> T>,
        }

        impl<T, $($ser),+, Dec, Com> $name<T, $($ser),+, Dec, Com>
        where
            $($ser: Serializer,)+
            Dec: Fn(&T) -> ($(<$ser as Serializer>::Value),+),
            Com: Fn($(<$ser as Serializer>::Value),+) -> T,
        {
            /// Fails with `InconsistentEndianness` if the field serializers disagree on byte order.
            pub fn new($($field: $ser,)+ decompose: Dec, compose: Com) -> StageResult<Self> {
                let endianness = common_endianness(&[$($field.endianness()),+])?;

                Ok(Self {
                    $($field,)+
                    decompose,
                    compose,
                    endianness,
                    marker: PhantomData,
                })
            }
        }

        impl<T, $($ser),+, Dec, Com> Serializer for $name<T, $($ser),+, Dec, Com>
        where
            $($ser: Serializer,)+
            Dec: Fn(&T) -> ($(<$ser as Serializer>::Value),+),
            Com: Fn($(<$ser as Serializer>::Value),+) -> T,
        {
            type Value = T;

            #[inline]
            fn endianness(&self) -> Endianness {
                self.endianness
            }

            #[inline]
            fn encoded_len(&self, value: &T) -> usize {
                let ($($field),+) = (self.decompose)(value);
                0 $(+ self.$field.encoded_len(&$field))+
            }

            #[inline]
            fn serialize(&self, value: &T, out: &mut Vec<u8>) {
                let ($($field),+) = (self.decompose)(value);
                $(self.$field.serialize(&$field, out);)+
            }

            #[inline]
            fn deserialize(&self, input: &mut &[u8]) -> StageResult<T> {
                $(let $field = self.$field.deserialize(input)?;)+
                Ok((self.compose)($($field),+))
            }
        }

        impl<T, $($ser),+, Dec, Com> ConstLength for $name<T, $($ser),+, Dec, Com>
        where
            $($ser: ConstLength,)+
        {
            #[inline]
            fn constant_len(&self) -> usize {
                0 $(+ self.$field.constant_len())+
            }
        }
    };
}

impl_composite!(Composite2, a: A, b: B);
impl_composite!(Composite3, a: A, b: B, c: C);
impl_composite!(Composite4, a: A, b: B, c: C, d: E);

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
