//! Z-order codes for 2D, 3D and 4D indices.
//!
//! Components are translated from `i32` into `u32` while preserving order, so every index has a code and sorting by code
//! sorts by Z-order even across the origin. Dimension 0 occupies the least significant bit of each interleaved group, so
//! the 2^D corners of any aligned unit cube are contiguous in Morton space, in child-index order.

use crate::{Index2, Index3, Index4, IndexN};

use core::hash::Hash;
use morton_encoding::{morton_decode, morton_encode};
use std::fmt;

/// An index type with a Z-order code.
pub trait MortonOrder: Copy {
    type Code: Copy + Eq + Ord + Hash + fmt::Debug + Send + Sync + 'static;

    fn morton(&self) -> Self::Code;

    fn from_morton(code: Self::Code) -> Self;
}

// ██████╗ ██████╗
// ╚════██╗██╔══██╗
//  █████╔╝██║  ██║
// ██╔═══╝ ██║  ██║
// ███████╗██████╔╝
// ╚══════╝╚═════╝

/// A Morton-encoded `Index2`. Uses a `u64` to support the full set of `Index2`s.
///
/// <https://en.wikipedia.org/wiki/Z-order_curve>
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Morton2(pub u64);

impl fmt::Debug for Morton2 {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{} = {:b}", self.0, self.0)
    }
}

impl From<Index2> for Morton2 {
    #[inline]
    fn from(p: Index2) -> Self {
        Self(morton_encode([translate(p.y()), translate(p.x())]))
    }
}

impl From<Morton2> for Index2 {
    #[inline]
    fn from(m: Morton2) -> Self {
        let yx: [u32; 2] = morton_decode(m.0);
        IndexN([untranslate(yx[1]), untranslate(yx[0])])
    }
}

impl MortonOrder for Index2 {
    type Code = Morton2;

    #[inline]
    fn morton(&self) -> Morton2 {
        Morton2::from(*self)
    }

    #[inline]
    fn from_morton(code: Morton2) -> Self {
        Self::from(code)
    }
}

// ██████╗ ██████╗
// ╚════██╗██╔══██╗
//  █████╔╝██║  ██║
//  ╚═══██╗██║  ██║
// ██████╔╝██████╔╝
// ╚═════╝ ╚═════╝

/// A Morton-encoded `Index3`. Uses a `u128` to support the full set of `Index3`s.
///
/// <https://en.wikipedia.org/wiki/Z-order_curve>
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Morton3(pub u128);

impl fmt::Debug for Morton3 {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{} = {:b}", self.0, self.0)
    }
}

impl From<Index3> for Morton3 {
    #[inline]
    fn from(p: Index3) -> Self {
        Self(morton_encode([
            translate(p.z()),
            translate(p.y()),
            translate(p.x()),
        ]))
    }
}

impl From<Morton3> for Index3 {
    #[inline]
    fn from(m: Morton3) -> Self {
        let zyx: [u32; 3] = morton_decode(m.0);
        IndexN([
            untranslate(zyx[2]),
            untranslate(zyx[1]),
            untranslate(zyx[0]),
        ])
    }
}

impl MortonOrder for Index3 {
    type Code = Morton3;

    #[inline]
    fn morton(&self) -> Morton3 {
        Morton3::from(*self)
    }

    #[inline]
    fn from_morton(code: Morton3) -> Self {
        Self::from(code)
    }
}

// ██╗  ██╗██████╗
// ██║  ██║██╔══██╗
// ███████║██║  ██║
// ╚════██║██║  ██║
//      ██║██████╔╝
//      ╚═╝╚═════╝

/// A Morton-encoded `Index4`. All 128 bits are used.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Morton4(pub u128);

impl fmt::Debug for Morton4 {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{} = {:b}", self.0, self.0)
    }
}

impl From<Index4> for Morton4 {
    #[inline]
    fn from(p: Index4) -> Self {
        Self(morton_encode([
            translate(p.w()),
            translate(p.z()),
            translate(p.y()),
            translate(p.x()),
        ]))
    }
}

impl From<Morton4> for Index4 {
    #[inline]
    fn from(m: Morton4) -> Self {
        let wzyx: [u32; 4] = morton_decode(m.0);
        IndexN([
            untranslate(wzyx[3]),
            untranslate(wzyx[2]),
            untranslate(wzyx[1]),
            untranslate(wzyx[0]),
        ])
    }
}

impl MortonOrder for Index4 {
    type Code = Morton4;

    #[inline]
    fn morton(&self) -> Morton4 {
        Morton4::from(*self)
    }

    #[inline]
    fn from_morton(code: Morton4) -> Self {
        Self::from(code)
    }
}

/// Send the full range of i32 onto u32 while preserving the total order.
#[inline]
fn translate(x: i32) -> u32 {
    x.wrapping_sub(i32::MIN) as u32
}

/// The inverse of `translate`.
#[inline]
fn untranslate(x: u32) -> i32 {
    (x as i32).wrapping_add(i32::MIN)
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
    use crate::Bounds3;

    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn limits_of_i32() {
        let min = IndexN([i32::MIN; 3]);
        let max = IndexN([i32::MAX; 3]);

        assert_eq!(Morton3::from(min), Morton3(0));
        assert_eq!(Morton3::from(max), Morton3((1 << 96) - 1));

        assert_eq!(min, Index3::from(Morton3::from(min)));
        assert_eq!(max, Index3::from(Morton3::from(max)));

        let max4 = IndexN([i32::MAX; 4]);
        assert_eq!(Morton4::from(max4), Morton4(u128::MAX));
        assert_eq!(max4, Index4::from(Morton4::from(max4)));
    }

    #[test]
    fn octants_are_contiguous_in_morton_space() {
        let octant_mins = [
            [-2, -2, -2],
            [0, -2, -2],
            [-2, 0, -2],
            [0, 0, -2],
            [-2, -2, 0],
            [0, -2, 0],
            [-2, 0, 0],
            [0, 0, 0],
        ];

        for &octant_min in octant_mins.iter() {
            let octant_mortons: Vec<_> = Index3::corner_offsets()
                .into_iter()
                .map(|offset| (IndexN(octant_min) + offset).morton())
                .collect();

            let first = octant_mortons[0].0;
            for (i, m) in octant_mortons.iter().enumerate() {
                assert_eq!(m.0, first + i as u128);
            }
        }
    }

    #[test]
    fn injective_over_dense_region() {
        let region = Bounds3::new(IndexN([-4, -4, -4]), IndexN([8, 8, 8]));

        let codes: HashSet<_> = region.iter_indices().map(|p| p.morton()).collect();
        assert_eq!(codes.len(), region.length());

        for p in region.iter_indices() {
            assert_eq!(Index3::from_morton(p.morton()), p);
        }
    }

    #[test]
    fn decode_inverts_encode_for_random_indices() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0xdead_beef);

        for _ in 0..1000 {
            let p2 = IndexN([rng.gen::<i32>(), rng.gen::<i32>()]);
            let p4 = IndexN([rng.gen::<i32>(), rng.gen::<i32>(), rng.gen::<i32>(), rng.gen::<i32>()]);

            assert_eq!(Index2::from_morton(p2.morton()), p2);
            assert_eq!(Index4::from_morton(p4.morton()), p4);
        }
    }

    #[test]
    fn ordering_is_preserved_along_an_axis() {
        let a = IndexN([-1, 0]).morton();
        let b = IndexN([0, 0]).morton();
        let c = IndexN([1, 0]).morton();

        assert!(a < b && b < c);
    }
}
