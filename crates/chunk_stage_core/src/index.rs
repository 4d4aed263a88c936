//! Fixed-rank integer lattice indices.

mod index2;
mod index3;
mod index4;
mod serde_impls;

pub use index2::*;
pub use index3::*;
pub use index4::*;

use core::ops::{
    Add, AddAssign, BitAnd, BitOr, Div, Mul, Neg, Not, Rem, Shl, Shr, Sub, SubAssign,
};
use num::Integer;
use std::cmp::Ordering;

/// An N-dimensional integer index (where N is 2, 3 or 4). It is most convenient to construct indices of any rank as:
///
/// ```
/// use chunk_stage_core::IndexN;
///
/// let i2 = IndexN([1, 2]); // 2D
/// let i3 = IndexN([1, 2, 3]); // 3D
/// ```
///
/// Indices support component-wise addition and subtraction, scalar multiplication, and flooring scalar division.
///
/// ```
/// use chunk_stage_core::IndexN;
///
/// let a = IndexN([1, 2]);
/// let b = IndexN([3, 4]);
///
/// assert_eq!(a + b, IndexN([4, 6]));
/// assert_eq!(a - b, IndexN([-2, -2]));
///
/// assert_eq!(a * 2, IndexN([2, 4]));
/// assert_eq!(IndexN([-1, 3]) / 2, IndexN([-1, 1]));
/// ```
///
/// The rank is part of the type, so two indices of different rank can never be combined.
///
/// There is also a partial order defined on indices which says that an index A is less than an index B if and only if all
/// of the components of A are less than those of B. This is what makes bounds containment a pair of comparisons:
///
/// ```
/// use chunk_stage_core::IndexN;
///
/// let min = IndexN([0, 0, 0]);
/// let least_upper_bound = IndexN([3, 3, 3]);
///
/// let i = IndexN([0, 1, 2]);
/// assert!(min <= i && i < least_upper_bound);
/// ```
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct IndexN<const D: usize>(pub [i32; D]);

impl<const D: usize> IndexN<D> {
    /// The canonical zero index.
    pub const ZERO: Self = Self([0; D]);
    /// An index of all ones.
    pub const ONES: Self = Self([1; D]);
    /// The least index.
    pub const MIN: Self = Self([i32::MIN; D]);
    /// The greatest index.
    pub const MAX: Self = Self([i32::MAX; D]);

    /// The rank of this index type.
    pub const RANK: usize = D;

    #[inline]
    pub const fn fill(value: i32) -> Self {
        Self([value; D])
    }

    /// Returns the component for dimension number `dim`. I.e. X = 0, Y = 1, Z = 2, W = 3.
    #[inline]
    pub fn at(&self, dim: usize) -> i32 {
        self.0[dim]
    }

    #[inline]
    pub fn at_mut(&mut self, dim: usize) -> &mut i32 {
        &mut self.0[dim]
    }

    /// Returns the index after applying `f` component-wise.
    #[inline]
    pub fn map_components_unary(&self, f: impl Fn(i32) -> i32) -> Self {
        let mut out = self.0;
        for c in out.iter_mut() {
            *c = f(*c);
        }
        Self(out)
    }

    /// Returns the index after applying `f` component-wise to both `self` and `other` in parallel.
    #[inline]
    pub fn map_components_binary(&self, other: &Self, f: impl Fn(i32, i32) -> i32) -> Self {
        let mut out = self.0;
        for (c, o) in out.iter_mut().zip(other.0.iter()) {
            *c = f(*c, *o);
        }
        Self(out)
    }

    /// The unit vectors of each dimension, in dimension order.
    #[inline]
    pub fn basis() -> [Self; D] {
        core::array::from_fn(|dim| {
            let mut b = Self::ZERO;
            b.0[dim] = 1;
            b
        })
    }

    /// Product of all components. Computed in 64 bits so large shapes don't overflow.
    #[inline]
    pub fn volume(&self) -> i64 {
        self.0.iter().map(|&c| c as i64).product()
    }

    /// Component-wise maximum.
    #[inline]
    pub fn join(&self, other: &Self) -> Self {
        self.map_components_binary(other, i32::max)
    }

    /// Component-wise minimum.
    #[inline]
    pub fn meet(&self, other: &Self) -> Self {
        self.map_components_binary(other, i32::min)
    }

    #[inline]
    pub fn min_component(&self) -> i32 {
        self.0.iter().copied().min().unwrap_or(0)
    }

    #[inline]
    pub fn max_component(&self) -> i32 {
        self.0.iter().copied().max().unwrap_or(0)
    }

    #[inline]
    pub fn abs(&self) -> Self {
        self.map_components_unary(i32::abs)
    }

    #[inline]
    pub fn vector_div_floor(&self, rhs: &Self) -> Self {
        self.map_components_binary(rhs, |c1, c2| Integer::div_floor(&c1, &c2))
    }

    #[inline]
    pub fn scalar_div_floor(&self, rhs: i32) -> Self {
        self.map_components_unary(|c| Integer::div_floor(&c, &rhs))
    }

    #[inline]
    pub fn vector_div_ceil(&self, rhs: &Self) -> Self {
        self.map_components_binary(rhs, |c1, c2| Integer::div_ceil(&c1, &c2))
    }

    /// Returns `true` iff all dimensions are powers of 2.
    #[inline]
    pub fn dimensions_are_powers_of_2(&self) -> bool {
        self.0.iter().all(|&c| c > 0 && (c as u32).is_power_of_two())
    }

    /// Returns `true` iff all dimensions are equal.
    #[inline]
    pub fn is_cube(&self) -> bool {
        self.0.iter().all(|&c| c == self.0[0])
    }

    /// All corners of an N-dimensional unit cube. Corner `i` has bit `k` of `i` set iff its component `k` is 1, so this is
    /// also the ordering of children in a quadtree or octree.
    pub fn corner_offsets() -> Vec<Self> {
        (0..(1usize << D)).map(Self::corner_offset).collect()
    }

    /// The corner of the unit cube selected by `child_index`, where bit `k` selects axis `k`.
    #[inline]
    pub fn corner_offset(child_index: usize) -> Self {
        let mut corner = Self::ZERO;
        for (dim, c) in corner.0.iter_mut().enumerate() {
            *c = ((child_index >> dim) & 1) as i32;
        }
        corner
    }

    /// [Von Neumann Neighborhood](https://en.wikipedia.org/wiki/Von_Neumann_neighborhood)
    pub fn von_neumann_offsets() -> Vec<Self> {
        let mut offsets = Vec::with_capacity(2 * D);
        for b in Self::basis().iter() {
            offsets.push(-*b);
            offsets.push(*b);
        }
        offsets
    }

    /// [Moore Neighborhood](https://en.wikipedia.org/wiki/Moore_neighborhood), in row-major order, excluding the center.
    pub fn moore_offsets() -> Vec<Self> {
        IndexIter::new(Self::fill(-1), Self::fill(2))
            .filter(|p| *p != Self::ZERO)
            .collect()
    }
}

impl<const D: usize> Default for IndexN<D> {
    #[inline]
    fn default() -> Self {
        Self::ZERO
    }
}

impl<const D: usize> From<[i32; D]> for IndexN<D> {
    #[inline]
    fn from(components: [i32; D]) -> Self {
        Self(components)
    }
}

// This particular partial order allows us to say that a `BoundsN` b contains an `IndexN` i iff i is GEQ the lower bound of b
// and i is LT the least upper bound of b.
impl<const D: usize> PartialOrd for IndexN<D> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else if self < other {
            Some(Ordering::Less)
        } else if self > other {
            Some(Ordering::Greater)
        } else {
            None
        }
    }

    #[inline]
    fn lt(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a < b)
    }

    #[inline]
    fn gt(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a > b)
    }

    #[inline]
    fn le(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a <= b)
    }

    #[inline]
    fn ge(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a >= b)
    }
}

/// Iterates over every index `p` with `min <= p < lub` in row-major order, i.e. dimension 0 varies fastest.
#[derive(Clone, Debug)]
pub struct IndexIter<const D: usize> {
    min: IndexN<D>,
    lub: IndexN<D>,
    next: Option<IndexN<D>>,
}

impl<const D: usize> IndexIter<D> {
    #[inline]
    pub fn new(min: IndexN<D>, lub: IndexN<D>) -> Self {
        let empty = D == 0 || min.0.iter().zip(lub.0.iter()).any(|(m, l)| m >= l);

        Self {
            min,
            lub,
            next: if empty { None } else { Some(min) },
        }
    }
}

impl<const D: usize> Iterator for IndexIter<D> {
    type Item = IndexN<D>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        // Odometer increment.
        let mut advanced = current;
        let mut dim = 0;
        loop {
            if dim == D {
                self.next = None;
                break;
            }
            advanced.0[dim] += 1;
            if advanced.0[dim] < self.lub.0[dim] {
                self.next = Some(advanced);
                break;
            }
            advanced.0[dim] = self.min.0[dim];
            dim += 1;
        }

        Some(current)
    }
}

macro_rules! impl_binary_op {
    ($op:ident, $f:ident, $assign_op:ident, $assign_f:ident, $e:expr) => {
        impl<const D: usize> $op for IndexN<D> {
            type Output = Self;

            #[inline]
            fn $f(self, rhs: Self) -> Self {
                self.map_components_binary(&rhs, $e)
            }
        }

        impl<const D: usize> $assign_op for IndexN<D> {
            #[inline]
            fn $assign_f(&mut self, rhs: Self) {
                *self = self.map_components_binary(&rhs, $e);
            }
        }
    };
}

impl_binary_op!(Add, add, AddAssign, add_assign, |a, b| a + b);
impl_binary_op!(Sub, sub, SubAssign, sub_assign, |a, b| a - b);

macro_rules! impl_scalar_op {
    ($op:ident, $f:ident, $e:expr) => {
        impl<const D: usize> $op<i32> for IndexN<D> {
            type Output = Self;

            #[inline]
            fn $f(self, rhs: i32) -> Self {
                self.map_components_unary(|c| $e(c, rhs))
            }
        }
    };
}

impl_scalar_op!(Mul, mul, |c: i32, s: i32| c * s);
impl_scalar_op!(Shl, shl, |c: i32, s: i32| c << s);
impl_scalar_op!(Shr, shr, |c: i32, s: i32| c >> s);
impl_scalar_op!(BitAnd, bitand, |c: i32, s: i32| c & s);
impl_scalar_op!(BitOr, bitor, |c: i32, s: i32| c | s);
impl_scalar_op!(Rem, rem, |c: i32, s: i32| c % s);

impl<const D: usize> Mul<IndexN<D>> for IndexN<D> {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.map_components_binary(&rhs, |c1, c2| c1 * c2)
    }
}

// Use specialized implementations because the default integer Div rounds towards zero, which is not what we want for
// lattice coordinates.
impl<const D: usize> Div<i32> for IndexN<D> {
    type Output = Self;

    #[inline]
    fn div(self, rhs: i32) -> Self {
        self.scalar_div_floor(rhs)
    }
}

impl<const D: usize> Div<IndexN<D>> for IndexN<D> {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self {
        self.vector_div_floor(&rhs)
    }
}

impl<const D: usize> Neg for IndexN<D> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::ZERO - self
    }
}

impl<const D: usize> Not for IndexN<D> {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        self.map_components_unary(|c| !c)
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
    fn arithmetic_is_component_wise() {
        let a = Index3::from([1, -2, 3]);
        let b = Index3::from([4, 5, -6]);

        assert_eq!(a + b, IndexN([5, 3, -3]));
        assert_eq!(a - b, IndexN([-3, -7, 9]));
        assert_eq!(-a, IndexN([-1, 2, -3]));
        assert_eq!(a * 3, IndexN([3, -6, 9]));
        assert_eq!(a.at(2), 3);
    }

    #[test]
    fn division_rounds_towards_negative_infinity() {
        assert_eq!(IndexN([-1, -16, -17, 15]) / 16, IndexN([-1, -1, -2, 0]));
        assert_eq!(IndexN([-1, 1]) >> 4, IndexN([-1, 0]));
    }

    #[test]
    fn corner_offsets_use_child_index_bits() {
        assert_eq!(
            Index2::corner_offsets(),
            vec![IndexN([0, 0]), IndexN([1, 0]), IndexN([0, 1]), IndexN([1, 1])]
        );
        assert_eq!(Index3::corner_offsets().len(), 8);
        assert_eq!(Index4::corner_offsets().len(), 16);
        assert_eq!(Index3::corner_offset(0b101), IndexN([1, 0, 1]));
    }

    #[test]
    fn moore_neighborhood_excludes_center() {
        let offsets = Index3::moore_offsets();

        assert_eq!(offsets.len(), 26);
        assert!(!offsets.contains(&Index3::ZERO));
        assert_eq!(Index2::moore_offsets().len(), 8);
    }

    #[test]
    fn partial_order_is_component_wise() {
        let a = IndexN([0, 5]);
        let b = IndexN([1, 4]);

        assert_eq!(a.partial_cmp(&b), None);
        assert!(IndexN([0, 0]) < IndexN([1, 1]));
        assert!(IndexN([0, 1]) <= IndexN([0, 1]));
    }

    #[test]
    fn iter_is_row_major_and_handles_empty_ranges() {
        let points: Vec<_> = IndexIter::new(IndexN([0, 0]), IndexN([2, 2])).collect();
        assert_eq!(
            points,
            vec![IndexN([0, 0]), IndexN([1, 0]), IndexN([0, 1]), IndexN([1, 1])]
        );

        assert_eq!(IndexIter::new(IndexN([0, 0]), IndexN([0, 2])).count(), 0);
    }
}
