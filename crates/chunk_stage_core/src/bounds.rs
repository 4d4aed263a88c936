use crate::{IndexIter, IndexN};

use serde::{Deserialize, Serialize};

/// 2-dimensional indexing bounds.
pub type Bounds2 = BoundsN<2>;
/// 3-dimensional indexing bounds.
pub type Bounds3 = BoundsN<3>;
/// 4-dimensional indexing bounds.
pub type Bounds4 = BoundsN<4>;

/// An N-dimensional box of lattice indices. This is mathematically the Cartesian product of a half-closed interval
/// `[lower, lower + dimension)` in each dimension. Every indexable storage has one of these describing the set of indices at
/// which it holds a value.
///
/// The dimensions are never negative. A zero dimension on any axis makes the bounds empty.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct BoundsN<const D: usize> {
    /// The least index contained in the bounds.
    pub lower_bounds: IndexN<D>,
    /// The length of each dimension.
    pub dimensions: IndexN<D>,
}

impl<const D: usize> BoundsN<D> {
    /// Negative dimensions are clamped to zero.
    #[inline]
    pub fn new(lower_bounds: IndexN<D>, dimensions: IndexN<D>) -> Self {
        Self {
            lower_bounds,
            dimensions: dimensions.join(&IndexN::ZERO),
        }
    }

    /// Bounds at the origin.
    #[inline]
    pub fn from_dimensions(dimensions: IndexN<D>) -> Self {
        Self::new(IndexN::ZERO, dimensions)
    }

    /// Both `lower_bounds` and `upper_bounds` are inclusive.
    #[inline]
    pub fn from_lower_and_upper(lower_bounds: IndexN<D>, upper_bounds: IndexN<D>) -> Self {
        Self::new(lower_bounds, upper_bounds - lower_bounds + IndexN::ONES)
    }

    #[inline]
    pub fn from_lower_and_lub(lower_bounds: IndexN<D>, least_upper_bound: IndexN<D>) -> Self {
        Self::new(lower_bounds, least_upper_bound - lower_bounds)
    }

    /// The greatest index contained in the bounds. Meaningless when the bounds are empty.
    #[inline]
    pub fn upper_bounds(&self) -> IndexN<D> {
        self.lower_bounds + self.dimensions - IndexN::ONES
    }

    /// The least index `p` such that every contained index `q` satisfies `q < p`.
    #[inline]
    pub fn least_upper_bound(&self) -> IndexN<D> {
        self.lower_bounds + self.dimensions
    }

    /// Number of indices contained.
    #[inline]
    pub fn length(&self) -> usize {
        self.dimensions.volume() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    #[inline]
    pub fn contains(&self, index: IndexN<D>) -> bool {
        self.lower_bounds <= index && index < self.least_upper_bound()
    }

    /// Translate the bounds by `offset`.
    #[inline]
    pub fn translated(&self, offset: IndexN<D>) -> Self {
        Self {
            lower_bounds: self.lower_bounds + offset,
            dimensions: self.dimensions,
        }
    }

    #[inline]
    pub fn with_lower_bounds(&self, lower_bounds: IndexN<D>) -> Self {
        Self {
            lower_bounds,
            dimensions: self.dimensions,
        }
    }

    /// Grow each side by `amount`.
    #[inline]
    pub fn padded(&self, amount: i32) -> Self {
        Self::new(
            self.lower_bounds - IndexN::fill(amount),
            self.dimensions + IndexN::fill(2 * amount),
        )
    }

    /// The largest bounds contained in both `self` and `other`. May be empty.
    #[inline]
    pub fn intersection(&self, other: &Self) -> Self {
        let lower = self.lower_bounds.join(&other.lower_bounds);
        let lub = self
            .least_upper_bound()
            .meet(&other.least_upper_bound());

        Self::from_lower_and_lub(lower, lub)
    }

    /// The empty set is a subset of everything.
    #[inline]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.is_empty() || self.intersection(other) == *self
    }

    /// Iterate over all contained indices in row-major order, i.e. dimension 0 varies fastest.
    #[inline]
    pub fn iter_indices(&self) -> IndexIter<D> {
        IndexIter::new(self.lower_bounds, self.least_upper_bound())
    }
}

/// Returns the smallest bounds containing all of the given indices, or `None` if there are none.
pub fn bounding_bounds<const D: usize>(
    mut indices: impl Iterator<Item = IndexN<D>>,
) -> Option<BoundsN<D>> {
    let first = indices.next()?;
    let (min, max) = indices.fold((first, first), |(min, max), i| (min.meet(&i), max.join(&i)));

    Some(BoundsN::from_lower_and_upper(min, max))
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
    fn upper_bounds_and_length() {
        let b = Bounds3::new(IndexN([-1, 0, 2]), IndexN([2, 3, 4]));

        assert_eq!(b.upper_bounds(), IndexN([0, 2, 5]));
        assert_eq!(b.length(), 24);
    }

    #[test]
    fn contains_agrees_with_iteration() {
        let b = Bounds2::new(IndexN([-2, 3]), IndexN([3, 2]));

        let inside: Vec<_> = b.iter_indices().collect();
        assert_eq!(inside.len(), b.length());
        assert!(inside.iter().all(|&i| b.contains(i)));

        for i in b.padded(1).iter_indices() {
            assert_eq!(b.contains(i), inside.contains(&i));
        }
    }

    #[test]
    fn zero_dimension_is_empty() {
        let b = Bounds3::new(IndexN([0, 0, 0]), IndexN([4, 0, 4]));

        assert!(b.is_empty());
        assert_eq!(b.length(), 0);
        assert!(!b.contains(IndexN([0, 0, 0])));
        assert_eq!(b.iter_indices().count(), 0);
    }

    #[test]
    fn negative_dimensions_are_clamped() {
        let b = Bounds2::new(IndexN([0, 0]), IndexN([-3, 5]));

        assert_eq!(b.dimensions, IndexN([0, 5]));
        assert!(b.is_empty());
    }

    #[test]
    fn intersection_and_subset() {
        let a = Bounds2::from_lower_and_upper(IndexN([0, 0]), IndexN([9, 9]));
        let b = Bounds2::from_lower_and_upper(IndexN([5, -5]), IndexN([15, 5]));

        let i = a.intersection(&b);
        assert_eq!(i, Bounds2::from_lower_and_upper(IndexN([5, 0]), IndexN([9, 5])));
        assert!(i.is_subset_of(&a));
        assert!(i.is_subset_of(&b));
        assert!(!a.is_subset_of(&b));

        let disjoint = a.intersection(&a.translated(IndexN([20, 0])));
        assert!(disjoint.is_empty());
    }

    #[test]
    fn bounding_bounds_of_scattered_indices() {
        let b = bounding_bounds(vec![IndexN([1, 5]), IndexN([-2, 0]), IndexN([3, 1])].into_iter());

        assert_eq!(
            b,
            Some(Bounds2::from_lower_and_upper(IndexN([-2, 0]), IndexN([3, 5])))
        );
        assert_eq!(bounding_bounds::<2>(std::iter::empty()), None);
    }
}
