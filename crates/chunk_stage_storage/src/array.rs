//! Dense N-dimensional arrays, where N is 2, 3 or 4.
//!
//! An array holds a value at exactly the set of indices in its `BoundsN`, and no more. Values are laid out in a flat `Vec` in
//! row-major order (dimension 0 varies fastest), which is also the order the codec writes them in.
//!
//! ```
//! use chunk_stage_core::prelude::*;
//! use chunk_stage_storage::prelude::*;
//!
//! let bounds = Bounds3::from_dimensions(IndexN::fill(16));
//! let mut array = ArrayN::fill(bounds, 0u16);
//!
//! // Write all indices in a sub-region.
//! let region = Bounds3::from_lower_and_lub(IndexN::fill(4), IndexN::fill(8));
//! array.for_each_mut(&region, |_, value| *value = 1);
//!
//! array.for_each(&bounds, |i, value| assert_eq!(value, region.contains(i) as u16));
//! ```

use crate::{Indexable, IndexableMut, StageError, StageResult};

use chunk_stage_core::prelude::*;

/// A 2-dimensional array.
pub type Array2<T> = ArrayN<2, T>;
/// A 3-dimensional array.
pub type Array3<T> = ArrayN<3, T>;
/// A 4-dimensional array.
pub type Array4<T> = ArrayN<4, T>;

/// A map from the indices of a `BoundsN` to values of type `T`, stored densely.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArrayN<const D: usize, T> {
    bounds: BoundsN<D>,
    strides: [usize; D],
    values: Vec<T>,
}

#[inline]
fn strides_for<const D: usize>(dimensions: IndexN<D>) -> [usize; D] {
    let mut strides = [0; D];
    let mut stride = 1;
    for (s, &dim) in strides.iter_mut().zip(dimensions.0.iter()) {
        *s = stride;
        stride *= dim.max(0) as usize;
    }
    strides
}

impl<const D: usize, T> ArrayN<D, T> {
    /// Fails if the number of values does not match the bounds.
    pub fn from_values(bounds: BoundsN<D>, values: Vec<T>) -> StageResult<Self> {
        if values.len() != bounds.length() {
            return Err(StageError::invalid_argument(format!(
                "array with dimensions {:?} needs {} values, got {}",
                bounds.dimensions.0,
                bounds.length(),
                values.len()
            )));
        }

        Ok(Self {
            strides: strides_for(bounds.dimensions),
            bounds,
            values,
        })
    }

    pub fn fill_with(bounds: BoundsN<D>, mut filler: impl FnMut(IndexN<D>) -> T) -> Self {
        let values = bounds.iter_indices().map(|i| filler(i)).collect();

        Self {
            strides: strides_for(bounds.dimensions),
            bounds,
            values,
        }
    }

    #[inline]
    pub fn dimensions(&self) -> IndexN<D> {
        self.bounds.dimensions
    }

    /// Moves the array so its least index is `lower_bounds`. Values keep their relative positions.
    #[inline]
    pub fn set_lower_bounds(&mut self, lower_bounds: IndexN<D>) {
        self.bounds.lower_bounds = lower_bounds;
    }

    #[inline]
    pub fn values_slice(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn values_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }

    #[inline]
    pub fn into_parts(self) -> (BoundsN<D>, Vec<T>) {
        (self.bounds, self.values)
    }

    /// The flat offset of `index`, which must be in bounds.
    #[inline]
    pub fn stride(&self, index: IndexN<D>) -> usize {
        debug_assert!(self.bounds.contains(index));

        let local = index - self.bounds.lower_bounds;
        local
            .0
            .iter()
            .zip(self.strides.iter())
            .map(|(&c, &s)| c as usize * s)
            .sum()
    }

    #[inline]
    pub fn get_ref(&self, index: IndexN<D>) -> Option<&T> {
        if self.bounds.contains(index) {
            Some(&self.values[self.stride(index)])
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, index: IndexN<D>) -> Option<&mut T> {
        if self.bounds.contains(index) {
            let s = self.stride(index);
            Some(&mut self.values[s])
        } else {
            None
        }
    }

    /// Visit every index of `bounds` that is in the array with a mutable reference to its value.
    pub fn for_each_mut(&mut self, bounds: &BoundsN<D>, mut f: impl FnMut(IndexN<D>, &mut T)) {
        for index in self.bounds.intersection(bounds).iter_indices() {
            let s = self.stride(index);
            f(index, &mut self.values[s]);
        }
    }
}

impl<const D: usize, T: Clone> ArrayN<D, T> {
    pub fn fill(bounds: BoundsN<D>, value: T) -> Self {
        Self {
            strides: strides_for(bounds.dimensions),
            values: vec![value; bounds.length()],
            bounds,
        }
    }

    /// Overwrite every value in place, keeping the allocation.
    #[inline]
    pub fn reset_values(&mut self, value: T) {
        for v in self.values.iter_mut() {
            *v = value.clone();
        }
    }

    pub fn fill_bounds(&mut self, bounds: &BoundsN<D>, value: T) {
        self.for_each_mut(bounds, |_, v| *v = value.clone());
    }
}

impl<const D: usize, T: Clone> Indexable<D> for ArrayN<D, T> {
    type Value = T;

    #[inline]
    fn bounds(&self) -> BoundsN<D> {
        self.bounds
    }

    #[inline]
    fn get_unchecked(&self, index: IndexN<D>) -> T {
        self.values[self.stride(index)].clone()
    }
}

impl<const D: usize, T: Clone> IndexableMut<D> for ArrayN<D, T> {
    #[inline]
    fn set_unchecked(&mut self, index: IndexN<D>, value: T) {
        let s = self.stride(index);
        self.values[s] = value;
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
    fn values_are_row_major() {
        let bounds = Bounds2::from_dimensions(IndexN([2, 2]));
        let array = ArrayN::from_values(bounds, vec![1u8, 2, 3, 4]).unwrap();

        assert_eq!(array.get(IndexN([0, 0])).unwrap(), 1);
        assert_eq!(array.get(IndexN([1, 0])).unwrap(), 2);
        assert_eq!(array.get(IndexN([0, 1])).unwrap(), 3);
        assert_eq!(array.get(IndexN([1, 1])).unwrap(), 4);
    }

    #[test]
    fn from_values_checks_length() {
        let bounds = Bounds3::from_dimensions(IndexN::fill(2));

        assert!(matches!(
            ArrayN::from_values(bounds, vec![0u8; 7]),
            Err(StageError::InvalidArgument(_))
        ));
    }

    #[test]
    fn access_is_defined_exactly_on_bounds() {
        let bounds = Bounds3::new(IndexN([-2, 0, 5]), IndexN([3, 2, 4]));
        let mut array = ArrayN::fill_with(bounds, |i| i.x() + i.y() + i.z());

        for i in bounds.padded(2).iter_indices() {
            let valid = bounds.contains(i);
            assert_eq!(array.is_index_valid(i), valid);
            assert_eq!(array.get(i).is_ok(), valid);
            assert_eq!(array.try_get(i), valid.then(|| i.x() + i.y() + i.z()));
            assert_eq!(array.try_set(i, 0), valid);
        }

        assert!(matches!(
            array.set(IndexN([1, 0, 5]), 9),
            Err(StageError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn for_each_clips_to_array_bounds() {
        let array = ArrayN::fill(Bounds2::from_dimensions(IndexN([4, 4])), 1u32);
        let query = Bounds2::new(IndexN([2, 2]), IndexN([10, 10]));

        let mut visited = Vec::new();
        array.for_each(&query, |i, v| {
            assert_eq!(v, 1);
            visited.push(i);
        });

        assert_eq!(
            visited,
            vec![IndexN([2, 2]), IndexN([3, 2]), IndexN([2, 3]), IndexN([3, 3])]
        );
    }

    #[test]
    fn reset_keeps_shape() {
        let bounds = Bounds3::from_dimensions(IndexN::fill(4));
        let mut array = ArrayN::fill_with(bounds, |i| i.x());

        array.reset_values(7);

        assert_eq!(array.bounds(), bounds);
        assert!(array.values_slice().iter().all(|&v| v == 7));
    }
}
