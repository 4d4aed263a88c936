//! Capability traits for reading and writing values at lattice indices.
//!
//! One storage type implements both traits; read-only consumers take `&impl Indexable<D>` and are never handed the mutators.
//! The traits are implemented for `&T` and `&mut T` (and `IndexableMut` for `&mut T`), which is how views borrow their
//! backing storage:
//!
//! ```
//! use chunk_stage_core::prelude::*;
//! use chunk_stage_storage::prelude::*;
//!
//! let mut array = ArrayN::fill(Bounds2::from_dimensions(IndexN([4, 4])), 0u8);
//! array.set(IndexN([1, 2]), 7).unwrap();
//!
//! let view = OffsetView::new(&array, IndexN([16, 16]));
//! assert_eq!(view.get(IndexN([17, 18])).unwrap(), 7);
//! assert!(view.try_get(IndexN([1, 2])).is_none());
//! ```

use crate::{StageError, StageResult};

use chunk_stage_core::{BoundsN, IndexN};
use std::sync::Arc;

//  ██████╗ ███████╗████████╗
// ██╔════╝ ██╔════╝╚══██╔══╝
// ██║  ███╗█████╗     ██║
// ██║   ██║██╔══╝     ██║
// ╚██████╔╝███████╗   ██║
//  ╚═════╝ ╚══════╝   ╚═╝

/// A bounded mapping from index to value.
pub trait Indexable<const D: usize> {
    type Value: Clone;

    /// The set of indices that have a value.
    fn bounds(&self) -> BoundsN<D>;

    /// Get the value at `index` without reporting an error for invalid indices. Callers must check validity first; this is
    /// only `debug_assert!`-ed.
    fn get_unchecked(&self, index: IndexN<D>) -> Self::Value;

    #[inline]
    fn is_index_valid(&self, index: IndexN<D>) -> bool {
        self.bounds().contains(index)
    }

    #[inline]
    fn get(&self, index: IndexN<D>) -> StageResult<Self::Value> {
        if self.is_index_valid(index) {
            Ok(self.get_unchecked(index))
        } else {
            Err(StageError::out_of_bounds(&index.0))
        }
    }

    #[inline]
    fn try_get(&self, index: IndexN<D>) -> Option<Self::Value> {
        if self.is_index_valid(index) {
            Some(self.get_unchecked(index))
        } else {
            None
        }
    }

    /// Visit every index of `bounds` that is also in `self.bounds()`, in row-major order.
    #[inline]
    fn for_each(&self, bounds: &BoundsN<D>, mut f: impl FnMut(IndexN<D>, Self::Value)) {
        for index in self.bounds().intersection(bounds).iter_indices() {
            f(index, self.get_unchecked(index));
        }
    }
}

// ███████╗███████╗████████╗
// ██╔════╝██╔════╝╚══██╔══╝
// ███████╗█████╗     ██║
// ╚════██║██╔══╝     ██║
// ███████║███████╗   ██║
// ╚══════╝╚══════╝   ╚═╝

pub trait IndexableMut<const D: usize>: Indexable<D> {
    /// Callers must check validity first; this is only `debug_assert!`-ed.
    fn set_unchecked(&mut self, index: IndexN<D>, value: Self::Value);

    #[inline]
    fn set(&mut self, index: IndexN<D>, value: Self::Value) -> StageResult<()> {
        if self.is_index_valid(index) {
            self.set_unchecked(index, value);
            Ok(())
        } else {
            Err(StageError::out_of_bounds(&index.0))
        }
    }

    /// Returns `false` instead of an error when `index` is invalid.
    #[inline]
    fn try_set(&mut self, index: IndexN<D>, value: Self::Value) -> bool {
        if self.is_index_valid(index) {
            self.set_unchecked(index, value);
            true
        } else {
            false
        }
    }

    /// Overwrite every index of `bounds` that is also in `self.bounds()` with `f(index)`, in row-major order.
    #[inline]
    fn write_with(&mut self, bounds: &BoundsN<D>, mut f: impl FnMut(IndexN<D>) -> Self::Value) {
        for index in self.bounds().intersection(bounds).iter_indices() {
            self.set_unchecked(index, f(index));
        }
    }
}

// Borrowing wrappers forward to the storage they point at, so views can hold `&S`, `&mut S` or shared ownership.
macro_rules! impl_indexable_for_pointer {
    ($($ptr:ty),*) => {
        $(
            impl<const D: usize, T: Indexable<D> + ?Sized> Indexable<D> for $ptr {
                type Value = T::Value;

                #[inline]
                fn bounds(&self) -> BoundsN<D> {
                    (**self).bounds()
                }

                #[inline]
                fn get_unchecked(&self, index: IndexN<D>) -> Self::Value {
                    (**self).get_unchecked(index)
                }
            }
        )*
    };
}

impl_indexable_for_pointer!(&T, &mut T, Box<T>, Arc<T>);

impl<const D: usize, T: IndexableMut<D> + ?Sized> IndexableMut<D> for &mut T {
    #[inline]
    fn set_unchecked(&mut self, index: IndexN<D>, value: Self::Value) {
        (**self).set_unchecked(index, value)
    }
}

impl<const D: usize, T: IndexableMut<D> + ?Sized> IndexableMut<D> for Box<T> {
    #[inline]
    fn set_unchecked(&mut self, index: IndexN<D>, value: Self::Value) {
        (**self).set_unchecked(index, value)
    }
}

/// Copy all values of `src` inside `bounds` into `dst` at the same indices. Indices outside either side are skipped.
pub fn copy_bounds<const D: usize, Src, Dst>(bounds: &BoundsN<D>, src: &Src, dst: &mut Dst)
where
    Src: Indexable<D>,
    Dst: IndexableMut<D, Value = Src::Value>,
{
    let region = bounds.intersection(&src.bounds()).intersection(&dst.bounds());
    src.for_each(&region, |index, value| dst.set_unchecked(index, value));
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
    use crate::{ArrayN, IndexableTree, OffsetView};

    use chunk_stage_core::Bounds2;

    #[test]
    fn copy_bounds_skips_indices_outside_either_side() {
        let src = ArrayN::fill_with(Bounds2::new(IndexN([0, 0]), IndexN([4, 4])), |i| i.x() * 10 + i.y());
        let mut dst = ArrayN::fill(Bounds2::new(IndexN([2, -2]), IndexN([4, 4])), -1);

        copy_bounds(&Bounds2::new(IndexN([-8, -8]), IndexN([16, 16])), &src, &mut dst);

        for i in dst.bounds().iter_indices() {
            let expected = if src.bounds().contains(i) { i.x() * 10 + i.y() } else { -1 };
            assert_eq!(dst.get(i).unwrap(), expected);
        }
    }

    #[test]
    fn copy_bounds_between_storage_kinds() {
        let src = ArrayN::fill_with(Bounds2::from_dimensions(IndexN([4, 4])), |i| (i.x() >= 2) as u8);
        let mut tree = IndexableTree::new(IndexN([0, 0]), 2, 0u8).unwrap();

        copy_bounds(&src.bounds(), &src, &mut tree);
        assert_eq!(tree.get(IndexN([3, 1])).unwrap(), 1);
        assert_eq!(tree.get(IndexN([1, 3])).unwrap(), 0);

        // Through a shared pointer and a translated view.
        let shared = Arc::new(tree);
        let view = OffsetView::new(shared.clone(), IndexN([100, 100]));
        assert_eq!(view.get(IndexN([103, 100])).unwrap(), 1);
        assert_eq!(view.bounds().lower_bounds, IndexN([100, 100]));
    }
}
