//! Indexables that reinterpret another indexable without copying it.
//!
//! A view holds its backing storage by value, which is normally a borrow (`&S` or `&mut S`), so it can never outlive the
//! storage it forwards to.

use crate::{Indexable, IndexableMut};

use chunk_stage_core::{BoundsN, IndexN};

/// Translates the index space of `backing` by `offset`: `view[i] == backing[i - offset]`.
///
/// This is how a chunk's 0-based local storage is exposed in stage coordinates.
#[derive(Clone, Copy, Debug)]
pub struct OffsetView<B, const D: usize> {
    backing: B,
    offset: IndexN<D>,
}

impl<B, const D: usize> OffsetView<B, D> {
    #[inline]
    pub fn new(backing: B, offset: IndexN<D>) -> Self {
        Self { backing, offset }
    }

    #[inline]
    pub fn offset(&self) -> IndexN<D> {
        self.offset
    }

    #[inline]
    pub fn backing(&self) -> &B {
        &self.backing
    }

    #[inline]
    pub fn into_backing(self) -> B {
        self.backing
    }
}

impl<B: Indexable<D>, const D: usize> Indexable<D> for OffsetView<B, D> {
    type Value = B::Value;

    #[inline]
    fn bounds(&self) -> BoundsN<D> {
        self.backing.bounds().translated(self.offset)
    }

    #[inline]
    fn get_unchecked(&self, index: IndexN<D>) -> Self::Value {
        self.backing.get_unchecked(index - self.offset)
    }
}

impl<B: IndexableMut<D>, const D: usize> IndexableMut<D> for OffsetView<B, D> {
    #[inline]
    fn set_unchecked(&mut self, index: IndexN<D>, value: Self::Value) {
        self.backing.set_unchecked(index - self.offset, value)
    }
}

/// Restricts `backing` to the indices inside `region`. Indices keep their meaning.
#[derive(Clone, Copy, Debug)]
pub struct SubRegionView<B, const D: usize> {
    backing: B,
    region: BoundsN<D>,
}

impl<B, const D: usize> SubRegionView<B, D> {
    #[inline]
    pub fn new(backing: B, region: BoundsN<D>) -> Self {
        Self { backing, region }
    }

    #[inline]
    pub fn backing(&self) -> &B {
        &self.backing
    }
}

impl<B: Indexable<D>, const D: usize> Indexable<D> for SubRegionView<B, D> {
    type Value = B::Value;

    #[inline]
    fn bounds(&self) -> BoundsN<D> {
        self.backing.bounds().intersection(&self.region)
    }

    #[inline]
    fn get_unchecked(&self, index: IndexN<D>) -> Self::Value {
        debug_assert!(self.region.contains(index));
        self.backing.get_unchecked(index)
    }
}

impl<B: IndexableMut<D>, const D: usize> IndexableMut<D> for SubRegionView<B, D> {
    #[inline]
    fn set_unchecked(&mut self, index: IndexN<D>, value: Self::Value) {
        debug_assert!(self.region.contains(index));
        self.backing.set_unchecked(index, value)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
