//! Lattice index math for chunked stages: fixed-rank integer indices, axis-aligned bounds and Z-order codes.

pub mod bounds;
pub mod index;
pub mod int_math;
pub mod morton;

pub use bounds::*;
pub use index::*;
pub use int_math::*;
pub use morton::*;

pub use num;

pub mod prelude {
    pub use super::{
        Bounds2, Bounds3, Bounds4, BoundsN, Index2, Index3, Index4, IndexIter, IndexN, Morton2,
        Morton3, Morton4, MortonOrder,
    };
}
