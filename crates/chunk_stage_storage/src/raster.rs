//! Turning continuous shapes into occupancy arrays on the chunk grid.
//!
//! Cell `i` covers `[i * cell_length, (i + 1) * cell_length)` on each axis and is occupied when its center lies inside the
//! shape. Halving the cell length roughly doubles the bounds on every axis.

use crate::{ArrayN, StageError, StageResult};

use chunk_stage_core::{BoundsN, IndexN};

/// A value that can be sampled onto a lattice of cubic cells.
pub trait Rasterizable<const D: usize> {
    type Value;

    fn rasterize(&self, cell_length: f32) -> StageResult<ArrayN<D, Self::Value>>;
}

/// A solid N-ball.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ball<const D: usize> {
    pub center: [f32; D],
    pub radius: f32,
}

/// An axis-aligned box spanning `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb<const D: usize> {
    pub min: [f32; D],
    pub max: [f32; D],
}

impl<const D: usize> Ball<D> {
    #[inline]
    pub fn contains(&self, p: &[f32; D]) -> bool {
        let dist_sq: f32 = p
            .iter()
            .zip(self.center.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();

        dist_sq <= self.radius * self.radius
    }

    #[inline]
    pub fn aabb(&self) -> Aabb<D> {
        Aabb {
            min: self.center.map(|c| c - self.radius),
            max: self.center.map(|c| c + self.radius),
        }
    }
}

impl<const D: usize> Aabb<D> {
    #[inline]
    pub fn contains(&self, p: &[f32; D]) -> bool {
        p.iter()
            .zip(self.min.iter().zip(self.max.iter()))
            .all(|(c, (lo, hi))| lo <= c && c <= hi)
    }

    /// The cells whose extent intersects the box.
    fn covering_cells(&self, cell_length: f32) -> StageResult<BoundsN<D>> {
        let too_fine = || {
            StageError::invalid_argument(format!(
                "cell length {} is too small to rasterize this shape",
                cell_length
            ))
        };

        let mut lower = IndexN::<D>::ZERO;
        let mut dimensions = IndexN::<D>::ZERO;
        let mut num_cells = 1i64;
        for dim in 0..D {
            let lo = (self.min[dim] as f64 / cell_length as f64).floor();
            let hi = (self.max[dim] as f64 / cell_length as f64).floor();
            if !(lo >= i32::MIN as f64 && hi <= i32::MAX as f64) {
                return Err(too_fine());
            }
            let extent = hi as i64 - lo as i64 + 1;
            if extent > i32::MAX as i64 {
                return Err(too_fine());
            }
            lower.0[dim] = lo as i32;
            dimensions.0[dim] = extent as i32;
            num_cells = num_cells.saturating_mul(extent);
        }

        if num_cells > i32::MAX as i64 {
            return Err(StageError::invalid_argument(format!(
                "rasterizing at cell length {} would need {} or more cells",
                cell_length, num_cells
            )));
        }

        Ok(BoundsN::new(lower, dimensions))
    }
}

fn check_cell_length(cell_length: f32) -> StageResult<()> {
    if cell_length > 0.0 && cell_length.is_finite() {
        Ok(())
    } else {
        Err(StageError::invalid_argument(format!(
            "cell length must be positive and finite, got {}",
            cell_length
        )))
    }
}

#[inline]
fn cell_center<const D: usize>(cell: IndexN<D>, cell_length: f32) -> [f32; D] {
    cell.0.map(|c| (c as f32 + 0.5) * cell_length)
}

fn rasterize_with<const D: usize>(
    aabb: &Aabb<D>,
    cell_length: f32,
    inside: impl Fn(&[f32; D]) -> bool,
) -> StageResult<ArrayN<D, bool>> {
    check_cell_length(cell_length)?;
    let bounds = aabb.covering_cells(cell_length)?;

    Ok(ArrayN::fill_with(bounds, |cell| {
        inside(&cell_center(cell, cell_length))
    }))
}

impl<const D: usize> Rasterizable<D> for Ball<D> {
    type Value = bool;

    fn rasterize(&self, cell_length: f32) -> StageResult<ArrayN<D, bool>> {
        if !(self.radius >= 0.0) {
            return Err(StageError::invalid_argument(format!(
                "ball radius must be non-negative, got {}",
                self.radius
            )));
        }

        rasterize_with(&self.aabb(), cell_length, |p| self.contains(p))
    }
}

impl<const D: usize> Rasterizable<D> for Aabb<D> {
    type Value = bool;

    fn rasterize(&self, cell_length: f32) -> StageResult<ArrayN<D, bool>> {
        if self.min.iter().zip(self.max.iter()).any(|(lo, hi)| !(lo <= hi)) {
            return Err(StageError::invalid_argument(format!(
                "box minimum {:?} exceeds maximum {:?}",
                self.min, self.max
            )));
        }

        rasterize_with(self, cell_length, |p| self.contains(p))
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
    use crate::Indexable;

    #[test]
    fn non_positive_cell_length_is_rejected() {
        let ball = Ball {
            center: [0.0; 3],
            radius: 1.0,
        };

        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                ball.rasterize(bad),
                Err(StageError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn finer_cells_give_larger_bounds() {
        let ball = Ball {
            center: [0.5, 0.5],
            radius: 4.0,
        };

        let coarse = ball.rasterize(1.0).unwrap();
        let fine = ball.rasterize(0.5).unwrap();

        assert!(fine.bounds().length() > coarse.bounds().length());
        assert!(coarse.get(IndexN([0, 0])).unwrap());
        assert!(!coarse.get(coarse.bounds().lower_bounds).unwrap());
    }

    #[test]
    fn unit_box_covers_expected_cells() {
        let aabb = Aabb {
            min: [0.0, 0.0, 0.0],
            max: [1.99, 0.99, 0.99],
        };

        let cells = aabb.rasterize(1.0).unwrap();

        assert_eq!(
            cells.bounds(),
            BoundsN::from_dimensions(IndexN([2, 1, 1]))
        );
        assert!(cells.values_slice().iter().all(|&occupied| occupied));
    }

    #[test]
    fn shapes_wider_than_the_index_range_are_rejected() {
        let ball = Ball::<3> {
            center: [0.0; 3],
            radius: 1.5e9,
        };
        assert!(matches!(
            ball.rasterize(1.0),
            Err(StageError::InvalidArgument(_))
        ));

        // Each endpoint fits in an i32, but the span between them does not.
        let aabb = Aabb {
            min: [-2.0e9, 0.0],
            max: [2.0e9, 0.5],
        };
        assert!(matches!(
            aabb.rasterize(1.0),
            Err(StageError::InvalidArgument(_))
        ));

        // 2^31 itself is out of range.
        let edge = Aabb {
            min: [0.0],
            max: [2147483648.0],
        };
        assert!(edge.rasterize(1.0).is_err());
    }

    #[test]
    fn too_many_cells_are_rejected() {
        let aabb = Aabb {
            min: [0.0; 4],
            max: [60_000.0; 4],
        };

        assert!(matches!(
            aabb.rasterize(1.0),
            Err(StageError::InvalidArgument(_))
        ));
    }

    #[test]
    fn inverted_box_is_rejected() {
        let aabb = Aabb {
            min: [1.0, 0.0],
            max: [0.0, 1.0],
        };

        assert!(aabb.rasterize(1.0).is_err());
    }
}
