use super::IndexN;

/// A 2-dimensional index with `i32` components.
pub type Index2 = IndexN<2>;

impl Index2 {
    #[inline]
    pub fn x(&self) -> i32 {
        self.0[0]
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.0[1]
    }

    /// Lifts this index into 3D by inserting `y` between X and Z. The inverse of `Index3::xz`.
    #[inline]
    pub fn with_y(&self, y: i32) -> IndexN<3> {
        IndexN([self.0[0], y, self.0[1]])
    }
}
