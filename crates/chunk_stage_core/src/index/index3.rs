use super::IndexN;

/// A 3-dimensional index with `i32` components.
pub type Index3 = IndexN<3>;

impl Index3 {
    #[inline]
    pub fn x(&self) -> i32 {
        self.0[0]
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.0[1]
    }

    #[inline]
    pub fn z(&self) -> i32 {
        self.0[2]
    }

    /// Drops the Y component.
    #[inline]
    pub fn xz(&self) -> IndexN<2> {
        IndexN([self.0[0], self.0[2]])
    }
}
