use super::IndexN;

/// A 4-dimensional index with `i32` components.
pub type Index4 = IndexN<4>;

impl Index4 {
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

    #[inline]
    pub fn w(&self) -> i32 {
        self.0[3]
    }

    /// Drops the W component.
    #[inline]
    pub fn xyz(&self) -> IndexN<3> {
        IndexN([self.0[0], self.0[1], self.0[2]])
    }
}
