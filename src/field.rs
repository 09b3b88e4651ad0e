//! Dense rectangular field arrays.
//!
//! State and metric data are held in row-major arrays with the vertical
//! level as the fastest-varying index, so that per-column slices are
//! contiguous and the innermost vertical loops vectorize. Indexing is by
//! tuple, e.g. `field[(i, j, k)]`; component-major 4D fields add the
//! component as the leading index.
//!
//! Views into these arrays are always taken through indexing or the
//! column accessors; no raw pointer reinterpretation is used anywhere.

use std::ops::{Index, IndexMut};

/// 2D field addressed by (i, j).
#[derive(Clone, Debug, PartialEq)]
pub struct Field2 {
    ni: usize,
    nj: usize,
    data: Vec<f64>,
}

impl Field2 {
    /// Allocate a zero-initialized field of shape (ni, nj).
    pub fn zeros(ni: usize, nj: usize) -> Self {
        Self {
            ni,
            nj,
            data: vec![0.0; ni * nj],
        }
    }

    /// Set every entry to `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    #[inline(always)]
    fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.ni && j < self.nj);
        i * self.nj + j
    }
}

impl Index<(usize, usize)> for Field2 {
    type Output = f64;

    #[inline(always)]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[self.offset(i, j)]
    }
}

impl IndexMut<(usize, usize)> for Field2 {
    #[inline(always)]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        let n = self.offset(i, j);
        &mut self.data[n]
    }
}

/// 3D field addressed by (i, j, k), with k contiguous.
#[derive(Clone, Debug, PartialEq)]
pub struct Field3 {
    ni: usize,
    nj: usize,
    nk: usize,
    data: Vec<f64>,
}

impl Field3 {
    /// Allocate a zero-initialized field of shape (ni, nj, nk).
    pub fn zeros(ni: usize, nj: usize, nk: usize) -> Self {
        Self {
            ni,
            nj,
            nk,
            data: vec![0.0; ni * nj * nk],
        }
    }

    /// Vertical extent (the contiguous axis).
    pub fn nk(&self) -> usize {
        self.nk
    }

    /// Set every entry to `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// The contiguous vertical column at horizontal position (i, j).
    #[inline]
    pub fn column(&self, i: usize, j: usize) -> &[f64] {
        let start = self.offset(i, j, 0);
        &self.data[start..start + self.nk]
    }

    /// Mutable contiguous vertical column at (i, j).
    #[inline]
    pub fn column_mut(&mut self, i: usize, j: usize) -> &mut [f64] {
        let start = self.offset(i, j, 0);
        &mut self.data[start..start + self.nk]
    }

    #[inline(always)]
    fn offset(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.ni && j < self.nj && k < self.nk);
        (i * self.nj + j) * self.nk + k
    }
}

impl Index<(usize, usize, usize)> for Field3 {
    type Output = f64;

    #[inline(always)]
    fn index(&self, (i, j, k): (usize, usize, usize)) -> &f64 {
        &self.data[self.offset(i, j, k)]
    }
}

impl IndexMut<(usize, usize, usize)> for Field3 {
    #[inline(always)]
    fn index_mut(&mut self, (i, j, k): (usize, usize, usize)) -> &mut f64 {
        let n = self.offset(i, j, k);
        &mut self.data[n]
    }
}

/// Component-major 4D field addressed by (c, i, j, k), with k contiguous.
#[derive(Clone, Debug, PartialEq)]
pub struct Field4 {
    nc: usize,
    ni: usize,
    nj: usize,
    nk: usize,
    data: Vec<f64>,
}

impl Field4 {
    /// Allocate a zero-initialized field of shape (nc, ni, nj, nk).
    pub fn zeros(nc: usize, ni: usize, nj: usize, nk: usize) -> Self {
        Self {
            nc,
            ni,
            nj,
            nk,
            data: vec![0.0; nc * ni * nj * nk],
        }
    }

    /// Number of components (leading axis).
    pub fn nc(&self) -> usize {
        self.nc
    }

    /// Vertical extent (the contiguous axis).
    pub fn nk(&self) -> usize {
        self.nk
    }

    /// Set every entry to `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Copy all entries from a field of identical shape.
    pub fn copy_from(&mut self, other: &Field4) {
        assert_eq!(
            (self.nc, self.ni, self.nj, self.nk),
            (other.nc, other.ni, other.nj, other.nk),
            "shape mismatch in Field4::copy_from"
        );
        self.data.copy_from_slice(&other.data);
    }

    #[inline(always)]
    fn offset(&self, c: usize, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(c < self.nc && i < self.ni && j < self.nj && k < self.nk);
        ((c * self.ni + i) * self.nj + j) * self.nk + k
    }
}

impl Index<(usize, usize, usize, usize)> for Field4 {
    type Output = f64;

    #[inline(always)]
    fn index(&self, (c, i, j, k): (usize, usize, usize, usize)) -> &f64 {
        &self.data[self.offset(c, i, j, k)]
    }
}

impl IndexMut<(usize, usize, usize, usize)> for Field4 {
    #[inline(always)]
    fn index_mut(&mut self, (c, i, j, k): (usize, usize, usize, usize)) -> &mut f64 {
        let n = self.offset(c, i, j, k);
        &mut self.data[n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field3_layout_is_column_contiguous() {
        let mut f = Field3::zeros(2, 3, 4);
        for k in 0..4 {
            f[(1, 2, k)] = k as f64;
        }
        assert_eq!(f.column(1, 2), &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_field3_column_mut_roundtrip() {
        let mut f = Field3::zeros(2, 2, 3);
        f.column_mut(0, 1).copy_from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(f[(0, 1, 0)], 1.0);
        assert_eq!(f[(0, 1, 2)], 3.0);
        // Neighboring columns untouched
        assert_eq!(f.column(0, 0), &[0.0; 3]);
        assert_eq!(f.column(1, 0), &[0.0; 3]);
    }

    #[test]
    fn test_field4_indexing_distinct_components() {
        let mut f = Field4::zeros(3, 2, 2, 2);
        f[(0, 1, 1, 1)] = 1.0;
        f[(2, 1, 1, 1)] = 2.0;
        assert_eq!(f[(0, 1, 1, 1)], 1.0);
        assert_eq!(f[(1, 1, 1, 1)], 0.0);
        assert_eq!(f[(2, 1, 1, 1)], 2.0);
    }

    #[test]
    fn test_field4_copy_from() {
        let mut a = Field4::zeros(2, 2, 2, 2);
        let mut b = Field4::zeros(2, 2, 2, 2);
        b[(1, 0, 1, 0)] = 7.0;
        a.copy_from(&b);
        assert_eq!(a[(1, 0, 1, 0)], 7.0);
    }

    #[test]
    #[should_panic]
    fn test_field4_copy_from_shape_mismatch_panics() {
        let mut a = Field4::zeros(2, 2, 2, 2);
        let b = Field4::zeros(2, 2, 2, 3);
        a.copy_from(&b);
    }
}
