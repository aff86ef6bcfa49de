//! Multivector storage: an owned row-major container, strided views over it, and
//! the storage-identity test the dispatch layer uses to route aliased calls.

pub mod view;

use std::ops::{Index, IndexMut};

use faer::Mat;

use crate::core::Scalar;
use crate::error::{KernelError, Result};

pub use view::{MvMut, MvRef};

/// How two views relate in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    /// No element is shared.
    Disjoint,
    /// Same base, shape and stride: every element is shared at the same index.
    Identical,
    /// Some but not all elements are shared, or shared at different indices.
    Partial,
}

/// Classify the storage relationship of two views.
///
/// Two column sub-views of one parent are interleaved in memory but disjoint; the
/// test accounts for that when both views use the same row stride.
pub fn overlap<T>(a: &MvRef<'_, T>, b: &MvRef<'_, T>) -> Overlap {
    let size = std::mem::size_of::<T>();
    let (Some(len_a), Some(len_b)) = (
        view::required_len(a.nrows(), a.ncols(), a.row_stride()),
        view::required_len(b.nrows(), b.ncols(), b.row_stride()),
    ) else {
        return Overlap::Partial;
    };
    if len_a == 0 || len_b == 0 || size == 0 {
        return Overlap::Disjoint;
    }
    let start_a = a.as_ptr() as usize;
    let start_b = b.as_ptr() as usize;
    let end_a = start_a.saturating_add(len_a.saturating_mul(size));
    let end_b = start_b.saturating_add(len_b.saturating_mul(size));
    if end_a <= start_b || end_b <= start_a {
        return Overlap::Disjoint;
    }
    if start_a == start_b
        && a.nrows() == b.nrows()
        && a.ncols() == b.ncols()
        && a.row_stride() == b.row_stride()
    {
        return Overlap::Identical;
    }
    let stride = a.row_stride();
    let diff = start_b as isize - start_a as isize;
    if stride == b.row_stride() && stride > 0 && diff % size as isize == 0 {
        // Column window of `b` in the frame of `a`'s row starts.
        let col_b = (diff / size as isize).rem_euclid(stride as isize) as usize;
        let no_wrap = a.ncols() <= stride && col_b + b.ncols() <= stride;
        if no_wrap && col_b >= a.ncols() {
            return Overlap::Disjoint;
        }
    }
    Overlap::Partial
}

/// Owned, dense, row-major multivector.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiVector<T> {
    data: Vec<T>,
    nrows: usize,
    ncols: usize,
}

/// Element count of a dense `nrows x ncols` multivector.
fn dense_len(nrows: usize, ncols: usize) -> Result<usize> {
    nrows.checked_mul(ncols).ok_or_else(|| {
        KernelError::InvalidView(format!("{nrows}x{ncols} multivector has more than usize::MAX elements"))
    })
}

impl<T: Scalar> MultiVector<T> {
    /// # Panics
    /// If `nrows * ncols` overflows or the allocation fails.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        // An overflowing shape asks for usize::MAX elements, which fails the allocation.
        let len = dense_len(nrows, ncols).unwrap_or(usize::MAX);
        Self { data: vec![T::zero(); len], nrows, ncols }
    }

    /// Build from a function of `(row, column)`.
    ///
    /// # Panics
    /// If `nrows * ncols` overflows or the allocation fails.
    pub fn from_fn(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(dense_len(nrows, ncols).unwrap_or(usize::MAX));
        for i in 0..nrows {
            for k in 0..ncols {
                data.push(f(i, k));
            }
        }
        Self { data, nrows, ncols }
    }

    /// Take ownership of row-major `data`.
    pub fn from_row_major(nrows: usize, ncols: usize, data: Vec<T>) -> Result<Self> {
        let needed = dense_len(nrows, ncols)?;
        if data.len() != needed {
            return Err(KernelError::InvalidView(format!(
                "{nrows}x{ncols} multivector needs {needed} elements, got {}",
                data.len()
            )));
        }
        Ok(Self { data, nrows, ncols })
    }

    /// Build from equal-length columns.
    pub fn from_columns(columns: &[Vec<T>]) -> Result<Self> {
        let nrows = columns.first().map_or(0, Vec::len);
        if let Some(bad) = columns.iter().find(|c| c.len() != nrows) {
            return Err(KernelError::RowMismatch {
                op: "from_columns",
                expected: nrows,
                found: bad.len(),
            });
        }
        Ok(Self::from_fn(nrows, columns.len(), |i, k| columns[k][i]))
    }

    /// Copy a `faer` matrix (column-major) into row-major storage.
    pub fn from_mat(mat: &Mat<T>) -> Self {
        Self::from_fn(mat.nrows(), mat.ncols(), |i, k| mat[(i, k)])
    }

    /// Copy into a `faer` matrix.
    pub fn to_mat(&self) -> Mat<T> {
        Mat::from_fn(self.nrows, self.ncols, |i, k| self[(i, k)])
    }

    pub fn column(&self, k: usize) -> Vec<T> {
        self.view().column_to_vec(k)
    }
}

impl<T> MultiVector<T> {
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn view(&self) -> MvRef<'_, T> {
        MvRef::dense(&self.data, self.nrows, self.ncols)
    }

    pub fn view_mut(&mut self) -> MvMut<'_, T> {
        MvMut::dense(&mut self.data, self.nrows, self.ncols)
    }
}

impl<T> Index<(usize, usize)> for MultiVector<T> {
    type Output = T;

    fn index(&self, (i, k): (usize, usize)) -> &T {
        assert!(i < self.nrows && k < self.ncols, "index ({i}, {k}) out of bounds");
        &self.data[i * self.ncols + k]
    }
}

impl<T> IndexMut<(usize, usize)> for MultiVector<T> {
    fn index_mut(&mut self, (i, k): (usize, usize)) -> &mut T {
        assert!(i < self.nrows && k < self.ncols, "index ({i}, {k}) out of bounds");
        &mut self.data[i * self.ncols + k]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_layout() {
        let mv = MultiVector::from_fn(2, 3, |i, k| (i * 3 + k) as f64);
        assert_eq!(mv.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(mv.view().row(1), &[3.0, 4.0, 5.0]);
        assert_eq!(mv.column(2), vec![2.0, 5.0]);
    }

    #[test]
    fn faer_roundtrip() {
        let mv = MultiVector::from_fn(4, 2, |i, k| (i as f64) - 2.0 * k as f64);
        let mat = mv.to_mat();
        assert_eq!(mat.nrows(), 4);
        assert_eq!(mat[(3, 1)], 1.0);
        assert_eq!(MultiVector::from_mat(&mat), mv);
    }

    #[test]
    fn overlap_classification() {
        let mut mv = MultiVector::<f64>::zeros(4, 4);
        let full = mv.view();
        assert_eq!(overlap(&full, &full), Overlap::Identical);
        assert_eq!(overlap(&full.cols(0..2), &full.cols(2..4)), Overlap::Disjoint);
        assert_eq!(overlap(&full.cols(0..3), &full.cols(2..4)), Overlap::Partial);
        assert_eq!(overlap(&full.rows(0..2), &full.rows(2..4)), Overlap::Disjoint);
        assert_eq!(overlap(&full.rows(0..3), &full.rows(1..4)), Overlap::Partial);

        let other = MultiVector::<f64>::zeros(4, 4);
        assert_eq!(overlap(&full, &other.view()), Overlap::Disjoint);

        let w = mv.view_mut();
        assert_eq!(w.ncols(), 4);
    }

    #[test]
    fn from_columns_checks_lengths() {
        let err = MultiVector::from_columns(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, KernelError::RowMismatch { .. }));
        let mv = MultiVector::from_columns(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(mv[(1, 0)], 2.0);
        assert_eq!(mv[(0, 1)], 3.0);
    }

    #[test]
    fn overflowing_shape_is_rejected() {
        let huge = (usize::MAX / 2) + 1;
        assert!(matches!(
            MultiVector::<f64>::from_row_major(huge, 2, Vec::new()),
            Err(KernelError::InvalidView(_))
        ));
        assert!(MultiVector::<f64>::from_row_major(0, usize::MAX, Vec::new()).is_ok());
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn zeros_with_overflowing_shape_panics() {
        let _ = MultiVector::<f64>::zeros((usize::MAX / 2) + 1, 2);
    }
}
