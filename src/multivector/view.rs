//! Strided row-major views over multivector storage.
//!
//! `MvRef` is a read-only view and `MvMut` a read-write view. Both are a pointer,
//! a shape and a row stride; column entries of one row are contiguous, so a row
//! task touches one contiguous run of memory. Views built from slices are checked
//! and borrow-tracked. Views built with `from_raw_parts` may share storage with
//! other views; the kernels classify such pairs with [`overlap`](super::overlap).

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, Range};
use std::ptr::NonNull;

use crate::error::{KernelError, Result};

/// Number of elements a `nrows x ncols` view with `row_stride` spans, or `None`
/// if that count does not fit in `usize`.
pub(crate) fn required_len(nrows: usize, ncols: usize, row_stride: usize) -> Option<usize> {
    if nrows == 0 || ncols == 0 {
        Some(0)
    } else {
        (nrows - 1).checked_mul(row_stride)?.checked_add(ncols)
    }
}

/// Rows of a view start at least `ncols` apart, so no two rows share an element.
pub(crate) fn check_row_stride(nrows: usize, ncols: usize, row_stride: usize) -> Result<()> {
    if row_stride < ncols && nrows > 1 {
        return Err(KernelError::InvalidView(format!(
            "row stride {row_stride} is smaller than the column count {ncols}"
        )));
    }
    Ok(())
}

fn check_layout(len: usize, nrows: usize, ncols: usize, row_stride: usize) -> Result<()> {
    check_row_stride(nrows, ncols, row_stride)?;
    let Some(needed) = required_len(nrows, ncols, row_stride) else {
        return Err(KernelError::InvalidView(format!(
            "{nrows}x{ncols} view with row stride {row_stride} spans more than usize::MAX elements"
        )));
    };
    if len < needed {
        return Err(KernelError::InvalidView(format!(
            "{nrows}x{ncols} view with row stride {row_stride} needs {needed} elements, slice has {len}"
        )));
    }
    Ok(())
}

/// Read-only multivector view.
pub struct MvRef<'a, T> {
    ptr: NonNull<T>,
    nrows: usize,
    ncols: usize,
    row_stride: usize,
    _marker: PhantomData<&'a T>,
}

/// Read-write multivector view.
pub struct MvMut<'a, T> {
    ptr: NonNull<T>,
    nrows: usize,
    ncols: usize,
    row_stride: usize,
    _marker: PhantomData<&'a mut T>,
}

// SAFETY: an `MvRef` only hands out shared access to `T`.
unsafe impl<T: Sync> Send for MvRef<'_, T> {}
unsafe impl<T: Sync> Sync for MvRef<'_, T> {}
// SAFETY: an `MvMut` behaves like `&mut [T]`.
unsafe impl<T: Send> Send for MvMut<'_, T> {}
unsafe impl<T: Sync> Sync for MvMut<'_, T> {}

impl<T> Clone for MvRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MvRef<'_, T> {}

impl<'a, T> MvRef<'a, T> {
    /// View `data` as a dense row-major `nrows x ncols` multivector.
    pub fn from_row_major(data: &'a [T], nrows: usize, ncols: usize) -> Result<Self> {
        Self::from_slice_with_stride(data, nrows, ncols, ncols)
    }

    /// View `data` as a row-major multivector whose rows start `row_stride` apart.
    pub fn from_slice_with_stride(
        data: &'a [T],
        nrows: usize,
        ncols: usize,
        row_stride: usize,
    ) -> Result<Self> {
        check_layout(data.len(), nrows, ncols, row_stride)?;
        Ok(Self {
            ptr: NonNull::from(data).cast::<T>(),
            nrows,
            ncols,
            row_stride,
            _marker: PhantomData,
        })
    }

    /// Dense view whose length the caller already guarantees.
    pub(crate) fn dense(data: &'a [T], nrows: usize, ncols: usize) -> Self {
        debug_assert_eq!(data.len(), nrows * ncols);
        Self {
            ptr: NonNull::from(data).cast::<T>(),
            nrows,
            ncols,
            row_stride: ncols,
            _marker: PhantomData,
        }
    }

    /// View a contiguous slice as a single column.
    pub fn from_column(data: &'a [T]) -> Self {
        Self {
            ptr: NonNull::from(data).cast::<T>(),
            nrows: data.len(),
            ncols: 1,
            row_stride: 1,
            _marker: PhantomData,
        }
    }

    /// Build a view over externally owned storage.
    ///
    /// # Safety
    /// `ptr` must be non-null and valid for reads of every element the view spans
    /// for `'a`. The storage must not be written during `'a` except by an mvkernels
    /// call that receives this view as a source, which checks the pair for overlap.
    pub unsafe fn from_raw_parts(
        ptr: *const T,
        nrows: usize,
        ncols: usize,
        row_stride: usize,
    ) -> Self {
        Self {
            // SAFETY: non-null per the caller contract.
            ptr: unsafe { NonNull::new_unchecked(ptr as *mut T) },
            nrows,
            ncols,
            row_stride,
            _marker: PhantomData,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Row `i` as a contiguous slice of `ncols` entries.
    #[inline]
    pub fn row(&self, i: usize) -> &'a [T] {
        assert!(i < self.nrows, "row {i} out of bounds for {} rows", self.nrows);
        // SAFETY: `i` is in bounds and the view spans `ncols` entries from each row start.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr().add(i * self.row_stride), self.ncols) }
    }

    /// Sub-view over the rows in `range`.
    pub fn rows(self, range: Range<usize>) -> Self {
        assert!(
            range.start <= range.end && range.end <= self.nrows,
            "row range {range:?} out of bounds for {} rows",
            self.nrows
        );
        Self {
            // SAFETY: the offset stays within the spanned storage.
            ptr: unsafe { self.ptr.add(range.start * self.row_stride) },
            nrows: range.end - range.start,
            ..self
        }
    }

    /// Sub-view over the columns in `range`.
    pub fn cols(self, range: Range<usize>) -> Self {
        assert!(
            range.start <= range.end && range.end <= self.ncols,
            "column range {range:?} out of bounds for {} columns",
            self.ncols
        );
        Self {
            // SAFETY: the offset stays within the first row.
            ptr: unsafe { self.ptr.add(range.start) },
            ncols: range.end - range.start,
            ..self
        }
    }

    /// Single-column sub-view.
    pub fn col(self, k: usize) -> Self {
        self.cols(k..k + 1)
    }
}

impl<T: Copy> MvRef<'_, T> {
    #[inline]
    pub fn get(&self, i: usize, k: usize) -> T {
        self.row(i)[k]
    }

    /// Column `k` copied into a `Vec`.
    pub fn column_to_vec(&self, k: usize) -> Vec<T> {
        (0..self.nrows).map(|i| self.get(i, k)).collect()
    }
}

impl<T> Index<(usize, usize)> for MvRef<'_, T> {
    type Output = T;

    fn index(&self, (i, k): (usize, usize)) -> &T {
        &self.row(i)[k]
    }
}

impl<T: fmt::Debug> fmt::Debug for MvRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<&[T]> = (0..self.nrows).map(|i| self.row(i)).collect();
        f.debug_struct("MvRef")
            .field("nrows", &self.nrows)
            .field("ncols", &self.ncols)
            .field("rows", &rows)
            .finish()
    }
}

impl<'a, T> MvMut<'a, T> {
    /// View `data` as a dense row-major `nrows x ncols` multivector.
    pub fn from_row_major(data: &'a mut [T], nrows: usize, ncols: usize) -> Result<Self> {
        Self::from_slice_with_stride(data, nrows, ncols, ncols)
    }

    /// View `data` as a row-major multivector whose rows start `row_stride` apart.
    pub fn from_slice_with_stride(
        data: &'a mut [T],
        nrows: usize,
        ncols: usize,
        row_stride: usize,
    ) -> Result<Self> {
        check_layout(data.len(), nrows, ncols, row_stride)?;
        Ok(Self {
            ptr: NonNull::from(data).cast::<T>(),
            nrows,
            ncols,
            row_stride,
            _marker: PhantomData,
        })
    }

    /// Dense view whose length the caller already guarantees.
    pub(crate) fn dense(data: &'a mut [T], nrows: usize, ncols: usize) -> Self {
        debug_assert_eq!(data.len(), nrows * ncols);
        Self {
            ptr: NonNull::from(data).cast::<T>(),
            nrows,
            ncols,
            row_stride: ncols,
            _marker: PhantomData,
        }
    }

    /// View a contiguous slice as a single column.
    pub fn from_column(data: &'a mut [T]) -> Self {
        let nrows = data.len();
        Self {
            ptr: NonNull::from(data).cast::<T>(),
            nrows,
            ncols: 1,
            row_stride: 1,
            _marker: PhantomData,
        }
    }

    /// Build a writable view over externally owned storage.
    ///
    /// # Safety
    /// `ptr` must be non-null and valid for reads and writes of every element the
    /// view spans for `'a`. No other access to that storage may happen during
    /// `'a`, except through read-only views handed to the same mvkernels call as
    /// sources; those calls detect identical storage and reject partial overlap.
    ///
    /// Rows must not overlap: `row_stride >= ncols` whenever `nrows > 1`. Every
    /// mvkernels call that writes through a view rejects one that breaks this with
    /// [`KernelError::InvalidView`] before touching it.
    pub unsafe fn from_raw_parts(
        ptr: *mut T,
        nrows: usize,
        ncols: usize,
        row_stride: usize,
    ) -> Self {
        Self {
            // SAFETY: non-null per the caller contract.
            ptr: unsafe { NonNull::new_unchecked(ptr) },
            nrows,
            ncols,
            row_stride,
            _marker: PhantomData,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Read-only view of the same storage.
    pub fn rb(&self) -> MvRef<'_, T> {
        MvRef {
            ptr: self.ptr,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
            _marker: PhantomData,
        }
    }

    /// Reborrow as a shorter-lived writable view.
    pub fn rb_mut(&mut self) -> MvMut<'_, T> {
        MvMut {
            ptr: self.ptr,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
            _marker: PhantomData,
        }
    }

    /// Convert into a read-only view with the full lifetime.
    pub fn into_const(self) -> MvRef<'a, T> {
        MvRef {
            ptr: self.ptr,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        self.rb().row(i)
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [T] {
        assert!(i < self.nrows, "row {i} out of bounds for {} rows", self.nrows);
        // SAFETY: in bounds, and `&mut self` makes the access exclusive.
        unsafe { self.rows_ptr().row_mut(i) }
    }

    /// Sub-view over the rows in `range`.
    pub fn rows(self, range: Range<usize>) -> Self {
        assert!(
            range.start <= range.end && range.end <= self.nrows,
            "row range {range:?} out of bounds for {} rows",
            self.nrows
        );
        Self {
            // SAFETY: the offset stays within the spanned storage.
            ptr: unsafe { self.ptr.add(range.start * self.row_stride) },
            nrows: range.end - range.start,
            ..self
        }
    }

    /// Sub-view over the columns in `range`.
    pub fn cols(self, range: Range<usize>) -> Self {
        assert!(
            range.start <= range.end && range.end <= self.ncols,
            "column range {range:?} out of bounds for {} columns",
            self.ncols
        );
        Self {
            // SAFETY: the offset stays within the first row.
            ptr: unsafe { self.ptr.add(range.start) },
            ncols: range.end - range.start,
            ..self
        }
    }

    /// Row handle shared by the tasks of one parallel loop.
    pub(crate) fn rows_ptr(&mut self) -> RowsMut<T> {
        RowsMut {
            ptr: self.ptr,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
        }
    }
}

impl<T: Copy> MvMut<'_, T> {
    #[inline]
    pub fn get(&self, i: usize, k: usize) -> T {
        self.row(i)[k]
    }

    #[inline]
    pub fn set(&mut self, i: usize, k: usize, value: T) {
        self.row_mut(i)[k] = value;
    }

    pub fn fill(&mut self, value: T) {
        for i in 0..self.nrows {
            self.row_mut(i).fill(value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for MvMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.rb(), f)
    }
}

/// Raw row access for parallel loops: each task takes a distinct row.
pub(crate) struct RowsMut<T> {
    ptr: NonNull<T>,
    nrows: usize,
    ncols: usize,
    row_stride: usize,
}

// SAFETY: tasks only ever touch disjoint rows (see `row_mut`).
unsafe impl<T: Send> Send for RowsMut<T> {}
unsafe impl<T: Send> Sync for RowsMut<T> {}

impl<T> RowsMut<T> {
    /// Mutable slice over row `i`.
    ///
    /// # Safety
    /// `i < nrows`, and no other live reference may cover row `i`. The view this
    /// came from passed [`check_row_stride`], so distinct rows never overlap.
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn row_mut<'r>(&self, i: usize) -> &'r mut [T] {
        debug_assert!(i < self.nrows);
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr().add(i * self.row_stride), self.ncols) }
    }
}
