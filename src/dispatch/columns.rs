//! Column-count policy.
//!
//! A call's column count `m` picks one of three loop shapes before the parallel
//! region starts:
//! - `m == 1`: single-vector path, no per-column loop,
//! - `1 < m <= unroll_limit`: per-column loop unrolled by [`UNROLL`], with the
//!   reduction accumulator held inline,
//! - `m > unroll_limit`: plain runtime loop.
//!
//! The shapes are zero-sized [`RowLoop`] types so each kernel is monomorphized per
//! shape and the choice costs one branch per call.

/// Manual unroll factor of the unrolled path.
pub const UNROLL: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnShape {
    Single,
    Unrolled(usize),
    Generic(usize),
}

impl ColumnShape {
    pub fn classify(ncols: usize, unroll_limit: usize) -> Self {
        match ncols {
            1 => ColumnShape::Single,
            m if m <= unroll_limit => ColumnShape::Unrolled(m),
            m => ColumnShape::Generic(m),
        }
    }

    pub fn ncols(self) -> usize {
        match self {
            ColumnShape::Single => 1,
            ColumnShape::Unrolled(m) | ColumnShape::Generic(m) => m,
        }
    }
}

/// Iteration strategy over the columns of one row.
pub trait RowLoop: Send + Sync + 'static {
    /// Call `f(k)` for every `k` in `[0, m)`, in increasing order.
    fn for_each<F: FnMut(usize)>(m: usize, f: F);
}

pub struct SingleLoop;
pub struct UnrolledLoop;
pub struct GenericLoop;

impl RowLoop for SingleLoop {
    #[inline(always)]
    fn for_each<F: FnMut(usize)>(m: usize, mut f: F) {
        debug_assert_eq!(m, 1);
        f(0);
    }
}

impl RowLoop for UnrolledLoop {
    #[inline(always)]
    fn for_each<F: FnMut(usize)>(m: usize, mut f: F) {
        let body = m - m % UNROLL;
        let mut k = 0;
        while k < body {
            f(k);
            f(k + 1);
            f(k + 2);
            f(k + 3);
            k += UNROLL;
        }
        while k < m {
            f(k);
            k += 1;
        }
    }
}

impl RowLoop for GenericLoop {
    #[inline(always)]
    fn for_each<F: FnMut(usize)>(m: usize, f: F) {
        (0..m).for_each(f);
    }
}

/// Bind the [`RowLoop`] type for `$shape` to `$L` and evaluate `$body`.
macro_rules! with_row_loop {
    ($shape:expr, $L:ident => $body:expr) => {
        match $shape {
            $crate::dispatch::ColumnShape::Single => {
                type $L = $crate::dispatch::SingleLoop;
                $body
            }
            $crate::dispatch::ColumnShape::Unrolled(_) => {
                type $L = $crate::dispatch::UnrolledLoop;
                $body
            }
            $crate::dispatch::ColumnShape::Generic(_) => {
                type $L = $crate::dispatch::GenericLoop;
                $body
            }
        }
    };
}
pub(crate) use with_row_loop;
