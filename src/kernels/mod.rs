//! Kernel bodies.
//!
//! Kernels are infallible: shapes, coefficient plans and aliasing routes are
//! settled by [`crate::ops`] before any of these run. Every kernel is generic over
//! a [`RowLoop`] so the per-column loop is fixed at compile time.
//!
//! The row helpers below hold the only mutable row access of the crate. Each row
//! task gets the destination row as `&mut [T]` and reads sources row by row.

pub(crate) mod axpby;
pub(crate) mod elementwise;
pub(crate) mod reductions;
pub(crate) mod unary;

use crate::core::Scalar;
use crate::dispatch::RowLoop;
use crate::multivector::{MvMut, MvRef};
use crate::parallel::ExecSpace;

/// Where a unary kernel reads its input.
#[derive(Clone, Copy)]
pub(crate) enum Source<'a, T> {
    /// A view not overlapping the destination.
    View(MvRef<'a, T>),
    /// The destination itself.
    Dest,
}

/// Run `body(i, row_i)` for every destination row `i < n`.
pub(crate) fn for_each_row<E, T, F>(exec: &E, n: usize, mut r: MvMut<'_, T>, body: F)
where
    E: ExecSpace,
    T: Scalar,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    debug_assert!(n <= r.nrows());
    let rows = r.rows_ptr();
    exec.parallel_for(n, |i| {
        // SAFETY: `i < n <= nrows` and `parallel_for` hands each index to one task.
        let dst = unsafe { rows.row_mut(i) };
        body(i, dst);
    });
}

/// `r(i,k) = f(k, x(i,k))`
pub(crate) fn map_rows<L, E, T, F>(exec: &E, n: usize, r: MvMut<'_, T>, x: MvRef<'_, T>, f: F)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
    F: Fn(usize, T) -> T + Sync + Send,
{
    for_each_row(exec, n, r, |i, dst| {
        let src = x.row(i);
        L::for_each(dst.len(), |k| dst[k] = f(k, src[k]));
    });
}

/// `r(i,k) = f(k, r(i,k))`
pub(crate) fn update_rows<L, E, T, F>(exec: &E, n: usize, r: MvMut<'_, T>, f: F)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
    F: Fn(usize, T) -> T + Sync + Send,
{
    for_each_row(exec, n, r, |_, dst| {
        L::for_each(dst.len(), |k| dst[k] = f(k, dst[k]));
    });
}

/// `r(i,k) = f(k, x(i,k), y(i,k))`
pub(crate) fn zip_rows<L, E, T, F>(
    exec: &E,
    n: usize,
    r: MvMut<'_, T>,
    x: MvRef<'_, T>,
    y: MvRef<'_, T>,
    f: F,
) where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
    F: Fn(usize, T, T) -> T + Sync + Send,
{
    for_each_row(exec, n, r, |i, dst| {
        let (xr, yr) = (x.row(i), y.row(i));
        L::for_each(dst.len(), |k| dst[k] = f(k, xr[k], yr[k]));
    });
}

/// `r(i,k) = f(k, r(i,k), s(i,k))`
pub(crate) fn zip_update_rows<L, E, T, F>(exec: &E, n: usize, r: MvMut<'_, T>, s: MvRef<'_, T>, f: F)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
    F: Fn(usize, T, T) -> T + Sync + Send,
{
    for_each_row(exec, n, r, |i, dst| {
        let sr = s.row(i);
        L::for_each(dst.len(), |k| dst[k] = f(k, dst[k], sr[k]));
    });
}

/// [`map_rows`] from a separate view, [`update_rows`] when reading the destination.
pub(crate) fn map_or_update<L, E, T, F>(exec: &E, n: usize, r: MvMut<'_, T>, src: Source<'_, T>, f: F)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
    F: Fn(usize, T) -> T + Sync + Send,
{
    match src {
        Source::View(x) => map_rows::<L, _, _, _>(exec, n, r, x, f),
        Source::Dest => update_rows::<L, _, _, _>(exec, n, r, f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{GenericLoop, UnrolledLoop};
    use crate::multivector::MultiVector;
    use crate::parallel::SerialExec;

    #[test]
    fn helpers_respect_row_prefix() {
        let x = MultiVector::from_fn(4, 3, |i, k| (i * 3 + k) as f64);
        let mut r = MultiVector::<f64>::zeros(4, 3);
        map_rows::<UnrolledLoop, _, _, _>(&SerialExec, 2, r.view_mut(), x.view(), |_, v| v + 1.0);
        assert_eq!(r.view().row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(r.view().row(2), &[0.0, 0.0, 0.0]);

        update_rows::<GenericLoop, _, _, _>(&SerialExec, 4, r.view_mut(), |k, v| v + k as f64);
        assert_eq!(r.view().row(3), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn zip_variants_agree() {
        let x = MultiVector::from_fn(3, 2, |i, k| (i + k) as f64);
        let y = MultiVector::from_fn(3, 2, |i, k| (i * k) as f64 + 0.5);
        let mut fresh = MultiVector::<f64>::zeros(3, 2);
        zip_rows::<UnrolledLoop, _, _, _>(&SerialExec, 3, fresh.view_mut(), x.view(), y.view(), |_, a, b| a - b);

        let mut inplace = x.clone();
        zip_update_rows::<UnrolledLoop, _, _, _>(&SerialExec, 3, inplace.view_mut(), y.view(), |_, a, b| a - b);
        assert_eq!(fresh, inplace);
    }
}
