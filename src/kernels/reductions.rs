//! Per-column reductions and the square-root pass of the 2-norm.
//!
//! Every reducer runs through [`run_reduction`]; they differ only in their
//! accumulate rule and, for the infinity norm, a max join. All identities are zero.

use std::marker::PhantomData;

use super::update_rows;
use crate::core::{RealScalar, Scalar};
use crate::dispatch::{RowLoop, SingleLoop};
use crate::multivector::{MvMut, MvRef};
use crate::parallel::ExecSpace;
use crate::reduce::{run_reduction, Reducer};

type LoopMarker<L> = PhantomData<fn() -> L>;

#[inline(always)]
fn join_sum<V: Scalar>(dst: &mut [V], src: &[V]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = *d + *s;
    }
}

struct Dot<'a, L, T> {
    x: MvRef<'a, T>,
    y: MvRef<'a, T>,
    _loop: LoopMarker<L>,
}

impl<L: RowLoop, T: Scalar> Reducer for Dot<'_, L, T> {
    type Value = T;

    fn width(&self) -> usize {
        self.x.ncols()
    }

    #[inline]
    fn accumulate(&self, i: usize, acc: &mut [T]) {
        let (xr, yr) = (self.x.row(i), self.y.row(i));
        L::for_each(acc.len(), |k| acc[k] = acc[k] + T::inner(xr[k], yr[k]));
    }

    fn join(&self, dst: &mut [T], src: &[T]) {
        join_sum(dst, src);
    }
}

struct Sum<'a, L, T> {
    x: MvRef<'a, T>,
    _loop: LoopMarker<L>,
}

impl<L: RowLoop, T: Scalar> Reducer for Sum<'_, L, T> {
    type Value = T;

    fn width(&self) -> usize {
        self.x.ncols()
    }

    #[inline]
    fn accumulate(&self, i: usize, acc: &mut [T]) {
        let xr = self.x.row(i);
        L::for_each(acc.len(), |k| acc[k] = acc[k] + xr[k]);
    }

    fn join(&self, dst: &mut [T], src: &[T]) {
        join_sum(dst, src);
    }
}

struct Norm1<'a, L, T> {
    x: MvRef<'a, T>,
    _loop: LoopMarker<L>,
}

impl<L: RowLoop, T: Scalar> Reducer for Norm1<'_, L, T> {
    type Value = T::Mag;

    fn width(&self) -> usize {
        self.x.ncols()
    }

    #[inline]
    fn accumulate(&self, i: usize, acc: &mut [T::Mag]) {
        let xr = self.x.row(i);
        L::for_each(acc.len(), |k| acc[k] = acc[k] + xr[k].abs());
    }

    fn join(&self, dst: &mut [T::Mag], src: &[T::Mag]) {
        join_sum(dst, src);
    }
}

/// Identity zero: every candidate is already an absolute value.
struct NormInf<'a, L, T> {
    x: MvRef<'a, T>,
    _loop: LoopMarker<L>,
}

impl<L: RowLoop, T: Scalar> Reducer for NormInf<'_, L, T> {
    type Value = T::Mag;

    fn width(&self) -> usize {
        self.x.ncols()
    }

    #[inline]
    fn accumulate(&self, i: usize, acc: &mut [T::Mag]) {
        let xr = self.x.row(i);
        L::for_each(acc.len(), |k| acc[k] = <T::Mag as RealScalar>::max_of(acc[k], xr[k].abs()));
    }

    fn join(&self, dst: &mut [T::Mag], src: &[T::Mag]) {
        for (d, s) in dst.iter_mut().zip(src) {
            *d = <T::Mag as RealScalar>::max_of(*d, *s);
        }
    }
}

struct Norm2Squared<'a, L, T> {
    x: MvRef<'a, T>,
    _loop: LoopMarker<L>,
}

impl<L: RowLoop, T: Scalar> Reducer for Norm2Squared<'_, L, T> {
    type Value = T::Mag;

    fn width(&self) -> usize {
        self.x.ncols()
    }

    #[inline]
    fn accumulate(&self, i: usize, acc: &mut [T::Mag]) {
        let xr = self.x.row(i);
        L::for_each(acc.len(), |k| {
            let a = xr[k].abs();
            acc[k] = acc[k] + a * a;
        });
    }

    fn join(&self, dst: &mut [T::Mag], src: &[T::Mag]) {
        join_sum(dst, src);
    }
}

/// `Σ_i x(i,k)²/w(i)²` with one weight column for all of `x`.
struct WeightedDotShared<'a, L, T> {
    x: MvRef<'a, T>,
    w: MvRef<'a, T>,
    _loop: LoopMarker<L>,
}

impl<L: RowLoop, T: Scalar> Reducer for WeightedDotShared<'_, L, T> {
    type Value = T;

    fn width(&self) -> usize {
        self.x.ncols()
    }

    #[inline]
    fn accumulate(&self, i: usize, acc: &mut [T]) {
        let xr = self.x.row(i);
        let wi = self.w.row(i)[0];
        let ww = wi * wi;
        L::for_each(acc.len(), |k| acc[k] = acc[k] + xr[k] * xr[k] / ww);
    }

    fn join(&self, dst: &mut [T], src: &[T]) {
        join_sum(dst, src);
    }
}

/// `Σ_i x(i,k)²/w(i,k)²`
struct WeightedDotPerColumn<'a, L, T> {
    x: MvRef<'a, T>,
    w: MvRef<'a, T>,
    _loop: LoopMarker<L>,
}

impl<L: RowLoop, T: Scalar> Reducer for WeightedDotPerColumn<'_, L, T> {
    type Value = T;

    fn width(&self) -> usize {
        self.x.ncols()
    }

    #[inline]
    fn accumulate(&self, i: usize, acc: &mut [T]) {
        let (xr, wr) = (self.x.row(i), self.w.row(i));
        L::for_each(acc.len(), |k| acc[k] = acc[k] + xr[k] * xr[k] / (wr[k] * wr[k]));
    }

    fn join(&self, dst: &mut [T], src: &[T]) {
        join_sum(dst, src);
    }
}

pub(crate) fn dot<L, E, T>(exec: &E, n: usize, out: &mut [T], x: MvRef<'_, T>, y: MvRef<'_, T>)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
{
    run_reduction(exec, n, &Dot::<L, T> { x, y, _loop: PhantomData }, out);
}

pub(crate) fn sum<L, E, T>(exec: &E, n: usize, out: &mut [T], x: MvRef<'_, T>)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
{
    run_reduction(exec, n, &Sum::<L, T> { x, _loop: PhantomData }, out);
}

pub(crate) fn norm1<L, E, T>(exec: &E, n: usize, out: &mut [T::Mag], x: MvRef<'_, T>)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
{
    run_reduction(exec, n, &Norm1::<L, T> { x, _loop: PhantomData }, out);
}

pub(crate) fn norm_inf<L, E, T>(exec: &E, n: usize, out: &mut [T::Mag], x: MvRef<'_, T>)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
{
    run_reduction(exec, n, &NormInf::<L, T> { x, _loop: PhantomData }, out);
}

pub(crate) fn norm2_squared<L, E, T>(exec: &E, n: usize, out: &mut [T::Mag], x: MvRef<'_, T>)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
{
    run_reduction(exec, n, &Norm2Squared::<L, T> { x, _loop: PhantomData }, out);
}

pub(crate) fn weighted_dot_shared<L, E, T>(exec: &E, n: usize, out: &mut [T], x: MvRef<'_, T>, w: MvRef<'_, T>)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
{
    run_reduction(exec, n, &WeightedDotShared::<L, T> { x, w, _loop: PhantomData }, out);
}

pub(crate) fn weighted_dot_per_column<L, E, T>(exec: &E, n: usize, out: &mut [T], x: MvRef<'_, T>, w: MvRef<'_, T>)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
{
    run_reduction(exec, n, &WeightedDotPerColumn::<L, T> { x, w, _loop: PhantomData }, out);
}

/// Single pass `v = sqrt(v)` over a finished reduction result.
pub(crate) fn sqrt_in_place<E, S>(exec: &E, values: &mut [S])
where
    E: ExecSpace,
    S: Scalar,
{
    let n = values.len();
    update_rows::<SingleLoop, _, _, _>(exec, n, MvMut::from_column(values), |_, v| v.sqrt());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{GenericLoop, UnrolledLoop};
    use crate::multivector::MultiVector;
    use crate::parallel::SerialExec;
    use approx::assert_abs_diff_eq;
    use num_complex::Complex;

    #[test]
    fn column_reductions() {
        // columns: [1, -2, 3] and [-4, 5, -6]
        let x = MultiVector::from_columns(&[vec![1.0, -2.0, 3.0], vec![-4.0, 5.0, -6.0]]).unwrap();
        let mut out = [0.0; 2];

        sum::<UnrolledLoop, _, _>(&SerialExec, 3, &mut out, x.view());
        assert_eq!(out, [2.0, -5.0]);
        norm1::<UnrolledLoop, _, _>(&SerialExec, 3, &mut out, x.view());
        assert_eq!(out, [6.0, 15.0]);
        norm_inf::<UnrolledLoop, _, _>(&SerialExec, 3, &mut out, x.view());
        assert_eq!(out, [3.0, 6.0]);
        norm2_squared::<GenericLoop, _, _>(&SerialExec, 3, &mut out, x.view());
        assert_eq!(out, [14.0, 77.0]);
        sqrt_in_place(&SerialExec, &mut out);
        assert_abs_diff_eq!(out[0], 14.0_f64.sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn weighted_dot_broadcast_equals_repeated_weights() {
        let x = MultiVector::from_fn(4, 3, |i, k| (i + 2 * k) as f64 + 1.0);
        let w1 = MultiVector::from_fn(4, 1, |i, _| 0.5 + i as f64);
        let wm = MultiVector::from_fn(4, 3, |i, _| 0.5 + i as f64);
        let mut shared = [0.0; 3];
        let mut per_col = [0.0; 3];
        weighted_dot_shared::<UnrolledLoop, _, _>(&SerialExec, 4, &mut shared, x.view(), w1.view());
        weighted_dot_per_column::<UnrolledLoop, _, _>(&SerialExec, 4, &mut per_col, x.view(), wm.view());
        for k in 0..3 {
            assert_abs_diff_eq!(shared[k], per_col[k], epsilon = 1e-12);
        }
        // column 0: 1/0.25 + 4/2.25 + 9/6.25 + 16/12.25
        assert_abs_diff_eq!(shared[0], 4.0 + 4.0 / 2.25 + 9.0 / 6.25 + 16.0 / 12.25, epsilon = 1e-12);
    }

    #[test]
    fn complex_dot_conjugates() {
        let x = MultiVector::from_row_major(2, 1, vec![Complex::new(0.0, 1.0), Complex::new(1.0, 1.0)]).unwrap();
        let mut out = [Complex::new(0.0, 0.0)];
        dot::<SingleLoop, _, _>(&SerialExec, 2, &mut out, x.view(), x.view());
        assert_eq!(out[0], Complex::new(3.0, 0.0));

        let mut mag = [0.0];
        norm2_squared::<SingleLoop, _, _>(&SerialExec, 2, &mut mag, x.view());
        assert_abs_diff_eq!(mag[0], 3.0, epsilon = 1e-12);
    }
}
