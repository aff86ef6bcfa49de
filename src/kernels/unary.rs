//! Unary kernels: scale, reciprocal, abs.

use super::{map_or_update, Source};
use crate::core::Scalar;
use crate::dispatch::{ColumnCoeff, RowLoop, Sign};
use crate::multivector::MvMut;
use crate::parallel::ExecSpace;

/// `r(i,k) = a(k)·src(i,k)`; `±1` coefficients skip the multiply.
pub(crate) fn scale<L, E, T, A>(exec: &E, n: usize, sign: Sign, a: A, r: MvMut<'_, T>, src: Source<'_, T>)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
    A: ColumnCoeff<T>,
{
    match (sign, src) {
        (Sign::PlusOne, Source::Dest) => {}
        (Sign::PlusOne, _) => map_or_update::<L, _, _, _>(exec, n, r, src, |_, v| v),
        (Sign::MinusOne, _) => map_or_update::<L, _, _, _>(exec, n, r, src, |_, v| -v),
        (Sign::Generic, _) => map_or_update::<L, _, _, _>(exec, n, r, src, |k, v| a.at(k) * v),
    }
}

/// `r(i,k) = 1/src(i,k)`
pub(crate) fn reciprocal<L, E, T>(exec: &E, n: usize, r: MvMut<'_, T>, src: Source<'_, T>)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
{
    map_or_update::<L, _, _, _>(exec, n, r, src, |_, v| T::one() / v);
}

/// `r(i,k) = |src(i,k)|`
pub(crate) fn abs<L, E, T>(exec: &E, n: usize, r: MvMut<'_, T>, src: Source<'_, T>)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
{
    map_or_update::<L, _, _, _>(exec, n, r, src, |_, v| T::from_mag(v.abs()));
}
