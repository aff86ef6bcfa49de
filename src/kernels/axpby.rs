//! Fused `r = s_a·a·x + s_b·b·y` kernels.
//!
//! [`AxpbyPlan`] fixes the signs and which coefficients are read; [`Aliasing`]
//! fixes where the row task reads `x` and `y`. When `r` is `x` the task reads
//! only `y` and folds it into `r` (`r += b·y` for `a == +1`), symmetrically for `y`,
//! and when `r` is both it reads `r` once per entry before writing it.

use super::{update_rows, zip_rows, zip_update_rows};
use crate::core::Scalar;
use crate::dispatch::{Aliasing, AxpbyPlan, ColumnCoeff, RowLoop};
use crate::multivector::{MvMut, MvRef};
use crate::parallel::ExecSpace;

#[allow(clippy::too_many_arguments)]
pub(crate) fn axpby<L, E, T, A, B>(
    exec: &E,
    n: usize,
    plan: AxpbyPlan,
    route: Aliasing,
    a: A,
    b: B,
    r: MvMut<'_, T>,
    x: MvRef<'_, T>,
    y: MvRef<'_, T>,
) where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
    A: ColumnCoeff<T>,
    B: ColumnCoeff<T>,
{
    use AxpbyPlan::*;
    match plan {
        XpY => routed::<L, _, _, _>(exec, n, route, r, x, y, |_, xv, yv| xv + yv),
        XmY => routed::<L, _, _, _>(exec, n, route, r, x, y, |_, xv, yv| xv - yv),
        NegXpY => routed::<L, _, _, _>(exec, n, route, r, x, y, |_, xv, yv| yv - xv),
        NegXmY => routed::<L, _, _, _>(exec, n, route, r, x, y, |_, xv, yv| -xv - yv),
        AXpY => routed::<L, _, _, _>(exec, n, route, r, x, y, |k, xv, yv| a.at(k) * xv + yv),
        AXmY => routed::<L, _, _, _>(exec, n, route, r, x, y, |k, xv, yv| a.at(k) * xv - yv),
        XpBY => routed::<L, _, _, _>(exec, n, route, r, x, y, |k, xv, yv| xv + b.at(k) * yv),
        NegXpBY => routed::<L, _, _, _>(exec, n, route, r, x, y, |k, xv, yv| b.at(k) * yv - xv),
        AXpBY => routed::<L, _, _, _>(exec, n, route, r, x, y, |k, xv, yv| a.at(k) * xv + b.at(k) * yv),
    }
}

/// Apply `f(k, x, y)` along the aliasing route; aliased sources are never read.
fn routed<L, E, T, F>(exec: &E, n: usize, route: Aliasing, r: MvMut<'_, T>, x: MvRef<'_, T>, y: MvRef<'_, T>, f: F)
where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
    F: Fn(usize, T, T) -> T + Sync + Send,
{
    match (route.contains(Aliasing::DEST_IS_X), route.contains(Aliasing::DEST_IS_Y)) {
        (false, false) => zip_rows::<L, _, _, _>(exec, n, r, x, y, f),
        (true, false) => zip_update_rows::<L, _, _, _>(exec, n, r, y, |k, rv, yv| f(k, rv, yv)),
        (false, true) => zip_update_rows::<L, _, _, _>(exec, n, r, x, |k, rv, xv| f(k, xv, rv)),
        (true, true) => update_rows::<L, _, _, _>(exec, n, r, |k, rv| f(k, rv, rv)),
    }
}
