//! Fused diagonal-scale-accumulate: `C(i,k) = c·C(i,k) + ab·A(i)·B(i,k)`.
//!
//! `A` is one column broadcast over the columns of `B`; each row task forms
//! `ab·A(i)` once and reuses it for all columns.

use super::for_each_row;
use crate::core::Scalar;
use crate::dispatch::{Aliasing, RowLoop};
use crate::multivector::{MvMut, MvRef};
use crate::parallel::ExecSpace;

/// `route` uses `DEST_IS_X` for `C == A` and `DEST_IS_Y` for `C == B`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn elementwise_multiply<L, E, T>(
    exec: &E,
    n: usize,
    route: Aliasing,
    c: T,
    cm: MvMut<'_, T>,
    ab: T,
    a: MvRef<'_, T>,
    b: MvRef<'_, T>,
) where
    L: RowLoop,
    E: ExecSpace,
    T: Scalar,
{
    match (route.contains(Aliasing::DEST_IS_X), route.contains(Aliasing::DEST_IS_Y)) {
        (false, false) => for_each_row(exec, n, cm, |i, dst| {
            let s = ab * a.row(i)[0];
            let br = b.row(i);
            L::for_each(dst.len(), |k| dst[k] = c * dst[k] + s * br[k]);
        }),
        (false, true) => for_each_row(exec, n, cm, |i, dst| {
            let s = ab * a.row(i)[0];
            L::for_each(dst.len(), |k| dst[k] = c * dst[k] + s * dst[k]);
        }),
        // `C == A` forces a single column.
        (true, false) => for_each_row(exec, n, cm, |i, dst| {
            let s = ab * dst[0];
            let br = b.row(i);
            L::for_each(dst.len(), |k| dst[k] = c * dst[k] + s * br[k]);
        }),
        (true, true) => for_each_row(exec, n, cm, |_, dst| {
            let s = ab * dst[0];
            L::for_each(dst.len(), |k| dst[k] = c * dst[k] + s * dst[k]);
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{GenericLoop, SingleLoop};
    use crate::multivector::MultiVector;
    use crate::parallel::SerialExec;

    #[test]
    fn broadcast_diagonal() {
        let a = MultiVector::from_row_major(2, 1, vec![2.0, 3.0]).unwrap();
        let b = MultiVector::from_fn(2, 3, |_, k| (k + 1) as f64);
        let mut cm = MultiVector::from_fn(2, 3, |_, _| 1.0);
        elementwise_multiply::<GenericLoop, _, _>(
            &SerialExec,
            2,
            Aliasing::empty(),
            0.5,
            cm.view_mut(),
            2.0,
            a.view(),
            b.view(),
        );
        // 0.5 + 2*2*{1,2,3} and 0.5 + 2*3*{1,2,3}
        assert_eq!(cm.view().row(0), &[4.5, 8.5, 12.5]);
        assert_eq!(cm.view().row(1), &[6.5, 12.5, 18.5]);
    }

    #[test]
    fn destination_is_b() {
        let a = MultiVector::from_row_major(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
        let mut cm = MultiVector::from_row_major(3, 1, vec![1.0, 1.0, 1.0]).unwrap();
        let unused = MultiVector::<f64>::zeros(3, 1);
        elementwise_multiply::<SingleLoop, _, _>(
            &SerialExec,
            3,
            Aliasing::DEST_IS_Y,
            1.0,
            cm.view_mut(),
            1.0,
            a.view(),
            unused.view(),
        );
        assert_eq!(cm.as_slice(), &[2.0, 3.0, 4.0]);
    }
}
