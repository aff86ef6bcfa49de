//! Write kernels on a rayon space forced to split every call into many row tasks.
//!
//! Element-wise results do not depend on how rows are split, so each call is
//! compared exactly against the serial space.
#![cfg(feature = "rayon")]

use mvkernels::{Coeff, KernelOptions, MultiVector, MvMut, MvOps, MvRef, RayonExec, SerialExec, UniverseExec};
use rand::Rng;

const ROWS: usize = 10_000;

fn spaces() -> (MvOps<UniverseExec>, MvOps<SerialExec>) {
    let opts = KernelOptions::default().with_serial_cutoff(0).with_min_rows_per_task(7);
    (MvOps::new(opts.clone()), MvOps::with_exec(SerialExec, opts))
}

fn random_mv(n: usize, m: usize) -> MultiVector<f64> {
    let mut rng = rand::thread_rng();
    MultiVector::from_fn(n, m, |_, _| rng.gen_range(-3.0..3.0))
}

#[test]
fn split_unary_kernels_match_serial() {
    let (par, ser) = spaces();
    for m in [1, 4, 17] {
        let x = random_mv(ROWS, m);
        let a: Vec<f64> = (0..m).map(|k| 1.5 - k as f64).collect();
        let (mut rp, mut rs) = (MultiVector::zeros(ROWS, m), MultiVector::zeros(ROWS, m));

        par.scale(rp.view_mut(), Coeff::Vector(&a), x.view(), None).unwrap();
        ser.scale(rs.view_mut(), Coeff::Vector(&a), x.view(), None).unwrap();
        assert_eq!(rp, rs);

        par.scale_in_place(rp.view_mut(), Coeff::Scalar(-1.0), None).unwrap();
        ser.scale_in_place(rs.view_mut(), Coeff::Scalar(-1.0), None).unwrap();
        assert_eq!(rp, rs);

        par.reciprocal(rp.view_mut(), x.view(), Some(ROWS - 3)).unwrap();
        ser.reciprocal(rs.view_mut(), x.view(), Some(ROWS - 3)).unwrap();
        assert_eq!(rp, rs);

        par.abs_in_place(rp.view_mut(), None).unwrap();
        ser.abs_in_place(rs.view_mut(), None).unwrap();
        assert_eq!(rp, rs);
        assert!(rp.as_slice().iter().all(|v| *v >= 0.0));
    }
}

#[test]
fn split_axpby_plans_match_serial() {
    let (par, ser) = spaces();
    for m in [1, 4, 17] {
        let x = random_mv(ROWS, m);
        let y = random_mv(ROWS, m);
        let b: Vec<f64> = (0..m).map(|k| 0.25 * k as f64 - 1.0).collect();
        for (a, b) in [
            (Coeff::Scalar(1.0), Coeff::Scalar(1.0)),
            (Coeff::Scalar(-1.0), Coeff::Scalar(1.0)),
            (Coeff::Scalar(2.0), Coeff::Scalar(-1.0)),
            (Coeff::Scalar(0.5), Coeff::Vector(&b)),
        ] {
            let (mut rp, mut rs) = (MultiVector::zeros(ROWS, m), MultiVector::zeros(ROWS, m));
            par.axpby(rp.view_mut(), a, x.view(), b, y.view(), None).unwrap();
            ser.axpby(rs.view_mut(), a, x.view(), b, y.view(), None).unwrap();
            assert_eq!(rp, rs);
        }
    }
}

/// In-place routes through raw views sharing the destination's storage.
#[test]
fn split_aliased_routes_match_serial() {
    let (par, ser) = spaces();
    let m = 5;
    let x = random_mv(ROWS, m);
    let y = random_mv(ROWS, m);
    let diag = random_mv(ROWS, 1);

    let (mut dp, mut ds) = (x.clone().into_vec(), x.clone().into_vec());
    for (ops, data) in [(&par as &dyn AliasedCalls, &mut dp), (&ser as &dyn AliasedCalls, &mut ds)] {
        let p = data.as_mut_ptr();
        // SAFETY: both views span exactly `data`, which nothing else touches.
        let (r, xv) = unsafe { (MvMut::from_raw_parts(p, ROWS, m, m), MvRef::from_raw_parts(p.cast_const(), ROWS, m, m)) };
        ops.axpby(r, Coeff::Scalar(3.0), xv, Coeff::Scalar(-2.0), y.view());
        // SAFETY: as above.
        let (r, v) = unsafe { (MvMut::from_raw_parts(p, ROWS, m, m), MvRef::from_raw_parts(p.cast_const(), ROWS, m, m)) };
        ops.axpby(r, Coeff::Scalar(0.5), v, Coeff::Scalar(1.0), v);
        // SAFETY: as above.
        let (c, bv) = unsafe { (MvMut::from_raw_parts(p, ROWS, m, m), MvRef::from_raw_parts(p.cast_const(), ROWS, m, m)) };
        ops.elementwise_multiply(c, diag.view(), bv);
    }
    assert_eq!(dp, ds);

    let want = MultiVector::from_fn(ROWS, m, |i, k| {
        let v = 3.0 * x[(i, k)] - 2.0 * y[(i, k)];
        let v = 0.5 * v + v;
        2.0 * v - diag[(i, 0)] * v
    });
    assert_eq!(dp, want.into_vec());
}

/// One call shape for both execution spaces in the aliased test.
trait AliasedCalls {
    fn axpby(&self, r: MvMut<'_, f64>, a: Coeff<'_, f64>, x: MvRef<'_, f64>, b: Coeff<'_, f64>, y: MvRef<'_, f64>);
    fn elementwise_multiply(&self, c: MvMut<'_, f64>, a: MvRef<'_, f64>, b: MvRef<'_, f64>);
}

impl<E: mvkernels::ExecSpace> AliasedCalls for MvOps<E> {
    fn axpby(&self, r: MvMut<'_, f64>, a: Coeff<'_, f64>, x: MvRef<'_, f64>, b: Coeff<'_, f64>, y: MvRef<'_, f64>) {
        MvOps::axpby(self, r, a, x, b, y, None).unwrap();
    }

    fn elementwise_multiply(&self, c: MvMut<'_, f64>, a: MvRef<'_, f64>, b: MvRef<'_, f64>) {
        MvOps::elementwise_multiply(self, 2.0, c, -1.0, a, b, None).unwrap();
    }
}

#[test]
fn split_elementwise_multiply_matches_serial() {
    let (par, ser) = spaces();
    let a = random_mv(ROWS, 1);
    let b = random_mv(ROWS, 17);
    let c0 = random_mv(ROWS, 17);
    let (mut cp, mut cs) = (c0.clone(), c0);
    par.elementwise_multiply(0.5, cp.view_mut(), 2.0, a.view(), b.view(), None).unwrap();
    ser.elementwise_multiply(0.5, cs.view_mut(), 2.0, a.view(), b.view(), None).unwrap();
    assert_eq!(cp, cs);
}

/// A private pool runs the same split path.
#[test]
fn private_pool_matches_serial() {
    let opts = KernelOptions::default().with_serial_cutoff(0).with_min_rows_per_task(13).with_num_threads(3);
    let par = MvOps::with_exec(RayonExec::from_options(&opts), opts.clone());
    let ser = MvOps::with_exec(SerialExec, opts);
    let x = random_mv(ROWS, 6);
    let y = random_mv(ROWS, 6);
    let (mut rp, mut rs) = (MultiVector::zeros(ROWS, 6), MultiVector::zeros(ROWS, 6));
    par.update(rp.view_mut(), x.view(), Coeff::Scalar(-0.75), y.view(), None).unwrap();
    ser.update(rs.view_mut(), x.view(), Coeff::Scalar(-0.75), y.view(), None).unwrap();
    assert_eq!(rp, rs);
}
