//! Public operation surface.
//!
//! [`MvOps`] binds an execution space to a set of [`KernelOptions`]. Each entry
//! point validates shapes, resolves the row count, classifies destination/source
//! aliasing and picks the column shape and coefficient plan; only then does it
//! enter the execution space. A failed check aborts the call before any write.
//!
//! The free functions at the bottom run on a process-wide [`MvOps`] built from
//! [`KernelOptions::from_env`] on first use.
//!
//! All entry points take an optional row count `rows`, which restricts the call to
//! the first `rows` rows of every operand (default: all rows).

use std::sync::OnceLock;

use crate::config::KernelOptions;
use crate::core::Scalar;
use crate::dispatch::{
    aliasing, check_cols, check_dest, check_result_len, check_rows, check_same_shape, identical_storage,
    resolve_rows, with_coeff, with_row_loop, AxpbyPlan, Coeff, ColumnShape, WeightRank,
};
use crate::error::Result;
use crate::kernels::{self, Source};
use crate::multivector::{MvMut, MvRef};
use crate::parallel::{ExecSpace, UniverseExec};

pub struct MvOps<E: ExecSpace = UniverseExec> {
    exec: E,
    opts: KernelOptions,
}

impl MvOps<UniverseExec> {
    pub fn new(opts: KernelOptions) -> Self {
        let exec = UniverseExec::from_options(&opts);
        log::debug!("mvkernels: operations on the {} execution space", exec.name());
        Self { exec, opts }
    }
}

impl Default for MvOps<UniverseExec> {
    fn default() -> Self {
        Self::new(KernelOptions::default())
    }
}

impl<E: ExecSpace> MvOps<E> {
    pub fn with_exec(exec: E, opts: KernelOptions) -> Self {
        Self { exec, opts }
    }

    pub fn exec(&self) -> &E {
        &self.exec
    }

    pub fn options(&self) -> &KernelOptions {
        &self.opts
    }

    /// Loop shape used for `ncols` columns.
    pub fn column_shape(&self, ncols: usize) -> ColumnShape {
        ColumnShape::classify(ncols, self.opts.unroll_limit)
    }

    // ----- unary -----

    /// `r(i,k) = a(k)·x(i,k)`
    pub fn scale<T: Scalar>(&self, r: MvMut<'_, T>, a: Coeff<'_, T>, x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
        const OP: &str = "scale";
        check_dest(OP, &r.rb())?;
        check_same_shape(OP, &r.rb(), &x)?;
        a.check_len(OP, r.ncols())?;
        let n = resolve_rows(OP, rows, r.nrows())?;
        let src = if identical_storage(OP, &r.rb(), &x)? { Source::Dest } else { Source::View(x) };
        self.run_scale(r, a, src, n);
        Ok(())
    }

    /// `r(i,k) = a(k)·r(i,k)`
    pub fn scale_in_place<T: Scalar>(&self, r: MvMut<'_, T>, a: Coeff<'_, T>, rows: Option<usize>) -> Result<()> {
        const OP: &str = "scale";
        check_dest(OP, &r.rb())?;
        a.check_len(OP, r.ncols())?;
        let n = resolve_rows(OP, rows, r.nrows())?;
        self.run_scale(r, a, Source::Dest, n);
        Ok(())
    }

    fn run_scale<T: Scalar>(&self, r: MvMut<'_, T>, a: Coeff<'_, T>, src: Source<'_, T>, n: usize) {
        let shape = self.column_shape(r.ncols());
        let sign = a.sign();
        log::trace!(
            "mvkernels: scale on {} shape={shape:?} sign={sign:?} vector={} in_place={} rows={n}",
            self.exec.name(),
            a.is_vector(),
            matches!(src, Source::Dest),
        );
        with_row_loop!(shape, L => with_coeff!(a, a => {
            kernels::unary::scale::<L, _, _, _>(&self.exec, n, sign, a, r, src)
        }));
    }

    /// `r(i,k) = 1/x(i,k)`
    pub fn reciprocal<T: Scalar>(&self, r: MvMut<'_, T>, x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
        const OP: &str = "reciprocal";
        check_dest(OP, &r.rb())?;
        check_same_shape(OP, &r.rb(), &x)?;
        let n = resolve_rows(OP, rows, r.nrows())?;
        let src = if identical_storage(OP, &r.rb(), &x)? { Source::Dest } else { Source::View(x) };
        self.run_reciprocal(r, src, n);
        Ok(())
    }

    pub fn reciprocal_in_place<T: Scalar>(&self, r: MvMut<'_, T>, rows: Option<usize>) -> Result<()> {
        check_dest("reciprocal", &r.rb())?;
        let n = resolve_rows("reciprocal", rows, r.nrows())?;
        self.run_reciprocal(r, Source::Dest, n);
        Ok(())
    }

    fn run_reciprocal<T: Scalar>(&self, r: MvMut<'_, T>, src: Source<'_, T>, n: usize) {
        let shape = self.column_shape(r.ncols());
        log::trace!(
            "mvkernels: reciprocal on {} shape={shape:?} in_place={} rows={n}",
            self.exec.name(),
            matches!(src, Source::Dest),
        );
        with_row_loop!(shape, L => kernels::unary::reciprocal::<L, _, _>(&self.exec, n, r, src));
    }

    /// `r(i,k) = |x(i,k)|`
    pub fn abs<T: Scalar>(&self, r: MvMut<'_, T>, x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
        const OP: &str = "abs";
        check_dest(OP, &r.rb())?;
        check_same_shape(OP, &r.rb(), &x)?;
        let n = resolve_rows(OP, rows, r.nrows())?;
        let src = if identical_storage(OP, &r.rb(), &x)? { Source::Dest } else { Source::View(x) };
        self.run_abs(r, src, n);
        Ok(())
    }

    pub fn abs_in_place<T: Scalar>(&self, r: MvMut<'_, T>, rows: Option<usize>) -> Result<()> {
        check_dest("abs", &r.rb())?;
        let n = resolve_rows("abs", rows, r.nrows())?;
        self.run_abs(r, Source::Dest, n);
        Ok(())
    }

    fn run_abs<T: Scalar>(&self, r: MvMut<'_, T>, src: Source<'_, T>, n: usize) {
        let shape = self.column_shape(r.ncols());
        log::trace!(
            "mvkernels: abs on {} shape={shape:?} in_place={} rows={n}",
            self.exec.name(),
            matches!(src, Source::Dest),
        );
        with_row_loop!(shape, L => kernels::unary::abs::<L, _, _>(&self.exec, n, r, src));
    }

    // ----- fused multiply-add -----

    /// `C(i,k) = c·C(i,k) + ab·A(i)·B(i,k)` with `A` a single column.
    pub fn elementwise_multiply<T: Scalar>(
        &self,
        c: T,
        cm: MvMut<'_, T>,
        ab: T,
        a: MvRef<'_, T>,
        b: MvRef<'_, T>,
        rows: Option<usize>,
    ) -> Result<()> {
        const OP: &str = "elementwise_multiply";
        check_dest(OP, &cm.rb())?;
        check_same_shape(OP, &cm.rb(), &b)?;
        check_rows(OP, cm.nrows(), a.nrows())?;
        check_cols(OP, 1, a.ncols())?;
        let n = resolve_rows(OP, rows, cm.nrows())?;
        let route = aliasing(OP, &cm.rb(), &a, &b)?;
        let shape = self.column_shape(cm.ncols());
        log::trace!(
            "mvkernels: elementwise_multiply on {} shape={shape:?} aliasing={route:?} rows={n}",
            self.exec.name(),
        );
        with_row_loop!(shape, L => {
            kernels::elementwise::elementwise_multiply::<L, _, _>(&self.exec, n, route, c, cm, ab, a, b)
        });
        Ok(())
    }

    /// `r(i,k) = a(k)·x(i,k) + b(k)·y(i,k)`
    ///
    /// Coefficients equal to `±1` (every entry, for vector coefficients) drop
    /// their multiply. `r` may share identical storage with `x`, `y` or both.
    pub fn axpby<T: Scalar>(
        &self,
        r: MvMut<'_, T>,
        a: Coeff<'_, T>,
        x: MvRef<'_, T>,
        b: Coeff<'_, T>,
        y: MvRef<'_, T>,
        rows: Option<usize>,
    ) -> Result<()> {
        const OP: &str = "axpby";
        check_dest(OP, &r.rb())?;
        check_same_shape(OP, &r.rb(), &x)?;
        check_same_shape(OP, &r.rb(), &y)?;
        a.check_len(OP, r.ncols())?;
        b.check_len(OP, r.ncols())?;
        let n = resolve_rows(OP, rows, r.nrows())?;
        let route = aliasing(OP, &r.rb(), &x, &y)?;
        let plan = AxpbyPlan::select(a.sign(), b.sign());
        let shape = self.column_shape(r.ncols());
        log::trace!(
            "mvkernels: axpby on {} shape={shape:?} plan={plan:?} aliasing={route:?} rows={n}",
            self.exec.name(),
        );
        with_row_loop!(shape, L => with_coeff!(a, a => with_coeff!(b, b => {
            kernels::axpby::axpby::<L, _, _, _, _>(&self.exec, n, plan, route, a, b, r, x, y)
        })));
        Ok(())
    }

    /// `r = x + y`
    pub fn add<T: Scalar>(&self, r: MvMut<'_, T>, x: MvRef<'_, T>, y: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
        self.axpby(r, Coeff::Scalar(T::one()), x, Coeff::Scalar(T::one()), y, rows)
    }

    /// `r = x + b·y`
    pub fn update<T: Scalar>(
        &self,
        r: MvMut<'_, T>,
        x: MvRef<'_, T>,
        b: Coeff<'_, T>,
        y: MvRef<'_, T>,
        rows: Option<usize>,
    ) -> Result<()> {
        self.axpby(r, Coeff::Scalar(T::one()), x, b, y, rows)
    }

    // ----- reductions -----

    /// `out[k] = Σ_i conj(x(i,k))·y(i,k)`
    pub fn dot<T: Scalar>(&self, out: &mut [T], x: MvRef<'_, T>, y: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
        const OP: &str = "dot";
        check_same_shape(OP, &x, &y)?;
        check_result_len(OP, x.ncols(), out.len())?;
        let n = resolve_rows(OP, rows, x.nrows())?;
        let shape = self.trace_reduction(OP, x.ncols(), n);
        with_row_loop!(shape, L => kernels::reductions::dot::<L, _, _>(&self.exec, n, out, x, y));
        Ok(())
    }

    /// `out[k] = Σ_i x(i,k)`
    pub fn sum<T: Scalar>(&self, out: &mut [T], x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
        const OP: &str = "sum";
        check_result_len(OP, x.ncols(), out.len())?;
        let n = resolve_rows(OP, rows, x.nrows())?;
        let shape = self.trace_reduction(OP, x.ncols(), n);
        with_row_loop!(shape, L => kernels::reductions::sum::<L, _, _>(&self.exec, n, out, x));
        Ok(())
    }

    /// `out[k] = Σ_i |x(i,k)|`
    pub fn norm1<T: Scalar>(&self, out: &mut [T::Mag], x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
        const OP: &str = "norm1";
        check_result_len(OP, x.ncols(), out.len())?;
        let n = resolve_rows(OP, rows, x.nrows())?;
        let shape = self.trace_reduction(OP, x.ncols(), n);
        with_row_loop!(shape, L => kernels::reductions::norm1::<L, _, _>(&self.exec, n, out, x));
        Ok(())
    }

    /// `out[k] = max_i |x(i,k)|`, zero for an empty row range.
    pub fn norm_inf<T: Scalar>(&self, out: &mut [T::Mag], x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
        const OP: &str = "norm_inf";
        check_result_len(OP, x.ncols(), out.len())?;
        let n = resolve_rows(OP, rows, x.nrows())?;
        let shape = self.trace_reduction(OP, x.ncols(), n);
        with_row_loop!(shape, L => kernels::reductions::norm_inf::<L, _, _>(&self.exec, n, out, x));
        Ok(())
    }

    /// `out[k] = Σ_i |x(i,k)|²`
    pub fn norm2_squared<T: Scalar>(&self, out: &mut [T::Mag], x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
        const OP: &str = "norm2_squared";
        check_result_len(OP, x.ncols(), out.len())?;
        let n = resolve_rows(OP, rows, x.nrows())?;
        let shape = self.trace_reduction(OP, x.ncols(), n);
        with_row_loop!(shape, L => kernels::reductions::norm2_squared::<L, _, _>(&self.exec, n, out, x));
        Ok(())
    }

    /// Euclidean norm per column: [`norm2_squared`](Self::norm2_squared) then a
    /// square-root pass over `out`.
    pub fn norm2<T: Scalar>(&self, out: &mut [T::Mag], x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
        self.norm2_squared(out, x, rows)?;
        self.sqrt_in_place(out);
        Ok(())
    }

    /// `out[k] = Σ_i x(i,k)²/w(i,k)²`, where `w` has one column shared by all of
    /// `x` or one column per column of `x`.
    pub fn weighted_dot<T: Scalar>(&self, out: &mut [T], x: MvRef<'_, T>, w: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
        const OP: &str = "weighted_dot";
        check_rows(OP, x.nrows(), w.nrows())?;
        let rank = WeightRank::classify(OP, w.ncols(), x.ncols())?;
        check_result_len(OP, x.ncols(), out.len())?;
        let n = resolve_rows(OP, rows, x.nrows())?;
        let shape = self.trace_reduction(OP, x.ncols(), n);
        log::trace!("mvkernels: weighted_dot weights={rank:?}");
        match rank {
            WeightRank::Broadcast => with_row_loop!(shape, L => {
                kernels::reductions::weighted_dot_shared::<L, _, _>(&self.exec, n, out, x, w)
            }),
            WeightRank::PerColumn => with_row_loop!(shape, L => {
                kernels::reductions::weighted_dot_per_column::<L, _, _>(&self.exec, n, out, x, w)
            }),
        }
        Ok(())
    }

    /// `v = sqrt(v)` for every entry, in one parallel pass.
    pub fn sqrt_in_place<S: Scalar>(&self, values: &mut [S]) {
        kernels::reductions::sqrt_in_place(&self.exec, values);
    }

    fn trace_reduction(&self, op: &'static str, ncols: usize, n: usize) -> ColumnShape {
        let shape = self.column_shape(ncols);
        log::trace!("mvkernels: {op} on {} shape={shape:?} rows={n}", self.exec.name());
        shape
    }
}

static DEFAULT_OPS: OnceLock<MvOps> = OnceLock::new();

/// Process-wide operations on the default execution space.
pub fn default_ops() -> &'static MvOps {
    DEFAULT_OPS.get_or_init(|| MvOps::new(KernelOptions::from_env()))
}

pub fn scale<T: Scalar>(r: MvMut<'_, T>, a: Coeff<'_, T>, x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().scale(r, a, x, rows)
}

pub fn scale_in_place<T: Scalar>(r: MvMut<'_, T>, a: Coeff<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().scale_in_place(r, a, rows)
}

pub fn reciprocal<T: Scalar>(r: MvMut<'_, T>, x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().reciprocal(r, x, rows)
}

pub fn reciprocal_in_place<T: Scalar>(r: MvMut<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().reciprocal_in_place(r, rows)
}

pub fn abs<T: Scalar>(r: MvMut<'_, T>, x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().abs(r, x, rows)
}

pub fn abs_in_place<T: Scalar>(r: MvMut<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().abs_in_place(r, rows)
}

pub fn elementwise_multiply<T: Scalar>(
    c: T,
    cm: MvMut<'_, T>,
    ab: T,
    a: MvRef<'_, T>,
    b: MvRef<'_, T>,
    rows: Option<usize>,
) -> Result<()> {
    default_ops().elementwise_multiply(c, cm, ab, a, b, rows)
}

pub fn axpby<T: Scalar>(
    r: MvMut<'_, T>,
    a: Coeff<'_, T>,
    x: MvRef<'_, T>,
    b: Coeff<'_, T>,
    y: MvRef<'_, T>,
    rows: Option<usize>,
) -> Result<()> {
    default_ops().axpby(r, a, x, b, y, rows)
}

pub fn add<T: Scalar>(r: MvMut<'_, T>, x: MvRef<'_, T>, y: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().add(r, x, y, rows)
}

pub fn update<T: Scalar>(r: MvMut<'_, T>, x: MvRef<'_, T>, b: Coeff<'_, T>, y: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().update(r, x, b, y, rows)
}

pub fn dot<T: Scalar>(out: &mut [T], x: MvRef<'_, T>, y: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().dot(out, x, y, rows)
}

pub fn sum<T: Scalar>(out: &mut [T], x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().sum(out, x, rows)
}

pub fn norm1<T: Scalar>(out: &mut [T::Mag], x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().norm1(out, x, rows)
}

pub fn norm_inf<T: Scalar>(out: &mut [T::Mag], x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().norm_inf(out, x, rows)
}

pub fn norm2_squared<T: Scalar>(out: &mut [T::Mag], x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().norm2_squared(out, x, rows)
}

pub fn norm2<T: Scalar>(out: &mut [T::Mag], x: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().norm2(out, x, rows)
}

pub fn weighted_dot<T: Scalar>(out: &mut [T], x: MvRef<'_, T>, w: MvRef<'_, T>, rows: Option<usize>) -> Result<()> {
    default_ops().weighted_dot(out, x, w, rows)
}

pub fn sqrt_in_place<S: Scalar>(values: &mut [S]) {
    default_ops().sqrt_in_place(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KernelError;
    use crate::multivector::MultiVector;
    use crate::parallel::SerialExec;

    fn serial() -> MvOps<SerialExec> {
        MvOps::with_exec(SerialExec, KernelOptions::default())
    }

    #[test]
    fn checks_run_before_any_write() {
        let ops = serial();
        let x = MultiVector::from_fn(3, 2, |_, _| 1.0);
        let mut r = MultiVector::from_fn(3, 2, |_, _| 9.0);
        let err = ops.scale(r.view_mut(), Coeff::Vector(&[1.0, 2.0, 3.0]), x.view(), None).unwrap_err();
        assert_eq!(err, KernelError::CoeffLength { op: "scale", expected: 2, found: 3 });
        let err = ops.scale(r.view_mut(), Coeff::Scalar(2.0), x.view(), Some(4)).unwrap_err();
        assert!(matches!(err, KernelError::RowOverride { requested: 4, .. }));
        assert!(r.as_slice().iter().all(|&v| v == 9.0));
    }

    #[test]
    fn column_shape_follows_options() {
        let ops = MvOps::with_exec(SerialExec, KernelOptions::default().with_unroll_limit(4));
        assert_eq!(ops.column_shape(1), ColumnShape::Single);
        assert_eq!(ops.column_shape(4), ColumnShape::Unrolled(4));
        assert_eq!(ops.column_shape(5), ColumnShape::Generic(5));
    }

    #[test]
    fn result_length_is_checked() {
        let ops = serial();
        let x = MultiVector::<f64>::zeros(3, 2);
        let mut out = [0.0; 3];
        assert_eq!(
            ops.sum(&mut out, x.view(), None),
            Err(KernelError::ResultLength { op: "sum", expected: 2, found: 3 })
        );
    }

    #[test]
    fn row_prefix_leaves_tail_untouched() {
        let ops = serial();
        let x = MultiVector::from_fn(4, 2, |i, _| i as f64 + 1.0);
        let mut r = MultiVector::<f64>::zeros(4, 2);
        ops.scale(r.view_mut(), Coeff::Scalar(3.0), x.view(), Some(2)).unwrap();
        assert_eq!(r.column(0), vec![3.0, 6.0, 0.0, 0.0]);

        let mut out = [0.0; 2];
        ops.sum(&mut out, x.view(), Some(3)).unwrap();
        assert_eq!(out, [6.0, 6.0]);
    }
}
