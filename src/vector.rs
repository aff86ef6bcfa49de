//! Single-vector conveniences over contiguous slices.
//!
//! Each function views its slices as one-column multivectors and runs the
//! single-column path of the matching [`MvOps`](crate::ops::MvOps) entry point on
//! the default execution space. Reductions return the scalar directly.

use num_traits::Zero;

use crate::core::Scalar;
use crate::dispatch::Coeff;
use crate::error::Result;
use crate::multivector::{MvMut, MvRef};
use crate::ops::default_ops;

/// `Σ_i conj(x_i)·y_i`
pub fn dot<T: Scalar>(x: &[T], y: &[T]) -> Result<T> {
    let mut out = [T::zero()];
    default_ops().dot(&mut out, MvRef::from_column(x), MvRef::from_column(y), None)?;
    Ok(out[0])
}

pub fn sum<T: Scalar>(x: &[T]) -> Result<T> {
    let mut out = [T::zero()];
    default_ops().sum(&mut out, MvRef::from_column(x), None)?;
    Ok(out[0])
}

pub fn norm1<T: Scalar>(x: &[T]) -> Result<T::Mag> {
    let mut out = [<T::Mag as Zero>::zero()];
    default_ops().norm1(&mut out, MvRef::from_column(x), None)?;
    Ok(out[0])
}

pub fn norm_inf<T: Scalar>(x: &[T]) -> Result<T::Mag> {
    let mut out = [<T::Mag as Zero>::zero()];
    default_ops().norm_inf(&mut out, MvRef::from_column(x), None)?;
    Ok(out[0])
}

pub fn norm2<T: Scalar>(x: &[T]) -> Result<T::Mag> {
    let mut out = [<T::Mag as Zero>::zero()];
    default_ops().norm2(&mut out, MvRef::from_column(x), None)?;
    Ok(out[0])
}

/// `Σ_i x_i²/w_i²`
pub fn weighted_dot<T: Scalar>(x: &[T], w: &[T]) -> Result<T> {
    let mut out = [T::zero()];
    default_ops().weighted_dot(&mut out, MvRef::from_column(x), MvRef::from_column(w), None)?;
    Ok(out[0])
}

/// `r_i = a·x_i`
pub fn scale<T: Scalar>(r: &mut [T], a: T, x: &[T]) -> Result<()> {
    default_ops().scale(MvMut::from_column(r), Coeff::Scalar(a), MvRef::from_column(x), None)
}

/// `r_i = 1/x_i`
pub fn reciprocal<T: Scalar>(r: &mut [T], x: &[T]) -> Result<()> {
    default_ops().reciprocal(MvMut::from_column(r), MvRef::from_column(x), None)
}

/// `r_i = |x_i|`
pub fn abs<T: Scalar>(r: &mut [T], x: &[T]) -> Result<()> {
    default_ops().abs(MvMut::from_column(r), MvRef::from_column(x), None)
}

/// `r_i = a·x_i + b·y_i`
pub fn axpby<T: Scalar>(r: &mut [T], a: T, x: &[T], b: T, y: &[T]) -> Result<()> {
    default_ops().axpby(
        MvMut::from_column(r),
        Coeff::Scalar(a),
        MvRef::from_column(x),
        Coeff::Scalar(b),
        MvRef::from_column(y),
        None,
    )
}

/// `c_i = γ·c_i + ab·a_i·b_i`
pub fn elementwise_multiply<T: Scalar>(gamma: T, c: &mut [T], ab: T, a: &[T], b: &[T]) -> Result<()> {
    default_ops().elementwise_multiply(gamma, MvMut::from_column(c), ab, MvRef::from_column(a), MvRef::from_column(b), None)
}
