//! Coefficient shape and sign classification.
//!
//! A coefficient is either one scalar shared by all columns or one value per
//! column. Its sign-class says whether every value is exactly `+1`, exactly `-1`,
//! or anything else; the `±1` classes let kernels drop the multiply.

use crate::core::Scalar;
use crate::error::{KernelError, Result};

/// Scaling coefficient of a multivector operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coeff<'a, T> {
    /// Shared by all columns.
    Scalar(T),
    /// One value per column.
    Vector(&'a [T]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    PlusOne,
    MinusOne,
    Generic,
}

impl Sign {
    pub fn of<T: Scalar>(value: T) -> Sign {
        if value == T::one() {
            Sign::PlusOne
        } else if value == -T::one() {
            Sign::MinusOne
        } else {
            Sign::Generic
        }
    }
}

impl<'a, T: Scalar> Coeff<'a, T> {
    /// Sign-class of the coefficient; a vector is `±1` only if all entries are.
    pub fn sign(&self) -> Sign {
        match *self {
            Coeff::Scalar(v) => Sign::of(v),
            Coeff::Vector(values) => {
                let mut iter = values.iter().map(|&v| Sign::of(v));
                match iter.next() {
                    Some(first) if first != Sign::Generic && iter.all(|s| s == first) => first,
                    _ => Sign::Generic,
                }
            }
        }
    }

    /// Reject a vector coefficient whose length differs from the column count.
    pub fn check_len(&self, op: &'static str, ncols: usize) -> Result<()> {
        match *self {
            Coeff::Vector(values) if values.len() != ncols => Err(KernelError::CoeffLength {
                op,
                expected: ncols,
                found: values.len(),
            }),
            _ => Ok(()),
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Coeff::Vector(_))
    }
}

/// Per-column coefficient loader captured by a kernel.
pub trait ColumnCoeff<T>: Copy + Send + Sync {
    fn at(&self, k: usize) -> T;
}

#[derive(Clone, Copy)]
pub struct SharedCoeff<T>(pub T);

#[derive(Clone, Copy)]
pub struct PerColumnCoeff<'a, T>(pub &'a [T]);

impl<T: Scalar> ColumnCoeff<T> for SharedCoeff<T> {
    #[inline(always)]
    fn at(&self, _k: usize) -> T {
        self.0
    }
}

impl<T: Scalar> ColumnCoeff<T> for PerColumnCoeff<'_, T> {
    #[inline(always)]
    fn at(&self, k: usize) -> T {
        self.0[k]
    }
}

/// Bind a [`ColumnCoeff`] loader for `$coeff` to `$a` and evaluate `$body`.
macro_rules! with_coeff {
    ($coeff:expr, $a:ident => $body:expr) => {
        match $coeff {
            $crate::dispatch::Coeff::Scalar(v) => {
                let $a = $crate::dispatch::SharedCoeff(v);
                $body
            }
            $crate::dispatch::Coeff::Vector(values) => {
                let $a = $crate::dispatch::PerColumnCoeff(values);
                $body
            }
        }
    };
}
pub(crate) use with_coeff;

/// The nine `r = s_a·a·x + s_b·b·y` strategies.
///
/// `X`/`Y` is the operand taken as is, `NegX` its negation, `AX`/`BY` the operand
/// scaled by its coefficient; `p` joins with `+` and `m` with `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxpbyPlan {
    XpY,
    XmY,
    NegXpY,
    NegXmY,
    AXpY,
    AXmY,
    XpBY,
    NegXpBY,
    AXpBY,
}

impl AxpbyPlan {
    pub fn select(a: Sign, b: Sign) -> AxpbyPlan {
        use AxpbyPlan::*;
        match (a, b) {
            (Sign::PlusOne, Sign::PlusOne) => XpY,
            (Sign::PlusOne, Sign::MinusOne) => XmY,
            (Sign::MinusOne, Sign::PlusOne) => NegXpY,
            (Sign::MinusOne, Sign::MinusOne) => NegXmY,
            (Sign::Generic, Sign::PlusOne) => AXpY,
            (Sign::Generic, Sign::MinusOne) => AXmY,
            (Sign::PlusOne, Sign::Generic) => XpBY,
            (Sign::MinusOne, Sign::Generic) => NegXpBY,
            (Sign::Generic, Sign::Generic) => AXpBY,
        }
    }

    /// Whether the kernel reads the `a` coefficient.
    pub fn uses_a(self) -> bool {
        matches!(self, AxpbyPlan::AXpY | AxpbyPlan::AXmY | AxpbyPlan::AXpBY)
    }

    /// Whether the kernel reads the `b` coefficient.
    pub fn uses_b(self) -> bool {
        matches!(self, AxpbyPlan::XpBY | AxpbyPlan::NegXpBY | AxpbyPlan::AXpBY)
    }
}
