//! Core numeric traits for mvkernels.
//!
//! Every kernel is generic over [`Scalar`]. The trait bundles what the kernels need
//! from an element type: additive and multiplicative identities (through
//! `num_traits::Zero`/`One`), an absolute value into a possibly-distinct magnitude
//! type, a square root, and a conjugate-aware inner product.

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_traits::{One, Zero};

/// Element type of a multivector.
pub trait Scalar:
    Copy
    + Send
    + Sync
    + Debug
    + PartialEq
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Magnitude type produced by `abs` and by the norms.
    type Mag: RealScalar;

    /// Absolute value (modulus for complex types).
    fn abs(self) -> Self::Mag;

    /// Principal square root.
    fn sqrt(self) -> Self;

    /// Complex conjugate; the identity for real types.
    fn conj(self) -> Self;

    /// Inner product of two entries: `conj(a) * b`.
    #[inline(always)]
    fn inner(a: Self, b: Self) -> Self {
        a.conj() * b
    }

    /// Embed a magnitude back into the scalar type.
    fn from_mag(m: Self::Mag) -> Self;
}

/// A real, ordered scalar: its own magnitude type.
pub trait RealScalar: Scalar<Mag = Self> + PartialOrd {
    /// Larger of two values; `a` wins ties and unordered comparisons.
    #[inline(always)]
    fn max_of(a: Self, b: Self) -> Self {
        if a < b { b } else { a }
    }
}
