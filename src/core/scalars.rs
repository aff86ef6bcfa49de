//! [`Scalar`] implementations for the primitive floats and `num_complex::Complex`.
//!
//! Real types use a plain product as their inner product; complex types conjugate
//! the left operand and report their modulus as magnitude.

use num_complex::Complex;

use crate::core::traits::{RealScalar, Scalar};

macro_rules! impl_real_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            type Mag = $t;

            #[inline(always)]
            fn abs(self) -> $t {
                <$t>::abs(self)
            }

            #[inline(always)]
            fn sqrt(self) -> $t {
                <$t>::sqrt(self)
            }

            #[inline(always)]
            fn conj(self) -> $t {
                self
            }

            #[inline(always)]
            fn inner(a: $t, b: $t) -> $t {
                a * b
            }

            #[inline(always)]
            fn from_mag(m: $t) -> $t {
                m
            }
        }

        impl RealScalar for $t {}
    )*};
}

impl_real_scalar!(f32, f64);

macro_rules! impl_complex_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for Complex<$t> {
            type Mag = $t;

            #[inline(always)]
            fn abs(self) -> $t {
                self.norm()
            }

            #[inline(always)]
            fn sqrt(self) -> Complex<$t> {
                Complex::sqrt(self)
            }

            #[inline(always)]
            fn conj(self) -> Complex<$t> {
                Complex::conj(&self)
            }

            #[inline(always)]
            fn from_mag(m: $t) -> Complex<$t> {
                Complex::new(m, 0.0)
            }
        }
    )*};
}

impl_complex_scalar!(f32, f64);
