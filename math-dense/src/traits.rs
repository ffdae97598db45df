//! Scalar abstraction for the dense kernels
//!
//! [`ComplexField`] abstracts over the four element types the kernels are
//! dispatched for: `f32`, `f64`, `Complex32` and `Complex64`.

use num_complex::{Complex32, Complex64};
use num_traits::{Float, FromPrimitive, NumAssign, One, ToPrimitive, Zero};
use std::fmt::Debug;
use std::ops::Neg;

/// Trait for scalar types that can be used in linear algebra operations.
///
/// This trait abstracts over real and complex number types, providing
/// a unified interface for operations like conjugation, modulus computation,
/// and conversion from real values.
///
/// # Implementations
///
/// Provided for:
/// - `f32` / `f64` (real single and double precision)
/// - `Complex32` / `Complex64` (complex single and double precision)
pub trait ComplexField:
    NumAssign + Clone + Copy + Send + Sync + Debug + Zero + One + Neg<Output = Self> + 'static
{
    /// The real number type underlying this field
    type Real: Float + NumAssign + FromPrimitive + ToPrimitive + Send + Sync + Debug + 'static;

    /// Complex conjugate
    fn conj(&self) -> Self;

    /// Squared magnitude |z|²
    fn norm_sqr(&self) -> Self::Real;

    /// Magnitude |z|
    fn norm(&self) -> Self::Real {
        self.norm_sqr().sqrt()
    }

    /// |re| + |im|, the cheap modulus LAPACK uses for pivoting and error bounds
    fn abs1(&self) -> Self::Real {
        self.re().abs() + self.im().abs()
    }

    /// Create from a real value
    fn from_real(r: Self::Real) -> Self;

    /// Real part
    fn re(&self) -> Self::Real;

    /// Imaginary part
    fn im(&self) -> Self::Real;

    /// True when both parts are finite
    fn is_finite(&self) -> bool {
        self.re().is_finite() && self.im().is_finite()
    }

    /// Multiplicative inverse (1/z)
    fn inv(&self) -> Self;

    /// Square root (principal branch for complex values)
    fn sqrt(&self) -> Self;
}

macro_rules! impl_complex_field_for_complex {
    ($ty:ty, $real:ty) => {
        impl ComplexField for $ty {
            type Real = $real;

            #[inline]
            fn conj(&self) -> Self {
                <$ty>::conj(self)
            }

            #[inline]
            fn norm_sqr(&self) -> $real {
                self.re * self.re + self.im * self.im
            }

            #[inline]
            fn from_real(r: $real) -> Self {
                <$ty>::new(r, 0.0)
            }

            #[inline]
            fn re(&self) -> $real {
                self.re
            }

            #[inline]
            fn im(&self) -> $real {
                self.im
            }

            #[inline]
            fn inv(&self) -> Self {
                let denom = self.norm_sqr();
                <$ty>::new(self.re / denom, -self.im / denom)
            }

            #[inline]
            fn sqrt(&self) -> Self {
                <$ty>::sqrt(*self)
            }
        }
    };
}

macro_rules! impl_complex_field_for_real {
    ($ty:ty) => {
        impl ComplexField for $ty {
            type Real = $ty;

            #[inline]
            fn conj(&self) -> Self {
                *self
            }

            #[inline]
            fn norm_sqr(&self) -> $ty {
                *self * *self
            }

            #[inline]
            fn norm(&self) -> $ty {
                self.abs()
            }

            #[inline]
            fn from_real(r: $ty) -> Self {
                r
            }

            #[inline]
            fn re(&self) -> $ty {
                *self
            }

            #[inline]
            fn im(&self) -> $ty {
                0.0
            }

            #[inline]
            fn inv(&self) -> Self {
                1.0 / *self
            }

            // NaN for negative input, like the scalar sqrt
            #[inline]
            fn sqrt(&self) -> Self {
                <$ty>::sqrt(*self)
            }
        }
    };
}

impl_complex_field_for_complex!(Complex64, f64);
impl_complex_field_for_complex!(Complex32, f32);
impl_complex_field_for_real!(f64);
impl_complex_field_for_real!(f32);
