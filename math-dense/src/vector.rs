//! One-dimensional reductions: inner product, norm and cross product
//!
//! Accumulation happens in the element type itself; there is no widening
//! to a higher precision accumulator.

use crate::conform::{check_cross_operands, check_same_len};
use crate::error::Result;
use crate::traits::ComplexField;
use ndarray::{Array1, ArrayBase, Data, Ix1};

/// Compute the inner product Σ a_i * b_i (no conjugation).
///
/// Fails with `ShapeMismatch` when the lengths differ.
#[inline]
pub fn inner_product<T, S1, S2>(a: &ArrayBase<S1, Ix1>, b: &ArrayBase<S2, Ix1>) -> Result<T>
where
    T: ComplexField,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    check_same_len("inner_product", a, b)?;
    Ok(dot_unchecked(a, b))
}

/// Compute the conjugating inner product (a, b) = Σ conj(a_i) * b_i
#[inline]
pub fn inner_product_conj<T, S1, S2>(a: &ArrayBase<S1, Ix1>, b: &ArrayBase<S2, Ix1>) -> Result<T>
where
    T: ComplexField,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    check_same_len("inner_product_conj", a, b)?;
    let mut sum = T::zero();
    for (ai, bi) in a.iter().zip(b.iter()) {
        sum += ai.conj() * *bi;
    }
    Ok(sum)
}

/// Compute sqrt(inner_product(a, a)).
///
/// For complex input the squares are not conjugated, so the result is the
/// principal square root of Σ a_i², which is not the Euclidean modulus. Use
/// [`vector_norm`] for that.
pub fn norm<T, S>(a: &ArrayBase<S, Ix1>) -> Result<T>
where
    T: ComplexField,
    S: Data<Elem = T>,
{
    Ok(inner_product(a, a)?.sqrt())
}

/// Euclidean 2-norm: ||x||_2 = sqrt(Σ |x_i|^2)
pub fn vector_norm<T, S>(x: &ArrayBase<S, Ix1>) -> T::Real
where
    T: ComplexField,
    S: Data<Elem = T>,
{
    let mut sum = <T::Real as num_traits::Zero>::zero();
    for xi in x.iter() {
        sum += xi.norm_sqr();
    }
    num_traits::Float::sqrt(sum)
}

/// Cross product of two 3-vectors.
///
/// Fails with `ShapeMismatch` unless both operands have length 3.
pub fn cross_product<T, S1, S2>(a: &ArrayBase<S1, Ix1>, b: &ArrayBase<S2, Ix1>) -> Result<Array1<T>>
where
    T: ComplexField,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    check_cross_operands(a, b)?;
    Ok(Array1::from_vec(vec![
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]))
}

/// Σ a_i * b_i over the common prefix; callers check conformance first.
#[inline]
pub(crate) fn dot_unchecked<T, S1, S2>(a: &ArrayBase<S1, Ix1>, b: &ArrayBase<S2, Ix1>) -> T
where
    T: ComplexField,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    let mut sum = T::zero();
    for (ai, bi) in a.iter().zip(b.iter()) {
        sum += *ai * *bi;
    }
    sum
}
