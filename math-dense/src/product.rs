//! Matrix products, transposition and related constructors
//!
//! Every element of a product is one sequential inner product, so the
//! result does not depend on whether rows were computed in parallel.

use crate::config::DenseConfig;
use crate::conform::check_product_shape;
use crate::error::{MatrixError, Result};
use crate::parallel::{is_parallel_available, parallel_map_indexed};
use crate::traits::ComplexField;
use crate::vector::dot_unchecked;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use std::sync::Once;

/// Matrix times vector: result[i] = Σ_k a[i, k] * x[k]
///
/// Fails with `DimensionMismatch` unless `a.ncols() == x.len()`.
pub fn product_mv<T, S1, S2>(a: &ArrayBase<S1, Ix2>, x: &ArrayBase<S2, Ix1>) -> Result<Array1<T>>
where
    T: ComplexField,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    check_product_shape("product(matrix, vector)", a.shape(), x.shape())?;
    Ok(a.outer_iter().map(|row| dot_unchecked(&row, x)).collect())
}

/// Column vector times row vector: the rank-1 matrix x * y_t.
///
/// `y_t` is the already transposed right operand and must be a single-row
/// matrix (1 x m); the result is `x.len() x m`. Any other row count fails
/// with `DimensionMismatch`.
pub fn product_vm<T, S1, S2>(x: &ArrayBase<S1, Ix1>, y_t: &ArrayBase<S2, Ix2>) -> Result<Array2<T>>
where
    T: ComplexField,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    if y_t.nrows() != 1 {
        return Err(MatrixError::DimensionMismatch {
            op: "product(vector, matrix)",
            lhs: vec![x.len(), 1],
            rhs: y_t.shape().to_vec(),
        });
    }
    let column = x.view().insert_axis(Axis(1));
    product(&column, y_t)
}

/// Matrix product with the default configuration.
pub fn product<T, S1, S2>(a: &ArrayBase<S1, Ix2>, b: &ArrayBase<S2, Ix2>) -> Result<Array2<T>>
where
    T: ComplexField,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    product_with(a, b, &DenseConfig::default())
}

/// Matrix product: result[i, j] = Σ_k a[i, k] * b[k, j]
///
/// Rows are distributed over the thread pool once the result has at least
/// `config.parallel_min_rows` rows.
pub fn product_with<T, S1, S2>(
    a: &ArrayBase<S1, Ix2>,
    b: &ArrayBase<S2, Ix2>,
    config: &DenseConfig,
) -> Result<Array2<T>>
where
    T: ComplexField,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    check_product_shape("product(matrix, matrix)", a.shape(), b.shape())?;
    let (rows, cols) = (a.nrows(), b.ncols());
    let a = a.view();
    let b = b.view();

    let row_of = |i: usize| -> Vec<T> {
        let lhs = a.row(i);
        (0..cols).map(|j| dot_unchecked(&lhs, &b.column(j))).collect()
    };

    let data: Vec<T> = if rows >= config.parallel_min_rows && is_parallel_available() {
        parallel_map_indexed(rows, row_of).into_iter().flatten().collect()
    } else {
        (0..rows).flat_map(row_of).collect()
    };

    Ok(Array2::from_shape_vec((rows, cols), data)?)
}

/// Transpose: result[j, i] = a[i, j]
pub fn transpose<T, S>(a: &ArrayBase<S, Ix2>) -> Array2<T>
where
    T: Clone,
    S: Data<Elem = T>,
{
    let (rows, cols) = a.dim();
    Array2::from_shape_fn((cols, rows), |(j, i)| a[[i, j]].clone())
}

/// Conjugate transpose: result[j, i] = conj(a[i, j])
pub fn adjoint<T, S>(a: &ArrayBase<S, Ix2>) -> Array2<T>
where
    T: ComplexField,
    S: Data<Elem = T>,
{
    let (rows, cols) = a.dim();
    Array2::from_shape_fn((cols, rows), |(j, i)| a[[i, j]].conj())
}

/// Kronecker product of `a` (p x q) and `b` (r x s), a (p*r) x (q*s) matrix
pub fn direct_product<T, S1, S2>(a: &ArrayBase<S1, Ix2>, b: &ArrayBase<S2, Ix2>) -> Array2<T>
where
    T: ComplexField,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    let (ar, ac) = a.dim();
    let (br, bc) = b.dim();
    Array2::from_shape_fn((ar * br, ac * bc), |(i, j)| {
        a[[i / br, j / bc]] * b[[i % br, j % bc]]
    })
}

/// n x n identity matrix
pub fn identity<T: ComplexField>(n: usize) -> Array2<T> {
    Array2::eye(n)
}

static OUTER_PRODUCT_MV_NOTICE: Once = Once::new();
static OUTER_PRODUCT_VM_NOTICE: Once = Once::new();
static CAYLEY_PRODUCT_NOTICE: Once = Once::new();

fn deprecation_notice(flag: &'static Once, old: &str, new: &str) {
    flag.call_once(|| {
        log::warn!("{old} is deprecated and will be removed, use {new} instead");
    });
}

/// Deprecated alias of [`product_mv`].
#[deprecated(note = "use `product_mv` instead")]
pub fn outer_product_mv<T, S1, S2>(
    a: &ArrayBase<S1, Ix2>,
    x: &ArrayBase<S2, Ix1>,
) -> Result<Array1<T>>
where
    T: ComplexField,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    deprecation_notice(&OUTER_PRODUCT_MV_NOTICE, "outer_product_mv", "product_mv");
    product_mv(a, x)
}

/// Deprecated alias of [`product_vm`].
#[deprecated(note = "use `product_vm` instead")]
pub fn outer_product_vm<T, S1, S2>(
    x: &ArrayBase<S1, Ix1>,
    y_t: &ArrayBase<S2, Ix2>,
) -> Result<Array2<T>>
where
    T: ComplexField,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    deprecation_notice(&OUTER_PRODUCT_VM_NOTICE, "outer_product_vm", "product_vm");
    product_vm(x, y_t)
}

/// Deprecated alias of [`product`].
#[deprecated(note = "use `product` instead")]
pub fn cayley_product<T, S1, S2>(
    a: &ArrayBase<S1, Ix2>,
    b: &ArrayBase<S2, Ix2>,
) -> Result<Array2<T>>
where
    T: ComplexField,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    deprecation_notice(&CAYLEY_PRODUCT_NOTICE, "cayley_product", "product");
    product(a, b)
}
