//! Determinant from the LU factors

use super::lu::{LuDecomposition, diagonal_product, swap_count};
use crate::conform::check_square;
use crate::error::Result;
use crate::lapack::Lapack;
use ndarray::{ArrayBase, Data, Ix2};

/// Determinant of a square matrix.
///
/// Fails with `NotSquare` otherwise. A singular matrix gives exactly zero.
pub fn determinant<T, S>(a: &ArrayBase<S, Ix2>) -> Result<T>
where
    T: Lapack,
    S: Data<Elem = T>,
{
    check_square("determinant", a)?;
    let lu = LuDecomposition::new(a)?;
    Ok(determinant_lu(&lu))
}

/// Determinant from an existing factorization.
///
/// Product of the diagonal of U, negated once for every pivot that swapped
/// two rows.
pub fn determinant_lu<T: Lapack>(lu: &LuDecomposition<T>) -> T {
    let det = diagonal_product(lu);
    if swap_count(lu) % 2 == 1 { -det } else { det }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatrixError;
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};
    use num_complex::Complex64;

    #[test]
    fn test_determinant_2x2() {
        let a = array![[4.0_f64, 3.0], [6.0, 3.0]];
        assert_relative_eq!(determinant(&a).unwrap(), -6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_determinant_sign_from_pivots() {
        // One row interchange
        let a = array![[0.0_f64, 1.0], [1.0, 0.0]];
        assert_relative_eq!(determinant(&a).unwrap(), -1.0);

        // Cyclic permutation: two interchanges
        let p = array![[0.0_f64, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]];
        assert_relative_eq!(determinant(&p).unwrap(), 1.0);
    }

    #[test]
    fn test_determinant_singular_is_zero() {
        let a = array![[1.0_f64, 2.0], [2.0, 4.0]];
        assert_eq!(determinant(&a).unwrap(), 0.0);

        let zero_column = array![[0.0_f64, 1.0], [0.0, 3.0]];
        assert_eq!(determinant(&zero_column).unwrap(), 0.0);
    }

    #[test]
    fn test_determinant_not_square() {
        let a = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            determinant(&a),
            Err(MatrixError::NotSquare { rows: 2, cols: 3, .. })
        ));
    }

    #[test]
    fn test_determinant_complex() {
        // det [[i, 1], [1, i]] = i*i - 1 = -2
        let i = Complex64::new(0.0, 1.0);
        let one = Complex64::new(1.0, 0.0);
        let a = array![[i, one], [one, i]];
        let det = determinant(&a).unwrap();
        assert_relative_eq!(det.re, -2.0, epsilon = 1e-12);
        assert_relative_eq!(det.im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_determinant_lu_reuse() {
        let a = array![[2.0_f64, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 4.0]];
        let lu = LuDecomposition::new(&a).unwrap();
        // 2*(12-1) - 1*(4-0) = 18
        assert_relative_eq!(determinant_lu(&lu), 18.0, epsilon = 1e-12);
    }
}
