//! Matrix inversion
//!
//! General matrices go through the LU handle and `getri`; symmetric
//! positive definite ones can take the Cholesky route instead.

use super::determinant::determinant_lu;
use super::lu::LuDecomposition;
use crate::config::DenseConfig;
use crate::conform::check_square;
use crate::error::{MatrixError, Result};
use crate::lapack::{Lapack, from_col_major, to_col_major};
use ndarray::{Array2, ArrayBase, Data, Ix2};
use num_traits::One;

/// Inverse of a square matrix.
///
/// Factors a copy of `a`; fails with `Factorization` when `a` is not square
/// and with `SingularMatrix` when U has an exactly zero diagonal entry.
pub fn inverse<T, S>(a: &ArrayBase<S, Ix2>) -> Result<Array2<T>>
where
    T: Lapack,
    S: Data<Elem = T>,
{
    let lu = LuDecomposition::new(a)?;
    inverse_lu(&lu)
}

/// Inverse from an existing factorization, default workspace sizing.
pub fn inverse_lu<T: Lapack>(lu: &LuDecomposition<T>) -> Result<Array2<T>> {
    inverse_lu_with(lu, &DenseConfig::default())
}

/// Inverse from an existing factorization.
///
/// The `getri` workspace holds `config.block_size * n` elements and lives
/// only for the duration of the call. An out-of-range `block_size` is
/// reported as `InvalidConfig` before anything is allocated.
pub fn inverse_lu_with<T: Lapack>(
    lu: &LuDecomposition<T>,
    config: &DenseConfig,
) -> Result<Array2<T>> {
    config.validate()?;
    let n = lu.rows();
    log::debug!("inverting {n} x {n} matrix from LU factors");

    let mut inv = lu.factors().to_vec();
    let mut work = vec![T::zero(); config.inverse_work_len(n)?];
    let info = T::getri(n, &mut inv, n.max(1), lu.pivots(), &mut work);
    check_getri_info(info)?;

    from_col_major(n, n, inv)
}

/// Inverse and determinant from a single factorization.
pub fn invert_with_determinant<T, S>(a: &ArrayBase<S, Ix2>) -> Result<(Array2<T>, T)>
where
    T: Lapack,
    S: Data<Elem = T>,
{
    let lu = LuDecomposition::new(a)?;
    let det = determinant_lu(&lu);
    let inv = inverse_lu(&lu)?;
    Ok((inv, det))
}

/// Inverse and determinant of a Hermitian positive definite matrix.
///
/// Only the upper triangle of `a` is read. Fails with `NotPositiveDefinite`
/// when a leading minor is not positive.
pub fn invert_sym_pos_def<T, S>(a: &ArrayBase<S, Ix2>) -> Result<(Array2<T>, T)>
where
    T: Lapack,
    S: Data<Elem = T>,
{
    check_square("invert_sym_pos_def", a)?;
    let n = a.nrows();
    let lda = n.max(1);
    log::debug!("Cholesky inversion of {n} x {n} matrix");

    let mut buf = to_col_major(a);
    let info = T::potrf(n, &mut buf, lda);
    if info < 0 {
        return Err(MatrixError::InvalidArgument {
            routine: "potrf",
            index: info.unsigned_abs() as usize,
        });
    }
    if info > 0 {
        return Err(MatrixError::NotPositiveDefinite {
            index: info as usize,
        });
    }

    // det(A) = det(U^H U) = prod |U_ii|^2
    let mut det = <T::Real as One>::one();
    for i in 0..n {
        det *= buf[i + i * n].norm_sqr();
    }

    let info = T::potri(n, &mut buf, lda);
    if info < 0 {
        return Err(MatrixError::InvalidArgument {
            routine: "potri",
            index: info.unsigned_abs() as usize,
        });
    }
    if info > 0 {
        return Err(MatrixError::SingularMatrix {
            routine: "potri",
            index: info as usize,
        });
    }

    let mut inv = from_col_major(n, n, buf)?;
    for j in 0..n {
        for i in (j + 1)..n {
            inv[[i, j]] = inv[[j, i]].conj();
        }
    }
    Ok((inv, T::from_real(det)))
}

fn check_getri_info(info: i32) -> Result<()> {
    match info {
        0 => Ok(()),
        i if i < 0 => Err(MatrixError::InvalidArgument {
            routine: "getri",
            index: i.unsigned_abs() as usize,
        }),
        i => Err(MatrixError::SingularMatrix {
            routine: "getri",
            index: i as usize,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{identity, product};
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    #[test]
    fn test_inverse_sample() {
        let a = array![[4.0_f64, 3.0], [6.0, 3.0]];
        let inv = inverse(&a).unwrap();
        assert_relative_eq!(inv[[0, 0]], -0.5, epsilon = 1e-12);
        assert_relative_eq!(inv[[0, 1]], 0.5, epsilon = 1e-12);
        assert_relative_eq!(inv[[1, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(inv[[1, 1]], -2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_round_trip() {
        let a = array![[2.0_f64, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 2.0]];
        let inv = inverse(&a).unwrap();
        let eye = product(&a, &inv).unwrap();
        let expected = identity::<f64>(3);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(eye[[i, j]], expected[[i, j]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_inverse_singular() {
        let a = array![[1.0_f64, 2.0], [2.0, 4.0]];
        match inverse(&a) {
            Err(MatrixError::SingularMatrix { routine, index }) => {
                assert_eq!(routine, "getri");
                assert_eq!(index, 2);
            }
            other => panic!("expected singular matrix, got {other:?}"),
        }
    }

    #[test]
    fn test_inverse_not_square() {
        let a = array![[1.0_f64, 2.0, 3.0]];
        assert!(matches!(inverse(&a), Err(MatrixError::Factorization { .. })));
    }

    #[test]
    fn test_inverse_with_small_block_size() {
        let a = array![[4.0_f64, 3.0], [6.0, 3.0]];
        let lu = LuDecomposition::new(&a).unwrap();
        let config = DenseConfig {
            block_size: 1,
            ..Default::default()
        };
        let inv = inverse_lu_with(&lu, &config).unwrap();
        assert_relative_eq!(inv[[1, 1]], -2.0 / 3.0, epsilon = 1e-12);

        let bad = DenseConfig {
            block_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            inverse_lu_with(&lu, &bad),
            Err(MatrixError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_inverse_with_oversized_block_size() {
        let a = array![[4.0_f64, 3.0], [6.0, 3.0]];
        let lu = LuDecomposition::new(&a).unwrap();
        let config: DenseConfig =
            serde_json::from_str(r#"{ "block_size": 9223372036854775807 }"#).unwrap();
        assert!(matches!(
            inverse_lu_with(&lu, &config),
            Err(MatrixError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_inverse_complex() {
        let a = array![
            [Complex64::new(1.0, 1.0), Complex64::new(2.0, 0.0)],
            [Complex64::new(0.0, -1.0), Complex64::new(3.0, 2.0)],
        ];
        let inv = inverse(&a).unwrap();
        let eye = product(&a, &inv).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(eye[[i, j]].re, expected, epsilon = 1e-12);
                assert_relative_eq!(eye[[i, j]].im, 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_invert_with_determinant() {
        let a = array![[4.0_f64, 3.0], [6.0, 3.0]];
        let (inv, det) = invert_with_determinant(&a).unwrap();
        assert_relative_eq!(det, -6.0, epsilon = 1e-12);
        assert_relative_eq!(inv[[0, 0]], -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_invert_sym_pos_def() {
        let a = array![[4.0_f64, 2.0], [2.0, 3.0]];
        let (inv, det) = invert_sym_pos_def(&a).unwrap();
        assert_relative_eq!(det, 8.0, epsilon = 1e-12);
        assert_relative_eq!(inv[[0, 0]], 3.0 / 8.0, epsilon = 1e-12);
        assert_relative_eq!(inv[[0, 1]], -2.0 / 8.0, epsilon = 1e-12);
        assert_relative_eq!(inv[[1, 0]], -2.0 / 8.0, epsilon = 1e-12);
        assert_relative_eq!(inv[[1, 1]], 4.0 / 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invert_hermitian_pos_def() {
        // [[2, i], [-i, 2]] has eigenvalues 1 and 3
        let a = array![
            [Complex64::new(2.0, 0.0), Complex64::new(0.0, 1.0)],
            [Complex64::new(0.0, -1.0), Complex64::new(2.0, 0.0)],
        ];
        let (inv, det) = invert_sym_pos_def(&a).unwrap();
        assert_relative_eq!(det.re, 3.0, epsilon = 1e-12);
        let eye = product(&a, &inv).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(eye[[i, j]].re, expected, epsilon = 1e-12);
                assert_relative_eq!(eye[[i, j]].im, 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_invert_sym_pos_def_rejects_indefinite() {
        let a = array![[1.0_f64, 2.0], [2.0, 1.0]];
        assert!(matches!(
            invert_sym_pos_def(&a),
            Err(MatrixError::NotPositiveDefinite { index: 2 })
        ));
    }
}
