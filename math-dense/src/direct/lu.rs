//! LU decomposition handle
//!
//! Factors a copy of the input once with partial pivoting; the handle is
//! then shared by inversion, determinant and the expert solver.

use crate::error::{MatrixError, Result};
use crate::lapack::{Lapack, from_col_major, to_col_major};
use crate::product::product;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};

/// LU factorization result: P * L * U = A
///
/// Stores L and U packed in one column-major buffer (L is unit lower
/// triangular, stored below the diagonal) along with the pivot indices.
#[derive(Debug, Clone)]
pub struct LuDecomposition<T: Lapack> {
    /// Packed factors, column-major, leading dimension `n`
    factors: Vec<T>,
    /// `pivots[k]` is the row swapped with row k at step k
    pivots: Vec<usize>,
    /// Matrix dimension
    n: usize,
    /// First exactly zero pivot (1-based), 0 if none
    info: i32,
}

impl<T: Lapack> LuDecomposition<T> {
    /// Factor a copy of `a`.
    ///
    /// Fails with `Factorization` when `a` is not square. A singular matrix
    /// still factors; see [`LuDecomposition::first_zero_pivot`].
    pub fn new<S>(a: &ArrayBase<S, Ix2>) -> Result<Self>
    where
        S: Data<Elem = T>,
    {
        let (rows, cols) = a.dim();
        if rows != cols {
            return Err(MatrixError::Factorization { rows, cols });
        }
        let n = rows;

        let mut factors = to_col_major(a);
        let mut pivots = vec![0; n];
        let info = T::getrf(n, n, &mut factors, n.max(1), &mut pivots);
        if info < 0 {
            return Err(MatrixError::InvalidArgument {
                routine: "getrf",
                index: info.unsigned_abs() as usize,
            });
        }

        log::debug!("LU factorization of {n} x {n} matrix");
        if info > 0 {
            log::warn!("LU factor is singular: U({info},{info}) is exactly zero");
        }

        Ok(Self {
            factors,
            pivots,
            n,
            info,
        })
    }

    /// Number of rows of the factored matrix
    pub fn rows(&self) -> usize {
        self.n
    }

    /// Number of columns of the factored matrix
    pub fn cols(&self) -> usize {
        self.n
    }

    /// Pivot indices, one per row
    pub fn pivots(&self) -> &[usize] {
        &self.pivots
    }

    /// 1-based index of the first exactly zero diagonal entry of U
    pub fn first_zero_pivot(&self) -> Option<usize> {
        (self.info > 0).then_some(self.info as usize)
    }

    /// True when U has an exactly zero diagonal entry
    pub fn is_singular(&self) -> bool {
        self.info > 0
    }

    /// Packed factor entry (i, j)
    #[inline]
    pub fn factor(&self, i: usize, j: usize) -> T {
        self.factors[i + j * self.n]
    }

    /// Column-major packed factors, for the backend
    pub(crate) fn factors(&self) -> &[T] {
        &self.factors
    }

    /// Packed L and U as a matrix
    pub fn lu(&self) -> Result<Array2<T>> {
        from_col_major(self.n, self.n, self.factors.clone())
    }

    /// Unit lower triangular factor L
    pub fn lower(&self) -> Array2<T> {
        Array2::from_shape_fn((self.n, self.n), |(i, j)| {
            if i == j {
                T::one()
            } else if i > j {
                self.factor(i, j)
            } else {
                T::zero()
            }
        })
    }

    /// Upper triangular factor U
    pub fn upper(&self) -> Array2<T> {
        Array2::from_shape_fn((self.n, self.n), |(i, j)| {
            if i <= j { self.factor(i, j) } else { T::zero() }
        })
    }

    /// Row order of A in L * U: row i of L * U is row `order[i]` of A.
    pub fn row_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.n).collect();
        for (k, &p) in self.pivots.iter().enumerate() {
            order.swap(k, p);
        }
        order
    }

    /// Permutation matrix P such that A = P * L * U
    pub fn permutation(&self) -> Array2<T> {
        let mut p = Array2::zeros((self.n, self.n));
        for (i, &row) in self.row_order().iter().enumerate() {
            p[[row, i]] = T::one();
        }
        p
    }

    /// Rebuild A = P * L * U from the factors
    pub fn reconstruct(&self) -> Result<Array2<T>> {
        let lu = product(&self.lower(), &self.upper())?;
        let mut a = Array2::zeros((self.n, self.n));
        for (i, &row) in self.row_order().iter().enumerate() {
            a.row_mut(row).assign(&lu.row(i));
        }
        Ok(a)
    }

    /// Solve Ax = b using the pre-computed LU factorization
    pub fn solve<S>(&self, b: &ArrayBase<S, Ix1>) -> Result<Array1<T>>
    where
        S: Data<Elem = T>,
    {
        if b.len() != self.n {
            return Err(MatrixError::DimensionMismatch {
                op: "LuDecomposition::solve",
                lhs: vec![self.n, self.n],
                rhs: vec![b.len()],
            });
        }
        if let Some(index) = self.first_zero_pivot() {
            return Err(MatrixError::SingularMatrix {
                routine: "getrs",
                index,
            });
        }

        let mut x = b.to_vec();
        let ld = self.n.max(1);
        let info = T::getrs(self.n, 1, &self.factors, ld, &self.pivots, &mut x, ld);
        if info < 0 {
            return Err(MatrixError::InvalidArgument {
                routine: "getrs",
                index: info.unsigned_abs() as usize,
            });
        }
        Ok(Array1::from_vec(x))
    }
}

/// Product of the diagonal of U, without the pivot sign
pub(crate) fn diagonal_product<T: Lapack>(lu: &LuDecomposition<T>) -> T {
    let mut prod = T::one();
    for i in 0..lu.rows() {
        prod *= lu.factor(i, i);
    }
    prod
}

/// Number of non-trivial row interchanges recorded in the pivots
pub(crate) fn swap_count<T: Lapack>(lu: &LuDecomposition<T>) -> usize {
    lu.pivots()
        .iter()
        .enumerate()
        .filter(|&(i, &p)| p != i)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    #[test]
    fn test_factor_sample() {
        let a = array![[4.0_f64, 3.0], [6.0, 3.0]];
        let lu = LuDecomposition::new(&a).expect("factorization should succeed");

        assert_eq!(lu.rows(), 2);
        assert_eq!(lu.cols(), 2);
        assert_eq!(lu.pivots(), &[1, 1]);
        assert!(!lu.is_singular());
        assert_eq!(swap_count(&lu), 1);

        let packed = lu.lu().unwrap();
        assert_relative_eq!(packed[[0, 0]], 6.0);
        assert_relative_eq!(packed[[1, 0]], 4.0 / 6.0);
        assert_relative_eq!(packed[[1, 1]], 1.0);
    }

    #[test]
    fn test_input_is_not_modified() {
        let a = array![[1.0_f64, 2.0], [3.0, 4.0]];
        let copy = a.clone();
        let _lu = LuDecomposition::new(&a).unwrap();
        assert_eq!(a, copy);
    }

    #[test]
    fn test_not_square() {
        let a = array![[1.0_f64, 2.0, 3.0], [4.0, 5.0, 6.0]];
        assert!(matches!(
            LuDecomposition::new(&a),
            Err(MatrixError::Factorization { rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn test_reconstruct() {
        let a = array![[0.0_f64, 2.0, 1.0], [1.0, 1.0, 0.0], [3.0, 0.0, 4.0]];
        let lu = LuDecomposition::new(&a).unwrap();

        let rebuilt = lu.reconstruct().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(rebuilt[[i, j]], a[[i, j]], epsilon = 1e-12);
            }
        }

        let plu = product(&lu.permutation(), &product(&lu.lower(), &lu.upper()).unwrap()).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(plu[[i, j]], a[[i, j]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_singular_factors() {
        let a = array![[1.0_f64, 2.0], [2.0, 4.0]];
        let lu = LuDecomposition::new(&a).unwrap();
        assert!(lu.is_singular());
        assert_eq!(lu.first_zero_pivot(), Some(2));

        let err = lu.solve(&array![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, MatrixError::SingularMatrix { index: 2, .. }));
    }

    #[test]
    fn test_lu_factorize_and_solve() {
        let a = array![[4.0_f64, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0],];

        let factorization = LuDecomposition::new(&a).expect("Factorization should succeed");

        // Solve multiple RHS
        let b1 = array![1.0_f64, 2.0, 3.0];
        let x1 = factorization.solve(&b1).expect("Solve should succeed");

        let ax1 = a.dot(&x1);
        for i in 0..3 {
            assert_relative_eq!(ax1[i], b1[i], epsilon = 1e-10);
        }

        let b2 = array![4.0_f64, 5.0, 6.0];
        let x2 = factorization.solve(&b2).expect("Solve should succeed");

        let ax2 = a.dot(&x2);
        for i in 0..3 {
            assert_relative_eq!(ax2[i], b2[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_solve_complex() {
        let a = array![
            [Complex64::new(4.0, 1.0), Complex64::new(1.0, 0.0)],
            [Complex64::new(1.0, 0.0), Complex64::new(3.0, -1.0)],
        ];
        let b = array![Complex64::new(1.0, 1.0), Complex64::new(2.0, -1.0)];

        let x = LuDecomposition::new(&a).unwrap().solve(&b).unwrap();

        let ax = a.dot(&x);
        for i in 0..2 {
            assert_relative_eq!((ax[i] - b[i]).norm(), 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_solve_wrong_length() {
        let a = array![[2.0_f64, 0.0], [0.0, 2.0]];
        let lu = LuDecomposition::new(&a).unwrap();
        assert!(lu.solve(&array![1.0_f64, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_diagonal_product() {
        let a = array![[2.0_f64, 0.0], [0.0, 5.0]];
        let lu = LuDecomposition::new(&a).unwrap();
        assert_relative_eq!(diagonal_product(&lu), 10.0);
        assert_eq!(swap_count(&lu), 0);
    }
}
