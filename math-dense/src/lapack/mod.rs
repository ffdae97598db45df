//! LAPACK-style backend routines.
//!
//! Each routine exists once per element type under its LAPACK name
//! (`s` = f32, `d` = f64, `c` = Complex32, `z` = Complex64) and is reached
//! generically through the [`Lapack`] trait:
//!
//! - **LU factorization** (`?getrf`) with partial pivoting
//! - **LU solve** (`?getrs`) from the factors
//! - **Inverse from LU** (`?getri`), workspace supplied by the caller
//! - **Expert solve** (`?gesvx`) with refinement and error bounds
//! - **Cholesky** (`?potrf`) and inverse from the Cholesky factor (`?potri`)
//!
//! All routines work on flat column-major buffers with an explicit leading
//! dimension and report through a signed `info` code; the safe wrappers in
//! the rest of the crate decode it immediately.
//!
//! By default the routines run on pure-Rust kernels. With the `lapack`
//! feature they call the system LAPACK instead (`openblas` or `netlib`
//! pick the provider); argument checks and return codes are the same on
//! both backends.

// LAPACK routines have many parameters matching standard API signatures.
#![allow(clippy::too_many_arguments)]

#[cfg_attr(feature = "lapack", allow(dead_code))]
mod kernels;
#[cfg(feature = "lapack")]
mod native;

use crate::error::Result;
use crate::traits::ComplexField;
use ndarray::{Array2, ArrayBase, Data, Ix2, ShapeBuilder};
use num_complex::{Complex32, Complex64};

pub use kernels::ITMAX;

/// Length of the `work` buffer the expert solver needs for order `n`.
pub fn gesvx_work_len(n: usize) -> usize {
    kernels::gesvx_work_len(n)
}

/// Length of the real `rwork` buffer the expert solver needs for order `n`.
pub fn gesvx_rwork_len(n: usize) -> usize {
    kernels::gesvx_rwork_len(n)
}

/// Element types with a backend entry point for every routine.
pub trait Lapack: ComplexField {
    /// LU factorization with partial pivoting of an `m x n` matrix.
    fn getrf(m: usize, n: usize, a: &mut [Self], lda: usize, ipiv: &mut [usize]) -> i32;

    /// Solve `A * X = B` from LU factors, overwriting `b` with `X`.
    fn getrs(
        n: usize,
        nrhs: usize,
        a: &[Self],
        lda: usize,
        ipiv: &[usize],
        b: &mut [Self],
        ldb: usize,
    ) -> i32;

    /// Inverse from LU factors, in place.
    fn getri(
        n: usize,
        a: &mut [Self],
        lda: usize,
        ipiv: &[usize],
        work: &mut [Self],
    ) -> i32;

    /// Expert solve with prefactored `af` and per-column error bounds.
    fn gesvx(
        n: usize,
        nrhs: usize,
        a: &[Self],
        lda: usize,
        af: &[Self],
        ldaf: usize,
        ipiv: &[usize],
        b: &[Self],
        ldb: usize,
        x: &mut [Self],
        ldx: usize,
        ferr: &mut [Self::Real],
        berr: &mut [Self::Real],
        work: &mut [Self],
        rwork: &mut [Self::Real],
    ) -> i32;

    /// Cholesky factorization (upper) of a Hermitian positive definite matrix.
    fn potrf(n: usize, a: &mut [Self], lda: usize) -> i32;

    /// Upper triangle of the inverse from the Cholesky factor.
    fn potri(n: usize, a: &mut [Self], lda: usize) -> i32;
}

macro_rules! impl_lapack {
    (
        $ty:ty,
        $getrf:ident,
        $getrs:ident,
        $getri:ident,
        $gesvx:ident,
        $potrf:ident,
        $potri:ident,
        $native_gesvx:ident
    ) => {
        #[doc = concat!(
            "LU factorization with partial pivoting, `",
            stringify!($ty),
            "` elements."
        )]
        pub fn $getrf(
            m: usize,
            n: usize,
            a: &mut [$ty],
            lda: usize,
            ipiv: &mut [usize],
        ) -> i32 {
            #[cfg(feature = "lapack")]
            {
                native::getrf(::lapack::$getrf, m, n, a, lda, ipiv)
            }
            #[cfg(not(feature = "lapack"))]
            {
                kernels::getrf(m, n, a, lda, ipiv)
            }
        }

        #[doc = concat!("Solve from LU factors, `", stringify!($ty), "` elements.")]
        pub fn $getrs(
            n: usize,
            nrhs: usize,
            a: &[$ty],
            lda: usize,
            ipiv: &[usize],
            b: &mut [$ty],
            ldb: usize,
        ) -> i32 {
            #[cfg(feature = "lapack")]
            {
                native::getrs(::lapack::$getrs, n, nrhs, a, lda, ipiv, b, ldb)
            }
            #[cfg(not(feature = "lapack"))]
            {
                kernels::getrs(n, nrhs, a, lda, ipiv, b, ldb)
            }
        }

        #[doc = concat!("Inverse from LU factors, `", stringify!($ty), "` elements.")]
        pub fn $getri(
            n: usize,
            a: &mut [$ty],
            lda: usize,
            ipiv: &[usize],
            work: &mut [$ty],
        ) -> i32 {
            #[cfg(feature = "lapack")]
            {
                native::getri(::lapack::$getri, n, a, lda, ipiv, work)
            }
            #[cfg(not(feature = "lapack"))]
            {
                kernels::getri(n, a, lda, ipiv, work)
            }
        }

        #[doc = concat!("Expert solve with error bounds, `", stringify!($ty), "` elements.")]
        pub fn $gesvx(
            n: usize,
            nrhs: usize,
            a: &[$ty],
            lda: usize,
            af: &[$ty],
            ldaf: usize,
            ipiv: &[usize],
            b: &[$ty],
            ldb: usize,
            x: &mut [$ty],
            ldx: usize,
            ferr: &mut [<$ty as ComplexField>::Real],
            berr: &mut [<$ty as ComplexField>::Real],
            work: &mut [$ty],
            rwork: &mut [<$ty as ComplexField>::Real],
        ) -> i32 {
            #[cfg(feature = "lapack")]
            {
                native::$native_gesvx(
                    ::lapack::$gesvx,
                    n,
                    nrhs,
                    a,
                    lda,
                    af,
                    ldaf,
                    ipiv,
                    b,
                    ldb,
                    x,
                    ldx,
                    ferr,
                    berr,
                    work,
                    rwork,
                )
            }
            #[cfg(not(feature = "lapack"))]
            {
                kernels::gesvx(
                    n, nrhs, a, lda, af, ldaf, ipiv, b, ldb, x, ldx, ferr, berr, work, rwork,
                )
            }
        }

        #[doc = concat!("Cholesky factorization, `", stringify!($ty), "` elements.")]
        pub fn $potrf(n: usize, a: &mut [$ty], lda: usize) -> i32 {
            #[cfg(feature = "lapack")]
            {
                native::potrf(::lapack::$potrf, n, a, lda)
            }
            #[cfg(not(feature = "lapack"))]
            {
                kernels::potrf_upper(n, a, lda)
            }
        }

        #[doc = concat!("Inverse from the Cholesky factor, `", stringify!($ty), "` elements.")]
        pub fn $potri(n: usize, a: &mut [$ty], lda: usize) -> i32 {
            #[cfg(feature = "lapack")]
            {
                native::potri(::lapack::$potri, n, a, lda)
            }
            #[cfg(not(feature = "lapack"))]
            {
                kernels::potri_upper(n, a, lda)
            }
        }

        impl Lapack for $ty {
            #[inline]
            fn getrf(m: usize, n: usize, a: &mut [Self], lda: usize, ipiv: &mut [usize]) -> i32 {
                $getrf(m, n, a, lda, ipiv)
            }

            #[inline]
            fn getrs(
                n: usize,
                nrhs: usize,
                a: &[Self],
                lda: usize,
                ipiv: &[usize],
                b: &mut [Self],
                ldb: usize,
            ) -> i32 {
                $getrs(n, nrhs, a, lda, ipiv, b, ldb)
            }

            #[inline]
            fn getri(
                n: usize,
                a: &mut [Self],
                lda: usize,
                ipiv: &[usize],
                work: &mut [Self],
            ) -> i32 {
                $getri(n, a, lda, ipiv, work)
            }

            #[inline]
            fn gesvx(
                n: usize,
                nrhs: usize,
                a: &[Self],
                lda: usize,
                af: &[Self],
                ldaf: usize,
                ipiv: &[usize],
                b: &[Self],
                ldb: usize,
                x: &mut [Self],
                ldx: usize,
                ferr: &mut [Self::Real],
                berr: &mut [Self::Real],
                work: &mut [Self],
                rwork: &mut [Self::Real],
            ) -> i32 {
                $gesvx(
                    n, nrhs, a, lda, af, ldaf, ipiv, b, ldb, x, ldx, ferr, berr, work, rwork,
                )
            }

            #[inline]
            fn potrf(n: usize, a: &mut [Self], lda: usize) -> i32 {
                $potrf(n, a, lda)
            }

            #[inline]
            fn potri(n: usize, a: &mut [Self], lda: usize) -> i32 {
                $potri(n, a, lda)
            }
        }
    };
}

impl_lapack!(f32, sgetrf, sgetrs, sgetri, sgesvx, spotrf, spotri, gesvx_real);
impl_lapack!(f64, dgetrf, dgetrs, dgetri, dgesvx, dpotrf, dpotri, gesvx_real);
impl_lapack!(Complex32, cgetrf, cgetrs, cgetri, cgesvx, cpotrf, cpotri, gesvx_complex);
impl_lapack!(Complex64, zgetrf, zgetrs, zgetri, zgesvx, zpotrf, zpotri, gesvx_complex);

/// Copy a matrix into a column-major buffer (leading dimension = rows).
pub(crate) fn to_col_major<T, S>(a: &ArrayBase<S, Ix2>) -> Vec<T>
where
    T: Copy,
    S: Data<Elem = T>,
{
    a.t().iter().copied().collect()
}

/// Wrap a column-major buffer as a standard-layout matrix.
pub(crate) fn from_col_major<T: Copy>(rows: usize, cols: usize, buf: Vec<T>) -> Result<Array2<T>> {
    let fortran = Array2::from_shape_vec((rows, cols).f(), buf)?;
    Ok(fortran.as_standard_layout().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_col_major_round_trip() {
        let a = array![[1.0_f64, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let buf = to_col_major(&a);
        assert_eq!(buf, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        let back = from_col_major(2, 3, buf).unwrap();
        assert_eq!(back, a);
        assert!(back.is_standard_layout());
    }

    #[test]
    fn test_from_col_major_bad_length() {
        assert!(from_col_major::<f64>(2, 2, vec![1.0; 3]).is_err());
    }

    #[test]
    fn test_typed_entry_points_agree() {
        let a64 = vec![4.0_f64, 6.0, 3.0, 3.0];
        let a32: Vec<f32> = a64.iter().map(|&v| v as f32).collect();

        let mut lu64 = a64.clone();
        let mut lu32 = a32.clone();
        let mut ipiv64 = vec![0; 2];
        let mut ipiv32 = vec![0; 2];
        assert_eq!(dgetrf(2, 2, &mut lu64, 2, &mut ipiv64), 0);
        assert_eq!(sgetrf(2, 2, &mut lu32, 2, &mut ipiv32), 0);
        assert_eq!(ipiv64, ipiv32);

        let mut w64 = vec![0.0; 2];
        let mut w32 = vec![0.0; 2];
        assert_eq!(dgetri(2, &mut lu64, 2, &ipiv64, &mut w64), 0);
        assert_eq!(sgetri(2, &mut lu32, 2, &ipiv32, &mut w32), 0);
        for (x, y) in lu64.iter().zip(lu32.iter()) {
            assert_relative_eq!(*x, *y as f64, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_typed_entry_points_share_codes() {
        use crate::error::SINGULAR_CODE_OFFSET;

        // Column-major [[1, 1], [1, 1 + 2 eps]]
        let a = vec![1.0_f64, 1.0, 1.0, 1.0 + 2.0 * f64::EPSILON];
        let mut af = a.clone();
        let mut ipiv = vec![0; 2];
        assert_eq!(dgetrf(2, 2, &mut af, 2, &mut ipiv), 0);
        assert!(ipiv.iter().all(|&p| p < 2));

        let b = vec![2.0, 2.0];
        let mut x = vec![0.0; 2];
        let mut ferr = vec![0.0; 1];
        let mut berr = vec![0.0; 1];
        let mut work = vec![0.0; gesvx_work_len(2)];
        let mut rwork = vec![0.0; gesvx_rwork_len(2)];
        let info = dgesvx(
            2, 1, &a, 2, &af, 2, &ipiv, &b, 2, &mut x, 2, &mut ferr, &mut berr, &mut work,
            &mut rwork,
        );
        assert_eq!(info, SINGULAR_CODE_OFFSET + 3);

        let bad_ipiv = vec![0, 2];
        let info = dgesvx(
            2, 1, &a, 2, &af, 2, &bad_ipiv, &b, 2, &mut x, 2, &mut ferr, &mut berr, &mut work,
            &mut rwork,
        );
        assert_eq!(info, -7);

        let mut indefinite = vec![1.0_f64, 2.0, 2.0, 1.0];
        assert_eq!(dpotrf(2, &mut indefinite, 2), 2);
        let mut short = vec![1.0_f64; 3];
        assert_eq!(dpotri(2, &mut short, 2), -2);
    }

    #[test]
    fn test_complex_dispatch_through_trait() {
        fn invert_2x2<T: Lapack>(mut a: Vec<T>) -> Vec<T> {
            let mut ipiv = vec![0; 2];
            assert_eq!(T::getrf(2, 2, &mut a, 2, &mut ipiv), 0);
            let mut work = vec![T::zero(); 2];
            assert_eq!(T::getri(2, &mut a, 2, &ipiv, &mut work), 0);
            a
        }

        let i = Complex64::new(0.0, 1.0);
        let one = Complex64::new(1.0, 0.0);
        // [[i, 0], [0, 2]] -> [[-i, 0], [0, 0.5]]
        let zero = Complex64::new(0.0, 0.0);
        let inv = invert_2x2(vec![i, zero, zero, one * 2.0]);
        assert_relative_eq!((inv[0] + i).norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!((inv[3] - one * 0.5).norm(), 0.0, epsilon = 1e-12);

        let inv32 = invert_2x2(vec![
            Complex32::new(2.0, 0.0),
            Complex32::new(0.0, 0.0),
            Complex32::new(0.0, 0.0),
            Complex32::new(4.0, 0.0),
        ]);
        assert_relative_eq!(inv32[0].re, 0.5);
        assert_relative_eq!(inv32[3].re, 0.25);
    }
}
