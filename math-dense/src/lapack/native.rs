//! Entry points backed by a system LAPACK through the `lapack` crate.
//!
//! Arguments go through the same checks as the pure-Rust kernels, so a
//! negative `info` names the same argument on either backend. Dimensions
//! are narrowed to `i32` and pivots shifted to LAPACK's 1-based convention
//! on the way in and back.

use super::kernels;
use crate::error::{GENERAL_CODE_OFFSET, SINGULAR_CODE_OFFSET};
use crate::traits::ComplexField;
use num_traits::Zero;

pub(crate) type GetrfFn<T> = unsafe fn(i32, i32, &mut [T], i32, &mut [i32], &mut i32);

pub(crate) type GetrsFn<T> =
    unsafe fn(u8, i32, i32, &[T], i32, &[i32], &mut [T], i32, &mut i32);

pub(crate) type GetriFn<T> = unsafe fn(i32, &mut [T], i32, &[i32], &mut [T], i32, &mut i32);

/// Shape shared by `?potrf` and `?potri`.
pub(crate) type TriangleFn<T> = unsafe fn(u8, i32, &mut [T], i32, &mut i32);

/// `?gesvx` for real types: integer `iwork` as the last workspace.
pub(crate) type RealGesvxFn<T> = unsafe fn(
    u8,
    u8,
    i32,
    i32,
    &mut [T],
    i32,
    &mut [T],
    i32,
    &mut [i32],
    &mut u8,
    &mut [T],
    &mut [T],
    &mut [T],
    i32,
    &mut [T],
    i32,
    &mut T,
    &mut [T],
    &mut [T],
    &mut [T],
    &mut [i32],
    &mut i32,
);

/// `?gesvx` for complex types: real `rwork` as the last workspace.
pub(crate) type ComplexGesvxFn<T, R> = unsafe fn(
    u8,
    u8,
    i32,
    i32,
    &mut [T],
    i32,
    &mut [T],
    i32,
    &mut [i32],
    &mut u8,
    &mut [R],
    &mut [R],
    &mut [T],
    i32,
    &mut [T],
    i32,
    &mut R,
    &mut [R],
    &mut [R],
    &mut [T],
    &mut [R],
    &mut i32,
);

/// Narrow a dimension, reporting argument `position` when it does not fit.
fn narrow(value: usize, position: i32) -> Result<i32, i32> {
    i32::try_from(value).map_err(|_| -position)
}

fn settle(result: Result<i32, i32>) -> i32 {
    result.unwrap_or_else(|code| code)
}

fn one_based(ipiv: &[usize], n: usize, position: i32) -> Result<Vec<i32>, i32> {
    ipiv[..n].iter().map(|&p| narrow(p + 1, position)).collect()
}

pub(crate) fn getrf<T>(
    call: GetrfFn<T>,
    m: usize,
    n: usize,
    a: &mut [T],
    lda: usize,
    ipiv: &mut [usize],
) -> i32 {
    match kernels::check_getrf(m, n, a, lda, ipiv) {
        0 => settle(run_getrf(call, m, n, a, lda, ipiv)),
        info => info,
    }
}

fn run_getrf<T>(
    call: GetrfFn<T>,
    m: usize,
    n: usize,
    a: &mut [T],
    lda: usize,
    ipiv: &mut [usize],
) -> Result<i32, i32> {
    let (m32, n32, lda32) = (narrow(m, 1)?, narrow(n, 2)?, narrow(lda, 4)?);
    let mut piv = vec![0_i32; m.min(n)];
    let mut info = 0;
    // SAFETY: `a` holds `lda * (n - 1) + m` elements and `piv` min(m, n)
    unsafe { call(m32, n32, a, lda32, &mut piv, &mut info) };
    for (dst, &p) in ipiv.iter_mut().zip(&piv) {
        *dst = (p - 1).max(0) as usize;
    }
    Ok(info)
}

pub(crate) fn getrs<T>(
    call: GetrsFn<T>,
    n: usize,
    nrhs: usize,
    a: &[T],
    lda: usize,
    ipiv: &[usize],
    b: &mut [T],
    ldb: usize,
) -> i32 {
    match kernels::check_getrs(n, nrhs, a, lda, ipiv, b, ldb) {
        0 => settle(run_getrs(call, n, nrhs, a, lda, ipiv, b, ldb)),
        info => info,
    }
}

fn run_getrs<T>(
    call: GetrsFn<T>,
    n: usize,
    nrhs: usize,
    a: &[T],
    lda: usize,
    ipiv: &[usize],
    b: &mut [T],
    ldb: usize,
) -> Result<i32, i32> {
    let (n32, nrhs32) = (narrow(n, 1)?, narrow(nrhs, 2)?);
    let (lda32, ldb32) = (narrow(lda, 4)?, narrow(ldb, 7)?);
    let piv = one_based(ipiv, n, 5)?;
    let mut info = 0;
    // SAFETY: buffer lengths were checked against n, nrhs and the leading dimensions
    unsafe { call(b'N', n32, nrhs32, a, lda32, &piv, b, ldb32, &mut info) };
    Ok(info)
}

pub(crate) fn getri<T>(
    call: GetriFn<T>,
    n: usize,
    a: &mut [T],
    lda: usize,
    ipiv: &[usize],
    work: &mut [T],
) -> i32 {
    match kernels::check_getri(n, a, lda, ipiv, work) {
        0 => settle(run_getri(call, n, a, lda, ipiv, work)),
        info => info,
    }
}

fn run_getri<T>(
    call: GetriFn<T>,
    n: usize,
    a: &mut [T],
    lda: usize,
    ipiv: &[usize],
    work: &mut [T],
) -> Result<i32, i32> {
    let (n32, lda32) = (narrow(n, 1)?, narrow(lda, 3)?);
    let piv = one_based(ipiv, n, 4)?;
    let lwork = i32::try_from(work.len()).unwrap_or(i32::MAX);
    let mut info = 0;
    // SAFETY: `work` holds at least `lwork >= max(1, n)` elements
    unsafe { call(n32, a, lda32, &piv, work, lwork, &mut info) };
    Ok(info)
}

pub(crate) fn potrf<T>(call: TriangleFn<T>, n: usize, a: &mut [T], lda: usize) -> i32 {
    triangle(call, n, a, lda)
}

pub(crate) fn potri<T>(call: TriangleFn<T>, n: usize, a: &mut [T], lda: usize) -> i32 {
    triangle(call, n, a, lda)
}

fn triangle<T>(call: TriangleFn<T>, n: usize, a: &mut [T], lda: usize) -> i32 {
    match kernels::check_triangle(n, a, lda) {
        0 => settle(run_triangle(call, n, a, lda)),
        info => info,
    }
}

fn run_triangle<T>(call: TriangleFn<T>, n: usize, a: &mut [T], lda: usize) -> Result<i32, i32> {
    let (n32, lda32) = (narrow(n, 1)?, narrow(lda, 3)?);
    let mut info = 0;
    // SAFETY: `a` holds the n x n upper triangle at leading dimension `lda`
    unsafe { call(b'U', n32, a, lda32, &mut info) };
    Ok(info)
}

/// Owned operands of one native expert solve.
///
/// LAPACK takes `a`, `af` and `b` mutably even with `fact = 'F'` and
/// `equed = 'N'`, so the caller's buffers are copied.
struct ExpertOperands<T, R> {
    n: i32,
    nrhs: i32,
    lda: i32,
    ldaf: i32,
    ldb: i32,
    ldx: i32,
    a: Vec<T>,
    af: Vec<T>,
    b: Vec<T>,
    ipiv: Vec<i32>,
    row_scale: Vec<R>,
    col_scale: Vec<R>,
}

impl<T: Copy, R: Zero + Clone> ExpertOperands<T, R> {
    fn new(
        n: usize,
        nrhs: usize,
        a: &[T],
        lda: usize,
        af: &[T],
        ldaf: usize,
        ipiv: &[usize],
        b: &[T],
        ldb: usize,
        ldx: usize,
    ) -> Result<Self, i32> {
        Ok(Self {
            n: narrow(n, 1)?,
            nrhs: narrow(nrhs, 2)?,
            lda: narrow(lda, 4)?,
            ldaf: narrow(ldaf, 6)?,
            ldb: narrow(ldb, 9)?,
            ldx: narrow(ldx, 11)?,
            a: a.to_vec(),
            af: af.to_vec(),
            b: b.to_vec(),
            ipiv: one_based(ipiv, n, 7)?,
            row_scale: vec![R::zero(); n.max(1)],
            col_scale: vec![R::zero(); n.max(1)],
        })
    }
}

/// Prechecks shared by both `?gesvx` flavors; `Some` is the final code.
fn expert_precheck<T: ComplexField>(
    n: usize,
    nrhs: usize,
    af: &[T],
    ldaf: usize,
    ferr: &mut [T::Real],
    berr: &mut [T::Real],
) -> Option<i32> {
    if n == 0 || nrhs == 0 {
        ferr[..nrhs].iter_mut().for_each(|e| *e = T::Real::zero());
        berr[..nrhs].iter_mut().for_each(|e| *e = T::Real::zero());
        return Some(0);
    }
    // With fact = 'F' LAPACK goes straight to the condition estimate
    match kernels::zero_pivot_code(n, af, ldaf) {
        0 => None,
        code => Some(code),
    }
}

/// Repack a native `?gesvx` info into the crate's diagnostic bands.
fn packed_code<T: ComplexField>(info: i32, n: usize, nrhs: usize, x: &[T], ldx: usize) -> i32 {
    let ill_conditioned = usize::try_from(info).is_ok_and(|i| i == n + 1);
    if info == 0 || ill_conditioned {
        if !kernels::solution_finite(n, nrhs, x, ldx) {
            return GENERAL_CODE_OFFSET + 1;
        }
        return if ill_conditioned {
            kernels::ill_conditioned_code(n)
        } else {
            0
        };
    }
    if (1..=SINGULAR_CODE_OFFSET).contains(&info) {
        return info;
    }
    log::warn!("native gesvx returned unexpected info {info}");
    GENERAL_CODE_OFFSET + 1
}

pub(crate) fn gesvx_real<T>(
    call: RealGesvxFn<T>,
    n: usize,
    nrhs: usize,
    a: &[T],
    lda: usize,
    af: &[T],
    ldaf: usize,
    ipiv: &[usize],
    b: &[T],
    ldb: usize,
    x: &mut [T],
    ldx: usize,
    ferr: &mut [T],
    berr: &mut [T],
    work: &mut [T],
    rwork: &mut [T],
) -> i32
where
    T: ComplexField<Real = T>,
{
    let info = kernels::check_gesvx(
        n, nrhs, a, lda, af, ldaf, ipiv, b, ldb, x, ldx, ferr, berr, work, rwork,
    );
    if info != 0 {
        return info;
    }
    if let Some(code) = expert_precheck::<T>(n, nrhs, af, ldaf, ferr, berr) {
        return code;
    }
    let mut ops = match ExpertOperands::<T, T>::new(n, nrhs, a, lda, af, ldaf, ipiv, b, ldb, ldx) {
        Ok(ops) => ops,
        Err(code) => return code,
    };

    let mut equed = b'N';
    let mut rcond = T::zero();
    let mut native_work = vec![T::zero(); 4 * n];
    let mut iwork = vec![0_i32; n];
    let mut info = 0;
    // SAFETY: every buffer was checked or allocated for n, nrhs and its leading dimension
    unsafe {
        call(
            b'F',
            b'N',
            ops.n,
            ops.nrhs,
            &mut ops.a,
            ops.lda,
            &mut ops.af,
            ops.ldaf,
            &mut ops.ipiv,
            &mut equed,
            &mut ops.row_scale,
            &mut ops.col_scale,
            &mut ops.b,
            ops.ldb,
            x,
            ops.ldx,
            &mut rcond,
            ferr,
            berr,
            &mut native_work,
            &mut iwork,
            &mut info,
        )
    };
    log::trace!("native gesvx: n = {n}, rcond = {rcond:?}, info = {info}");
    packed_code(info, n, nrhs, x, ldx)
}

pub(crate) fn gesvx_complex<T>(
    call: ComplexGesvxFn<T, T::Real>,
    n: usize,
    nrhs: usize,
    a: &[T],
    lda: usize,
    af: &[T],
    ldaf: usize,
    ipiv: &[usize],
    b: &[T],
    ldb: usize,
    x: &mut [T],
    ldx: usize,
    ferr: &mut [T::Real],
    berr: &mut [T::Real],
    work: &mut [T],
    rwork: &mut [T::Real],
) -> i32
where
    T: ComplexField,
{
    let info = kernels::check_gesvx(
        n, nrhs, a, lda, af, ldaf, ipiv, b, ldb, x, ldx, ferr, berr, work, rwork,
    );
    if info != 0 {
        return info;
    }
    if let Some(code) = expert_precheck::<T>(n, nrhs, af, ldaf, ferr, berr) {
        return code;
    }
    let mut ops =
        match ExpertOperands::<T, T::Real>::new(n, nrhs, a, lda, af, ldaf, ipiv, b, ldb, ldx) {
            Ok(ops) => ops,
            Err(code) => return code,
        };

    let mut equed = b'N';
    let mut rcond = T::Real::zero();
    let mut native_work = vec![T::zero(); 2 * n];
    let mut native_rwork = vec![T::Real::zero(); 2 * n];
    let mut info = 0;
    // SAFETY: every buffer was checked or allocated for n, nrhs and its leading dimension
    unsafe {
        call(
            b'F',
            b'N',
            ops.n,
            ops.nrhs,
            &mut ops.a,
            ops.lda,
            &mut ops.af,
            ops.ldaf,
            &mut ops.ipiv,
            &mut equed,
            &mut ops.row_scale,
            &mut ops.col_scale,
            &mut ops.b,
            ops.ldb,
            x,
            ops.ldx,
            &mut rcond,
            ferr,
            berr,
            &mut native_work,
            &mut native_rwork,
            &mut info,
        )
    };
    log::trace!("native gesvx: n = {n}, rcond = {rcond:?}, info = {info}");
    packed_code(info, n, nrhs, x, ldx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lapack::{gesvx_rwork_len, gesvx_work_len};
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    #[test]
    fn test_native_getrf_matches_kernel() {
        let a = vec![4.0_f64, 6.0, 3.0, 3.0];
        let mut native = a.clone();
        let mut fallback = a;
        let mut native_piv = vec![0; 2];
        let mut fallback_piv = vec![0; 2];

        assert_eq!(getrf(::lapack::dgetrf, 2, 2, &mut native, 2, &mut native_piv), 0);
        assert_eq!(kernels::getrf(2, 2, &mut fallback, 2, &mut fallback_piv), 0);
        assert_eq!(native_piv, fallback_piv);
        for (x, y) in native.iter().zip(&fallback) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_native_argument_positions_match_kernel() {
        let mut a = vec![1.0_f64; 4];
        let mut ipiv = vec![0; 2];
        assert_eq!(getrf(::lapack::dgetrf, 2, 2, &mut a, 1, &mut ipiv), -4);

        let mut work = vec![0.0; 1];
        assert_eq!(getri(::lapack::dgetri, 2, &mut a, 2, &[0, 1], &mut work), -5);
        assert_eq!(potrf(::lapack::dpotrf, 2, &mut a[..3], 2), -2);
    }

    #[test]
    fn test_native_getri_singular() {
        let mut a = vec![1.0_f64, 2.0, 2.0, 4.0];
        let mut ipiv = vec![0; 2];
        assert_eq!(getrf(::lapack::dgetrf, 2, 2, &mut a, 2, &mut ipiv), 2);
        let mut work = vec![0.0; 2];
        assert_eq!(getri(::lapack::dgetri, 2, &mut a, 2, &ipiv, &mut work), 2);
    }

    #[test]
    fn test_native_gesvx_packs_codes() {
        let d = 1.0 + 2.0 * f64::EPSILON;
        let a = vec![1.0_f64, 1.0, 1.0, d];
        let mut af = a.clone();
        let mut ipiv = vec![0; 2];
        assert_eq!(getrf(::lapack::dgetrf, 2, 2, &mut af, 2, &mut ipiv), 0);

        let b = vec![2.0, 2.0];
        let mut x = vec![0.0; 2];
        let mut ferr = vec![0.0; 1];
        let mut berr = vec![0.0; 1];
        let mut work = vec![0.0; gesvx_work_len(2)];
        let mut rwork = vec![0.0; gesvx_rwork_len(2)];
        let info = gesvx_real(
            ::lapack::dgesvx,
            2,
            1,
            &a,
            2,
            &af,
            2,
            &ipiv,
            &b,
            2,
            &mut x,
            2,
            &mut ferr,
            &mut berr,
            &mut work,
            &mut rwork,
        );
        assert_eq!(info, SINGULAR_CODE_OFFSET + 3);

        // Exactly zero U(2, 2)
        let singular = vec![1.0_f64, 2.0, 2.0, 4.0];
        let mut af = singular.clone();
        assert_eq!(getrf(::lapack::dgetrf, 2, 2, &mut af, 2, &mut ipiv), 2);
        let info = gesvx_real(
            ::lapack::dgesvx,
            2,
            1,
            &singular,
            2,
            &af,
            2,
            &ipiv,
            &b,
            2,
            &mut x,
            2,
            &mut ferr,
            &mut berr,
            &mut work,
            &mut rwork,
        );
        assert_eq!(info, 2);
    }

    #[test]
    fn test_native_complex_gesvx_solves() {
        let i = Complex64::new(0.0, 1.0);
        let one = Complex64::new(1.0, 0.0);
        // Column-major [[2, i], [-i, 3]]
        let a = vec![one * 2.0, -i, i, one * 3.0];
        let mut af = a.clone();
        let mut ipiv = vec![0; 2];
        assert_eq!(getrf(::lapack::zgetrf, 2, 2, &mut af, 2, &mut ipiv), 0);

        // b = A * [1, i]
        let b = vec![one * 2.0 + i * i, -i + i * 3.0];
        let mut x = vec![Complex64::new(0.0, 0.0); 2];
        let mut ferr = vec![0.0; 1];
        let mut berr = vec![0.0; 1];
        let mut work = vec![Complex64::new(0.0, 0.0); gesvx_work_len(2)];
        let mut rwork = vec![0.0; gesvx_rwork_len(2)];
        let info = gesvx_complex(
            ::lapack::zgesvx,
            2,
            1,
            &a,
            2,
            &af,
            2,
            &ipiv,
            &b,
            2,
            &mut x,
            2,
            &mut ferr,
            &mut berr,
            &mut work,
            &mut rwork,
        );
        assert_eq!(info, 0);
        assert_relative_eq!((x[0] - one).norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!((x[1] - i).norm(), 0.0, epsilon = 1e-12);
        assert!(ferr[0].is_finite());
        assert!(berr[0] < 1e-14);
    }
}
