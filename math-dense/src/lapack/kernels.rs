//! Generic column-major kernels behind the typed LAPACK entry points.
//!
//! Conventions follow LAPACK: element (i, j) of a matrix with leading
//! dimension `ld` lives at `i + j * ld`, the return value is `info`, and a
//! negative `info` is the 1-based position of the offending argument.
//! Pivot indices are 0-based.

use crate::error::{GENERAL_CODE_OFFSET, SINGULAR_CODE_OFFSET};
use crate::traits::ComplexField;
use num_traits::{Float, FromPrimitive, One, ToPrimitive, Zero};

/// Maximum number of iterative refinement steps in [`gesvx`].
pub const ITMAX: usize = 5;

#[inline(always)]
fn at(i: usize, j: usize, ld: usize) -> usize {
    i + j * ld
}

/// Minimum buffer length for a `rows x cols` matrix with leading dimension `ld`.
#[inline]
fn required_len(ld: usize, rows: usize, cols: usize) -> usize {
    if rows == 0 || cols == 0 {
        0
    } else {
        ld * (cols - 1) + rows
    }
}

fn pivots_valid(ipiv: &[usize], n: usize) -> bool {
    ipiv.len() >= n && ipiv[..n].iter().all(|&p| p < n)
}

/// Argument check for [`getrf`]: 4 `lda`, 3 `a`, 5 `ipiv`.
pub(crate) fn check_getrf<T>(m: usize, n: usize, a: &[T], lda: usize, ipiv: &[usize]) -> i32 {
    if lda < m.max(1) {
        return -4;
    }
    if a.len() < required_len(lda, m, n) {
        return -3;
    }
    if ipiv.len() < m.min(n) {
        return -5;
    }
    0
}

/// Argument check for [`getrs`].
pub(crate) fn check_getrs<T>(
    n: usize,
    nrhs: usize,
    a: &[T],
    lda: usize,
    ipiv: &[usize],
    b: &[T],
    ldb: usize,
) -> i32 {
    if lda < n.max(1) {
        return -4;
    }
    if a.len() < required_len(lda, n, n) {
        return -3;
    }
    if !pivots_valid(ipiv, n) {
        return -5;
    }
    if ldb < n.max(1) {
        return -7;
    }
    if b.len() < required_len(ldb, n, nrhs) {
        return -6;
    }
    0
}

/// Argument check for [`getri`].
pub(crate) fn check_getri<T>(n: usize, a: &[T], lda: usize, ipiv: &[usize], work: &[T]) -> i32 {
    if lda < n.max(1) {
        return -3;
    }
    if a.len() < required_len(lda, n, n) {
        return -2;
    }
    if !pivots_valid(ipiv, n) {
        return -4;
    }
    if work.len() < n.max(1) {
        return -5;
    }
    0
}

/// Argument check for [`gesvx`], positions as documented there.
pub(crate) fn check_gesvx<T, R>(
    n: usize,
    nrhs: usize,
    a: &[T],
    lda: usize,
    af: &[T],
    ldaf: usize,
    ipiv: &[usize],
    b: &[T],
    ldb: usize,
    x: &[T],
    ldx: usize,
    ferr: &[R],
    berr: &[R],
    work: &[T],
    rwork: &[R],
) -> i32 {
    if lda < n.max(1) {
        return -4;
    }
    if a.len() < required_len(lda, n, n) {
        return -3;
    }
    if ldaf < n.max(1) {
        return -6;
    }
    if af.len() < required_len(ldaf, n, n) {
        return -5;
    }
    if !pivots_valid(ipiv, n) {
        return -7;
    }
    if ldb < n.max(1) {
        return -9;
    }
    if b.len() < required_len(ldb, n, nrhs) {
        return -8;
    }
    if ldx < n.max(1) {
        return -11;
    }
    if x.len() < required_len(ldx, n, nrhs) {
        return -10;
    }
    if ferr.len() < nrhs {
        return -12;
    }
    if berr.len() < nrhs {
        return -13;
    }
    if work.len() < gesvx_work_len(n) {
        return -14;
    }
    if rwork.len() < gesvx_rwork_len(n) {
        return -15;
    }
    0
}

/// Argument check shared by the Cholesky routines: 3 `lda`, 2 `a`.
pub(crate) fn check_triangle<T>(n: usize, a: &[T], lda: usize) -> i32 {
    if lda < n.max(1) {
        return -3;
    }
    if a.len() < required_len(lda, n, n) {
        return -2;
    }
    0
}

/// Packed code for the first exactly zero `U(i, i)` in `af`, or 0.
pub(crate) fn zero_pivot_code<T: ComplexField>(n: usize, af: &[T], ldaf: usize) -> i32 {
    match (0..n).find(|&i| af[at(i, i, ldaf)].is_zero()) {
        None => 0,
        Some(i) => match i32::try_from(i + 1) {
            Ok(index) if index <= SINGULAR_CODE_OFFSET => index,
            _ => GENERAL_CODE_OFFSET + 1,
        },
    }
}

/// LU factorization with partial pivoting: P * A = L * U.
///
/// `ipiv[k]` is the row interchanged with row k at step k. A column with no
/// non-zero pivot candidate is skipped and reported through `info > 0`
/// (first such column, 1-based); the factorization still completes.
pub(crate) fn getrf<T: ComplexField>(
    m: usize,
    n: usize,
    a: &mut [T],
    lda: usize,
    ipiv: &mut [usize],
) -> i32 {
    let info = check_getrf(m, n, a, lda, ipiv);
    if info != 0 {
        return info;
    }

    let min_mn = m.min(n);
    let mut info = 0;
    for k in 0..min_mn {
        // Find pivot: max |A[i, k]| for i in k..m
        let mut max_row = k;
        let mut max_val = a[at(k, k, lda)].abs1();
        for i in (k + 1)..m {
            let val = a[at(i, k, lda)].abs1();
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }
        ipiv[k] = max_row;

        if max_val.is_zero() {
            if info == 0 {
                info = (k + 1) as i32;
            }
            continue;
        }

        if max_row != k {
            for j in 0..n {
                a.swap(at(k, j, lda), at(max_row, j, lda));
            }
        }

        // Multipliers, stored in the L part
        let inv_pivot = a[at(k, k, lda)].inv();
        for i in (k + 1)..m {
            a[at(i, k, lda)] *= inv_pivot;
        }

        // Trailing update, column by column so the inner loop is contiguous
        for j in (k + 1)..n {
            let ukj = a[at(k, j, lda)];
            if ukj.is_zero() {
                continue;
            }
            for i in (k + 1)..m {
                let lik = a[at(i, k, lda)];
                a[at(i, j, lda)] -= lik * ukj;
            }
        }
    }

    info
}

/// Solve A * X = B in place in `b` from the factors produced by [`getrf`].
pub(crate) fn getrs<T: ComplexField>(
    n: usize,
    nrhs: usize,
    a: &[T],
    lda: usize,
    ipiv: &[usize],
    b: &mut [T],
    ldb: usize,
) -> i32 {
    let info = check_getrs(n, nrhs, a, lda, ipiv, b, ldb);
    if info != 0 {
        return info;
    }

    for k in 0..n {
        let p = ipiv[k];
        if p != k {
            for j in 0..nrhs {
                b.swap(at(k, j, ldb), at(p, j, ldb));
            }
        }
    }

    for j in 0..nrhs {
        // Forward substitution with unit lower L
        for k in 0..n {
            let bk = b[at(k, j, ldb)];
            if bk.is_zero() {
                continue;
            }
            for i in (k + 1)..n {
                b[at(i, j, ldb)] -= bk * a[at(i, k, lda)];
            }
        }

        // Backward substitution with U
        for k in (0..n).rev() {
            if b[at(k, j, ldb)].is_zero() {
                continue;
            }
            b[at(k, j, ldb)] /= a[at(k, k, lda)];
            let bk = b[at(k, j, ldb)];
            for i in 0..k {
                b[at(i, j, ldb)] -= bk * a[at(i, k, lda)];
            }
        }
    }

    0
}

/// In-place inverse of the upper triangle of `a` (non-unit diagonal).
///
/// Returns `i` (1-based) when `U(i, i)` is exactly zero; `a` is then
/// left untouched.
pub(crate) fn trtri_upper<T: ComplexField>(n: usize, a: &mut [T], lda: usize) -> i32 {
    for j in 0..n {
        if a[at(j, j, lda)].is_zero() {
            return (j + 1) as i32;
        }
    }

    for j in 0..n {
        let diag = a[at(j, j, lda)].inv();
        a[at(j, j, lda)] = diag;
        let ajj = -diag;

        // x := T * x where T is the already inverted leading j x j block
        // and x is column j above the diagonal
        for jj in 0..j {
            let temp = a[at(jj, j, lda)];
            if temp.is_zero() {
                continue;
            }
            for i in 0..jj {
                let t_ijj = a[at(i, jj, lda)];
                a[at(i, j, lda)] += temp * t_ijj;
            }
            a[at(jj, j, lda)] = temp * a[at(jj, jj, lda)];
        }
        for i in 0..j {
            a[at(i, j, lda)] *= ajj;
        }
    }

    0
}

/// Inverse of a matrix from its [`getrf`] factors, in place.
///
/// `work` must hold at least `max(1, n)` elements.
pub(crate) fn getri<T: ComplexField>(
    n: usize,
    a: &mut [T],
    lda: usize,
    ipiv: &[usize],
    work: &mut [T],
) -> i32 {
    let info = check_getri(n, a, lda, ipiv, work);
    if info != 0 {
        return info;
    }
    if n == 0 {
        return 0;
    }

    let info = trtri_upper(n, a, lda);
    if info > 0 {
        return info;
    }

    // Solve inv(A) * L = inv(U) for inv(A), last column first
    for j in (0..n).rev() {
        for i in (j + 1)..n {
            work[i] = a[at(i, j, lda)];
            a[at(i, j, lda)] = T::zero();
        }
        for k in (j + 1)..n {
            let w = work[k];
            if w.is_zero() {
                continue;
            }
            for i in 0..n {
                let aik = a[at(i, k, lda)];
                a[at(i, j, lda)] -= aik * w;
            }
        }
    }

    // Undo the row interchanges as column interchanges, in reverse
    for j in (0..n.saturating_sub(1)).rev() {
        let jp = ipiv[j];
        if jp != j {
            for i in 0..n {
                a.swap(at(i, j, lda), at(i, jp, lda));
            }
        }
    }

    0
}

/// Length of the `work` buffer [`gesvx`] needs for order `n`.
pub(crate) fn gesvx_work_len(n: usize) -> usize {
    n * n + 2 * n
}

/// Length of the `rwork` buffer [`gesvx`] needs for order `n`.
pub(crate) fn gesvx_rwork_len(n: usize) -> usize {
    n
}

/// Matrix 1-norm: max column sum of moduli.
fn norm1<T: ComplexField>(n: usize, a: &[T], lda: usize) -> T::Real {
    let mut best = T::Real::zero();
    for j in 0..n {
        let mut sum = T::Real::zero();
        for i in 0..n {
            sum += a[at(i, j, lda)].norm();
        }
        if sum > best || sum.is_nan() {
            best = sum;
        }
    }
    best
}

/// Expert solve of A * X = B with prefactored `af`, error bounds per column.
///
/// Argument positions: 1 `n`, 2 `nrhs`, 3 `a`, 4 `lda`, 5 `af`, 6 `ldaf`,
/// 7 `ipiv`, 8 `b`, 9 `ldb`, 10 `x`, 11 `ldx`, 12 `ferr`, 13 `berr`,
/// 14 `work`, 15 `rwork`.
///
/// Positive codes use the packed bands of [`crate::error::SolverFailure`]:
/// `i` for an exactly zero `U(i, i)`, above `SINGULAR_CODE_OFFSET` when the
/// reciprocal condition number is below machine epsilon, above
/// `GENERAL_CODE_OFFSET` for a non-finite solution. On a positive code `x`,
/// `ferr` and `berr` hold whatever was computed so far.
pub(crate) fn gesvx<T: ComplexField>(
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
) -> i32 {
    let info = check_gesvx(
        n, nrhs, a, lda, af, ldaf, ipiv, b, ldb, x, ldx, ferr, berr, work, rwork,
    );
    if info != 0 {
        return info;
    }

    let zero = T::Real::zero();
    if n == 0 || nrhs == 0 {
        ferr[..nrhs].iter_mut().for_each(|e| *e = zero);
        berr[..nrhs].iter_mut().for_each(|e| *e = zero);
        return 0;
    }

    let info = zero_pivot_code(n, af, ldaf);
    if info != 0 {
        return info;
    }

    let (inv, rest) = work.split_at_mut(n * n);
    let (resid, scratch) = rest.split_at_mut(n);

    // Explicit inverse: drives the condition estimate and the forward bound
    for j in 0..n {
        for i in 0..n {
            inv[at(i, j, n)] = af[at(i, j, ldaf)];
        }
    }
    if getri(n, inv, n, ipiv, scratch) != 0 {
        return GENERAL_CODE_OFFSET + 1;
    }

    let anorm = norm1(n, a, lda);
    let ainvnorm = norm1(n, inv, n);
    let mut rcond = if anorm.is_zero() || ainvnorm.is_zero() {
        zero
    } else {
        T::Real::one() / anorm / ainvnorm
    };
    if !rcond.is_finite() {
        rcond = zero;
    }

    // Initial solution
    for j in 0..nrhs {
        for i in 0..n {
            x[at(i, j, ldx)] = b[at(i, j, ldb)];
        }
    }
    let info = getrs(n, nrhs, af, ldaf, ipiv, x, ldx);
    if info != 0 {
        return GENERAL_CODE_OFFSET + 1;
    }

    let eps = T::Real::epsilon();
    let nz = T::Real::from_usize(n + 1).unwrap_or_else(T::Real::max_value);
    let safe1 = nz * T::Real::min_positive_value();
    let safe2 = safe1 / eps;
    let two = T::Real::one() + T::Real::one();

    for j in 0..nrhs {
        let mut count = 1;
        let mut lstres = two + T::Real::one();

        loop {
            // resid = b - A x, rwork = |b| + |A| |x|
            for i in 0..n {
                let bi = b[at(i, j, ldb)];
                resid[i] = bi;
                rwork[i] = bi.abs1();
            }
            for k in 0..n {
                let xk = x[at(k, j, ldx)];
                let xk_abs = xk.abs1();
                for i in 0..n {
                    let aik = a[at(i, k, lda)];
                    resid[i] -= aik * xk;
                    rwork[i] += aik.abs1() * xk_abs;
                }
            }

            let mut s = zero;
            for i in 0..n {
                let ratio = if rwork[i] > safe2 {
                    resid[i].abs1() / rwork[i]
                } else {
                    (resid[i].abs1() + safe1) / (rwork[i] + safe1)
                };
                if ratio > s {
                    s = ratio;
                }
            }
            berr[j] = s;

            if s > eps && two * s <= lstres && count <= ITMAX {
                if getrs(n, 1, af, ldaf, ipiv, resid, n) != 0 {
                    return GENERAL_CODE_OFFSET + 1;
                }
                for i in 0..n {
                    x[at(i, j, ldx)] += resid[i];
                }
                lstres = s;
                count += 1;
            } else {
                break;
            }
        }

        log::debug!(
            "gesvx: column {} refined in {} step(s), berr = {:.3e}",
            j,
            count - 1,
            berr[j].to_f64().unwrap_or(f64::NAN)
        );

        // Forward bound: || |inv(A)| (|r| + nz*eps*(|A||x| + |b|)) || / ||x||
        for i in 0..n {
            rwork[i] = resid[i].abs1() + nz * eps * rwork[i];
        }
        let mut bound = zero;
        let mut xnorm = zero;
        for i in 0..n {
            let mut sum = zero;
            for k in 0..n {
                sum += inv[at(i, k, n)].abs1() * rwork[k];
            }
            if sum > bound {
                bound = sum;
            }
            let xi = x[at(i, j, ldx)].abs1();
            if xi > xnorm {
                xnorm = xi;
            }
        }
        ferr[j] = if xnorm.is_zero() { bound } else { bound / xnorm };
    }

    if !solution_finite(n, nrhs, x, ldx) {
        return GENERAL_CODE_OFFSET + 1;
    }
    if rcond < eps {
        return ill_conditioned_code(n);
    }

    0
}

/// True when every entry of the `n x nrhs` solution is finite.
pub(crate) fn solution_finite<T: ComplexField>(n: usize, nrhs: usize, x: &[T], ldx: usize) -> bool {
    (0..nrhs).all(|j| (0..n).all(|i| x[at(i, j, ldx)].is_finite()))
}

/// Packed code for a solution whose reciprocal condition number is below
/// machine epsilon.
pub(crate) fn ill_conditioned_code(n: usize) -> i32 {
    let band = (n + 1).min(SINGULAR_CODE_OFFSET as usize) as i32;
    SINGULAR_CODE_OFFSET + band
}

/// Cholesky factorization A = U^H * U of a Hermitian positive definite
/// matrix; only the upper triangle of `a` is referenced and overwritten.
///
/// Returns `j` (1-based) when the leading minor of order `j` is not
/// positive.
pub(crate) fn potrf_upper<T: ComplexField>(n: usize, a: &mut [T], lda: usize) -> i32 {
    let info = check_triangle(n, a, lda);
    if info != 0 {
        return info;
    }

    for j in 0..n {
        let mut ajj = a[at(j, j, lda)].re();
        for k in 0..j {
            ajj -= a[at(k, j, lda)].norm_sqr();
        }
        if ajj <= T::Real::zero() || ajj.is_nan() {
            a[at(j, j, lda)] = T::from_real(ajj);
            return (j + 1) as i32;
        }
        let ajj = ajj.sqrt();
        a[at(j, j, lda)] = T::from_real(ajj);

        let scale = T::from_real(T::Real::one() / ajj);
        for jj in (j + 1)..n {
            let mut s = a[at(j, jj, lda)];
            for k in 0..j {
                s -= a[at(k, j, lda)].conj() * a[at(k, jj, lda)];
            }
            a[at(j, jj, lda)] = s * scale;
        }
    }

    0
}

/// Inverse from the [`potrf_upper`] factor: upper triangle of inv(U) * inv(U)^H.
pub(crate) fn potri_upper<T: ComplexField>(n: usize, a: &mut [T], lda: usize) -> i32 {
    let info = check_triangle(n, a, lda);
    if info != 0 {
        return info;
    }

    let info = trtri_upper(n, a, lda);
    if info > 0 {
        return info;
    }

    // Row i of the product only reads rows >= i, so ascending rows are safe
    for i in 0..n {
        for j in i..n {
            let mut sum = T::zero();
            for k in j..n {
                sum += a[at(i, k, lda)] * a[at(j, k, lda)].conj();
            }
            a[at(i, j, lda)] = sum;
        }
    }

    0
}
