//! Linear system solve with error bounds
//!
//! Every entry point ends in the backend expert driver (`gesvx`), which
//! refines the solution and reports a forward and a backward error bound
//! per right-hand side. Its packed diagnostic is decoded before returning.

use super::lu::LuDecomposition;
use crate::conform::check_product_shape;
use crate::error::{Result, check_solver_code};
use crate::lapack::{Lapack, from_col_major, gesvx_rwork_len, gesvx_work_len, to_col_major};
use crate::traits::ComplexField;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use num_traits::Zero;

/// Solution of A x = y
#[derive(Debug, Clone)]
pub struct Solution<T: ComplexField> {
    /// Solution vector
    pub x: Array1<T>,
    /// Estimated bound on ||x - x_true||_inf / ||x||_inf
    pub forward_error: T::Real,
    /// Componentwise relative backward error
    pub backward_error: T::Real,
}

/// Solution of A X = B, one error bound pair per column of B
#[derive(Debug, Clone)]
pub struct MultiSolution<T: ComplexField> {
    /// Solution matrix, same shape as B
    pub x: Array2<T>,
    /// Forward error bound per right-hand side
    pub forward_errors: Array1<T::Real>,
    /// Backward error per right-hand side
    pub backward_errors: Array1<T::Real>,
}

/// Solve A x = y for a single right-hand side.
pub fn solve<T, S1, S2>(a: &ArrayBase<S1, Ix2>, y: &ArrayBase<S2, Ix1>) -> Result<Solution<T>>
where
    T: Lapack,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    let b = y.view().insert_axis(Axis(1));
    let multi = solve_multi(a, &b)?;
    Ok(Solution {
        x: multi.x.column(0).to_owned(),
        forward_error: multi.forward_errors[0],
        backward_error: multi.backward_errors[0],
    })
}

/// Solve A X = B, factoring a copy of A first.
///
/// B must have as many rows as A has columns; this is checked before the
/// factorization is paid for.
pub fn solve_multi<T, S1, S2>(
    a: &ArrayBase<S1, Ix2>,
    b: &ArrayBase<S2, Ix2>,
) -> Result<MultiSolution<T>>
where
    T: Lapack,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    check_product_shape("solve", a.shape(), b.shape())?;
    let lu = LuDecomposition::new(a)?;
    expert_solve(a, &lu, b)
}

/// Solve A X = B from an existing factorization.
///
/// A is rebuilt as P * L * U for the residuals of the refinement step.
pub fn solve_lu<T, S>(lu: &LuDecomposition<T>, b: &ArrayBase<S, Ix2>) -> Result<MultiSolution<T>>
where
    T: Lapack,
    S: Data<Elem = T>,
{
    check_product_shape("solve", &[lu.rows(), lu.cols()], b.shape())?;
    let a = lu.reconstruct()?;
    expert_solve(&a, lu, b)
}

/// B has already been checked against A by the caller.
fn expert_solve<T, S1, S2>(
    a: &ArrayBase<S1, Ix2>,
    lu: &LuDecomposition<T>,
    b: &ArrayBase<S2, Ix2>,
) -> Result<MultiSolution<T>>
where
    T: Lapack,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    let n = lu.rows();
    let nrhs = b.ncols();
    let ld = n.max(1);
    log::debug!("expert solve: n = {n}, nrhs = {nrhs}");

    let a_buf = to_col_major(a);
    let b_buf = to_col_major(b);
    let mut x = vec![T::zero(); n * nrhs];
    let mut ferr = vec![T::Real::zero(); nrhs];
    let mut berr = vec![T::Real::zero(); nrhs];
    let mut work = vec![T::zero(); gesvx_work_len(n)];
    let mut rwork = vec![T::Real::zero(); gesvx_rwork_len(n)];

    let code = T::gesvx(
        n,
        nrhs,
        &a_buf,
        ld,
        lu.factors(),
        ld,
        lu.pivots(),
        &b_buf,
        ld,
        &mut x,
        ld,
        &mut ferr,
        &mut berr,
        &mut work,
        &mut rwork,
    );
    check_solver_code(code)?;

    Ok(MultiSolution {
        x: from_col_major(n, nrhs, x)?,
        forward_errors: Array1::from_vec(ferr),
        backward_errors: Array1::from_vec(berr),
    })
}
