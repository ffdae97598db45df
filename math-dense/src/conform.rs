//! Operand conformance checks
//!
//! Every kernel calls one of these before touching an element, so a shape
//! error never leaves a partially computed result behind.

use crate::error::{MatrixError, Result};
use ndarray::{ArrayBase, Data, Ix1, Ix2};

/// Require two vectors of equal length.
pub fn check_same_len<A, B, S1, S2>(
    op: &'static str,
    a: &ArrayBase<S1, Ix1>,
    b: &ArrayBase<S2, Ix1>,
) -> Result<()>
where
    S1: Data<Elem = A>,
    S2: Data<Elem = B>,
{
    if a.len() != b.len() {
        return Err(MatrixError::ShapeMismatch {
            op,
            lhs: vec![a.len()],
            rhs: vec![b.len()],
        });
    }
    Ok(())
}

/// Require two 3-vectors.
pub fn check_cross_operands<A, B, S1, S2>(
    a: &ArrayBase<S1, Ix1>,
    b: &ArrayBase<S2, Ix1>,
) -> Result<()>
where
    S1: Data<Elem = A>,
    S2: Data<Elem = B>,
{
    if a.len() != 3 || b.len() != 3 {
        return Err(MatrixError::ShapeMismatch {
            op: "cross_product (operands not in 3-space)",
            lhs: vec![a.len()],
            rhs: vec![b.len()],
        });
    }
    Ok(())
}

/// Require `lhs_cols == rhs_rows` for a product.
pub fn check_product_shape(op: &'static str, lhs: &[usize], rhs: &[usize]) -> Result<()> {
    let inner_lhs = lhs.last().copied().unwrap_or(0);
    let inner_rhs = rhs.first().copied().unwrap_or(0);
    if inner_lhs != inner_rhs {
        return Err(MatrixError::DimensionMismatch {
            op,
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        });
    }
    Ok(())
}

/// Require a square matrix.
pub fn check_square<A, S>(op: &'static str, a: &ArrayBase<S, Ix2>) -> Result<()>
where
    S: Data<Elem = A>,
{
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(MatrixError::NotSquare { op, rows, cols });
    }
    Ok(())
}
