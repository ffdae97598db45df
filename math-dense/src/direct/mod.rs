//! Direct methods for dense matrices
//!
//! This module provides the factorization-based kernels:
//! - [`LuDecomposition`]: LU decomposition with partial pivoting
//! - [`inverse`] / [`inverse_lu`]: inversion through `getri`
//! - [`determinant`]: product of the U diagonal with the pivot sign
//! - [`solve`] / [`solve_multi`]: expert solve with error bounds
//! - [`invert_sym_pos_def`]: Cholesky inversion for SPD systems

mod determinant;
mod inverse;
mod lu;
mod solve;

pub use determinant::{determinant, determinant_lu};
pub use inverse::{
    inverse, inverse_lu, inverse_lu_with, invert_sym_pos_def, invert_with_determinant,
};
pub use lu::LuDecomposition;
pub use solve::{MultiSolution, Solution, solve, solve_lu, solve_multi};
