//! Dense linear-algebra kernels
//!
//! This crate provides the dense primitives higher-level numerical code is
//! built on: products, transposition, LU-based inversion and determinant,
//! and an expert linear solver reporting forward and backward error bounds.
//!
//! # Features
//!
//! - **Vector Reductions**: inner product, norm, cross product
//! - **Products**: matrix x vector, vector x row, matrix x matrix (parallel rows with `native`)
//! - **Direct Methods**: LU decomposition, inverse, determinant, expert solve, Cholesky inverse
//! - **Backend**: LAPACK-style `getrf`/`getrs`/`getri`/`gesvx`/`potrf`/`potri` in pure Rust,
//!   or the system LAPACK with the `lapack` feature (`openblas` / `netlib` select the provider)
//! - **Generic Scalar Types**: Works with Complex64, Complex32, f64, f32
//!
//! # Example
//!
//! ```
//! use math_dense::{determinant, inverse, solve};
//! use ndarray::array;
//!
//! let a = array![[4.0_f64, 3.0], [6.0, 3.0]];
//! let inv = inverse(&a).unwrap();
//! assert!((inv[[0, 0]] + 0.5).abs() < 1e-12);
//! assert!((determinant(&a).unwrap() + 6.0).abs() < 1e-12);
//!
//! let sol = solve(&a, &array![10.0, 12.0]).unwrap();
//! assert!((sol.x[1] - 2.0).abs() < 1e-12);
//! ```

#[cfg(feature = "lapack")]
extern crate lapack_src as _;

pub mod config;
pub mod conform;
pub mod direct;
pub mod error;
pub mod lapack;
pub mod parallel;
pub mod product;
pub mod rotation;
pub mod traits;
pub mod vector;

pub use config::{BLOCKSIZE, DenseConfig, MAX_BLOCK_SIZE, PARALLEL_MIN_ROWS};
pub use error::{MatrixError, Result, SolverFailure};
pub use lapack::Lapack;
pub use traits::ComplexField;

// Re-export kernels
pub use direct::{
    LuDecomposition, MultiSolution, Solution, determinant, determinant_lu, inverse, inverse_lu,
    inverse_lu_with, invert_sym_pos_def, invert_with_determinant, solve, solve_lu, solve_multi,
};
#[allow(deprecated)]
pub use product::{cayley_product, outer_product_mv, outer_product_vm};
pub use product::{
    adjoint, direct_product, identity, product, product_mv, product_vm, product_with, transpose,
};
pub use rotation::rot3d;
pub use vector::{cross_product, inner_product, inner_product_conj, norm, vector_norm};
