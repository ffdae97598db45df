//! Error types for the dense kernels.
//!
//! Every failure is raised where it is detected and carries the shapes,
//! routine name or backend code needed to reproduce it.

use std::fmt;
use thiserror::Error;

/// Threshold separating the "argument" and "singular" bands of a packed
/// expert-solver code.
pub const SINGULAR_CODE_OFFSET: i32 = 10_000;

/// Threshold above which a packed expert-solver code means general trouble.
pub const GENERAL_CODE_OFFSET: i32 = 20_000;

/// Errors that can occur in the dense kernels.
#[derive(Debug, Error)]
pub enum MatrixError {
    /// Operand shapes are incompatible for an elementwise or reduction operation.
    #[error("{op}: shape mismatch between {lhs:?} and {rhs:?}")]
    ShapeMismatch {
        /// Operation that performed the check
        op: &'static str,
        /// Shape of the left operand
        lhs: Vec<usize>,
        /// Shape of the right operand
        rhs: Vec<usize>,
    },

    /// Operand shapes cannot be multiplied.
    #[error("{op}: multiplication of these matrix shapes is undefined ({lhs:?} x {rhs:?})")]
    DimensionMismatch {
        /// Operation that performed the check
        op: &'static str,
        /// Shape of the left operand
        lhs: Vec<usize>,
        /// Shape of the right operand
        rhs: Vec<usize>,
    },

    /// Operation requires a square matrix.
    #[error("{op}: matrix is not square ({rows} x {cols})")]
    NotSquare {
        /// Operation that performed the check
        op: &'static str,
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
    },

    /// LU factorization was given a non-square matrix.
    #[error("LU factorization requires a square matrix, got {rows} x {cols}")]
    Factorization {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
    },

    /// Rotation axis outside {0, 1, 2}.
    #[error("invalid rotation axis {axis} (must be 0, 1 or 2)")]
    InvalidAxis {
        /// The rejected axis
        axis: isize,
    },

    /// Backend routine rejected one of its arguments.
    #[error("{routine}: argument #{index} is illegal")]
    InvalidArgument {
        /// Backend routine name
        routine: &'static str,
        /// 1-based argument position
        index: usize,
    },

    /// Backend routine found an exactly zero diagonal entry of U.
    #[error("{routine}: returned U({index},{index}) is zero, i.e. singular")]
    SingularMatrix {
        /// Backend routine name
        routine: &'static str,
        /// 1-based position of the zero pivot
        index: usize,
    },

    /// Expert solver failed; `failure` is the decoded diagnostic.
    #[error("solver failed: {failure} (code {code})")]
    Solver {
        /// Decoded diagnostic
        failure: SolverFailure,
        /// Raw code reported by the backend
        code: i32,
    },

    /// Cholesky factorization found a non-positive leading minor.
    #[error("matrix is not positive definite: leading minor of order {index} is not positive")]
    NotPositiveDefinite {
        /// Order of the failing leading minor
        index: usize,
    },

    /// Configuration value out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong
        reason: String,
    },

    /// Buffer could not be reshaped into the requested matrix.
    #[error("layout error: {0}")]
    Layout(#[from] ndarray::ShapeError),
}

/// A specialized `Result` type for dense kernel operations.
pub type Result<T> = std::result::Result<T, MatrixError>;

impl MatrixError {
    /// Returns `true` for operand shape failures.
    ///
    /// This includes `ShapeMismatch`, `DimensionMismatch`, `NotSquare` and
    /// `Factorization`.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            MatrixError::ShapeMismatch { .. }
                | MatrixError::DimensionMismatch { .. }
                | MatrixError::NotSquare { .. }
                | MatrixError::Factorization { .. }
        )
    }

    /// Returns `true` when the failure means the matrix is (numerically) singular.
    pub fn is_singular(&self) -> bool {
        match self {
            MatrixError::SingularMatrix { .. } => true,
            MatrixError::Solver { failure, .. } => failure.is_singular(),
            _ => false,
        }
    }

    /// Returns `true` if the backend reported the error.
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            MatrixError::InvalidArgument { .. }
                | MatrixError::SingularMatrix { .. }
                | MatrixError::Solver { .. }
                | MatrixError::NotPositiveDefinite { .. }
        )
    }
}

/// Decoded expert-solver diagnostic.
///
/// The backend packs argument errors and singularity warnings into one
/// signed integer; [`SolverFailure::from_code`] is the only place that
/// integer is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverFailure {
    /// Argument at `index` (1-based) is bad.
    BadArgument {
        /// 1-based argument position
        index: usize,
    },
    /// Argument at `index` is bad and the matrix may also be singular to
    /// machine precision.
    BadArgumentPossiblySingular {
        /// 1-based argument position
        index: usize,
    },
    /// Matrix is singular to machine precision.
    SingularToPrecision,
    /// U(index, index) is exactly zero.
    SingularFactor {
        /// 1-based position of the zero pivot
        index: usize,
    },
    /// Any other computational failure.
    GeneralTrouble,
}

impl SolverFailure {
    /// Decode a packed backend code. Returns `None` for success (`0`).
    pub fn from_code(code: i32) -> Option<Self> {
        if code == 0 {
            return None;
        }
        // unsigned_abs avoids overflow on i32::MIN
        let magnitude = code.unsigned_abs() as usize;
        let singular = SINGULAR_CODE_OFFSET as usize;
        let general = GENERAL_CODE_OFFSET as usize;

        let failure = if code < 0 {
            if magnitude > general {
                SolverFailure::BadArgument {
                    index: magnitude - general,
                }
            } else if magnitude > singular {
                SolverFailure::BadArgumentPossiblySingular {
                    index: magnitude - singular,
                }
            } else {
                SolverFailure::BadArgument { index: magnitude }
            }
        } else if magnitude > general {
            SolverFailure::GeneralTrouble
        } else if magnitude > singular {
            SolverFailure::SingularToPrecision
        } else {
            SolverFailure::SingularFactor { index: magnitude }
        };
        Some(failure)
    }

    /// Returns `true` when the diagnostic involves singularity.
    pub fn is_singular(&self) -> bool {
        matches!(
            self,
            SolverFailure::BadArgumentPossiblySingular { .. }
                | SolverFailure::SingularToPrecision
                | SolverFailure::SingularFactor { .. }
        )
    }
}

impl fmt::Display for SolverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverFailure::BadArgument { index } => write!(f, "argument #{index} bad"),
            SolverFailure::BadArgumentPossiblySingular { index } => write!(
                f,
                "argument #{index} bad and matrix may be singular to machine precision"
            ),
            SolverFailure::SingularToPrecision => {
                write!(f, "matrix A is singular to machine precision")
            }
            SolverFailure::SingularFactor { index } => {
                write!(f, "factor U is singular at position ({index},{index})")
            }
            SolverFailure::GeneralTrouble => write!(f, "general computational trouble"),
        }
    }
}

/// Turn a packed expert-solver code into a `Result`.
pub(crate) fn check_solver_code(code: i32) -> Result<()> {
    match SolverFailure::from_code(code) {
        None => Ok(()),
        Some(failure) => Err(MatrixError::Solver { failure, code }),
    }
}
