//! Axis-aligned 3D rotation matrices

use crate::error::{MatrixError, Result};
use ndarray::Array2;
use num_traits::Float;

/// Right-handed rotation by `angle` (radians) about Cartesian axis `axis`.
///
/// With `i = (axis + 1) % 3` and `j = (axis + 2) % 3` the matrix is the
/// identity except for `R[i][i] = R[j][j] = cos`, `R[j][i] = sin` and
/// `R[i][j] = -sin`. Fails with `InvalidAxis` unless `axis` is 0, 1 or 2.
pub fn rot3d<T: Float>(axis: isize, angle: T) -> Result<Array2<T>> {
    if !(0..3).contains(&axis) {
        return Err(MatrixError::InvalidAxis { axis });
    }
    let k = axis as usize;
    let i = (k + 1) % 3;
    let j = (k + 2) % 3;
    let (sin, cos) = angle.sin_cos();

    let mut rot = Array2::zeros((3, 3));
    rot[[k, k]] = T::one();
    rot[[i, i]] = cos;
    rot[[j, j]] = cos;
    rot[[j, i]] = sin;
    rot[[i, j]] = -sin;
    Ok(rot)
}
