//! Tuning parameters for the dense kernels

use crate::error::{MatrixError, Result};
use serde::{Deserialize, Serialize};

/// Block size the inversion workspace is sized for (`block_size * n` elements).
pub const BLOCKSIZE: usize = 64;

/// Largest accepted `block_size`.
pub const MAX_BLOCK_SIZE: usize = 4096;

/// Minimum number of result rows before the matrix product goes parallel.
pub const PARALLEL_MIN_ROWS: usize = 64;

/// Dense kernel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseConfig {
    /// Workspace block size for the triangular inverse
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Row count from which matrix products are computed in parallel
    #[serde(default = "default_parallel_min_rows")]
    pub parallel_min_rows: usize,
}

fn default_block_size() -> usize {
    BLOCKSIZE
}

fn default_parallel_min_rows() -> usize {
    PARALLEL_MIN_ROWS
}

impl Default for DenseConfig {
    fn default() -> Self {
        Self {
            block_size: BLOCKSIZE,
            parallel_min_rows: PARALLEL_MIN_ROWS,
        }
    }
}

impl DenseConfig {
    /// Check that every field is usable.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(MatrixError::InvalidConfig {
                reason: "block_size must be > 0".to_string(),
            });
        }
        if self.block_size > MAX_BLOCK_SIZE {
            return Err(MatrixError::InvalidConfig {
                reason: format!(
                    "block_size must be <= {MAX_BLOCK_SIZE}, got {}",
                    self.block_size
                ),
            });
        }
        Ok(())
    }

    /// Workspace length for inverting an n x n matrix.
    ///
    /// Fails with `InvalidConfig` when `block_size * n` does not fit in `usize`.
    pub fn inverse_work_len(&self, n: usize) -> Result<usize> {
        self.block_size
            .checked_mul(n)
            .map(|len| len.max(1))
            .ok_or_else(|| MatrixError::InvalidConfig {
                reason: format!(
                    "workspace for n = {n} overflows with block_size {}",
                    self.block_size
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DenseConfig::default();
        assert_eq!(config.block_size, 64);
        assert!(config.validate().is_ok());
        assert_eq!(config.inverse_work_len(10).unwrap(), 640);
        assert_eq!(config.inverse_work_len(0).unwrap(), 1);
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let config = DenseConfig {
            block_size: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, MatrixError::InvalidConfig { .. }));
    }

    #[test]
    fn test_oversized_block_size_rejected() {
        let config: DenseConfig =
            serde_json::from_str(r#"{ "block_size": 9223372036854775807 }"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(MatrixError::InvalidConfig { .. })
        ));
        assert!(matches!(
            config.inverse_work_len(4),
            Err(MatrixError::InvalidConfig { .. })
        ));

        let edge = DenseConfig {
            block_size: MAX_BLOCK_SIZE,
            ..Default::default()
        };
        assert!(edge.validate().is_ok());
        assert!(matches!(
            edge.inverse_work_len(usize::MAX),
            Err(MatrixError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config: DenseConfig = serde_json::from_str(r#"{ "block_size": 32 }"#).unwrap();
        assert_eq!(config.block_size, 32);
        assert_eq!(config.parallel_min_rows, PARALLEL_MIN_ROWS);

        let json = serde_json::to_string(&DenseConfig::default()).unwrap();
        let back: DenseConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DenseConfig::default());
    }
}
