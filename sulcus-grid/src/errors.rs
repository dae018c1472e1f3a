//! Error types for the grid provider.

use thiserror::Error;

/// Errors raised while building grid masks or binding p-values to them.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GridError {
    /// A grid dimension was zero.
    #[error("grid dimension {axis} is zero")]
    ZeroDimension {
        /// Zero-based axis index (0 = x, 1 = y, 2 = z).
        axis: usize,
    },
    /// The mask flags do not cover the grid.
    #[error("mask has {got} entries but the grid holds {expected} cells")]
    MaskLengthMismatch {
        /// Cells in the grid.
        expected: usize,
        /// Entries supplied by the caller.
        got: usize,
    },
    /// The p-value vector does not cover the in-mask voxels.
    #[error("{got} p-values supplied but the mask holds {expected} voxels")]
    PValueCountMismatch {
        /// In-mask voxels.
        expected: usize,
        /// P-values supplied by the caller.
        got: usize,
    },
}
