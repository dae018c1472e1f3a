//! Error types for the ARI core.
//!
//! Defines the error enums exposed by the public API and a convenient result
//! alias. Every variant maps to a stable machine-readable code suitable for
//! logging surfaces.

use std::{fmt, sync::Arc};

use thiserror::Error;

/// A single rule violated by the construction inputs.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InputViolation {
    /// The statistical map contained no voxels.
    #[error("the statistical map contains no voxels")]
    EmptyMap,
    /// The family-wise error level must lie strictly inside (0, 1).
    #[error("alpha {alpha} is outside the open interval (0, 1)")]
    AlphaOutOfRange {
        /// Level supplied by the caller.
        alpha: f64,
    },
    /// A p-value fell outside [0, 1].
    #[error("p-value {value} at voxel {voxel} is outside [0, 1]")]
    PValueOutOfRange {
        /// Voxel carrying the offending value.
        voxel: usize,
        /// The offending p-value.
        value: f64,
    },
    /// A caller-provided sorting order was not a permutation of the voxels.
    #[error("sorting order is not a permutation of 0..{expected}")]
    OrderNotPermutation {
        /// Number of voxels the permutation must cover.
        expected: usize,
    },
    /// A caller-provided sorting order did not sort the p-values.
    #[error("sorting order does not sort p-values at position {position}")]
    OrderNotSorted {
        /// First position where the ordered p-values decrease.
        position: usize,
    },
    /// The statistical map failed to yield an in-bounds voxel.
    #[error("the statistical map failed to yield voxel {voxel}")]
    SourceFailure {
        /// Voxel the source refused to serve.
        voxel: usize,
    },
    /// An adjacency list referenced a voxel outside the map.
    #[error("voxel {voxel} lists neighbour {neighbour}, but the map has {len} voxels")]
    NeighbourOutOfBounds {
        /// Voxel whose neighbour list is invalid.
        voxel: usize,
        /// The out-of-bounds neighbour id.
        neighbour: usize,
        /// Number of voxels in the map.
        len: usize,
    },
}

/// Stable codes describing [`AriError`] variants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum AriErrorCode {
    /// Construction input failed validation.
    InvalidInput,
    /// A p-value was not a finite number.
    Numeric,
    /// No admissible supra-threshold clusters exist.
    EmptyAdmissible,
    /// The voxel lies in no cluster of the supplied answer set.
    NoSuchCluster,
    /// The requested TDP change was outside the accepted range.
    OutOfRange,
    /// The requested TDP change cannot be attained.
    NoFurtherChange,
}

impl AriErrorCode {
    /// Return the stable machine-readable representation of this error code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "ARI_INVALID_INPUT",
            Self::Numeric => "ARI_NUMERIC",
            Self::EmptyAdmissible => "ARI_EMPTY_ADMISSIBLE",
            Self::NoSuchCluster => "ARI_NO_SUCH_CLUSTER",
            Self::OutOfRange => "ARI_OUT_OF_RANGE",
            Self::NoFurtherChange => "ARI_NO_FURTHER_CHANGE",
        }
    }
}

impl fmt::Display for AriErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type produced when constructing or querying an ARI engine.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AriError {
    /// Construction input failed validation.
    #[error("invalid input for map `{map}`: {violation}")]
    InvalidInput {
        /// Name of the statistical map being analysed.
        map: Arc<str>,
        /// The rule the input violated.
        #[source]
        violation: InputViolation,
    },
    /// A p-value was not a finite number.
    #[error("non-finite p-value {value} at voxel {voxel} in map `{map}`")]
    Numeric {
        /// Name of the statistical map being analysed.
        map: Arc<str>,
        /// Voxel carrying the non-finite value.
        voxel: usize,
        /// The non-finite value as read from the source.
        value: f64,
    },
    /// A cluster mutation was requested while no admissible clusters exist.
    #[error("no admissible supra-threshold clusters are available")]
    EmptyAdmissible,
    /// The chosen voxel lies in no cluster of the supplied answer set.
    #[error("voxel {voxel} lies in no cluster of the current answer set")]
    NoSuchCluster {
        /// Voxel the caller used to select a cluster.
        voxel: usize,
    },
    /// The requested TDP change was zero or outside (-1, 1).
    #[error("tdp change {delta} must be non-zero and strictly inside (-1, 1)")]
    OutOfRange {
        /// Change requested by the caller.
        delta: f64,
    },
    /// The requested TDP change exceeds what the admissible clusters allow.
    #[error(
        "a tdp change of {delta} from {current} cannot be attained; \
         admissible bounds are [{min}, {max}]"
    )]
    NoFurtherChange {
        /// TDP of the selected cluster.
        current: f64,
        /// Change requested by the caller.
        delta: f64,
        /// Smallest admissible TDP.
        min: f64,
        /// Largest admissible TDP.
        max: f64,
    },
}

impl AriError {
    /// Retrieve the stable [`AriErrorCode`] for this error.
    pub const fn code(&self) -> AriErrorCode {
        match self {
            Self::InvalidInput { .. } => AriErrorCode::InvalidInput,
            Self::Numeric { .. } => AriErrorCode::Numeric,
            Self::EmptyAdmissible => AriErrorCode::EmptyAdmissible,
            Self::NoSuchCluster { .. } => AriErrorCode::NoSuchCluster,
            Self::OutOfRange { .. } => AriErrorCode::OutOfRange,
            Self::NoFurtherChange { .. } => AriErrorCode::NoFurtherChange,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, AriError>;
