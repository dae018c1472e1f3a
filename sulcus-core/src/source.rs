//! Statistical map abstractions for the ARI core.
//!
//! A [`StatMap`] supplies the per-voxel p-values and the spatial adjacency
//! the engine clusters over. Providers (such as the 3D-grid helper crate)
//! implement this trait; [`InMemoryMap`] is the vector-backed implementation
//! used by tests and simple callers.

use thiserror::Error;

/// An error produced by [`StatMap`] accessors.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum StatMapError {
    /// Requested voxel was outside the map's bounds.
    #[error("voxel {voxel} is out of bounds")]
    OutOfBounds {
        /// The invalid voxel id.
        voxel: usize,
    },
}

/// Abstraction over a masked statistical map: p-values plus adjacency.
///
/// Voxels carry stable ids `0..len()`. Adjacency must be symmetric and
/// self-exclusive; the engine validates neighbour bounds at construction but
/// trusts symmetry.
///
/// # Examples
/// ```
/// use sulcus_core::{InMemoryMap, StatMap};
///
/// let map = InMemoryMap::new(
///     "chain",
///     vec![0.01, 0.02, 0.03],
///     vec![vec![1], vec![0, 2], vec![1]],
/// );
/// assert_eq!(map.len(), 3);
/// assert_eq!(map.p_value(1)?, 0.02);
/// assert_eq!(map.neighbours(1)?, &[0, 2]);
/// # Ok::<(), sulcus_core::StatMapError>(())
/// ```
pub trait StatMap {
    /// Returns the number of in-mask voxels.
    fn len(&self) -> usize;

    /// Returns whether the map contains no voxels.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a human-readable name for diagnostics.
    fn name(&self) -> &str;

    /// Returns the p-value attached to `voxel`.
    fn p_value(&self, voxel: usize) -> Result<f64, StatMapError>;

    /// Returns the neighbour ids of `voxel`.
    fn neighbours(&self, voxel: usize) -> Result<&[usize], StatMapError>;
}

/// A [`StatMap`] backed by plain vectors.
#[derive(Clone, Debug, PartialEq)]
pub struct InMemoryMap {
    name: String,
    p: Vec<f64>,
    adjacency: Vec<Vec<usize>>,
}

impl InMemoryMap {
    /// Creates a map from per-voxel p-values and adjacency lists.
    ///
    /// The two vectors must have the same length; content validation (value
    /// ranges, neighbour bounds) happens when an engine is built from the
    /// map.
    ///
    /// # Panics
    /// Panics when `p` and `adjacency` disagree on the voxel count.
    #[must_use]
    pub fn new(name: impl Into<String>, p: Vec<f64>, adjacency: Vec<Vec<usize>>) -> Self {
        assert_eq!(
            p.len(),
            adjacency.len(),
            "p-values and adjacency must cover the same voxels",
        );
        Self {
            name: name.into(),
            p,
            adjacency,
        }
    }

    /// Creates a 1-D chain map where voxel `i` neighbours `i - 1` and `i + 1`.
    #[must_use]
    pub fn chain(name: impl Into<String>, p: Vec<f64>) -> Self {
        let m = p.len();
        let adjacency = (0..m)
            .map(|i| {
                let mut ids = Vec::with_capacity(2);
                if i > 0 {
                    ids.push(i - 1);
                }
                if i + 1 < m {
                    ids.push(i + 1);
                }
                ids
            })
            .collect();
        Self::new(name, p, adjacency)
    }
}

impl StatMap for InMemoryMap {
    fn len(&self) -> usize {
        self.p.len()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn p_value(&self, voxel: usize) -> Result<f64, StatMapError> {
        self.p
            .get(voxel)
            .copied()
            .ok_or(StatMapError::OutOfBounds { voxel })
    }

    fn neighbours(&self, voxel: usize) -> Result<&[usize], StatMapError> {
        self.adjacency
            .get(voxel)
            .map(Vec::as_slice)
            .ok_or(StatMapError::OutOfBounds { voxel })
    }
}
