//! A [`StatMap`] implementation backed by a grid mask.

use sulcus_core::{StatMap, StatMapError};

use crate::errors::GridError;
use crate::grid::GridMask;

/// Per-voxel p-values bound to a [`GridMask`].
///
/// Adjacency is precomputed at construction so repeated engine builds and
/// queries never re-derive geometry.
///
/// # Examples
/// ```
/// use sulcus_core::{AriEngineBuilder, StatMap};
/// use sulcus_grid::{Connectivity, GridMap, GridMask};
///
/// let mask = GridMask::full([2, 1, 1], Connectivity::Faces).expect("dims are non-zero");
/// let map = GridMap::new("demo", mask, vec![0.01, 0.02]).expect("counts agree");
/// assert_eq!(map.neighbours(0).expect("in bounds"), &[1]);
///
/// let mut engine = AriEngineBuilder::new().build(&map).expect("valid input");
/// assert_eq!(engine.answer_query(0.0).len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct GridMap {
    name: String,
    mask: GridMask,
    p: Vec<f64>,
    adjacency: Vec<Vec<usize>>,
}

impl GridMap {
    /// Binds p-values (in voxel-id order) to a mask.
    pub fn new(
        name: impl Into<String>,
        mask: GridMask,
        p: Vec<f64>,
    ) -> Result<Self, GridError> {
        if p.len() != mask.len() {
            return Err(GridError::PValueCountMismatch {
                expected: mask.len(),
                got: p.len(),
            });
        }
        let adjacency = mask.adjacency();
        Ok(Self {
            name: name.into(),
            mask,
            p,
            adjacency,
        })
    }

    /// The underlying mask.
    #[must_use]
    pub fn mask(&self) -> &GridMask {
        &self.mask
    }
}

impl StatMap for GridMap {
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
