//! Grid geometry: linear indexing, connectivity offsets, and masks.
//!
//! The grid is stored x-fastest: `index = z * dims[1] * dims[0] + y *
//! dims[0] + x`. In-mask cells receive voxel ids `0..m` in linear-index
//! order, so providers and file loaders agree on numbering without any
//! shared table.

use rayon::prelude::*;

use crate::errors::GridError;

/// Neighbourhood offsets in the fixed order 6 face, 12 edge, 8 corner.
/// A connectivity criterion selects a prefix of this table.
const OFFSETS: [[i64; 3]; 26] = [
    // 6 face neighbours
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
    // 12 edge neighbours
    [1, 1, 0],
    [-1, 1, 0],
    [1, -1, 0],
    [-1, -1, 0],
    [1, 0, 1],
    [-1, 0, 1],
    [1, 0, -1],
    [-1, 0, -1],
    [0, 1, 1],
    [0, -1, 1],
    [0, 1, -1],
    [0, -1, -1],
    // 8 corner neighbours
    [1, 1, 1],
    [-1, 1, 1],
    [1, -1, 1],
    [-1, -1, 1],
    [1, 1, -1],
    [-1, 1, -1],
    [1, -1, -1],
    [-1, -1, -1],
];

/// 3D connectivity criterion: which cells count as spatial neighbours.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Connectivity {
    /// Face neighbours only (6-connectivity).
    Faces,
    /// Face and edge neighbours (18-connectivity).
    FacesEdges,
    /// Face, edge, and corner neighbours (26-connectivity).
    #[default]
    Full,
}

impl Connectivity {
    /// Number of neighbours the criterion admits.
    #[must_use]
    pub fn degree(self) -> usize {
        match self {
            Self::Faces => 6,
            Self::FacesEdges => 18,
            Self::Full => 26,
        }
    }

    /// Parses the conventional degree notation (6, 18, or 26).
    #[must_use]
    pub fn from_degree(degree: usize) -> Option<Self> {
        match degree {
            6 => Some(Self::Faces),
            18 => Some(Self::FacesEdges),
            26 => Some(Self::Full),
            _ => None,
        }
    }

    fn offsets(self) -> &'static [[i64; 3]] {
        &OFFSETS[..self.degree()]
    }
}

/// Linear cell index of the coordinate triple; x varies fastest.
#[must_use]
pub fn xyz_to_index(x: usize, y: usize, z: usize, dims: [usize; 3]) -> usize {
    z * dims[1] * dims[0] + y * dims[0] + x
}

/// Coordinate triple of a linear cell index.
#[must_use]
pub fn index_to_xyz(index: usize, dims: [usize; 3]) -> [usize; 3] {
    [
        index % dims[0],
        (index / dims[0]) % dims[1],
        index / (dims[0] * dims[1]),
    ]
}

/// Coordinate triples for several linear cell indices.
#[must_use]
pub fn ids_to_xyz(indices: &[usize], dims: [usize; 3]) -> Vec<[usize; 3]> {
    indices.iter().map(|&i| index_to_xyz(i, dims)).collect()
}

/// A masked 3D grid with a connectivity criterion.
///
/// # Examples
/// ```
/// use sulcus_grid::{Connectivity, GridMask};
///
/// let mask = GridMask::full([2, 2, 1], Connectivity::Faces).expect("dims are non-zero");
/// assert_eq!(mask.len(), 4);
/// assert_eq!(mask.neighbours_of(0), vec![1, 2]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridMask {
    dims: [usize; 3],
    connectivity: Connectivity,
    voxel_of: Vec<Option<usize>>,
    linear_of: Vec<usize>,
}

impl GridMask {
    /// Builds a mask from per-cell flags in linear-index order.
    pub fn from_flags(
        dims: [usize; 3],
        flags: &[bool],
        connectivity: Connectivity,
    ) -> Result<Self, GridError> {
        if let Some(axis) = dims.iter().position(|&d| d == 0) {
            return Err(GridError::ZeroDimension { axis });
        }
        let cells = dims[0] * dims[1] * dims[2];
        if flags.len() != cells {
            return Err(GridError::MaskLengthMismatch {
                expected: cells,
                got: flags.len(),
            });
        }

        let mut voxel_of = vec![None; cells];
        let mut linear_of = Vec::new();
        for (index, &in_mask) in flags.iter().enumerate() {
            if in_mask {
                voxel_of[index] = Some(linear_of.len());
                linear_of.push(index);
            }
        }

        Ok(Self {
            dims,
            connectivity,
            voxel_of,
            linear_of,
        })
    }

    /// Builds a mask covering the whole grid.
    pub fn full(dims: [usize; 3], connectivity: Connectivity) -> Result<Self, GridError> {
        let cells = dims.iter().product();
        Self::from_flags(dims, &vec![true; cells], connectivity)
    }

    /// Number of in-mask voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.linear_of.len()
    }

    /// Whether the mask selects no voxels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.linear_of.is_empty()
    }

    /// Grid dimensions.
    #[must_use]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Configured connectivity criterion.
    #[must_use]
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Voxel id stored at a linear cell index, when the cell is in-mask.
    #[must_use]
    pub fn voxel_at(&self, index: usize) -> Option<usize> {
        self.voxel_of.get(index).copied().flatten()
    }

    /// Linear cell index of a voxel.
    #[must_use]
    pub fn linear_index(&self, voxel: usize) -> Option<usize> {
        self.linear_of.get(voxel).copied()
    }

    /// Coordinates of a voxel.
    #[must_use]
    pub fn voxel_coordinates(&self, voxel: usize) -> Option<[usize; 3]> {
        self.linear_index(voxel).map(|i| index_to_xyz(i, self.dims))
    }

    /// Bounds-and-mask check: the voxel id at a signed coordinate triple.
    fn voxel_at_signed(&self, x: i64, y: i64, z: i64) -> Option<usize> {
        let inside = x >= 0
            && y >= 0
            && z >= 0
            && to_i64(self.dims[0]) > x
            && to_i64(self.dims[1]) > y
            && to_i64(self.dims[2]) > z;
        if !inside {
            return None;
        }
        let index = xyz_to_index(to_usize(x), to_usize(y), to_usize(z), self.dims);
        self.voxel_at(index)
    }

    /// In-mask neighbours of a voxel, in offset-table order.
    ///
    /// # Panics
    /// Panics when `voxel >= self.len()`.
    #[must_use]
    pub fn neighbours_of(&self, voxel: usize) -> Vec<usize> {
        let [x, y, z] = index_to_xyz(self.linear_of[voxel], self.dims);
        let mut ids = Vec::with_capacity(self.connectivity.degree());
        for offset in self.connectivity.offsets() {
            let nx = to_i64(x) + offset[0];
            let ny = to_i64(y) + offset[1];
            let nz = to_i64(z) + offset[2];
            if let Some(id) = self.voxel_at_signed(nx, ny, nz) {
                ids.push(id);
            }
        }
        ids
    }

    /// Neighbour lists for every voxel.
    ///
    /// Each voxel is independent, so the lists are computed in parallel;
    /// the collected order is fixed by voxel id and the offset table, so
    /// the output is deterministic.
    #[must_use]
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        (0..self.len())
            .into_par_iter()
            .map(|voxel| self.neighbours_of(voxel))
            .collect()
    }
}

#[expect(
    clippy::cast_possible_wrap,
    reason = "grid dimensions stay far below i64::MAX"
)]
fn to_i64(value: usize) -> i64 {
    value as i64
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "callers check non-negativity and bounds first"
)]
fn to_usize(value: i64) -> usize {
    value as usize
}
