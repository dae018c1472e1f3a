//! 3D-grid neighbour helper for the ARI core.
//!
//! Turns a masked 3D grid plus a connectivity criterion (6, 18, or 26)
//! into the per-voxel adjacency lists the engine clusters over, and
//! provides the coordinate conversions shared with file loaders: linear
//! indices are x-fastest, and in-mask voxels are numbered in linear-index
//! order.

mod errors;
mod grid;
mod map;

pub use crate::{
    errors::GridError,
    grid::{Connectivity, GridMask, ids_to_xyz, index_to_xyz, xyz_to_index},
    map::GridMap,
};
