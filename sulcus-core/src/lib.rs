//! All-Resolutions Inference core library.
//!
//! Given per-voxel p-values and a spatial adjacency, the engine computes,
//! for every True Discovery Proportion threshold `gamma` in `[0, 1]`, the
//! partition of the mask into maximal supra-threshold clusters whose TDP
//! lower bound reaches `gamma`. The bounds are simultaneously valid in the
//! closed-testing sense of Hommel/Simes, so any number of thresholds can be
//! explored interactively without spending additional error budget.

mod engine;
mod error;
mod forest;
mod hommel;
mod query;
mod source;
mod tdp;

pub use crate::{
    engine::{AriEngine, AriEngineBuilder},
    error::{AriError, AriErrorCode, InputViolation, Result},
    forest::ClusterForest,
    hommel::{AlphaLevel, Hommel, LocalTest},
    query::{Cluster, counting_sort_desc},
    source::{InMemoryMap, StatMap, StatMapError},
    tdp::INVALID_TDP,
};

#[cfg(test)]
mod property;
