//! Property-based tests over seeded random statistical maps.
//!
//! Strategies generate small masks with mixed signal/noise p-values and
//! randomised adjacency (a shuffled chain with optional breaks plus extra
//! shortcut edges), then check the engine invariants that must hold for
//! every valid input: bounded TDP values, disjoint answers, threshold
//! compliance, nesting across thresholds, and mark hygiene observed as
//! query idempotence.

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::hommel::LocalTest;
use crate::source::InMemoryMap;

/// Minimum voxel count for generated maps.
const MIN_VOXELS: usize = 4;
/// Maximum voxel count for generated maps.
const MAX_VOXELS: usize = 32;

#[derive(Clone, Debug)]
pub(crate) struct MapFixture {
    pub(crate) map: InMemoryMap,
    pub(crate) local_test: LocalTest,
    pub(crate) alpha: f64,
}

pub(crate) fn map_fixture_strategy() -> impl Strategy<Value = MapFixture> {
    (
        any::<u64>(),
        MIN_VOXELS..=MAX_VOXELS,
        prop_oneof![Just(LocalTest::Simes), Just(LocalTest::Hommel)],
        0.01_f64..0.2,
    )
        .prop_map(|(seed, m, local_test, alpha)| generate_fixture(seed, m, local_test, alpha))
}

fn generate_fixture(seed: u64, m: usize, local_test: LocalTest, alpha: f64) -> MapFixture {
    let mut rng = SmallRng::seed_from_u64(seed);

    // Mix of strong signal and flat noise, with occasional exact ties.
    let mut p: Vec<f64> = (0..m)
        .map(|_| {
            if rng.gen_bool(0.4) {
                rng.gen_range(1e-6..0.01)
            } else {
                rng.gen_range(0.0..1.0)
            }
        })
        .collect();
    if m >= 2 && rng.gen_bool(0.3) {
        p[m / 2] = p[m / 2 - 1];
    }

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); m];
    let link = |adjacency: &mut Vec<Vec<usize>>, a: usize, b: usize| {
        if a != b && !adjacency[a].contains(&b) {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
    };

    // A shuffled chain with random breaks keeps several components likely.
    let mut order: Vec<usize> = (0..m).collect();
    order.shuffle(&mut rng);
    for pair in order.windows(2) {
        if rng.gen_bool(0.85) {
            link(&mut adjacency, pair[0], pair[1]);
        }
    }
    for _ in 0..m / 2 {
        let a = rng.gen_range(0..m);
        let b = rng.gen_range(0..m);
        link(&mut adjacency, a, b);
    }

    MapFixture {
        map: InMemoryMap::new("fixture", p, adjacency),
        local_test,
        alpha,
    }
}
