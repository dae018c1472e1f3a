//! True discovery proportion bounds for every cluster in the forest.
//!
//! Every node of the cluster forest lies on exactly one heavy path (a
//! maximal chain of heavy-child edges starting at a forest root or at a
//! non-first child). Because [`ClusterForest::descendants`] lists the
//! subtree of each node on a heavy path as a prefix, a single discovery
//! count over the path start's descendants prices every node on the path:
//! `tdp[v] = disc[size(v) - 1] / size(v)`.
//!
//! A node whose p-value ties its parent's does not represent a distinct
//! supra-threshold cluster; it receives the sentinel `-1.0` and is skipped
//! by the query layer.

use crate::forest::ClusterForest;
use crate::hommel::{AlphaLevel, Hommel};

/// Sentinel TDP for nodes that do not represent a valid cluster.
pub const INVALID_TDP: f64 = -1.0;

/// Assigns a TDP bound to every forest node.
pub(crate) fn propagate(
    forest: &ClusterForest,
    p: &[f64],
    hommel: &Hommel,
    level: &AlphaLevel,
) -> Vec<f64> {
    let mut tdp = vec![0.0_f64; forest.len()];
    let mut stack = Vec::new();

    for &root in forest.roots() {
        heavy_path(forest, p, hommel, level, root, None, &mut tdp, &mut stack);
    }
    for v in 0..forest.len() {
        for &c in forest.children(v).iter().skip(1) {
            heavy_path(forest, p, hommel, level, c, Some(v), &mut tdp, &mut stack);
        }
    }
    tdp
}

/// Walks the heavy path starting at `start` and fills in its TDP bounds.
#[expect(
    clippy::too_many_arguments,
    reason = "plain plumbing between the forest and the Hommel engine"
)]
#[expect(
    clippy::float_cmp,
    reason = "exact p-value ties identify invalid cluster representatives"
)]
fn heavy_path(
    forest: &ClusterForest,
    p: &[f64],
    hommel: &Hommel,
    level: &AlphaLevel,
    start: usize,
    parent: Option<usize>,
    tdp: &mut [f64],
    stack: &mut Vec<usize>,
) {
    let desc = forest.descendants_with(start, stack);
    let disc = hommel.discoveries(level, desc.iter().map(|&u| p[u]));

    let mut v = start;
    let mut par = parent;
    loop {
        let valid = par.is_none_or(|par| p[v] != p[par]);
        if valid {
            let size = forest.size(v);
            tdp[v] = to_f64(disc[size - 1]) / to_f64(size);
        } else {
            tdp[v] = INVALID_TDP;
        }

        if forest.size(v) == 1 {
            break;
        }
        par = Some(v);
        v = forest.heavy_child(v).expect("non-leaf nodes have a heavy child");
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "voxel counts stay far below 2^52"
)]
fn to_f64(value: usize) -> f64 {
    value as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hommel::LocalTest;

    fn chain_forest(m: usize) -> ClusterForest {
        let adjacency: Vec<Vec<usize>> = (0..m)
            .map(|i| {
                let mut ids = Vec::new();
                if i > 0 {
                    ids.push(i - 1);
                }
                if i + 1 < m {
                    ids.push(i + 1);
                }
                ids
            })
            .collect();
        let ord: Vec<usize> = (0..m).collect();
        ClusterForest::build(&adjacency, &ord, &ord.clone())
    }

    #[test]
    fn chain_with_full_rejection_reaches_tdp_one_everywhere() {
        let p = vec![0.01, 0.02, 0.03, 0.04];
        let forest = chain_forest(4);
        let hommel = Hommel::from_sorted(p.clone(), LocalTest::Simes);
        let level = hommel.level(0.05);
        let tdp = propagate(&forest, &p, &hommel, &level);
        assert_eq!(tdp, vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn tdp_is_monotone_down_the_heavy_path() {
        let p = vec![0.001, 0.01, 0.3, 0.6];
        let forest = chain_forest(4);
        let hommel = Hommel::from_sorted(p.clone(), LocalTest::Simes);
        let level = hommel.level(0.05);
        let tdp = propagate(&forest, &p, &hommel, &level);
        // Root 3 -> 2 -> 1 -> 0: shrinking a cluster can only keep or raise
        // its discovery proportion.
        assert!(tdp[3] <= tdp[2] && tdp[2] <= tdp[1] && tdp[1] <= tdp[0]);
        assert!(tdp.iter().all(|&t| (0.0..=1.0).contains(&t)));
    }

    #[test]
    fn tied_p_values_mark_all_but_the_top_node_invalid() {
        let p = vec![0.1, 0.1, 0.1];
        let forest = chain_forest(3);
        let hommel = Hommel::from_sorted(p.clone(), LocalTest::Simes);
        let level = hommel.level(0.05);
        let tdp = propagate(&forest, &p, &hommel, &level);
        assert_eq!(tdp[0], INVALID_TDP);
        assert_eq!(tdp[1], INVALID_TDP);
        assert!(tdp[2] >= 0.0);
    }

    #[test]
    fn singleton_map_gets_tdp_one() {
        let p = vec![0.001];
        let forest = chain_forest(1);
        let hommel = Hommel::from_sorted(p.clone(), LocalTest::Simes);
        let level = hommel.level(0.05);
        let tdp = propagate(&forest, &p, &hommel, &level);
        assert_eq!(tdp, vec![1.0]);
    }
}
