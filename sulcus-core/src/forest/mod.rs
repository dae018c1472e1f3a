//! Cluster forest construction over voxels sorted by p-value.
//!
//! Absorbing voxels in ascending p-value order and merging each with its
//! already-absorbed neighbours yields, in a single pass, every
//! supra-threshold cluster at every threshold: node `v` represents the
//! maximal connected cluster "all voxels in `subtree(v)`", and nesting of
//! subtrees mirrors nesting of clusters across thresholds.
//!
//! Children are stored with the heavy child (largest subtree) first; that
//! ordering is what lets the TDP propagation walk heavy paths with one
//! discovery count per path, and it makes [`ClusterForest::descendants`]
//! emit, for every node `u` on a heavy path, the exact subtree of `u` as a
//! prefix.

mod union_find;

use std::collections::VecDeque;

use self::union_find::ComponentForest;

/// A forest of nested supra-threshold clusters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterForest {
    child: Vec<Vec<usize>>,
    size: Vec<usize>,
    root: Vec<usize>,
}

impl ClusterForest {
    /// Builds the forest from adjacency lists and the sorting permutation.
    ///
    /// `ord[i]` is the voxel with the i-th smallest p-value and `rank` its
    /// inverse. Neighbour ids must be in bounds; the engine validates this
    /// before calling.
    pub(crate) fn build(adjacency: &[Vec<usize>], ord: &[usize], rank: &[usize]) -> Self {
        let m = adjacency.len();
        let mut dsu = ComponentForest::new(m);
        let mut child: Vec<Vec<usize>> = vec![Vec::new(); m];
        let mut chd: VecDeque<usize> = VecDeque::new();

        for (i, &v) in ord.iter().enumerate() {
            for &u in &adjacency[v] {
                if rank[u] >= i {
                    continue;
                }
                let rep = dsu.find(u);
                let w = dsu.forest_root(rep);
                if v == w {
                    // Neighbour already merged into v's growing cluster.
                    continue;
                }
                dsu.union_by_size(v, rep);

                // Heavy child in front; the rest keep encounter order.
                let head_is_heavier = chd
                    .front()
                    .is_none_or(|&head| dsu.component_size(head) >= dsu.component_size(w));
                if head_is_heavier {
                    chd.push_back(w);
                } else {
                    chd.push_front(w);
                }
            }
            child[v] = chd.iter().copied().collect();
            chd.clear();
        }

        let root = (0..m)
            .filter(|&i| dsu.is_representative(i))
            .map(|i| dsu.forest_root(i))
            .collect();

        // The union-find tracked running component sizes at forest-root
        // indices; the public sizes are subtree sizes, recovered bottom-up
        // in rank order (children always rank below their parent).
        let mut size = vec![1_usize; m];
        for &v in ord {
            size[v] = 1 + child[v].iter().map(|&c| size[c]).sum::<usize>();
        }

        Self { child, size, root }
    }

    /// Number of voxels in the forest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.child.len()
    }

    /// Whether the forest contains no voxels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.child.is_empty()
    }

    /// Children of `v`, heavy child first.
    #[must_use]
    pub fn children(&self, v: usize) -> &[usize] {
        &self.child[v]
    }

    /// Heavy child of `v`, when `v` is not a leaf.
    #[must_use]
    pub fn heavy_child(&self, v: usize) -> Option<usize> {
        self.child[v].first().copied()
    }

    /// Size of the subtree rooted at `v`.
    #[must_use]
    pub fn size(&self, v: usize) -> usize {
        self.size[v]
    }

    /// Forest roots, one per connected region of the mask.
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.root
    }

    /// All descendants of `v` (including `v`) in post order, `v` last.
    ///
    /// Children are visited heavy child first, so for every node `u` on the
    /// heavy path starting at `v` the first `size(u)` entries are exactly
    /// the subtree of `u`.
    #[must_use]
    pub fn descendants(&self, v: usize) -> Vec<usize> {
        let mut stack = Vec::new();
        self.descendants_with(v, &mut stack)
    }

    /// As [`Self::descendants`], reusing a caller-held stack buffer.
    ///
    /// The post order is produced as a reversed pre-order: children are
    /// pushed in forward order so the heavy child is expanded last, and one
    /// final reverse puts it first.
    pub(crate) fn descendants_with(&self, v: usize, stack: &mut Vec<usize>) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.size[v]);
        stack.clear();
        stack.push(v);
        while let Some(u) = stack.pop() {
            out.push(u);
            stack.extend(self.child[u].iter().copied());
        }
        out.reverse();
        debug_assert_eq!(out.len(), self.size[v]);
        out
    }

    /// Leaves of the forest: the local minima of the p-value map.
    #[must_use]
    pub fn leaves(&self) -> Vec<usize> {
        (0..self.len()).filter(|&v| self.child[v].is_empty()).collect()
    }
}
