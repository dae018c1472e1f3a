//! Union-find (disjoint set union) used while growing the cluster forest.
//!
//! The forest builder absorbs voxels in ascending p-value order, merging the
//! new voxel with the components of its already-processed neighbours. Each
//! component remembers its forest root (the voxel that will represent the
//! grown cluster) separately from the union-find representative, and the
//! running component size is stored at the forest-root index.

#[derive(Clone, Debug)]
pub(super) struct ComponentForest {
    parent: Vec<usize>,
    size: Vec<usize>,
    forest_root: Vec<usize>,
}

impl ComponentForest {
    pub(super) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
            forest_root: (0..n).collect(),
        }
    }

    pub(super) fn find(&mut self, mut node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        while self.parent[node] != node {
            let parent = self.parent[node];
            self.parent[node] = root;
            node = parent;
        }

        root
    }

    pub(super) fn is_representative(&self, node: usize) -> bool {
        self.parent[node] == node
    }

    /// Forest root of the component whose representative is `rep`.
    pub(super) fn forest_root(&self, rep: usize) -> usize {
        self.forest_root[rep]
    }

    /// Merges the component of `node` with the component represented by
    /// `other_rep`. The size comparison only balances the representative
    /// tree; the forest root of `node`'s side survives either way, which is
    /// what keeps the newest voxel at the top of its growing cluster.
    pub(super) fn union_by_size(&mut self, node: usize, other_rep: usize) {
        let rep = self.find(node);
        if rep == other_rep {
            return;
        }

        let root = self.forest_root[rep];
        let other_root = self.forest_root[other_rep];
        if self.size[root] < self.size[other_root] {
            self.parent[rep] = other_rep;
            self.forest_root[other_rep] = root;
        } else {
            self.parent[other_rep] = rep;
        }
        self.size[root] += self.size[other_root];
    }

    /// Running size of the component containing forest root `root`.
    pub(super) fn component_size(&self, root: usize) -> usize {
        self.size[root]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_always_keeps_the_processing_side_forest_root() {
        let mut forest = ComponentForest::new(4);
        // Grow {0, 1} under root 1, then absorb that pair into 2.
        forest.union_by_size(1, 0);
        let found0 = forest.find(0);
        assert_eq!(forest.forest_root(found0), 1);
        assert_eq!(forest.component_size(1), 2);

        let rep = forest.find(0);
        forest.union_by_size(2, rep);
        let found2 = forest.find(2);
        assert_eq!(forest.forest_root(found2), 2);
        assert_eq!(forest.component_size(2), 3);
    }

    #[test]
    fn size_ties_are_won_by_the_processing_node() {
        let mut forest = ComponentForest::new(2);
        forest.union_by_size(1, 0);
        let rep = forest.find(0);
        assert_eq!(forest.forest_root(rep), 1);
    }
}
