//! Union-find (disjoint set union) used by the discovery-counting pass.
//!
//! The discovery counter walks a subset of p-value categories and repeatedly
//! asks for the smallest category still reachable from a given one, merging
//! categories downward as budget is consumed. This structure augments a
//! rank-based union-find with a per-root minimum to answer that query in
//! amortised inverse-Ackermann time.

#[derive(Clone, Debug)]
pub(super) struct CategorySets {
    parent: Vec<usize>,
    rank: Vec<u8>,
    lowest: Vec<usize>,
}

impl CategorySets {
    pub(super) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
            lowest: (0..n).collect(),
        }
    }

    /// Smallest category merged into the set rooted at `root`.
    pub(super) fn lowest(&self, root: usize) -> usize {
        self.lowest[root]
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

    pub(super) fn union(&mut self, left: usize, right: usize) -> usize {
        let mut left = self.find(left);
        let mut right = self.find(right);
        if left == right {
            return left;
        }
        let left_rank = self.rank[left];
        let right_rank = self.rank[right];
        if left_rank < right_rank {
            std::mem::swap(&mut left, &mut right);
        }
        self.parent[right] = left;
        self.lowest[left] = self.lowest[left].min(self.lowest[right]);
        if left_rank == right_rank {
            self.rank[left] = left_rank.saturating_add(1);
        }
        left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_tracks_the_smallest_merged_category() {
        let mut sets = CategorySets::new(5);
        sets.union(3, 4);
        sets.union(1, 3);
        let root = sets.find(4);
        assert_eq!(sets.lowest(root), 1);
        let untouched = sets.find(0);
        assert_eq!(sets.lowest(untouched), 0);
    }

    #[test]
    fn find_compresses_paths() {
        let mut sets = CategorySets::new(4);
        sets.union(0, 1);
        sets.union(1, 2);
        sets.union(2, 3);
        let root = sets.find(3);
        assert_eq!(sets.find(0), root);
        assert_eq!(sets.lowest(root), 0);
    }
}
