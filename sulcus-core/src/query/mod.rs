//! Threshold queries over the cluster forest.
//!
//! Only *admissible* nodes can answer a query: a node whose TDP strictly
//! exceeds every ancestor's. Dominated nodes would always lose to an
//! ancestor with at least the same bound and at least the same extent.
//! The admissible representatives, sorted by TDP, turn every query
//! `gamma -> maximal clusters with TDP >= gamma` into a suffix scan with
//! mark-based suppression of nested answers.
//!
//! The `mark` buffer is owned here, is all-zeros between public calls, and
//! is never exposed. Every error return happens before the first mark
//! mutation, so the hygiene holds on all exit paths.

use crate::error::AriError;
use crate::forest::ClusterForest;

/// One cluster of an answer set: voxels in post order, representative last.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cluster {
    voxels: Vec<usize>,
}

impl Cluster {
    pub(crate) fn new(voxels: Vec<usize>) -> Self {
        debug_assert!(!voxels.is_empty(), "clusters always contain their representative");
        Self { voxels }
    }

    /// The voxels of this cluster in post order.
    #[must_use]
    pub fn voxels(&self) -> &[usize] {
        &self.voxels
    }

    /// The representative: the voxel with the largest p-value, stored last.
    #[must_use]
    pub fn representative(&self) -> usize {
        *self.voxels.last().expect("clusters always contain their representative")
    }

    /// Number of voxels in the cluster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// Always `false`; a cluster contains at least its representative.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }
}

/// Query-time state: the admissible list plus the mark scratch.
#[derive(Clone, Debug)]
pub(crate) struct QueryIndex {
    admstc: Vec<usize>,
    mark: Vec<u8>,
    stack: Vec<usize>,
}

impl QueryIndex {
    /// Collects and TDP-sorts the admissible representatives.
    pub(crate) fn new(forest: &ClusterForest, tdp: &[f64]) -> Self {
        let mut admstc = Vec::with_capacity(forest.len());
        let mut stack: Vec<(usize, f64)> = Vec::new();
        for &root in forest.roots() {
            // qmax is the maximum TDP strictly above v; -1.0 for roots, so
            // every root (tdp >= 0) is admissible.
            stack.push((root, -1.0));
            while let Some((v, qmax)) = stack.pop() {
                if tdp[v] > qmax {
                    admstc.push(v);
                }
                let below = tdp[v].max(qmax);
                for &c in forest.children(v) {
                    stack.push((c, below));
                }
            }
        }
        admstc.sort_by(|&a, &b| tdp[a].total_cmp(&tdp[b]));
        debug_assert!(admstc.iter().all(|&v| tdp[v] >= 0.0));

        Self {
            admstc,
            mark: vec![0; forest.len()],
            stack: Vec::new(),
        }
    }

    pub(crate) fn admissible(&self) -> &[usize] {
        &self.admstc
    }

    pub(crate) fn marks_are_clean(&self) -> bool {
        self.mark.iter().all(|&m| m == 0)
    }

    /// Emits the maximal clusters whose representative TDP reaches `gamma`.
    pub(crate) fn answer(
        &mut self,
        gamma: f64,
        forest: &ClusterForest,
        tdp: &[f64],
    ) -> Vec<Cluster> {
        debug_assert!(self.marks_are_clean());
        let gamma = gamma.max(0.0);
        let left = find_left(gamma, &self.admstc, tdp);

        let mut clusters = Vec::new();
        for i in left..self.admstc.len() {
            let v = self.admstc[i];
            if self.mark[v] != 0 {
                continue;
            }
            // Admissible descendants of v carry strictly higher TDP and sit
            // further right; marking v's subtree suppresses them, keeping
            // only the maximal qualifying cluster.
            let desc = forest.descendants_with(v, &mut self.stack);
            for &u in &desc {
                self.mark[u] = 1;
            }
            clusters.push(Cluster::new(desc));
        }

        for cluster in &clusters {
            for &u in cluster.voxels() {
                self.mark[u] = 0;
            }
        }
        clusters
    }

    /// Answers one query per entry of `gammas`, reusing scratch buffers.
    pub(crate) fn answer_batch(
        &mut self,
        gammas: &[f64],
        forest: &ClusterForest,
        tdp: &[f64],
    ) -> Vec<Vec<Cluster>> {
        gammas
            .iter()
            .map(|&gamma| self.answer(gamma, forest, tdp))
            .collect()
    }

    /// Grows (`delta < 0`) or shrinks (`delta > 0`) the cluster of `ans`
    /// containing `voxel` by the requested TDP change.
    #[expect(
        clippy::float_cmp,
        reason = "hitting an admissible extreme exactly means no further step exists"
    )]
    pub(crate) fn change(
        &mut self,
        voxel: usize,
        delta: f64,
        ans: &[Cluster],
        forest: &ClusterForest,
        tdp: &[f64],
    ) -> Result<Vec<Cluster>, AriError> {
        debug_assert!(self.marks_are_clean());
        if self.admstc.is_empty() {
            return Err(AriError::EmptyAdmissible);
        }
        let iclus = find_rep(voxel, forest, ans).ok_or(AriError::NoSuchCluster { voxel })?;
        let rep = ans[iclus].representative();
        let idxv =
            find_index(rep, &self.admstc, tdp).ok_or(AriError::NoSuchCluster { voxel })?;

        if !delta.is_finite() || delta <= -1.0 || delta == 0.0 || delta >= 1.0 {
            return Err(AriError::OutOfRange { delta });
        }

        let min_tdp = tdp[self.admstc[0]];
        let max_tdp = tdp[self.admstc[self.admstc.len() - 1]];
        let current = tdp[rep];
        let blocked = if delta < 0.0 {
            min_tdp == current || min_tdp - current > delta
        } else {
            max_tdp == current || max_tdp - current < delta
        };
        if blocked {
            return Err(AriError::NoFurtherChange {
                current,
                delta,
                min: min_tdp,
                max: max_tdp,
            });
        }

        for &u in ans[iclus].voxels() {
            self.mark[u] = 1;
        }
        let changed = if delta < 0.0 {
            self.grow(idxv, iclus, delta, ans, forest, tdp)
        } else {
            self.shrink(idxv, iclus, delta, ans, forest, tdp)
        };
        for &u in ans[iclus].voxels() {
            self.mark[u] = 0;
        }
        debug_assert!(self.marks_are_clean());
        Ok(changed)
    }

    /// Scans towards smaller TDP for the nearest admissible superset that
    /// realises the requested drop. Returns the answer set unchanged when no
    /// candidate qualifies.
    fn grow(
        &mut self,
        idxv: usize,
        iclus: usize,
        delta: f64,
        ans: &[Cluster],
        forest: &ClusterForest,
        tdp: &[f64],
    ) -> Vec<Cluster> {
        let rep = ans[iclus].representative();
        let base = tdp[self.admstc[idxv]];
        for i in (0..idxv).rev() {
            let a = self.admstc[i];
            if tdp[a] - base > delta || forest.size(a) <= forest.size(rep) {
                continue;
            }
            let desc = forest.descendants_with(a, &mut self.stack);
            if !touches_marked(&self.mark, &desc) {
                continue;
            }

            // The candidate subtree contains the selected cluster. Other
            // clusters it swallows are dropped; the rest carry over.
            let mut out = Vec::with_capacity(ans.len());
            let mut slack = desc.len() - ans[iclus].len();
            out.push(Cluster::new(desc));
            for (j, other) in ans.iter().enumerate() {
                if j == iclus {
                    continue;
                }
                if slack >= other.len()
                    && contains_cluster(&mut self.mark, out[0].voxels(), other.voxels())
                {
                    slack -= other.len();
                } else {
                    out.push(other.clone());
                }
            }
            return out;
        }
        ans.to_vec()
    }

    /// Collects the admissible subclusters inside the selected cluster that
    /// realise the requested raise; the remaining answer set carries over.
    /// Returns the answer set unchanged when no candidate qualifies.
    fn shrink(
        &mut self,
        idxv: usize,
        iclus: usize,
        delta: f64,
        ans: &[Cluster],
        forest: &ClusterForest,
        tdp: &[f64],
    ) -> Vec<Cluster> {
        let base = tdp[self.admstc[idxv]];
        let mut pieces = Vec::new();
        for i in (idxv + 1)..self.admstc.len() {
            let a = self.admstc[i];
            // mark == 1 keeps candidates inside the selected cluster and
            // outside pieces already taken (their subtrees are remarked 2).
            if tdp[a] - base >= delta && self.mark[a] == 1 {
                let desc = forest.descendants_with(a, &mut self.stack);
                for &u in &desc {
                    self.mark[u] = 2;
                }
                pieces.push(Cluster::new(desc));
            }
        }
        if pieces.is_empty() {
            return ans.to_vec();
        }
        for (j, other) in ans.iter().enumerate() {
            if j != iclus {
                pieces.push(other.clone());
            }
        }
        pieces
    }
}

/// Smallest index into `admstc` whose TDP reaches `gamma`; `admstc.len()`
/// when none does. Binary search and a right-to-left linear probe run in
/// lockstep; whichever terminates first answers.
pub(crate) fn find_left(gamma: f64, admstc: &[usize], tdp: &[f64]) -> usize {
    let mut right = admstc.len();
    let mut low = 0_usize;
    let mut high = right;
    while low < high {
        let mid = (low + high) / 2;
        if tdp[admstc[mid]] >= gamma {
            high = mid;
        } else {
            low = mid + 1;
        }
        // The probe moves once per halving, so it cannot underflow.
        right -= 1;
        if tdp[admstc[right]] < gamma {
            return right + 1;
        }
    }
    low
}

/// Index into `ans` of the cluster containing `voxel`, if any.
fn find_rep(voxel: usize, forest: &ClusterForest, ans: &[Cluster]) -> Option<usize> {
    for (i, cluster) in ans.iter().enumerate() {
        let rep = cluster.representative();
        if rep == voxel {
            return Some(i);
        }
        // Only a strictly larger subtree can contain the voxel's own.
        if forest.size(rep) > forest.size(voxel) {
            let voxels = cluster.voxels();
            let mut l = 0;
            let mut r = voxels.len() - 1;
            while l <= r {
                if voxels[l] == voxel || voxels[r] == voxel {
                    return Some(i);
                }
                l += 1;
                if r == 0 {
                    break;
                }
                r -= 1;
            }
        }
    }
    None
}

/// Position of `rep` in the TDP-sorted admissible list: binary search to the
/// first equal-TDP entry, then an identity scan across the equal run.
fn find_index(rep: usize, admstc: &[usize], tdp: &[f64]) -> Option<usize> {
    let target = tdp[rep];
    let left = admstc.partition_point(|&v| tdp[v] < target);
    for (offset, &v) in admstc[left..].iter().enumerate() {
        if tdp[v] > target {
            break;
        }
        if v == rep {
            return Some(left + offset);
        }
    }
    None
}

/// Whether any voxel of `desc` carries a non-zero mark, scanning from both
/// ends as the marked set is a subtree sitting at post-order extremes.
fn touches_marked(mark: &[u8], desc: &[usize]) -> bool {
    let mut l = 0;
    let mut r = desc.len() - 1;
    while l <= r {
        if mark[desc[l]] != 0 || mark[desc[r]] != 0 {
            return true;
        }
        l += 1;
        if r == 0 {
            break;
        }
        r -= 1;
    }
    false
}

/// Whether the subtree listing `desc` contains the whole cluster `other`.
///
/// Subtrees are nested or disjoint, and `other` is never larger than the
/// slack left in `desc`, so containment is equivalent to any `other` voxel
/// appearing while the two-ended window over the post-order listing is
/// still at least `other.len()` wide: fewer than `other.len()` positions
/// remain unscanned after the loop.
fn contains_cluster(mark: &mut [u8], desc: &[usize], other: &[usize]) -> bool {
    for &u in other {
        mark[u] = 2;
    }
    let mut found = false;
    let mut l = 0;
    let mut r = desc.len() - 1;
    while r + 1 - l >= other.len() {
        if mark[desc[l]] == 2 || mark[desc[r]] == 2 {
            found = true;
            break;
        }
        l += 1;
        if r == 0 {
            break;
        }
        r -= 1;
    }
    for &u in other {
        mark[u] = 0;
    }
    found
}

/// Index permutation ordering `values` by descending value.
///
/// Plain counting sort; `max_value` must be at least the largest entry.
/// The relative order of equal values is unspecified.
#[must_use]
pub fn counting_sort_desc(values: &[usize], max_value: usize) -> Vec<usize> {
    debug_assert!(values.iter().all(|&v| v <= max_value));
    let mut count = vec![0_usize; max_value + 1];
    for &v in values {
        count[v] += 1;
    }
    for i in (1..=max_value).rev() {
        count[i - 1] += count[i];
    }
    let mut sorted = vec![0_usize; values.len()];
    for (i, &v) in values.iter().enumerate() {
        sorted[count[v] - 1] = i;
        count[v] -= 1;
    }
    sorted
}
