//! Engine façade: validated construction and the public query surface.

use std::sync::Arc;

use crate::error::{AriError, InputViolation, Result};
use crate::forest::ClusterForest;
use crate::hommel::{AlphaLevel, Hommel, LocalTest};
use crate::query::{Cluster, QueryIndex};
use crate::source::StatMap;
use crate::tdp;

const DEFAULT_ALPHA: f64 = 0.05;

/// Configures and constructs [`AriEngine`] instances.
///
/// # Examples
/// ```
/// use sulcus_core::{AriEngineBuilder, InMemoryMap, LocalTest};
///
/// let map = InMemoryMap::chain("demo", vec![0.01, 0.02, 0.03, 0.04]);
/// let engine = AriEngineBuilder::new()
///     .with_alpha(0.05)
///     .with_local_test(LocalTest::Simes)
///     .build(&map)
///     .expect("builder configuration is valid");
/// assert_eq!(engine.len(), 4);
/// ```
#[derive(Clone, Debug)]
pub struct AriEngineBuilder {
    alpha: f64,
    local_test: LocalTest,
    order: Option<Vec<usize>>,
}

impl Default for AriEngineBuilder {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            local_test: LocalTest::Simes,
            order: None,
        }
    }
}

impl AriEngineBuilder {
    /// Creates a builder populated with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the family-wise error level (default 0.05).
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Returns the configured level.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Selects the local test family (default [`LocalTest::Simes`]).
    #[must_use]
    pub fn with_local_test(mut self, local_test: LocalTest) -> Self {
        self.local_test = local_test;
        self
    }

    /// Returns the configured local test family.
    #[must_use]
    pub fn local_test(&self) -> LocalTest {
        self.local_test
    }

    /// Supplies a precomputed sorting permutation instead of the internal
    /// stable argsort. `order[i]` must be the voxel with the i-th smallest
    /// p-value; the permutation is validated during [`Self::build`].
    #[must_use]
    pub fn with_order(mut self, order: Vec<usize>) -> Self {
        self.order = Some(order);
        self
    }

    /// Validates the inputs and constructs an [`AriEngine`].
    ///
    /// # Errors
    /// Returns [`AriError::InvalidInput`] for an empty map, a level outside
    /// (0, 1), p-values outside [0, 1], a bad explicit order, or neighbour
    /// ids outside the map; [`AriError::Numeric`] for non-finite p-values.
    pub fn build<M: StatMap>(self, map: &M) -> Result<AriEngine> {
        let name: Arc<str> = Arc::from(map.name());
        let invalid = |violation: InputViolation| AriError::InvalidInput {
            map: Arc::clone(&name),
            violation,
        };

        let m = map.len();
        if m == 0 {
            return Err(invalid(InputViolation::EmptyMap));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(invalid(InputViolation::AlphaOutOfRange { alpha: self.alpha }));
        }

        let mut p = Vec::with_capacity(m);
        for voxel in 0..m {
            let value = map
                .p_value(voxel)
                .map_err(|_| invalid(InputViolation::SourceFailure { voxel }))?;
            if !value.is_finite() {
                return Err(AriError::Numeric {
                    map: Arc::clone(&name),
                    voxel,
                    value,
                });
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(InputViolation::PValueOutOfRange { voxel, value }));
            }
            p.push(value);
        }

        let mut adjacency = Vec::with_capacity(m);
        for voxel in 0..m {
            let ids = map
                .neighbours(voxel)
                .map_err(|_| invalid(InputViolation::SourceFailure { voxel }))?;
            for &neighbour in ids {
                if neighbour >= m {
                    return Err(invalid(InputViolation::NeighbourOutOfBounds {
                        voxel,
                        neighbour,
                        len: m,
                    }));
                }
            }
            adjacency.push(ids.to_vec());
        }

        let ord = match self.order {
            Some(order) => validate_order(order, &p).map_err(invalid)?,
            None => {
                let mut ord: Vec<usize> = (0..m).collect();
                ord.sort_by(|&a, &b| p[a].total_cmp(&p[b]));
                ord
            }
        };
        let mut rank = vec![0_usize; m];
        for (i, &v) in ord.iter().enumerate() {
            rank[v] = i;
        }

        let sorted_p: Vec<f64> = ord.iter().map(|&v| p[v]).collect();
        let hommel = Hommel::from_sorted(sorted_p, self.local_test);
        let level = hommel.level(self.alpha);

        let forest = ClusterForest::build(&adjacency, &ord, &rank);
        let tdp = tdp::propagate(&forest, &p, &hommel, &level);
        let query = QueryIndex::new(&forest, &tdp);

        Ok(AriEngine {
            name,
            p,
            ord,
            hommel,
            level,
            forest,
            tdp,
            query,
        })
    }
}

fn validate_order(order: Vec<usize>, p: &[f64]) -> core::result::Result<Vec<usize>, InputViolation> {
    let m = p.len();
    if order.len() != m {
        return Err(InputViolation::OrderNotPermutation { expected: m });
    }
    let mut seen = vec![false; m];
    for &v in &order {
        if v >= m || seen[v] {
            return Err(InputViolation::OrderNotPermutation { expected: m });
        }
        seen[v] = true;
    }
    for (position, pair) in order.windows(2).enumerate() {
        if p[pair[0]] > p[pair[1]] {
            return Err(InputViolation::OrderNotSorted { position: position + 1 });
        }
    }
    Ok(order)
}

/// The All-Resolutions Inference engine for one statistical map.
///
/// Construction runs the whole preparation pipeline: the Hommel
/// closed-testing state, the cluster forest, the per-node TDP bounds, and
/// the admissible-representative index. Afterwards every query is answered
/// from memory; queries take `&mut self` only for the mark scratch, which is
/// restored to all-zeros before each call returns.
///
/// # Examples
/// ```
/// use sulcus_core::{AriEngineBuilder, InMemoryMap};
///
/// let map = InMemoryMap::chain("demo", vec![0.01, 0.02, 0.03, 0.04]);
/// let mut engine = AriEngineBuilder::new().build(&map).expect("valid input");
/// let clusters = engine.answer_query(0.5);
/// assert_eq!(clusters.len(), 1);
/// assert_eq!(clusters[0].voxels(), &[0, 1, 2, 3]);
/// ```
#[derive(Clone, Debug)]
pub struct AriEngine {
    name: Arc<str>,
    p: Vec<f64>,
    ord: Vec<usize>,
    hommel: Hommel,
    level: AlphaLevel,
    forest: ClusterForest,
    tdp: Vec<f64>,
    query: QueryIndex,
}

impl AriEngine {
    /// Number of in-mask voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.p.len()
    }

    /// Always `false`; construction rejects empty maps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.p.is_empty()
    }

    /// Name of the analysed map.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying closed-testing state.
    #[must_use]
    pub fn hommel(&self) -> &Hommel {
        &self.hommel
    }

    /// The per-alpha bundle the TDP bounds were derived at.
    #[must_use]
    pub fn level(&self) -> &AlphaLevel {
        &self.level
    }

    /// The cluster forest.
    #[must_use]
    pub fn forest(&self) -> &ClusterForest {
        &self.forest
    }

    /// Per-node TDP lower bounds; `-1.0` marks nodes that do not represent
    /// a valid cluster (their p-value ties their parent's).
    #[must_use]
    pub fn tdp(&self) -> &[f64] {
        &self.tdp
    }

    /// TDP bound of a cluster, read at its representative.
    #[must_use]
    pub fn cluster_tdp(&self, cluster: &Cluster) -> f64 {
        self.tdp[cluster.representative()]
    }

    /// Admissible cluster representatives, sorted by TDP ascending.
    #[must_use]
    pub fn admissible(&self) -> &[usize] {
        self.query.admissible()
    }

    /// Maximal clusters whose TDP bound reaches `gamma`.
    ///
    /// Clusters are pairwise disjoint; each is listed in post order with the
    /// representative last. Negative `gamma` is clamped to zero.
    pub fn answer_query(&mut self, gamma: f64) -> Vec<Cluster> {
        self.query.answer(gamma, &self.forest, &self.tdp)
    }

    /// One [`Self::answer_query`] result per entry of `gammas`.
    pub fn answer_query_batch(&mut self, gammas: &[f64]) -> Vec<Vec<Cluster>> {
        self.query.answer_batch(gammas, &self.forest, &self.tdp)
    }

    /// Grows (`delta < 0`) or shrinks (`delta > 0`) the cluster of `ans`
    /// that contains `voxel`, returning the updated answer set.
    ///
    /// # Errors
    /// [`AriError::NoSuchCluster`] when `voxel` lies in no cluster of `ans`,
    /// [`AriError::OutOfRange`] when `delta` is zero or outside (-1, 1),
    /// [`AriError::NoFurtherChange`] when the request exceeds the admissible
    /// extremes, and [`AriError::EmptyAdmissible`] when no admissible
    /// representatives exist.
    pub fn change_query(
        &mut self,
        voxel: usize,
        delta: f64,
        ans: &[Cluster],
    ) -> Result<Vec<Cluster>> {
        if voxel >= self.len() {
            return Err(AriError::NoSuchCluster { voxel });
        }
        self.query.change(voxel, delta, ans, &self.forest, &self.tdp)
    }

    /// Local minima of the p-value map: the leaves of the cluster forest.
    #[must_use]
    pub fn leaves(&self) -> Vec<usize> {
        self.forest.leaves()
    }

    /// TDP lower bound for the whole mask.
    #[must_use]
    pub fn whole_map_tdp(&self) -> f64 {
        let disc = self
            .hommel
            .discoveries(&self.level, self.ord.iter().map(|&v| self.p[v]));
        to_f64(disc.last().copied().unwrap_or(0)) / to_f64(self.len())
    }

    /// Closed-testing-adjusted p-values in original voxel order.
    #[must_use]
    pub fn adjusted_p_values(&self) -> Vec<f64> {
        let sorted = self.hommel.adjusted_elementary();
        let mut adjusted = vec![0.0; self.len()];
        for (i, &v) in self.ord.iter().enumerate() {
            adjusted[v] = sorted[i];
        }
        adjusted
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "voxel counts stay far below 2^52"
)]
fn to_f64(value: usize) -> f64 {
    value as f64
}
