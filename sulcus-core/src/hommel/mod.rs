//! Hommel closed-testing machinery over sorted p-values.
//!
//! Closed testing with Simes-type local tests admits a compact summary: the
//! function `h(alpha)` counting hypotheses not rejected by the closure. Its
//! jump points are governed by the lower concave hull of the sorted p-values
//! (Fortune's 1989 sweep), and the number of guaranteed true discoveries in
//! any subset follows from `h`, a concentration bound, and a category-merging
//! union-find pass.
//!
//! All index arithmetic here is zero-based; the alpha-jump sequence stores
//! `jump_alpha[h - 1]`, the critical level below which the `h` largest
//! p-values stay unrejected:
//!
//! `jump_alpha[h - 1] = simes_factor[h] * min_{l >= m - h} p[l] / (l - m + h + 1)`
//!
//! The minimisation is restricted to hull points; the per-`h` argmin walks
//! the hull monotonically, keeping the whole sequence O(m).

mod union_find;

use self::union_find::CategorySets;

/// The local test family used inside the closed testing procedure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LocalTest {
    /// Classical Simes local tests (denominator `i`). Valid under positive
    /// dependence (PRDS) of the p-values.
    Simes,
    /// Hommel's robust variant (denominator `i * H_i`), valid under any
    /// dependence structure.
    Hommel,
}

/// Per-alpha quantities derived from the closed testing procedure.
///
/// Bundles the number of unrejected hypotheses `h`, the Simes height
/// `simes_factor[h] / h` (zero when `h = 0`), and the concentration bound:
/// the prefix of the sorted p-values within which every discovery guaranteed
/// at this level is concentrated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlphaLevel {
    alpha: f64,
    h: usize,
    simes_height: f64,
    concentration: usize,
}

impl AlphaLevel {
    /// The family-wise error level this bundle was derived for.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Number of hypotheses not rejected by the closure at this level.
    #[must_use]
    pub fn h(&self) -> usize {
        self.h
    }

    /// `simes_factor[h] / h`, or zero when every hypothesis is rejected.
    #[must_use]
    pub fn simes_height(&self) -> f64 {
        self.simes_height
    }

    /// Zero-based index of the last sorted p-value inside the concentration
    /// set.
    #[must_use]
    pub fn concentration(&self) -> usize {
        self.concentration
    }
}

/// The Hommel engine: precomputed closed-testing state for one sorted
/// p-value vector.
#[derive(Clone, Debug)]
pub struct Hommel {
    sorted_p: Vec<f64>,
    simes_factor: Vec<f64>,
    jump_alpha: Vec<f64>,
    test: LocalTest,
}

impl Hommel {
    /// Builds the engine from p-values already sorted in ascending order.
    ///
    /// The caller is responsible for sortedness and for values inside
    /// `[0, 1]`; the engine façade validates both before construction.
    ///
    /// # Panics
    /// Panics when `sorted_p` is empty.
    #[must_use]
    pub fn from_sorted(sorted_p: Vec<f64>, test: LocalTest) -> Self {
        assert!(!sorted_p.is_empty(), "at least one p-value is required");
        debug_assert!(
            sorted_p.windows(2).all(|w| w[0] <= w[1]),
            "p-values must be sorted ascending",
        );
        let simes_factor = find_simes_factor(test, sorted_p.len());
        let jump_alpha = find_jump_alpha(&sorted_p, &simes_factor, test);
        Self {
            sorted_p,
            simes_factor,
            jump_alpha,
            test,
        }
    }

    /// Number of hypotheses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sorted_p.len()
    }

    /// Always `false`; construction rejects empty inputs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorted_p.is_empty()
    }

    /// The configured local test family.
    #[must_use]
    pub fn local_test(&self) -> LocalTest {
        self.test
    }

    /// The local test denominator table; index 0 is the sentinel 0.
    #[must_use]
    pub fn simes_factor(&self) -> &[f64] {
        &self.simes_factor
    }

    /// The alpha-jump sequence, non-increasing from index 0 to `m - 1`.
    #[must_use]
    pub fn jump_alpha(&self) -> &[f64] {
        &self.jump_alpha
    }

    /// Largest `h` in `[1, m]` with `jump_alpha[h - 1] > alpha`, or 0 when
    /// even the single largest p-value is rejected.
    #[must_use]
    pub fn h_alpha(&self, alpha: f64) -> usize {
        let (mut low, mut high) = (0_usize, self.len());
        while low < high {
            let mid = (low + high + 1) / 2;
            if self.jump_alpha[mid - 1] > alpha {
                low = mid;
            } else {
                high = mid - 1;
            }
        }
        low
    }

    /// Derives the per-alpha bundle used by discovery counting.
    #[must_use]
    pub fn level(&self, alpha: f64) -> AlphaLevel {
        let h = self.h_alpha(alpha);
        let simes_height = if h == 0 {
            0.0
        } else {
            self.simes_factor[h] / to_f64(h)
        };
        let concentration = self.find_concentration(alpha, h, simes_height);
        AlphaLevel {
            alpha,
            h,
            simes_height,
            concentration,
        }
    }

    /// Size of the concentration set: the smallest prefix of the sorted
    /// p-values that contains every discovery guaranteed at `alpha`.
    fn find_concentration(&self, alpha: f64, h: usize, simes_height: f64) -> usize {
        let m = self.len();
        let mut z = m.saturating_sub(h + 1);
        while z < m - 1 && simes_height * self.sorted_p[z] > (to_f64(z + h + 2) - to_f64(m)) * alpha
        {
            z += 1;
        }
        z
    }

    /// Category of a single p-value: the number of budget units a discovery
    /// at this p-value consumes. Category 0 is a certain discovery.
    #[must_use]
    #[expect(
        clippy::float_cmp,
        reason = "the zero height and zero alpha sentinels are exact"
    )]
    pub fn category(&self, p: f64, level: &AlphaLevel) -> usize {
        let m = self.len();
        if p <= 0.0 || level.simes_height == 0.0 {
            0
        } else if level.alpha == 0.0 {
            m
        } else {
            let cat = (level.simes_height / level.alpha * p).ceil();
            saturating_usize(cat).saturating_sub(1).min(m)
        }
    }

    /// Lower bounds on the number of true discoveries in every prefix of a
    /// subset, visited in the order `subset_p` yields its p-values.
    ///
    /// The output is non-decreasing and steps by at most one per element.
    /// Scratch is limited to the category table and an O(maxcat) union-find.
    pub fn discoveries<I>(&self, level: &AlphaLevel, subset_p: I) -> Vec<usize>
    where
        I: IntoIterator<Item = f64>,
    {
        let cats: Vec<usize> = subset_p
            .into_iter()
            .map(|p| self.category(p, level))
            .collect();
        let k = cats.len();
        if k == 0 {
            return Vec::new();
        }

        // The concentration bound guarantees z + h + 1 >= m, so the budget
        // below never underflows.
        let budget = level.concentration + level.h + 1 - self.len();
        let mut max_cat = budget.min(k - 1);

        // Tighten by the largest category actually present.
        let mut seen = 0_usize;
        for &cat in cats.iter().rev() {
            if cat > seen {
                seen = cat;
                if seen >= max_cat {
                    break;
                }
            }
        }
        max_cat = max_cat.min(seen);

        let mut sets = CategorySets::new(max_cat + 1);
        let mut disc = vec![0_usize; k];
        let mut count = 0_usize;
        for (i, &cat) in cats.iter().enumerate() {
            if cat <= max_cat {
                let root = sets.find(cat);
                let lowest = sets.lowest(root);
                if lowest == 0 {
                    count += 1;
                } else {
                    sets.union(lowest - 1, root);
                }
            }
            disc[i] = count;
        }
        disc
    }

    /// Closed-testing-adjusted p-values for all elementary hypotheses, in
    /// sorted order.
    ///
    /// The descending sweep keeps `j` at the largest closure size whose
    /// critical level still covers `p[i]`, so each hypothesis is priced by
    /// the intersection that is hardest to reject.
    #[must_use]
    pub fn adjusted_elementary(&self) -> Vec<f64> {
        let m = self.len();
        let mut adjusted = vec![0.0; m];
        let mut i = 0_usize;
        let mut j = m;
        while i < m {
            // simes_factor[0] = 0 keeps the condition true at j = 1, so j
            // never reaches 0.
            if self.simes_factor[j - 1] * self.sorted_p[i] <= self.jump_alpha[j - 1] {
                adjusted[i] = (self.simes_factor[j] * self.sorted_p[i]).min(self.jump_alpha[j - 1]);
                i += 1;
            } else {
                j -= 1;
            }
        }
        adjusted
    }
}

fn find_simes_factor(test: LocalTest, m: usize) -> Vec<f64> {
    let mut factor = Vec::with_capacity(m + 1);
    factor.push(0.0);
    match test {
        LocalTest::Simes => {
            for i in 1..=m {
                factor.push(to_f64(i));
            }
        }
        LocalTest::Hommel => {
            let mut harmonic = 0.0_f64;
            for i in 1..=m {
                harmonic += 1.0 / to_f64(i);
                factor.push(to_f64(i) * harmonic);
            }
        }
    }
    factor
}

/// Lower concave hull of the points `(rank, p[rank - 1])`, anchored at a
/// virtual origin `(0, 0)` and terminated at rank `m`. Returns zero-based
/// indices.
fn find_hull(p: &[f64]) -> Vec<usize> {
    let m = p.len();
    let mut hull = vec![0_usize];
    for i in 1..m {
        let admit = i == m - 1 || (to_f64(m) - 1.0) * (p[i] - p[0]) < to_f64(i) * (p[m - 1] - p[0]);
        if !admit {
            continue;
        }
        loop {
            let r = hull.len();
            let notconvex = if r > 1 {
                let a = hull[r - 2];
                let b = hull[r - 1];
                to_f64(i - a) * (p[b] - p[a]) >= to_f64(b - a) * (p[i] - p[a])
            } else if r == 1 {
                // Against the origin the comparison is between rank slopes.
                let b = hull[0];
                to_f64(i + 1) * p[b] >= to_f64(b + 1) * p[i]
            } else {
                false
            };
            if notconvex {
                hull.pop();
            } else {
                break;
            }
        }
        hull.push(i);
    }
    hull
}

/// Signed distance of sorted index `idx` from the anchor of the jump at
/// array position `j`: `rank(idx) - (m - h)` with `h = j + 1`.
fn anchor_offset(idx: usize, m: usize, j: usize) -> f64 {
    to_f64(idx + j + 2) - to_f64(m)
}

fn find_jump_alpha(p: &[f64], simes_factor: &[f64], test: LocalTest) -> Vec<f64> {
    let m = p.len();
    let hull = find_hull(p);
    let mut alpha = vec![0.0_f64; m];
    let mut k = hull.len() - 1;
    let mut j = 0_usize;
    while j < m {
        if k > 0 {
            let a = hull[k - 1];
            let b = hull[k];
            // Cross-multiplied comparison of p/offset at the two candidate
            // hull points; non-positive offsets (ineligible points) make the
            // difference non-negative, so the walk never retreats onto them.
            let dk = p[a] * anchor_offset(b, m, j) - p[b] * anchor_offset(a, m, j);
            if dk < 0.0 {
                k -= 1;
                continue;
            }
        }
        let b = hull[k];
        alpha[j] = simes_factor[j + 1] * p[b] / anchor_offset(b, m, j);
        j += 1;
    }

    if test == LocalTest::Hommel {
        for value in &mut alpha {
            if *value > 1.0 {
                *value = 1.0;
            }
        }
        for j in (0..m - 1).rev() {
            if alpha[j] < alpha[j + 1] {
                alpha[j] = alpha[j + 1];
            }
        }
    }
    alpha
}

#[expect(
    clippy::cast_precision_loss,
    reason = "voxel counts stay far below 2^52"
)]
fn to_f64(value: usize) -> f64 {
    value as f64
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "input is a non-negative ceil result; the as-cast saturates"
)]
fn saturating_usize(value: f64) -> usize {
    value as usize
}

#[cfg(test)]
mod tests;
