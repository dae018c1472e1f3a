//! Unit tests for the Hommel closed-testing machinery.
//!
//! Expected values are hand-derived from the jump definition
//! `alpha_h = simes_factor[h] * min_{l >= m-h} p[l] / (l - m + h + 1)`.

use rstest::rstest;

use super::{Hommel, LocalTest, find_hull, find_simes_factor};

fn close(left: &[f64], right: &[f64]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(a, b)| (a - b).abs() <= 1e-12 * b.abs().max(1.0))
}

#[test]
fn simes_factor_is_the_rank_for_simes() {
    assert_eq!(find_simes_factor(LocalTest::Simes, 3), vec![0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn simes_factor_carries_the_harmonic_correction_for_hommel() {
    let factor = find_simes_factor(LocalTest::Hommel, 3);
    assert!(close(&factor, &[0.0, 1.0, 3.0, 5.5]));
}

#[rstest]
#[case(vec![0.001], vec![0])]
#[case(vec![1e-6, 0.5, 0.9], vec![0, 2])]
// Collinear through the origin: only the terminal point survives.
#[case(vec![0.01, 0.02, 0.03, 0.04], vec![3])]
#[case(vec![0.01, 0.02, 0.6, 0.8], vec![1, 3])]
fn hull_keeps_exactly_the_lower_concave_points(
    #[case] p: Vec<f64>,
    #[case] expected: Vec<usize>,
) {
    assert_eq!(find_hull(&p), expected);
}

#[rstest]
#[case(vec![0.001], LocalTest::Simes, vec![0.001])]
#[case(vec![0.01, 0.02, 0.03, 0.04], LocalTest::Simes, vec![0.04, 0.04, 0.04, 0.04])]
#[case(vec![1e-6, 0.5, 0.9], LocalTest::Simes, vec![0.9, 0.9, 3e-6])]
#[case(vec![1e-6, 0.5, 0.9], LocalTest::Hommel, vec![1.0, 1.0, 5.5e-6])]
#[case(vec![0.01, 0.02, 0.6, 0.8], LocalTest::Simes, vec![0.8, 0.8, 0.06, 0.04])]
fn jump_alpha_matches_hand_derived_values(
    #[case] p: Vec<f64>,
    #[case] test: LocalTest,
    #[case] expected: Vec<f64>,
) {
    let hommel = Hommel::from_sorted(p, test);
    assert!(
        close(hommel.jump_alpha(), &expected),
        "got {:?}, expected {expected:?}",
        hommel.jump_alpha(),
    );
}

#[rstest]
#[case(vec![0.01, 0.02, 0.03, 0.04], LocalTest::Simes)]
#[case(vec![1e-6, 0.5, 0.9], LocalTest::Simes)]
#[case(vec![1e-6, 0.5, 0.9], LocalTest::Hommel)]
#[case(vec![0.0, 0.0, 0.3, 0.3, 0.99], LocalTest::Hommel)]
#[case(vec![0.2, 0.4, 0.6, 0.8, 1.0], LocalTest::Simes)]
fn jump_alpha_is_non_increasing(#[case] p: Vec<f64>, #[case] test: LocalTest) {
    let hommel = Hommel::from_sorted(p, test);
    assert!(
        hommel.jump_alpha().windows(2).all(|w| w[0] >= w[1]),
        "jump alpha must not increase: {:?}",
        hommel.jump_alpha(),
    );
}

#[rstest]
#[case(vec![0.01, 0.02, 0.03, 0.04], LocalTest::Simes, 0.05, 0)]
#[case(vec![0.01, 0.02, 0.03, 0.04], LocalTest::Simes, 0.03, 4)]
#[case(vec![1e-6, 0.5, 0.9], LocalTest::Simes, 0.05, 2)]
#[case(vec![1e-6, 0.5, 0.9], LocalTest::Hommel, 0.05, 2)]
#[case(vec![0.01, 0.02, 0.6, 0.8], LocalTest::Simes, 0.05, 3)]
#[case(vec![0.001], LocalTest::Simes, 0.05, 0)]
fn h_alpha_counts_unrejected_hypotheses(
    #[case] p: Vec<f64>,
    #[case] test: LocalTest,
    #[case] alpha: f64,
    #[case] expected: usize,
) {
    let hommel = Hommel::from_sorted(p, test);
    assert_eq!(hommel.h_alpha(alpha), expected);
}

#[test]
fn level_treats_full_rejection_as_zero_height() {
    let hommel = Hommel::from_sorted(vec![0.01, 0.02, 0.03, 0.04], LocalTest::Simes);
    let level = hommel.level(0.05);
    assert_eq!(level.h(), 0);
    assert_eq!(level.simes_height(), 0.0);
    assert_eq!(level.concentration(), 3);
}

#[test]
fn level_concentrates_on_the_smallest_prefix() {
    let hommel = Hommel::from_sorted(vec![1e-6, 0.5, 0.9], LocalTest::Hommel);
    let level = hommel.level(0.05);
    assert_eq!(level.h(), 2);
    assert!((level.simes_height() - 1.5).abs() < 1e-12);
    assert_eq!(level.concentration(), 0);
}

#[rstest]
#[case(0.0, 0)]
#[case(1e-6, 0)]
#[case(0.5, 14)]
#[case(0.9, 26)]
fn category_prices_each_p_value(#[case] p: f64, #[case] expected: usize) {
    let hommel = Hommel::from_sorted(vec![1e-6, 0.5, 0.9], LocalTest::Hommel);
    let level = hommel.level(0.05);
    assert_eq!(hommel.category(p, &level), expected);
}

#[test]
fn discoveries_count_only_the_certain_voxel_when_h_is_positive() {
    let hommel = Hommel::from_sorted(vec![1e-6, 0.5, 0.9], LocalTest::Hommel);
    let level = hommel.level(0.05);
    let disc = hommel.discoveries(&level, [1e-6, 0.5, 0.9]);
    assert_eq!(disc, vec![1, 1, 1]);
}

#[test]
fn discoveries_count_everything_when_the_closure_rejects_all() {
    let hommel = Hommel::from_sorted(vec![0.01, 0.02, 0.03, 0.04], LocalTest::Simes);
    let level = hommel.level(0.05);
    let disc = hommel.discoveries(&level, [0.01, 0.02, 0.03, 0.04]);
    assert_eq!(disc, vec![1, 2, 3, 4]);
}

#[test]
fn discoveries_consume_budget_across_tied_p_values() {
    let hommel = Hommel::from_sorted(vec![0.1, 0.1, 0.1], LocalTest::Simes);
    let level = hommel.level(0.05);
    assert_eq!(level.h(), 3);
    let disc = hommel.discoveries(&level, [0.1, 0.1, 0.1]);
    assert_eq!(disc, vec![0, 1, 2]);
}

#[test]
fn discoveries_are_monotone_with_unit_steps() {
    let p = vec![0.001, 0.004, 0.02, 0.3, 0.44, 0.9];
    let hommel = Hommel::from_sorted(p.clone(), LocalTest::Simes);
    let level = hommel.level(0.05);
    let disc = hommel.discoveries(&level, p.iter().rev().copied());
    for w in disc.windows(2) {
        assert!(w[1] == w[0] || w[1] == w[0] + 1, "steps must be 0 or 1: {disc:?}");
    }
}

#[test]
fn empty_subset_yields_no_discoveries() {
    let hommel = Hommel::from_sorted(vec![0.2, 0.4], LocalTest::Simes);
    let level = hommel.level(0.05);
    assert!(hommel.discoveries(&level, []).is_empty());
}

#[rstest]
#[case(vec![0.001], vec![0.001])]
#[case(vec![0.01, 0.02, 0.03, 0.04], vec![0.04, 0.04, 0.04, 0.04])]
fn adjusted_elementary_prices_hypotheses_by_the_closure(
    #[case] p: Vec<f64>,
    #[case] expected: Vec<f64>,
) {
    let hommel = Hommel::from_sorted(p, LocalTest::Simes);
    assert!(close(&hommel.adjusted_elementary(), &expected));
}
