//! Kind quotas: control value and pool size to exact integer counts per kind.
//!
//! - [largest_remainder]: weights to integers summing exactly to a target (Hare quota).
//! - [allocate]: interpolate the kind-mix curve at `u`, then round with [largest_remainder].
//! - [churn::retarget]: move the fewest pool members between kinds to hit new counts.
//! - [curve::resolve_quota]: per-shape caps of a kind at `u`.
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::catalog::{ConditionKind, MixAnchor};
use crate::error::{Error, Result};

pub mod churn;
pub mod curve;

pub use churn::retarget;
pub use curve::{resolve_quota, ResolvedQuota};

/// Integer member count per kind, indexed by [`ConditionKind::index`].
pub type KindCounts = [usize; ConditionKind::COUNT];

/// Post-rounding adjustment applied by [`allocate`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DominancePolicy {
    /// Keep the largest-remainder result as is.
    Off,
    /// If the highest-weight kind rounded to zero, take one unit from the largest other bucket.
    #[default]
    EnsureDominant,
}

/// Distribute `total` units proportionally to `weights`.
///
/// Floors every proportional share, then hands the leftover units one at a time to the
/// largest fractional remainders (ties go to the lower index). The result always sums to
/// `total` when `weights` is non-empty. Negative or non-finite weights count as zero; an
/// all-zero vector is treated as uniform.
pub fn largest_remainder(weights: &[f32], total: usize) -> Vec<usize> {
    let k = weights.len();
    if k == 0 {
        return Vec::new();
    }

    let mut clean: Vec<f64> = weights
        .iter()
        .map(|&w| if w.is_finite() && w > 0.0 { w as f64 } else { 0.0 })
        .collect();
    let mut sum: f64 = clean.iter().sum();
    if !(sum.is_finite() && sum > 0.0) {
        clean.iter_mut().for_each(|w| *w = 1.0);
        sum = k as f64;
    }

    let mut counts = Vec::with_capacity(k);
    let mut remainders = Vec::with_capacity(k);
    for w in &clean {
        let scaled = w * total as f64 / sum;
        let floor = scaled.floor();
        counts.push(floor as usize);
        remainders.push(scaled - floor);
    }

    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| remainders[b].total_cmp(&remainders[a]).then(a.cmp(&b)));

    let assigned: usize = counts.iter().sum();
    if assigned < total {
        for &i in order.iter().cycle().take(total - assigned) {
            counts[i] += 1;
        }
    } else if assigned > total {
        // Only reachable through float error; trim the smallest remainders first.
        let mut excess = assigned - total;
        for &i in order.iter().rev().cycle() {
            if excess == 0 {
                break;
            }
            if counts[i] > 0 {
                counts[i] -= 1;
                excess -= 1;
            }
        }
    }

    counts
}

/// Gives the highest-weight kind at least one member when `total > 0`.
///
/// Returns `true` if a unit was moved.
pub fn ensure_dominant(weights: &[f32], counts: &mut [usize]) -> bool {
    let total: usize = counts.iter().sum();
    if total == 0 || weights.len() != counts.len() {
        return false;
    }

    let finite = weights.iter().map(|w| if w.is_finite() { *w } else { 0.0 });
    let Some(dominant) = argmax_first(finite) else {
        return false;
    };
    if weights[dominant] <= 0.0 || counts[dominant] > 0 {
        return false;
    }

    let donor = argmax_first(
        counts
            .iter()
            .enumerate()
            .map(|(i, &c)| if i == dominant { 0.0 } else { c as f32 }),
    );
    match donor {
        Some(d) if counts[d] > 0 => {
            counts[d] -= 1;
            counts[dominant] += 1;
            true
        }
        _ => false,
    }
}

/// Kind-mix weights at control value `u`.
pub fn mix_weights(mix: &[MixAnchor], u: f32) -> Result<[f32; ConditionKind::COUNT]> {
    let (lo, hi, f) =
        bracket(mix, |a| a.t, u).ok_or_else(|| Error::EmptyCurve("kind mix".into()))?;
    let (a, b) = (&mix[lo].weights, &mix[hi].weights);
    let mut out = [0.0; ConditionKind::COUNT];
    for (i, w) in out.iter_mut().enumerate() {
        *w = a[i] + (b[i] - a[i]) * f;
    }
    Ok(out)
}

/// Per-kind counts for a pool of `total` members at control value `u`.
pub fn allocate(
    mix: &[MixAnchor],
    u: f32,
    total: usize,
    policy: DominancePolicy,
) -> Result<KindCounts> {
    let weights = mix_weights(mix, u)?;
    let rounded = largest_remainder(&weights, total);

    let mut counts: KindCounts = [0; ConditionKind::COUNT];
    counts.copy_from_slice(&rounded);
    if policy == DominancePolicy::EnsureDominant && ensure_dominant(&weights, &mut counts) {
        debug!(?weights, ?counts, "moved one unit to the dominant kind");
    }
    Ok(counts)
}

/// Clamp a control value into `[0, 1]`, mapping NaN to 0.
#[inline]
pub fn clamp_unit(u: f32) -> f32 {
    if u.is_nan() {
        0.0
    } else {
        u.clamp(0.0, 1.0)
    }
}

/// Locate the anchors bracketing `u`.
///
/// Returns `(lo, hi, f)` with `value = a[lo] + (a[hi] - a[lo]) * f`. Values outside the
/// anchor range, or exactly on an anchor, resolve to a single anchor (`lo == hi`).
pub(crate) fn bracket<T>(
    anchors: &[T],
    t_of: impl Fn(&T) -> f32,
    u: f32,
) -> Option<(usize, usize, f32)> {
    if anchors.is_empty() {
        return None;
    }
    let u = clamp_unit(u);
    let Some(hi) = anchors.iter().position(|a| t_of(a) >= u) else {
        let last = anchors.len() - 1;
        return Some((last, last, 0.0));
    };
    let t_hi = t_of(&anchors[hi]);
    if hi == 0 || t_hi == u {
        return Some((hi, hi, 0.0));
    }
    let lo = hi - 1;
    let t_lo = t_of(&anchors[lo]);
    let span = t_hi - t_lo;
    let f = if span > 0.0 { (u - t_lo) / span } else { 0.0 };
    Some((lo, hi, f.clamp(0.0, 1.0)))
}

fn argmax_first(values: impl Iterator<Item = f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, v) in values.enumerate() {
        if best.is_none_or(|(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use rand::prelude::*;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn exact_sum_for_random_weights() {
        let mut rng = StdRng::seed_from_u64(0xA11C);
        for _ in 0..500 {
            let k = rng.random_range(1..8usize);
            let weights: Vec<f32> = (0..k)
                .map(|_| {
                    if rng.random::<f32>() < 0.2 {
                        0.0
                    } else {
                        rng.random_range(0.0..50.0f32)
                    }
                })
                .collect();
            let n = rng.random_range(0..200usize);
            let counts = largest_remainder(&weights, n);
            assert_eq!(counts.len(), k);
            assert_eq!(counts.iter().sum::<usize>(), n, "weights {weights:?}");
        }
    }

    #[test]
    fn counts_stay_within_one_of_share() {
        let weights = [2.0, 4.0, 10.0, 8.0];
        let counts = largest_remainder(&weights, 24);
        assert_eq!(counts.iter().sum::<usize>(), 24);
        for (w, c) in weights.iter().zip(&counts) {
            let share = w * 24.0 / 24.0;
            assert!((*c as f32 - share).abs() <= 1.0, "{counts:?}");
        }
        assert_eq!(counts, vec![2, 4, 10, 8]);
    }

    #[test]
    fn remainder_ties_go_to_lower_index() {
        assert_eq!(largest_remainder(&[1.0, 1.0, 1.0], 2), vec![1, 1, 0]);
        assert_eq!(largest_remainder(&[1.0, 1.0, 1.0, 1.0], 5), vec![2, 1, 1, 1]);
        // 3 * 1/6 = 0.5, 3 * 2/6 = 1.0, 3 * 3/6 = 1.5
        assert_eq!(largest_remainder(&[1.0, 2.0, 3.0], 3), vec![1, 1, 1]);
    }

    #[test]
    fn degenerate_weights_fall_back_to_uniform() {
        assert_eq!(largest_remainder(&[0.0, 0.0], 3), vec![2, 1]);
        assert_eq!(largest_remainder(&[f32::NAN, -1.0, 0.0], 3), vec![1, 1, 1]);
        assert_eq!(largest_remainder(&[f32::NAN, 2.0], 4), vec![0, 4]);
        assert!(largest_remainder(&[], 4).is_empty());
        assert_eq!(largest_remainder(&[3.0, 1.0], 0), vec![0, 0]);
    }

    #[test]
    fn dominant_kind_steals_from_largest_bucket() {
        // The first kind dominates by weight but every bucket gets a floor of zero.
        let weights = [0.4, 0.3, 0.3];
        let mut counts = largest_remainder(&weights, 1);
        assert_eq!(counts, vec![1, 0, 0]);
        assert!(!ensure_dominant(&weights, &mut counts));

        let weights = [0.34, 0.33, 0.33];
        let mut counts = vec![0, 2, 1];
        assert!(ensure_dominant(&weights, &mut counts));
        assert_eq!(counts, vec![1, 1, 1]);

        let mut empty = vec![0, 0, 0];
        assert!(!ensure_dominant(&weights, &mut empty));
    }

    #[test]
    fn mix_interpolates_between_anchors() {
        let mix = vec![
            MixAnchor::new(0.0, [4.0, 0.0, 0.0, 0.0]),
            MixAnchor::new(1.0, [0.0, 0.0, 0.0, 4.0]),
        ];
        assert_eq!(mix_weights(&mix, 0.25).unwrap(), [3.0, 0.0, 0.0, 1.0]);
        assert_eq!(mix_weights(&mix, -3.0).unwrap(), [4.0, 0.0, 0.0, 0.0]);
        assert_eq!(mix_weights(&mix, 7.0).unwrap(), [0.0, 0.0, 0.0, 4.0]);
        assert_eq!(mix_weights(&mix, f32::NAN).unwrap(), [4.0, 0.0, 0.0, 0.0]);
        assert!(matches!(mix_weights(&[], 0.5), Err(Error::EmptyCurve(_))));
    }

    #[test]
    fn allocate_sums_to_pool_size() {
        let mix = vec![
            MixAnchor::new(0.0, [10.0, 2.0, 0.0, 0.0]),
            MixAnchor::new(1.0, [0.0, 2.0, 4.0, 10.0]),
        ];
        for step in 0..=20 {
            let u = step as f32 / 20.0;
            let counts = allocate(&mix, u, 17, DominancePolicy::EnsureDominant).unwrap();
            assert_eq!(counts.iter().sum::<usize>(), 17);
        }
        assert_eq!(
            allocate(&mix, 0.0, 12, DominancePolicy::Off).unwrap(),
            [10, 2, 0, 0]
        );
    }

    #[test]
    fn bracket_resolves_exact_anchor_alone() {
        let ts = [0.0f32, 0.5, 1.0];
        assert_eq!(bracket(&ts, |t| *t, 0.5), Some((1, 1, 0.0)));
        assert_eq!(bracket(&ts, |t| *t, 0.75), Some((1, 2, 0.5)));
        assert_eq!(bracket(&[0.3f32], |t| *t, 0.9), Some((0, 0, 0.0)));
        assert_eq!(bracket::<f32>(&[], |t| *t, 0.9), None);
    }
}
