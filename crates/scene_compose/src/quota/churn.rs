//! Minimal-churn reassignment of pool members to new per-kind counts.
use crate::catalog::ConditionKind;
use crate::quota::{largest_remainder, KindCounts};

/// Reassign the fewest members of `kinds` so the per-kind tally matches `target`.
///
/// If `target` does not sum to `kinds.len()` it is first re-normalized with
/// [`largest_remainder`]. Donors are the kinds with the largest surplus; each donation pops
/// the most recent holder of that kind (array order) and hands it to the kind with the
/// largest remaining need. Ties prefer the lower kind index. Returns the indices that
/// changed kind, in reassignment order.
pub fn retarget(kinds: &mut [ConditionKind], target: &KindCounts) -> Vec<usize> {
    let total = kinds.len();
    let target: KindCounts = if target.iter().sum::<usize>() == total {
        *target
    } else {
        let weights = target.map(|c| c as f32);
        let mut fixed = [0; ConditionKind::COUNT];
        fixed.copy_from_slice(&largest_remainder(&weights, total));
        fixed
    };

    let mut holders: [Vec<usize>; ConditionKind::COUNT] = Default::default();
    for (i, kind) in kinds.iter().enumerate() {
        holders[kind.index()].push(i);
    }

    let mut surplus = [0usize; ConditionKind::COUNT];
    let mut need = [0usize; ConditionKind::COUNT];
    for k in 0..ConditionKind::COUNT {
        let current = holders[k].len();
        surplus[k] = current.saturating_sub(target[k]);
        need[k] = target[k].saturating_sub(current);
    }

    let mut changed = Vec::new();
    while let (Some(donor), Some(recipient)) = (largest(&surplus), largest(&need)) {
        let Some(idx) = holders[donor].pop() else {
            break;
        };
        let Some(kind) = ConditionKind::from_index(recipient) else {
            break;
        };
        kinds[idx] = kind;
        surplus[donor] -= 1;
        need[recipient] -= 1;
        changed.push(idx);
    }
    changed
}

/// Index of the largest positive entry, lowest index on ties.
fn largest(values: &[usize; ConditionKind::COUNT]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if v > 0 && best.is_none_or(|b| v > values[b]) {
            best = Some(i);
        }
    }
    best
}

/// Tally of members per kind.
pub fn count_kinds(kinds: &[ConditionKind]) -> KindCounts {
    let mut counts = [0; ConditionKind::COUNT];
    for kind in kinds {
        counts[kind.index()] += 1;
    }
    counts
}
