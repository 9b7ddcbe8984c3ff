//! Per-kind shape quota curves.
use crate::catalog::{QuotaAnchor, QuotaLimit, ShapeId, Variant};
use crate::quota::bracket;

/// Shape limits of one kind at a fixed control value, in catalog order.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedQuota {
    pub entries: Vec<(Variant, QuotaLimit)>,
}

impl ResolvedQuota {
    pub fn limit(&self, shape: ShapeId) -> Option<QuotaLimit> {
        self.entries
            .iter()
            .find(|(v, _)| v.shape == shape)
            .map(|(_, l)| *l)
    }

    pub fn has_fill(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, l)| matches!(l, QuotaLimit::Unbounded))
    }
}

/// Resolve a kind's quota curve at `u` over its variant catalog.
///
/// Limits of the two bracketing anchors are blended linearly and floored. An unbounded limit
/// on either side stays unbounded. Catalog shapes an anchor does not mention count as a cap
/// of zero on that side.
pub fn resolve_quota(anchors: &[QuotaAnchor], catalog: &[Variant], u: f32) -> ResolvedQuota {
    let Some((lo, hi, f)) = bracket(anchors, |a| a.t, u) else {
        return ResolvedQuota {
            entries: catalog
                .iter()
                .map(|v| (*v, QuotaLimit::Capped(0)))
                .collect(),
        };
    };

    let (a, b) = (&anchors[lo], &anchors[hi]);
    let entries = catalog
        .iter()
        .map(|v| {
            let limit = blend(
                a.limits.get(&v.shape).copied(),
                b.limits.get(&v.shape).copied(),
                f,
            );
            (*v, limit)
        })
        .collect();
    ResolvedQuota { entries }
}

fn blend(a: Option<QuotaLimit>, b: Option<QuotaLimit>, f: f32) -> QuotaLimit {
    let cap = |l: Option<QuotaLimit>| match l {
        Some(QuotaLimit::Capped(n)) => Some(n as f32),
        Some(QuotaLimit::Unbounded) => None,
        None => Some(0.0),
    };
    match (cap(a), cap(b)) {
        (Some(x), Some(y)) => QuotaLimit::Capped((x + (y - x) * f).floor().max(0.0) as u32),
        _ => QuotaLimit::Unbounded,
    }
}
