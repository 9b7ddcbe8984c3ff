//! Shape planning: resolve every pool member's kind into a concrete shape and size.
//!
//! Members of a kind are visited in hash order of `(id, salt)` rather than pool order, so
//! the first members in the pool do not systematically win the capped shapes. Capped shapes
//! are taken in catalog order while capacity remains; afterwards members rotate through the
//! unbounded fill shapes.
use tracing::warn;

use crate::catalog::{ConditionKind, KindCatalog, QuotaLimit, SceneTables, Variant};
use crate::error::{Error, Result};
use crate::hash::KeyHasher;
use crate::pool::PoolItem;
use crate::quota::resolve_quota;

/// Deterministic visiting order of a kind's members.
pub fn member_order(kind: ConditionKind, ids: &[u32], salt: u32) -> Vec<usize> {
    let keys: Vec<u32> = ids
        .iter()
        .map(|&id| {
            KeyHasher::new()
                .str("plan")
                .usize(kind.index())
                .u32(id)
                .u32(salt)
                .finish()
        })
        .collect();
    let mut order: Vec<usize> = (0..ids.len()).collect();
    order.sort_by_key(|&i| (keys[i], ids[i]));
    order
}

/// Pick a variant for each member id of `kind`, returned in the same order as `ids`.
pub fn plan_kind(
    kind: ConditionKind,
    catalog: &KindCatalog,
    ids: &[u32],
    u: f32,
    salt: u32,
) -> Result<Vec<Variant>> {
    let first = *catalog
        .variants
        .first()
        .ok_or(Error::EmptyCatalog { kind })?;

    let quota = resolve_quota(&catalog.quota, &catalog.variants, u);
    let mut remaining: Vec<Option<u32>> = quota
        .entries
        .iter()
        .map(|(_, limit)| match limit {
            QuotaLimit::Capped(n) => Some(*n),
            QuotaLimit::Unbounded => None,
        })
        .collect();
    let fills: Vec<usize> = remaining
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.is_none().then_some(i))
        .collect();

    let mut assigned = vec![first; ids.len()];
    let mut fill_cursor = 0;
    let mut overflowed = 0usize;
    for member in member_order(kind, ids, salt) {
        let capped = remaining
            .iter_mut()
            .enumerate()
            .find(|(_, r)| matches!(r, Some(n) if *n > 0));
        assigned[member] = if let Some((i, slot)) = capped {
            if let Some(n) = slot.as_mut() {
                *n -= 1;
            }
            quota.entries[i].0
        } else if !fills.is_empty() {
            let i = fills[fill_cursor % fills.len()];
            fill_cursor += 1;
            quota.entries[i].0
        } else {
            overflowed += 1;
            first
        };
    }

    if overflowed > 0 {
        warn!(
            "Kind '{}' exhausted its capped quota with no fill shape; {} member(s) use '{}'.",
            kind, overflowed, first.shape
        );
    }
    Ok(assigned)
}

/// Assign shape and size to every member of `pool`, bucketed by kind.
pub fn plan_shapes(
    tables: &SceneTables,
    pool: &mut [PoolItem],
    u: f32,
    salt: u32,
) -> Result<()> {
    for kind in ConditionKind::ALL {
        let members: Vec<usize> = pool
            .iter()
            .enumerate()
            .filter_map(|(i, p)| (p.kind == kind).then_some(i))
            .collect();
        if members.is_empty() {
            continue;
        }
        let ids: Vec<u32> = members.iter().map(|&i| pool[i].id).collect();
        let variants = plan_kind(kind, tables.catalog(kind), &ids, u, salt)?;
        for (&i, variant) in members.iter().zip(variants) {
            let item = &mut pool[i];
            item.shape = Some(variant.shape);
            item.size = Some(variant.size);
            item.clear_placement();
        }
    }
    Ok(())
}
