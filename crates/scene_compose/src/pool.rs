//! Caller-owned pool of scene members and its size lifecycle.
//!
//! A [`PoolItem`]'s `id` is the only field that must survive across compositions; kind,
//! shape and placement are recomputed on every pass.
use glam::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::catalog::{ConditionKind, ShapeId, Size};
use crate::error::{Error, Result};
use crate::grid::Footprint;
use crate::quota::bracket;

/// Unit of identity and temporal stability.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct PoolItem {
    pub id: u32,
    pub kind: ConditionKind,
    pub shape: Option<ShapeId>,
    pub size: Option<Size>,
    pub footprint: Option<Footprint>,
    /// Pixel position of the footprint center.
    pub position: Option<Vec2>,
}

impl PoolItem {
    pub fn new(id: u32, kind: ConditionKind) -> Self {
        Self {
            id,
            kind,
            shape: None,
            size: None,
            footprint: None,
            position: None,
        }
    }

    #[inline]
    pub fn is_placed(&self) -> bool {
        self.footprint.is_some()
    }

    pub fn clear_placement(&mut self) {
        self.footprint = None;
        self.position = None;
    }
}

/// Grow or shrink `pool` to `desired` members.
///
/// New members get ids above the current maximum and start as `seed_kind`; the next
/// retarget moves them to whichever kinds need members. Shrinking truncates from the end.
pub fn resize_pool(pool: &mut Vec<PoolItem>, desired: usize, seed_kind: ConditionKind) {
    if desired <= pool.len() {
        pool.truncate(desired);
        return;
    }
    let mut next_id = pool
        .iter()
        .map(|p| p.id)
        .max()
        .map_or(0, |m| m.saturating_add(1));
    pool.reserve(desired - pool.len());
    while pool.len() < desired {
        pool.push(PoolItem::new(next_id, seed_kind));
        next_id = next_id.saturating_add(1);
    }
}

/// Desired pool size at a control value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensityAnchor {
    pub t: f32,
    pub count: f32,
}

/// Piecewise-linear curve from control value to pool size.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DensityCurve {
    pub anchors: Vec<DensityAnchor>,
}

impl DensityCurve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anchor(mut self, t: f32, count: f32) -> Self {
        self.anchors.push(DensityAnchor { t, count });
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.anchors.is_empty() {
            return Err(Error::EmptyCurve("density".into()));
        }
        if self.anchors.windows(2).any(|w| w[1].t < w[0].t) {
            return Err(Error::InvalidConfig(
                "density anchors must be sorted by t".into(),
            ));
        }
        if self
            .anchors
            .iter()
            .any(|a| !a.count.is_finite() || a.count < 0.0)
        {
            return Err(Error::InvalidConfig(
                "density counts must be finite and >= 0".into(),
            ));
        }
        Ok(())
    }

    /// Rounded pool size at `u`; zero for an empty curve.
    pub fn desired_size(&self, u: f32) -> usize {
        let Some((lo, hi, f)) = bracket(&self.anchors, |a| a.t, u) else {
            return 0;
        };
        let (a, b) = (self.anchors[lo].count, self.anchors[hi].count);
        (a + (b - a) * f).round().max(0.0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growing_assigns_fresh_ids_above_max() {
        let mut pool = vec![
            PoolItem::new(4, ConditionKind::Rainy),
            PoolItem::new(9, ConditionKind::Clear),
        ];
        resize_pool(&mut pool, 5, ConditionKind::Cloudy);
        let ids: Vec<u32> = pool.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![4, 9, 10, 11, 12]);
        assert!(pool[2..].iter().all(|p| p.kind == ConditionKind::Cloudy));
        assert_eq!(pool[0].kind, ConditionKind::Rainy);
    }

    #[test]
    fn shrinking_truncates_from_the_end() {
        let mut pool = Vec::new();
        resize_pool(&mut pool, 4, ConditionKind::Clear);
        assert_eq!(pool.iter().map(|p| p.id).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        resize_pool(&mut pool, 2, ConditionKind::Clear);
        assert_eq!(pool.iter().map(|p| p.id).collect::<Vec<_>>(), vec![0, 1]);
        resize_pool(&mut pool, 3, ConditionKind::Clear);
        // Ids are only unique among live members; 2 is free again after truncation.
        assert_eq!(pool.iter().map(|p| p.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn density_curve_interpolates_and_rounds() {
        let curve = DensityCurve::new()
            .with_anchor(0.0, 10.0)
            .with_anchor(1.0, 20.0);
        curve.validate().unwrap();
        assert_eq!(curve.desired_size(0.0), 10);
        assert_eq!(curve.desired_size(0.26), 13);
        assert_eq!(curve.desired_size(1.0), 20);
        assert_eq!(curve.desired_size(4.0), 20);
        assert_eq!(DensityCurve::new().desired_size(0.5), 0);
        assert!(DensityCurve::new().validate().is_err());
    }

    #[test]
    fn placement_is_cleared() {
        let mut item = PoolItem::new(1, ConditionKind::Clear);
        item.footprint = Some(Footprint::new(0, 0, 1, 1));
        item.position = Some(Vec2::ONE);
        assert!(item.is_placed());
        item.clear_placement();
        assert!(!item.is_placed());
        assert!(item.position.is_none());
    }
}
