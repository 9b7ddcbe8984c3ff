//! Closed catalogs of condition kinds and shapes, plus the static tables that drive a scene.
//!
//! [`SceneTables`] bundles everything the engine consumes for one device/mode bucket:
//! per-kind variant catalogs and quota curves, the kind-mix curve, and per-shape bands
//! and metadata. Resolving which bucket applies is the caller's job.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Coarse condition category governing which shapes are eligible and at what quota.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConditionKind {
    Clear,
    Cloudy,
    Rainy,
    Stormy,
}

impl ConditionKind {
    pub const COUNT: usize = 4;
    pub const ALL: [ConditionKind; Self::COUNT] = [
        ConditionKind::Clear,
        ConditionKind::Cloudy,
        ConditionKind::Rainy,
        ConditionKind::Stormy,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            ConditionKind::Clear => 0,
            ConditionKind::Cloudy => 1,
            ConditionKind::Rainy => 2,
            ConditionKind::Stormy => 3,
        }
    }

    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ConditionKind::Clear),
            1 => Some(ConditionKind::Cloudy),
            2 => Some(ConditionKind::Rainy),
            3 => Some(ConditionKind::Stormy),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ConditionKind::Clear => "clear",
            ConditionKind::Cloudy => "cloudy",
            ConditionKind::Rainy => "rainy",
            ConditionKind::Stormy => "stormy",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A concrete drawable entity.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeId {
    Sun,
    Bird,
    Cloud,
    RainCloud,
    StormCloud,
    Lightning,
    House,
    Tower,
    Factory,
    Tree,
    Car,
    Bus,
}

impl ShapeId {
    pub const ALL: [ShapeId; 12] = [
        ShapeId::Sun,
        ShapeId::Bird,
        ShapeId::Cloud,
        ShapeId::RainCloud,
        ShapeId::StormCloud,
        ShapeId::Lightning,
        ShapeId::House,
        ShapeId::Tower,
        ShapeId::Factory,
        ShapeId::Tree,
        ShapeId::Car,
        ShapeId::Bus,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ShapeId::Sun => "sun",
            ShapeId::Bird => "bird",
            ShapeId::Cloud => "cloud",
            ShapeId::RainCloud => "rain_cloud",
            ShapeId::StormCloud => "storm_cloud",
            ShapeId::Lightning => "lightning",
            ShapeId::House => "house",
            ShapeId::Tower => "tower",
            ShapeId::Factory => "factory",
            ShapeId::Tree => "tree",
            ShapeId::Car => "car",
            ShapeId::Bus => "bus",
        }
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Crowding group; same-group shapes repel each other during scoring.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeGroup {
    Sky,
    Cloud,
    Weather,
    Fauna,
    Building,
    Nature,
    Vehicle,
}

/// Footprint size in cells.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    pub w: usize,
    pub h: usize,
}

impl Size {
    pub const fn new(w: usize, h: usize) -> Self {
        Self { w, h }
    }

    #[inline]
    pub const fn is_unit(self) -> bool {
        self.w == 1 && self.h == 1
    }
}

/// One eligible shape of a kind with its static footprint size.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Variant {
    pub shape: ShapeId,
    pub size: Size,
}

impl Variant {
    pub const fn new(shape: ShapeId, w: usize, h: usize) -> Self {
        Self {
            shape,
            size: Size::new(w, h),
        }
    }
}

/// Legal vertical range of a shape, as fractions of the used rows.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    pub top_k: f32,
    pub bot_k: f32,
}

impl Band {
    pub const FULL: Band = Band {
        top_k: 0.0,
        bot_k: 1.0,
    };

    pub const fn new(top_k: f32, bot_k: f32) -> Self {
        Self { top_k, bot_k }
    }
}

/// Scoring metadata for a shape.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeMeta {
    pub group: ShapeGroup,
    /// Preferred minimum center distance, in cells, to other members of `group`.
    pub separation: f32,
    /// Purely ornamental shapes are the last choice for post-fix replacement.
    #[cfg_attr(feature = "serde", serde(default))]
    pub decorative: bool,
}

impl ShapeMeta {
    pub const fn new(group: ShapeGroup, separation: f32) -> Self {
        Self {
            group,
            separation,
            decorative: false,
        }
    }

    pub const fn decorative(mut self) -> Self {
        self.decorative = true;
        self
    }
}

/// Per-shape cap in a quota anchor.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuotaLimit {
    Capped(u32),
    /// Fill candidate: takes whatever the capped shapes leave over.
    Unbounded,
}

/// Shape quota limits of one kind at control value `t`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct QuotaAnchor {
    pub t: f32,
    pub limits: BTreeMap<ShapeId, QuotaLimit>,
}

impl QuotaAnchor {
    pub fn new(t: f32) -> Self {
        Self {
            t,
            limits: BTreeMap::new(),
        }
    }

    pub fn capped(mut self, shape: ShapeId, cap: u32) -> Self {
        self.limits.insert(shape, QuotaLimit::Capped(cap));
        self
    }

    pub fn unbounded(mut self, shape: ShapeId) -> Self {
        self.limits.insert(shape, QuotaLimit::Unbounded);
        self
    }
}

/// Kind-mix weights at control value `t`, indexed by [`ConditionKind::index`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MixAnchor {
    pub t: f32,
    pub weights: [f32; ConditionKind::COUNT],
}

impl MixAnchor {
    pub const fn new(t: f32, weights: [f32; ConditionKind::COUNT]) -> Self {
        Self { t, weights }
    }
}

/// Variants and quota curve of a single kind.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KindCatalog {
    pub variants: Vec<Variant>,
    pub quota: Vec<QuotaAnchor>,
}

impl KindCatalog {
    pub fn new(variants: Vec<Variant>) -> Self {
        Self {
            variants,
            quota: Vec::new(),
        }
    }

    pub fn with_anchor(mut self, anchor: QuotaAnchor) -> Self {
        self.quota.push(anchor);
        self
    }

    pub fn variant(&self, shape: ShapeId) -> Option<&Variant> {
        self.variants.iter().find(|v| v.shape == shape)
    }
}

/// Static configuration for one device/mode bucket, already resolved by the caller.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct SceneTables {
    pub kinds: [KindCatalog; ConditionKind::COUNT],
    pub mix: Vec<MixAnchor>,
    pub bands: BTreeMap<ShapeId, Band>,
    pub meta: BTreeMap<ShapeId, ShapeMeta>,
}

impl SceneTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: ConditionKind, catalog: KindCatalog) -> Self {
        self.kinds[kind.index()] = catalog;
        self
    }

    pub fn with_mix(mut self, anchor: MixAnchor) -> Self {
        self.mix.push(anchor);
        self
    }

    pub fn with_shape(mut self, shape: ShapeId, band: Band, meta: ShapeMeta) -> Self {
        self.bands.insert(shape, band);
        self.meta.insert(shape, meta);
        self
    }

    #[inline]
    pub fn catalog(&self, kind: ConditionKind) -> &KindCatalog {
        &self.kinds[kind.index()]
    }

    pub fn band(&self, shape: ShapeId) -> Result<Band> {
        self.bands
            .get(&shape)
            .copied()
            .ok_or(Error::MissingBand { shape })
    }

    pub fn meta(&self, shape: ShapeId) -> Result<&ShapeMeta> {
        self.meta.get(&shape).ok_or(Error::MissingMeta { shape })
    }

    /// Finds the static size of `shape` in any kind's catalog.
    pub fn size_of(&self, shape: ShapeId) -> Option<Size> {
        self.kinds
            .iter()
            .find_map(|c| c.variant(shape))
            .map(|v| v.size)
    }

    /// Checks every table entry the engine will consult.
    pub fn validate(&self) -> Result<()> {
        validate_anchor_order(self.mix.iter().map(|a| a.t), "kind mix")?;
        for anchor in &self.mix {
            if anchor.weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "kind mix weights at t={} must be finite and >= 0",
                    anchor.t
                )));
            }
        }

        for kind in ConditionKind::ALL {
            let catalog = self.catalog(kind);
            if catalog.variants.is_empty() {
                return Err(Error::EmptyCatalog { kind });
            }

            let mut seen = BTreeSet::new();
            for variant in &catalog.variants {
                if !seen.insert(variant.shape) {
                    return Err(Error::DuplicateVariant {
                        kind,
                        shape: variant.shape,
                    });
                }
                if variant.size.w == 0 || variant.size.h == 0 {
                    return Err(Error::InvalidConfig(format!(
                        "variant '{}' of kind '{kind}' has an empty footprint",
                        variant.shape
                    )));
                }
                self.band(variant.shape)?;
                self.meta(variant.shape)?;
            }

            validate_anchor_order(
                catalog.quota.iter().map(|a| a.t),
                &format!("quota of kind '{kind}'"),
            )?;
            for anchor in &catalog.quota {
                if let Some(stray) = anchor.limits.keys().find(|s| !seen.contains(s)) {
                    return Err(Error::InvalidConfig(format!(
                        "quota of kind '{kind}' references shape '{stray}' outside its catalog"
                    )));
                }
            }
        }

        for (shape, band) in &self.bands {
            let in_range = |k: f32| k.is_finite() && (0.0..=1.0).contains(&k);
            if !in_range(band.top_k) || !in_range(band.bot_k) || band.top_k > band.bot_k {
                return Err(Error::InvalidConfig(format!(
                    "band of shape '{shape}' must satisfy 0 <= top_k <= bot_k <= 1"
                )));
            }
        }

        for (shape, meta) in &self.meta {
            if !meta.separation.is_finite() || meta.separation < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "separation of shape '{shape}' must be finite and >= 0"
                )));
            }
        }

        Ok(())
    }
}

fn validate_anchor_order(ts: impl Iterator<Item = f32>, what: &str) -> Result<()> {
    let mut prev: Option<f32> = None;
    let mut any = false;
    for t in ts {
        any = true;
        if !t.is_finite() || !(0.0..=1.0).contains(&t) {
            return Err(Error::InvalidConfig(format!(
                "{what}: anchor t={t} outside [0, 1]"
            )));
        }
        if prev.is_some_and(|p| t < p) {
            return Err(Error::InvalidConfig(format!(
                "{what}: anchors must be sorted by t"
            )));
        }
        prev = Some(t);
    }
    if !any {
        return Err(Error::EmptyCurve(what.to_owned()));
    }
    Ok(())
}
