#![forbid(unsafe_code)]
//! scene_compose: deterministic, low-churn placement of weather-driven scene items.
//!
//! A single control value `u` in `[0, 1]` drives which kinds appear, which shapes they
//! take, and where they land on a coarse grid over the canvas. Results are a pure function
//! of the inputs; the pool returned from one pass seeds the next so small changes of `u`
//! move few members.
//!
//! Modules:
//! - hash: keyed 32-bit hashing and `[0, 1)` derivations
//! - grid: canvas to cell grid, forbidden zones, occupancy
//! - catalog: kinds, shapes, bands, quota and mix tables
//! - quota: kind allocation, minimal-churn retargeting, shape quota curves
//! - planner: per-kind shape assignment
//! - placement: band-constrained scoring with fallback
//! - compose: the full pass, post-fix hooks, composer
//! - events: observation hooks
//! - presets: a ready-made skyline scene
pub mod catalog;
pub mod compose;
pub mod error;
pub mod events;
pub mod grid;
pub mod hash;
pub mod placement;
pub mod planner;
pub mod pool;
pub mod presets;
pub mod quota;

/// Convenient re-exports for common types. Import with `use scene_compose::prelude::*;`.
pub mod prelude {
    pub use crate::catalog::{
        Band, ConditionKind, KindCatalog, MixAnchor, QuotaAnchor, QuotaLimit, SceneTables,
        ShapeGroup, ShapeId, ShapeMeta, Size, Variant,
    };
    pub use crate::compose::{
        compose_field, ComposeConfig, Composition, EnsureShapeAtExtreme, PlacedItem, PostFix,
        PostFixChange, PostFixContext, SceneComposer,
    };
    pub use crate::error::{Error, Result};
    pub use crate::events::{ComposeEvent, EventSink, FnSink, VecSink};
    pub use crate::grid::{
        build_grid, Footprint, ForbiddenRects, ForbiddenZone, FractionalRect, Grid, GridSpec,
        NoForbidden, OccupancyGrid,
    };
    pub use crate::hash::{hash_bytes, phase, rand01, KeyHasher};
    pub use crate::placement::{PlacementEngine, PlacementPath, ScoringConfig};
    pub use crate::planner::plan_shapes;
    pub use crate::pool::{resize_pool, DensityCurve, PoolItem};
    pub use crate::quota::{allocate, retarget, DominancePolicy, KindCounts};
}
