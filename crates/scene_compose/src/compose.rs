//! Scene composition: grid, quota, plan, place, post-fix.
//!
//! A pass is a pure function of `(tables, config, canvas, u, pool)`. The only state that
//! survives between passes is the returned `next_pool`, which the caller feeds into the
//! next call so kind reassignment stays minimal.
use glam::Vec2;
use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::catalog::{ConditionKind, SceneTables, ShapeId};
use crate::error::Result;
use crate::events::{ComposeEvent, EventSink};
use crate::grid::{build_grid, Footprint, Grid, GridSpec};
use crate::placement::{PlacementEngine, PlacementPath, ScoringConfig};
use crate::planner::plan_shapes;
use crate::pool::PoolItem;
use crate::quota::churn::count_kinds;
use crate::quota::{allocate, clamp_unit, retarget, DominancePolicy, KindCounts};

/// Configuration for composition passes.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct ComposeConfig {
    pub grid: GridSpec,
    pub scoring: ScoringConfig,
    pub dominance: DominancePolicy,
    /// Mixed into every hash so different scenes can diverge from identical inputs.
    pub salt: u32,
}

impl ComposeConfig {
    pub fn new(grid: GridSpec) -> Self {
        Self {
            grid,
            ..Default::default()
        }
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_dominance(mut self, dominance: DominancePolicy) -> Self {
        self.dominance = dominance;
        self
    }

    pub fn with_salt(mut self, salt: u32) -> Self {
        self.salt = salt;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.scoring.validate()
    }
}

/// Pixel-space draw instruction for one placed member.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedItem {
    pub id: u32,
    pub kind: ConditionKind,
    pub shape: ShapeId,
    pub footprint: Footprint,
    /// Pixel position of the footprint center.
    pub position: Vec2,
    pub path: PlacementPath,
}

/// Output of a composition pass.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct Composition {
    /// Placed members, in pool order.
    pub placed: Vec<PlacedItem>,
    /// Pool to pass into the next call.
    ///
    /// Shapes here are the ones planned from each member's kind catalog. Post-fix swaps
    /// show up in `placed` only.
    pub next_pool: Vec<PoolItem>,
    pub grid: Grid,
    /// Per-kind member counts targeted by this pass.
    pub counts: KindCounts,
    /// Members whose kind changed relative to the input pool.
    pub reassigned: usize,
    /// Members that received a shape but no footprint.
    pub dropped: usize,
}

/// Read-only view handed to post-fix hooks.
pub struct PostFixContext<'a> {
    pub u: f32,
    pub tables: &'a SceneTables,
    pub grid: &'a Grid,
    pub salt: u32,
}

/// Shape swap performed by a post-fix hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFixChange {
    pub id: u32,
    pub from: ShapeId,
    pub to: ShapeId,
}

/// Rule applied to the placed items after placement.
///
/// Hooks may only swap the shape of an already placed item; they never move footprints.
/// The new shape need not belong to the item's kind catalog, so the swap is not written
/// back to [`Composition::next_pool`].
pub trait PostFix: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, ctx: &PostFixContext<'_>, placed: &mut [PlacedItem]) -> Option<PostFixChange>;
}

/// Guarantees at least one `shape` when `u <= u_max` by converting a placed 1x1 item.
///
/// Non-decorative items are converted before decorative ones; within each class the first
/// in pool order wins.
#[derive(Debug, Clone, Copy)]
pub struct EnsureShapeAtExtreme {
    pub shape: ShapeId,
    pub u_max: f32,
}

impl EnsureShapeAtExtreme {
    pub fn new(shape: ShapeId, u_max: f32) -> Self {
        Self { shape, u_max }
    }
}

impl PostFix for EnsureShapeAtExtreme {
    fn name(&self) -> &str {
        "ensure_shape_at_extreme"
    }

    fn apply(&self, ctx: &PostFixContext<'_>, placed: &mut [PlacedItem]) -> Option<PostFixChange> {
        if ctx.u > self.u_max || placed.iter().any(|p| p.shape == self.shape) {
            return None;
        }
        match ctx.tables.size_of(self.shape) {
            Some(size) if size.is_unit() => {}
            _ => {
                warn!(
                    "Shape '{}' is not a 1x1 catalog variant; cannot guarantee it.",
                    self.shape
                );
                return None;
            }
        }

        let is_decorative = |shape: ShapeId| {
            ctx.tables
                .meta(shape)
                .map(|m| m.decorative)
                .unwrap_or(false)
        };
        let unit = |p: &PlacedItem| p.footprint.w == 1 && p.footprint.h == 1;
        let target = placed
            .iter()
            .position(|p| unit(p) && !is_decorative(p.shape))
            .or_else(|| placed.iter().position(|p| unit(p)))?;

        let item = &mut placed[target];
        let change = PostFixChange {
            id: item.id,
            from: item.shape,
            to: self.shape,
        };
        item.shape = self.shape;
        item.path = PlacementPath::PostFix;
        Some(change)
    }
}

/// Composer bound to validated tables, config and post-fix hooks.
pub struct SceneComposer {
    tables: SceneTables,
    config: ComposeConfig,
    post_fixes: Vec<Box<dyn PostFix>>,
}

impl SceneComposer {
    /// Validates `tables` and `config`; configuration errors surface here.
    pub fn try_new(tables: SceneTables, config: ComposeConfig) -> Result<Self> {
        tables.validate()?;
        config.validate()?;
        Ok(Self {
            tables,
            config,
            post_fixes: Vec::new(),
        })
    }

    /// Append a post-fix hook. Hooks run in insertion order.
    pub fn with_post_fix<P: PostFix + 'static>(mut self, fix: P) -> Self {
        self.post_fixes.push(Box::new(fix));
        self
    }

    pub fn tables(&self) -> &SceneTables {
        &self.tables
    }

    pub fn config(&self) -> &ComposeConfig {
        &self.config
    }

    /// Runs one composition pass.
    pub fn compose(
        &self,
        canvas: impl Into<mint::Vector2<f32>>,
        u: f32,
        pool: &[PoolItem],
    ) -> Result<Composition> {
        self.compose_with_events(canvas, u, pool, &mut ())
    }

    pub fn compose_with_events(
        &self,
        canvas: impl Into<mint::Vector2<f32>>,
        u: f32,
        pool: &[PoolItem],
        sink: &mut dyn EventSink,
    ) -> Result<Composition> {
        compose_pass(
            &self.tables,
            &self.config,
            &self.post_fixes,
            Vec2::from(canvas.into()),
            u,
            pool,
            sink,
        )
    }
}

/// Validate and run a single pass without post-fix hooks.
pub fn compose_field(
    tables: &SceneTables,
    config: &ComposeConfig,
    canvas: impl Into<mint::Vector2<f32>>,
    u: f32,
    pool: &[PoolItem],
) -> Result<Composition> {
    tables.validate()?;
    config.validate()?;
    compose_pass(
        tables,
        config,
        &[],
        Vec2::from(canvas.into()),
        u,
        pool,
        &mut (),
    )
}

fn compose_pass(
    tables: &SceneTables,
    config: &ComposeConfig,
    post_fixes: &[Box<dyn PostFix>],
    canvas: Vec2,
    u: f32,
    pool: &[PoolItem],
    sink: &mut dyn EventSink,
) -> Result<Composition> {
    let u = clamp_unit(u);
    sink.send(ComposeEvent::Started {
        canvas,
        u,
        pool_len: pool.len(),
    });

    let grid = build_grid(canvas, &config.grid);
    if grid.is_degenerate() {
        warn!(
            "Canvas {}x{} yields a degenerate grid; nothing placed.",
            canvas.x, canvas.y
        );
        sink.send(ComposeEvent::Warning {
            context: "grid".into(),
            message: "Degenerate grid; pool passed through".into(),
        });
        sink.send(ComposeEvent::Finished {
            placed: 0,
            dropped: 0,
        });
        let kinds: Vec<ConditionKind> = pool.iter().map(|p| p.kind).collect();
        return Ok(Composition {
            placed: Vec::new(),
            next_pool: pool.to_vec(),
            grid,
            counts: count_kinds(&kinds),
            reassigned: 0,
            dropped: 0,
        });
    }
    debug!(
        rows = grid.rows,
        cols = grid.cols,
        used_rows = grid.used_rows,
        cell_size = grid.cell_size,
        "grid built"
    );
    sink.send(ComposeEvent::GridBuilt { grid });

    let counts = allocate(&tables.mix, u, pool.len(), config.dominance)?;
    sink.send(ComposeEvent::QuotaResolved { counts });

    let mut next_pool = pool.to_vec();
    let mut kinds: Vec<ConditionKind> = next_pool.iter().map(|p| p.kind).collect();
    let changed = retarget(&mut kinds, &counts);
    for (item, kind) in next_pool.iter_mut().zip(kinds) {
        item.kind = kind;
    }
    if !changed.is_empty() {
        debug!(count = changed.len(), ?counts, "members retargeted");
        sink.send(ComposeEvent::KindsRetargeted {
            ids: changed.iter().map(|&i| next_pool[i].id).collect(),
        });
    }

    plan_shapes(tables, &mut next_pool, u, config.salt)?;

    let mut engine = PlacementEngine::new(
        &grid,
        config.grid.forbidden.as_ref(),
        &config.scoring,
        config.salt,
    );
    let mut placed: Vec<PlacedItem> = Vec::with_capacity(next_pool.len());
    let mut dropped = 0usize;
    for item in next_pool.iter_mut() {
        let (Some(shape), Some(size)) = (item.shape, item.size) else {
            continue;
        };
        let band = tables.band(shape)?;
        let meta = tables.meta(shape)?;
        match engine.place(size, band, meta) {
            Some(p) => {
                let position = grid.footprint_center(&p.footprint);
                item.footprint = Some(p.footprint);
                item.position = Some(position);
                let placed_item = PlacedItem {
                    id: item.id,
                    kind: item.kind,
                    shape,
                    footprint: p.footprint,
                    position,
                    path: p.path,
                };
                sink.send(ComposeEvent::ItemPlaced {
                    item: placed_item.clone(),
                });
                placed.push(placed_item);
            }
            None => {
                dropped += 1;
                sink.send(ComposeEvent::ItemDropped { id: item.id, shape });
            }
        }
    }
    if dropped > 0 {
        debug!(dropped, "items did not fit and were dropped");
    }

    let ctx = PostFixContext {
        u,
        tables,
        grid: &grid,
        salt: config.salt,
    };
    for fix in post_fixes {
        let Some(change) = fix.apply(&ctx, &mut placed) else {
            continue;
        };
        info!(
            "Post-fix '{}' turned item {} from '{}' into '{}'.",
            fix.name(),
            change.id,
            change.from,
            change.to
        );
        sink.send(ComposeEvent::PostFixApplied {
            fix: fix.name().to_owned(),
            id: change.id,
            from: change.from,
            to: change.to,
        });
    }

    info!(
        "Composed {} member(s) at u={:.3}: {} placed, {} dropped, {} retargeted.",
        next_pool.len(),
        u,
        placed.len(),
        dropped,
        changed.len()
    );
    sink.send(ComposeEvent::Finished {
        placed: placed.len(),
        dropped,
    });

    Ok(Composition {
        placed,
        next_pool,
        grid,
        counts,
        reassigned: changed.len(),
        dropped,
    })
}
