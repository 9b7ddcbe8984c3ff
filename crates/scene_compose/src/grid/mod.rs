//! Grid construction: pixel canvas to square-cell grid.
//!
//! [`build_grid`] turns a canvas size and a [`GridSpec`] into a [`Grid`] whose rows are
//! authoritative and whose column count is derived so cells stay square. The grid is
//! centered horizontally on the canvas and anchored to its top edge.
use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use tracing::debug;

use crate::catalog::Size;
use crate::error::{Error, Result};

pub mod occupancy;

pub use occupancy::{Footprint, OccupancyGrid};

/// Lower bound applied to the used-rows ratio before sizing cells.
pub const MIN_TOP_RATIO: f32 = 0.01;

/// Predicate marking cells that must never be occupied.
pub trait ForbiddenZone: Send + Sync {
    fn is_forbidden(&self, row: usize, col: usize, rows: usize, cols: usize) -> bool;
}

impl<F> ForbiddenZone for F
where
    F: Fn(usize, usize, usize, usize) -> bool + Send + Sync,
{
    #[inline]
    fn is_forbidden(&self, row: usize, col: usize, rows: usize, cols: usize) -> bool {
        self(row, col, rows, cols)
    }
}

/// Zone with no forbidden cells.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoForbidden;

impl ForbiddenZone for NoForbidden {
    #[inline]
    fn is_forbidden(&self, _row: usize, _col: usize, _rows: usize, _cols: usize) -> bool {
        false
    }
}

/// Rectangle expressed as fractions of the grid, so it scales with the column count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractionalRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl FractionalRect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Horizontally centered rectangle of the given width fraction.
    pub fn centered(width: f32, top: f32, bottom: f32) -> Self {
        let half = width.clamp(0.0, 1.0) * 0.5;
        Self::new(0.5 - half, top, 0.5 + half, bottom)
    }

    fn contains(&self, row: usize, col: usize, rows: usize, cols: usize) -> bool {
        let c0 = (self.left * cols as f32).floor() as usize;
        let c1 = (self.right * cols as f32).ceil() as usize;
        let r0 = (self.top * rows as f32).floor() as usize;
        let r1 = (self.bottom * rows as f32).ceil() as usize;
        (c0..c1).contains(&col) && (r0..r1).contains(&row)
    }
}

/// Union of fractional rectangles.
#[derive(Clone, Debug, Default)]
pub struct ForbiddenRects(pub Vec<FractionalRect>);

impl ForbiddenZone for ForbiddenRects {
    fn is_forbidden(&self, row: usize, col: usize, rows: usize, cols: usize) -> bool {
        self.0.iter().any(|r| r.contains(row, col, rows, cols))
    }
}

/// Row count, used-rows ratio and forbidden predicate for one update.
#[derive(Clone)]
pub struct GridSpec {
    pub rows: usize,
    pub use_top_ratio: f32,
    pub forbidden: Arc<dyn ForbiddenZone>,
}

impl fmt::Debug for GridSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridSpec")
            .field("rows", &self.rows)
            .field("use_top_ratio", &self.use_top_ratio)
            .finish_non_exhaustive()
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            rows: 10,
            use_top_ratio: 1.0,
            forbidden: Arc::new(NoForbidden),
        }
    }
}

impl GridSpec {
    pub fn new(rows: usize, use_top_ratio: f32) -> Self {
        Self {
            rows,
            use_top_ratio,
            ..Default::default()
        }
    }

    /// Sets the forbidden predicate.
    pub fn with_forbidden<Z: ForbiddenZone + 'static>(mut self, zone: Z) -> Self {
        self.forbidden = Arc::new(zone);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.use_top_ratio.is_finite() {
            return Err(Error::InvalidConfig("use_top_ratio must be finite".into()));
        }
        Ok(())
    }

    #[inline]
    fn ratio(&self) -> f32 {
        self.use_top_ratio.clamp(MIN_TOP_RATIO, 1.0)
    }
}

/// Square-cell grid laid over the canvas.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    /// Cell edge length in pixels; zero marks a degenerate grid.
    pub cell_size: f32,
    /// Pixel position of the top-left corner of cell (0, 0).
    pub origin: Vec2,
    /// Rows biased for natural placement; rows below are overflow.
    pub used_rows: usize,
}

impl Grid {
    pub const fn degenerate() -> Self {
        Self {
            rows: 0,
            cols: 0,
            cell_size: 0.0,
            origin: Vec2::ZERO,
            used_rows: 0,
        }
    }

    /// A degenerate grid has nothing placeable.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.rows == 0 || self.cols == 0 || self.cell_size.is_nan() || self.cell_size <= 0.0
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Whether a footprint of `size` fits the grid at all.
    #[inline]
    pub fn fits(&self, size: Size) -> bool {
        !self.is_degenerate()
            && size.w > 0
            && size.h > 0
            && size.w <= self.cols
            && size.h <= self.rows
    }

    /// Target point of the centering term, in cell units (x = column, y = row).
    #[inline]
    pub fn focus(&self) -> Vec2 {
        Vec2::new(self.cols as f32 * 0.5, self.used_rows as f32 * 0.5)
    }

    /// Pixel position of a footprint's center.
    pub fn footprint_center(&self, fp: &Footprint) -> Vec2 {
        self.origin
            + Vec2::new(
                (fp.c0 as f32 + fp.w as f32 * 0.5) * self.cell_size,
                (fp.r0 as f32 + fp.h as f32 * 0.5) * self.cell_size,
            )
    }
}

/// Build a grid for a canvas of `canvas` pixels.
///
/// Returns [`Grid::degenerate`] when the canvas or row count leaves nothing placeable.
pub fn build_grid(canvas: Vec2, spec: &GridSpec) -> Grid {
    let (w, h) = (canvas.x, canvas.y);
    if spec.rows == 0 || !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        debug!(?canvas, rows = spec.rows, "degenerate canvas or row count");
        return Grid::degenerate();
    }

    let ratio = spec.ratio();
    let usable_h = (h * ratio).round().max(1.0);
    let cell_size = usable_h / spec.rows as f32;
    let cols = (w / cell_size).round();
    if cols.is_nan() || cols < 1.0 {
        debug!(?canvas, cell_size, "canvas too narrow for a single column");
        return Grid::degenerate();
    }
    let cols = cols as usize;

    let used_rows = ((spec.rows as f32 * ratio).round() as usize).clamp(1, spec.rows);
    let origin = Vec2::new((w - cols as f32 * cell_size) * 0.5, 0.0);

    Grid {
        rows: spec.rows,
        cols,
        cell_size,
        origin,
        used_rows,
    }
}
