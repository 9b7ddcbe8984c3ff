//! Boolean occupancy over a grid, scoped to a single composition pass.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::grid::ForbiddenZone;

/// Rectangle of cells occupied by a placed shape.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Footprint {
    pub r0: usize,
    pub c0: usize,
    pub w: usize,
    pub h: usize,
}

impl Footprint {
    pub const fn new(r0: usize, c0: usize, w: usize, h: usize) -> Self {
        Self { r0, c0, w, h }
    }

    /// Center in cell units (x = column, y = row).
    #[inline]
    pub fn center(&self) -> glam::Vec2 {
        glam::Vec2::new(
            self.c0 as f32 + self.w as f32 * 0.5,
            self.r0 as f32 + self.h as f32 * 0.5,
        )
    }

    pub fn overlaps(&self, other: &Footprint) -> bool {
        self.c0 < other.c0 + other.w
            && other.c0 < self.c0 + self.w
            && self.r0 < other.r0 + other.h
            && other.r0 < self.r0 + self.h
    }

    /// Iterate the `(row, col)` cells covered by this footprint.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.r0..self.r0 + self.h)
            .flat_map(move |r| (self.c0..self.c0 + self.w).map(move |c| (r, c)))
    }
}

/// Per-cell occupancy with forbidden cells pre-marked.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    rows: usize,
    cols: usize,
    occupied: Vec<bool>,
    forbidden: Vec<bool>,
}

impl OccupancyGrid {
    pub fn new(rows: usize, cols: usize, zone: &dyn ForbiddenZone) -> Self {
        let mut forbidden = vec![false; rows * cols];
        for r in 0..rows {
            for c in 0..cols {
                forbidden[r * cols + c] = zone.is_forbidden(r, c, rows, cols);
            }
        }
        Self {
            rows,
            cols,
            occupied: forbidden.clone(),
            forbidden,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn idx(&self, r: usize, c: usize) -> usize {
        r * self.cols + c
    }

    /// Whether the cell is forbidden. Out-of-bounds cells count as forbidden.
    #[inline]
    pub fn is_forbidden(&self, r: usize, c: usize) -> bool {
        r >= self.rows || c >= self.cols || self.forbidden[self.idx(r, c)]
    }

    /// Whether the cell is occupied or forbidden. Out-of-bounds cells count as occupied.
    #[inline]
    pub fn is_occupied(&self, r: usize, c: usize) -> bool {
        r >= self.rows || c >= self.cols || self.occupied[self.idx(r, c)]
    }

    #[inline]
    fn in_bounds(&self, r0: usize, c0: usize, w: usize, h: usize) -> bool {
        w > 0
            && h > 0
            && r0.checked_add(h).is_some_and(|end| end <= self.rows)
            && c0.checked_add(w).is_some_and(|end| end <= self.cols)
    }

    pub fn can_place(&self, r0: usize, c0: usize, w: usize, h: usize) -> bool {
        if !self.in_bounds(r0, c0, w, h) {
            return false;
        }
        (r0..r0 + h).all(|r| {
            let row = self.idx(r, 0);
            self.occupied[row + c0..row + c0 + w].iter().all(|o| !o)
        })
    }

    /// Marks the rectangle occupied if every cell is free, returning the committed footprint.
    pub fn try_place_at(&mut self, r0: usize, c0: usize, w: usize, h: usize) -> Option<Footprint> {
        if !self.can_place(r0, c0, w, h) {
            return None;
        }
        for r in r0..r0 + h {
            let row = self.idx(r, 0);
            self.occupied[row + c0..row + c0 + w].fill(true);
        }
        Some(Footprint::new(r0, c0, w, h))
    }

    /// Number of occupied cells, forbidden ones included.
    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|o| **o).count()
    }
}
