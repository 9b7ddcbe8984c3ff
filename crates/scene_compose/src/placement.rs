//! Greedy, single-pass placement of planned items onto an [`OccupancyGrid`].
//!
//! Each item is placed against the occupancy left by the items before it, so the iteration
//! order over the pool is part of the result. Per item:
//! 1. resolve its [`Band`] into a range of legal top rows ([`band_rows`]);
//! 2. enumerate every left edge inside the maximal non-forbidden segments of each row
//!    ([`free_segments`]);
//! 3. score candidates (centering, same-group separation, hashed jitter) and commit the best
//!    one that is still free;
//! 4. if no candidate was generated at all, walk the shared [`FallbackCells`] order under
//!    [`FallbackRows`], which admits the band or the overflow rows below the used rows;
//! 5. otherwise drop the item. An item whose band had candidates, all taken, is dropped.
use glam::Vec2;
use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::catalog::{Band, ShapeGroup, ShapeMeta, Size};
use crate::error::{Error, Result};
use crate::grid::{Footprint, ForbiddenZone, Grid, OccupancyGrid};
use crate::hash::KeyHasher;

/// Weights of the candidate scoring terms.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringConfig {
    /// Pull toward the horizontal grid center and the vertical center of the used rows.
    pub center_weight: f32,
    /// Multiplier of the squared separation shortfall between same-group items.
    pub separation_weight: f32,
    /// Amplitude of the hashed tie-break jitter.
    pub jitter: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            center_weight: 1.0,
            separation_weight: 0.25,
            jitter: 0.35,
        }
    }
}

impl ScoringConfig {
    pub fn with_center_weight(mut self, center_weight: f32) -> Self {
        self.center_weight = center_weight;
        self
    }

    pub fn with_separation_weight(mut self, separation_weight: f32) -> Self {
        self.separation_weight = separation_weight;
        self
    }

    pub fn with_jitter(mut self, jitter: f32) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let ok = |v: f32| v.is_finite() && v >= 0.0;
        if !ok(self.center_weight) || !ok(self.separation_weight) || !ok(self.jitter) {
            return Err(Error::InvalidConfig(
                "scoring weights must be finite and >= 0".into(),
            ));
        }
        Ok(())
    }
}

/// How an item obtained its footprint.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlacementPath {
    /// Best free candidate inside the item's band.
    Scored,
    /// Fallback walk over the distance-sorted cell list.
    Fallback,
    /// Shape swapped in place by a post-fix hook.
    PostFix,
}

/// Inclusive range of legal top rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowBand {
    pub row_min: usize,
    pub row_max: usize,
}

impl RowBand {
    #[inline]
    pub fn contains(&self, row: usize) -> bool {
        (self.row_min..=self.row_max).contains(&row)
    }
}

/// Legal top rows of a footprint of `size` under `band`.
///
/// `bot_k` marks the lowest allowed bottom edge; the range is clamped so the footprint
/// always fits inside the used rows. Returns `None` when it cannot fit there at all.
pub fn band_rows(band: Band, size: Size, grid: &Grid) -> Option<RowBand> {
    let used = grid.used_rows;
    if size.h == 0 || size.h > used || size.w == 0 || size.w > grid.cols {
        return None;
    }
    let limit = used - size.h;
    let bottom = (band.bot_k * used as f32).round().max(0.0) as usize;
    let row_max = bottom.saturating_sub(size.h).min(limit);
    let row_min = ((band.top_k * used as f32).round().max(0.0) as usize).min(row_max);
    Some(RowBand { row_min, row_max })
}

/// Top rows the fallback walk accepts for one footprint height.
///
/// A footprint starts no higher than the band's top row and either ends inside the band or
/// reaches past the used rows into the overflow rows. Footprints ending between the band's
/// bottom and the last used row are refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FallbackRows {
    pub row_min: usize,
    /// Exclusive bottom edge of the band.
    pub band_end: usize,
    pub used_rows: usize,
    pub height: usize,
}

impl FallbackRows {
    pub fn new(band: Band, size: Size, grid: &Grid) -> Self {
        let used = grid.used_rows;
        let band_end = ((band.bot_k * used as f32).round().max(0.0) as usize).min(used);
        let top = (band.top_k * used as f32).round().max(0.0) as usize;
        let row_min = top
            .min(band_end.saturating_sub(size.h))
            .min(grid.rows.saturating_sub(size.h));
        Self {
            row_min,
            band_end,
            used_rows: used,
            height: size.h,
        }
    }

    #[inline]
    pub fn admits(&self, r0: usize) -> bool {
        let end = r0 + self.height;
        r0 >= self.row_min && (end <= self.band_end || end > self.used_rows)
    }
}

/// Maximal run of legal left edges in one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub row: usize,
    pub c_start: usize,
    /// Inclusive.
    pub c_end: usize,
}

/// Segments of left edges whose footprint avoids every forbidden cell.
///
/// Occupancy by earlier items is not considered here; commits re-check it.
pub fn free_segments(occupancy: &OccupancyGrid, rows: RowBand, size: Size) -> Vec<Segment> {
    let cols = occupancy.cols();
    let mut segments = Vec::new();
    if size.w == 0 || size.h == 0 || size.w > cols {
        return segments;
    }
    for row in rows.row_min..=rows.row_max {
        if row + size.h > occupancy.rows() {
            break;
        }
        let mut run_start: Option<usize> = None;
        for c in 0..=cols {
            let blocked =
                c == cols || (row..row + size.h).any(|r| occupancy.is_forbidden(r, c));
            match (blocked, run_start) {
                (false, None) => run_start = Some(c),
                (true, Some(start)) => {
                    if c - start >= size.w {
                        segments.push(Segment {
                            row,
                            c_start: start,
                            c_end: c - size.w,
                        });
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
    }
    segments
}

/// A scored top-left cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub r0: usize,
    pub c0: usize,
    pub score: f32,
}

/// Every grid cell sorted by distance from the grid focus, walked with a forward-only cursor.
///
/// Built once per composition pass and shared by all items that need it. The cursor skips
/// leading cells that are already occupied; occupancy never shrinks within a pass, so those
/// cells can never host a footprint again.
#[derive(Clone, Debug)]
pub struct FallbackCells {
    order: Vec<(usize, usize)>,
    cursor: usize,
}

impl FallbackCells {
    pub fn new(grid: &Grid) -> Self {
        let focus = grid.focus();
        let mut keyed: Vec<(f32, usize, usize)> = Vec::with_capacity(grid.cell_count());
        for r in 0..grid.rows {
            for c in 0..grid.cols {
                let center = Vec2::new(c as f32 + 0.5, r as f32 + 0.5);
                keyed.push((center.distance_squared(focus), r, c));
            }
        }
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
        Self {
            order: keyed.into_iter().map(|(_, r, c)| (r, c)).collect(),
            cursor: 0,
        }
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Commit the first cell (in distance order) admitted by `rows` that fits `size`.
    pub fn place(
        &mut self,
        occupancy: &mut OccupancyGrid,
        rows: FallbackRows,
        size: Size,
    ) -> Option<Footprint> {
        while let Some(&(r, c)) = self.order.get(self.cursor) {
            if !occupancy.is_occupied(r, c) {
                break;
            }
            self.cursor += 1;
        }
        for &(r, c) in &self.order[self.cursor..] {
            if !rows.admits(r) || occupancy.is_occupied(r, c) {
                continue;
            }
            if let Some(fp) = occupancy.try_place_at(r, c, size.w, size.h) {
                return Some(fp);
            }
        }
        None
    }
}

/// Successful placement of one item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placed {
    pub footprint: Footprint,
    pub path: PlacementPath,
    /// Number of scored candidates considered; zero on the fallback path.
    pub candidates: usize,
}

#[derive(Clone, Copy, Debug)]
struct Mark {
    center: Vec2,
    group: ShapeGroup,
}

/// Placement state for one composition pass.
pub struct PlacementEngine<'a> {
    grid: &'a Grid,
    scoring: &'a ScoringConfig,
    salt: u32,
    occupancy: OccupancyGrid,
    marks: Vec<Mark>,
    fallback: Option<FallbackCells>,
}

impl<'a> PlacementEngine<'a> {
    pub fn new(
        grid: &'a Grid,
        zone: &dyn ForbiddenZone,
        scoring: &'a ScoringConfig,
        salt: u32,
    ) -> Self {
        Self {
            grid,
            scoring,
            salt,
            occupancy: OccupancyGrid::new(grid.rows, grid.cols, zone),
            marks: Vec::new(),
            fallback: None,
        }
    }

    pub fn occupancy(&self) -> &OccupancyGrid {
        &self.occupancy
    }

    /// Score of a footprint of `size` whose top-left cell is `(r0, c0)`.
    pub fn score(&self, r0: usize, c0: usize, size: Size, meta: &ShapeMeta) -> f32 {
        let center = Footprint::new(r0, c0, size.w, size.h).center();
        let extent = Vec2::new(
            self.grid.cols.max(1) as f32,
            self.grid.used_rows.max(1) as f32,
        );
        let offset = (center - self.grid.focus()) / extent;
        let mut score = -self.scoring.center_weight * offset.length_squared();

        if meta.separation > 0.0 {
            for mark in self.marks.iter().filter(|m| m.group == meta.group) {
                let shortfall = meta.separation - center.distance(mark.center);
                if shortfall > 0.0 {
                    score -= self.scoring.separation_weight * shortfall * shortfall;
                }
            }
        }

        let jitter = KeyHasher::new()
            .str("cell")
            .usize(r0)
            .usize(c0)
            .usize(size.w)
            .usize(size.h)
            .u32(self.salt)
            .rand01();
        score + self.scoring.jitter * jitter
    }

    /// Scored candidates inside `rows`, best first. Ties resolve top-left first.
    pub fn candidates(&self, size: Size, rows: RowBand, meta: &ShapeMeta) -> Vec<Candidate> {
        let mut out = Vec::new();
        for seg in free_segments(&self.occupancy, rows, size) {
            for c0 in seg.c_start..=seg.c_end {
                out.push(Candidate {
                    r0: seg.row,
                    c0,
                    score: self.score(seg.row, c0, size, meta),
                });
            }
        }
        out.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.r0.cmp(&b.r0))
                .then(a.c0.cmp(&b.c0))
        });
        out
    }

    /// Place one item. `None` means it did not fit anywhere and should be dropped.
    pub fn place(&mut self, size: Size, band: Band, meta: &ShapeMeta) -> Option<Placed> {
        if !self.grid.fits(size) {
            return None;
        }

        let candidates = band_rows(band, size, self.grid)
            .map(|rows| self.candidates(size, rows, meta))
            .unwrap_or_default();
        for cand in &candidates {
            if let Some(footprint) = self.occupancy.try_place_at(cand.r0, cand.c0, size.w, size.h)
            {
                self.mark(&footprint, meta.group);
                return Some(Placed {
                    footprint,
                    path: PlacementPath::Scored,
                    candidates: candidates.len(),
                });
            }
        }
        if !candidates.is_empty() {
            trace!(candidates = candidates.len(), "band exhausted");
            return None;
        }

        let grid = self.grid;
        let rows = FallbackRows::new(band, size, grid);
        let fallback = self.fallback.get_or_insert_with(|| FallbackCells::new(grid));
        let footprint = fallback.place(&mut self.occupancy, rows, size)?;
        trace!(?footprint, "fallback placement");
        self.mark(&footprint, meta.group);
        Some(Placed {
            footprint,
            path: PlacementPath::Fallback,
            candidates: 0,
        })
    }

    fn mark(&mut self, footprint: &Footprint, group: ShapeGroup) {
        self.marks.push(Mark {
            center: footprint.center(),
            group,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::NoForbidden;

    fn grid(rows: usize, cols: usize, used_rows: usize) -> Grid {
        Grid {
            rows,
            cols,
            cell_size: 10.0,
            origin: Vec2::ZERO,
            used_rows,
        }
    }

    fn meta(separation: f32) -> ShapeMeta {
        ShapeMeta::new(ShapeGroup::Building, separation)
    }

    #[test]
    fn band_rows_leave_room_for_height() {
        let g = grid(12, 10, 10);
        assert_eq!(
            band_rows(Band::FULL, Size::new(1, 1), &g),
            Some(RowBand {
                row_min: 0,
                row_max: 9
            })
        );
        assert_eq!(
            band_rows(Band::new(0.5, 1.0), Size::new(1, 2), &g),
            Some(RowBand {
                row_min: 5,
                row_max: 8
            })
        );
        // A band thinner than the footprint is widened upward.
        assert_eq!(
            band_rows(Band::new(0.9, 1.0), Size::new(1, 3), &g),
            Some(RowBand {
                row_min: 7,
                row_max: 7
            })
        );
        assert_eq!(
            band_rows(Band::new(0.0, 0.1), Size::new(1, 2), &g),
            Some(RowBand {
                row_min: 0,
                row_max: 0
            })
        );
        assert_eq!(band_rows(Band::FULL, Size::new(1, 11), &g), None);
        assert_eq!(band_rows(Band::FULL, Size::new(11, 1), &g), None);
    }

    #[test]
    fn segments_split_around_forbidden_cells() {
        let zone = |r: usize, c: usize, _rows: usize, _cols: usize| r == 1 && c == 4;
        let occ = OccupancyGrid::new(3, 8, &zone);
        let rows = RowBand {
            row_min: 0,
            row_max: 1,
        };
        let segs = free_segments(&occ, rows, Size::new(2, 2));
        assert_eq!(
            segs,
            vec![
                Segment {
                    row: 0,
                    c_start: 0,
                    c_end: 2
                },
                Segment {
                    row: 0,
                    c_start: 5,
                    c_end: 6
                },
                Segment {
                    row: 1,
                    c_start: 0,
                    c_end: 2
                },
                Segment {
                    row: 1,
                    c_start: 5,
                    c_end: 6
                },
            ]
        );
        assert!(free_segments(&occ, rows, Size::new(9, 1)).is_empty());
    }

    #[test]
    fn first_item_lands_near_focus() {
        let g = grid(10, 10, 10);
        let scoring = ScoringConfig::default().with_jitter(0.0);
        let mut engine = PlacementEngine::new(&g, &NoForbidden, &scoring, 0);
        let placed = engine
            .place(Size::new(2, 2), Band::FULL, &meta(0.0))
            .expect("empty grid");
        assert_eq!(placed.footprint, Footprint::new(4, 4, 2, 2));
        assert_eq!(placed.path, PlacementPath::Scored);
        assert_eq!(placed.candidates, 81);
    }

    #[test]
    fn separation_pushes_same_group_apart() {
        let g = grid(10, 20, 10);
        let scoring = ScoringConfig::default()
            .with_jitter(0.0)
            .with_separation_weight(1.0);
        let mut engine = PlacementEngine::new(&g, &NoForbidden, &scoring, 0);
        let band = Band::new(0.4, 0.6);
        let a = engine.place(Size::new(1, 1), band, &meta(6.0)).unwrap();
        let b = engine.place(Size::new(1, 1), band, &meta(6.0)).unwrap();
        let d = a.footprint.center().distance(b.footprint.center());
        assert!(d >= 5.0, "same-group items only {d} cells apart");

        let other = ShapeMeta::new(ShapeGroup::Vehicle, 6.0);
        let c = engine.place(Size::new(1, 1), band, &other).unwrap();
        let d = a.footprint.center().distance(c.footprint.center());
        assert!(d <= 1.5, "other groups are not repelled: {d}");
    }

    #[test]
    fn scored_placements_stay_in_band() {
        let g = grid(12, 16, 10);
        let scoring = ScoringConfig::default();
        let mut engine = PlacementEngine::new(&g, &NoForbidden, &scoring, 3);
        let band = Band::new(0.6, 1.0);
        let size = Size::new(2, 1);
        let rows = band_rows(band, size, &g).unwrap();
        let mut dropped = 0;
        for _ in 0..40 {
            match engine.place(size, band, &meta(1.0)) {
                Some(placed) => {
                    assert_eq!(placed.path, PlacementPath::Scored);
                    assert!(rows.contains(placed.footprint.r0));
                }
                None => dropped += 1,
            }
        }
        // 4 rows of 16 columns hold at most 32 two-wide items.
        assert!(dropped >= 8);
    }

    #[test]
    fn exhausted_band_drops_instead_of_falling_back() {
        let g = grid(10, 10, 10);
        let scoring = ScoringConfig::default();
        let mut engine = PlacementEngine::new(&g, &NoForbidden, &scoring, 0);
        let band = Band::new(0.0, 0.1);
        for _ in 0..10 {
            let placed = engine.place(Size::new(1, 1), band, &meta(0.0)).unwrap();
            assert_eq!(placed.path, PlacementPath::Scored);
            assert_eq!(placed.footprint.r0, 0);
        }
        assert_eq!(engine.place(Size::new(1, 1), band, &meta(0.0)), None);
        assert_eq!(engine.occupancy().occupied_count(), 10);
    }

    #[test]
    fn crowded_bands_keep_every_placement_in_its_rows() {
        let g = grid(12, 16, 10);
        let zone = |r: usize, _c: usize, _rows: usize, _cols: usize| r < 2;
        let scoring = ScoringConfig::default();
        let mut engine = PlacementEngine::new(&g, &zone, &scoring, 5);
        let cases = [
            (Band::new(0.0, 0.2), Size::new(1, 1)),
            (Band::new(0.0, 0.3), Size::new(2, 1)),
            (Band::new(0.6, 1.0), Size::new(2, 2)),
            (Band::new(0.3, 0.7), Size::new(1, 2)),
        ];
        let mut fallbacks = 0;
        for i in 0..200 {
            let (band, size) = cases[i % cases.len()];
            let Some(placed) = engine.place(size, band, &meta(1.0)) else {
                continue;
            };
            let r0 = placed.footprint.r0;
            if placed.candidates > 0 {
                assert_eq!(placed.path, PlacementPath::Scored);
                let rows = band_rows(band, size, &g).unwrap();
                assert!(rows.contains(r0), "row {r0} outside {rows:?}");
            } else {
                fallbacks += 1;
                assert!(FallbackRows::new(band, size, &g).admits(r0));
                assert!(r0 >= g.used_rows, "fallback into used row {r0}");
            }
        }
        assert!(fallbacks > 0);
    }

    #[test]
    fn fallback_rows_skip_the_gap_below_the_band() {
        let g = grid(12, 10, 10);
        let rows = FallbackRows::new(Band::new(0.0, 0.3), Size::new(1, 1), &g);
        assert_eq!(rows.band_end, 3);
        assert!((0..3).all(|r| rows.admits(r)));
        assert!((3..10).all(|r| !rows.admits(r)));
        assert!(rows.admits(10) && rows.admits(11));

        let tall = FallbackRows::new(Band::new(0.0, 0.3), Size::new(1, 2), &g);
        assert!(tall.admits(0) && tall.admits(1));
        assert!((2..9).all(|r| !tall.admits(r)));
        assert!(tall.admits(9) && tall.admits(10));

        let low = FallbackRows::new(Band::new(0.5, 1.0), Size::new(1, 1), &g);
        assert!(!low.admits(4));
        assert!((5..12).all(|r| low.admits(r)));
    }

    #[test]
    fn fallback_skips_used_rows_below_the_band() {
        let g = grid(8, 4, 6);
        let zone = |r: usize, _c: usize, _rows: usize, _cols: usize| r < 3;
        let scoring = ScoringConfig::default();
        let mut engine = PlacementEngine::new(&g, &zone, &scoring, 0);
        let band = Band::new(0.0, 0.5);
        for _ in 0..8 {
            let placed = engine.place(Size::new(1, 1), band, &meta(0.0)).unwrap();
            assert_eq!(placed.path, PlacementPath::Fallback);
            assert!(placed.footprint.r0 >= 6, "landed in used row {}", placed.footprint.r0);
        }
        assert_eq!(engine.place(Size::new(1, 1), band, &meta(0.0)), None);
    }

    #[test]
    fn fallback_reaches_overflow_rows() {
        let g = grid(6, 6, 3);
        let zone = |r: usize, _c: usize, _rows: usize, _cols: usize| r < 3;
        let scoring = ScoringConfig::default();
        let mut engine = PlacementEngine::new(&g, &zone, &scoring, 0);
        let placed = engine
            .place(Size::new(1, 1), Band::FULL, &meta(0.0))
            .expect("overflow rows are free");
        assert_eq!(placed.path, PlacementPath::Fallback);
        assert_eq!(placed.candidates, 0);
        assert_eq!(placed.footprint.r0, 3);
    }

    #[test]
    fn fallback_cursor_only_moves_forward() {
        let g = grid(2, 2, 2);
        let mut occ = OccupancyGrid::new(2, 2, &NoForbidden);
        let mut cells = FallbackCells::new(&g);
        let rows = FallbackRows::new(Band::FULL, Size::new(1, 1), &g);
        assert_eq!(cells.len(), 4);
        let mut last = 0;
        for _ in 0..4 {
            assert!(cells.place(&mut occ, rows, Size::new(1, 1)).is_some());
            assert!(cells.cursor() >= last);
            last = cells.cursor();
        }
        assert!(cells.place(&mut occ, rows, Size::new(1, 1)).is_none());
        assert_eq!(cells.cursor(), 4);
    }

    #[test]
    fn full_grid_drops_items() {
        let g = grid(2, 2, 2);
        let scoring = ScoringConfig::default();
        let mut engine = PlacementEngine::new(&g, &NoForbidden, &scoring, 0);
        assert!(engine.place(Size::new(2, 2), Band::FULL, &meta(0.0)).is_some());
        assert!(engine.place(Size::new(1, 1), Band::FULL, &meta(0.0)).is_none());
        assert!(engine.place(Size::new(3, 1), Band::FULL, &meta(0.0)).is_none());
    }

    #[test]
    fn mixed_sizes_never_overlap() {
        let g = grid(12, 24, 10);
        let scoring = ScoringConfig::default();
        let mut engine = PlacementEngine::new(&g, &NoForbidden, &scoring, 9);
        let sizes = [
            Size::new(1, 1),
            Size::new(2, 1),
            Size::new(3, 1),
            Size::new(2, 2),
            Size::new(1, 3),
        ];
        let mut placed = Vec::new();
        for i in 0..120 {
            if let Some(p) = engine.place(sizes[i % sizes.len()], Band::FULL, &meta(1.5)) {
                placed.push(p.footprint);
            }
        }
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
        let covered: usize = placed.iter().map(|f| f.w * f.h).sum();
        assert_eq!(covered, engine.occupancy().occupied_count());
    }

    #[test]
    fn scoring_config_validation() {
        assert!(ScoringConfig::default().validate().is_ok());
        assert!(ScoringConfig::default().with_jitter(-1.0).validate().is_err());
        assert!(ScoringConfig::default()
            .with_center_weight(f32::NAN)
            .validate()
            .is_err());
    }
}
