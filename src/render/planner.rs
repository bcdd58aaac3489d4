//! Viewport-driven render planning.
//!
//! Each frame the planner turns the visible world rectangle into a
//! [`RenderTask`]: which display rows to walk, which display columns to keep,
//! and whether the host should discard what it has accumulated so far.
//!
//! Three strategies are used:
//!
//! - **Partial**: the view is small enough that only the visible rows are
//!   walked and entries outside the visible columns are skipped.
//! - **Full**: the view is large but the matrix has few rows, so everything
//!   is drawn unclipped.
//! - **Incremental**: a huge matrix seen from far away. One chunk of visible
//!   rows is drawn per frame and the host keeps redrawing until the scan
//!   reaches the last visible row.

use std::ops::Range;

use crate::config::RenderConfig;
use crate::matrix::{AxisOrder, IdentityOrder, NormalizationVectors, Permutation, SparseMatrix};
use crate::render::normalization::{AxisScale, NormalizationMode, UnitScale};
use crate::render::sink::PointSink;
use crate::util::color::ColorScale;

// =============================================================================
// World Extents
// =============================================================================

/// Visible world rectangle. `x` runs along columns, `y` along rows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldExtents {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl WorldExtents {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Larger of width and height, compared against the partial threshold.
    pub fn max_extent(&self) -> f32 {
        self.width().max(self.height())
    }

    /// Display rows touched by the rectangle, clipped to `[0, nrows)`.
    pub fn row_bounds(&self, nrows: usize) -> Range<usize> {
        axis_bounds(self.y1, self.y2, nrows)
    }

    /// Display columns touched by the rectangle, clipped to `[0, ncols)`.
    pub fn col_bounds(&self, ncols: usize) -> Range<usize> {
        axis_bounds(self.x1, self.x2, ncols)
    }
}

/// `[floor(lo), floor(hi)]` as a half-open range clipped to `[0, n)`.
fn axis_bounds(lo: f32, hi: f32, n: usize) -> Range<usize> {
    let n_f = n as f32;
    let start = lo.floor().clamp(0.0, n_f) as usize;
    let end = (hi.floor() + 1.0).clamp(0.0, n_f) as usize;
    start..end.max(start)
}

// =============================================================================
// Render Task
// =============================================================================

/// How a frame's nonzeros are selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStrategy {
    Partial,
    Full,
    Incremental,
}

impl RenderStrategy {
    pub fn name(self) -> &'static str {
        match self {
            Self::Partial => "partial",
            Self::Full => "full",
            Self::Incremental => "incremental",
        }
    }
}

/// Work for one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderTask {
    pub strategy: RenderStrategy,
    /// Display rows to walk.
    pub rows: Range<usize>,
    /// Display columns kept when `clip` is set.
    pub cols: Range<usize>,
    pub clip: bool,
    /// Discard previously accumulated points before drawing.
    pub clear: bool,
    /// `false` when the host must request another redraw.
    pub finished: bool,
}

impl RenderTask {
    /// A clipped walk over exactly the visible window.
    pub fn visible(extents: &WorldExtents, nrows: usize, ncols: usize) -> Self {
        Self {
            strategy: RenderStrategy::Partial,
            rows: extents.row_bounds(nrows),
            cols: extents.col_bounds(ncols),
            clip: true,
            clear: true,
            finished: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Planner
// =============================================================================

/// Progress of the incremental scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanState {
    #[default]
    Idle,
    /// Next chunk starts at this display row.
    Scanning { offset: usize },
    Done,
}

/// Chooses a strategy per frame and carries incremental progress between
/// frames.
#[derive(Clone, Debug)]
pub struct RenderPlanner {
    partial_extent_threshold: f32,
    full_row_limit: usize,
    chunk_rows: usize,
    state: ScanState,
    /// Visible bounds the current scan was started for.
    bounds: Option<(Range<usize>, Range<usize>)>,
}

impl RenderPlanner {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            partial_extent_threshold: config.partial_extent_threshold,
            full_row_limit: config.full_row_limit,
            chunk_rows: config.incremental_chunk_rows.max(1),
            state: ScanState::Idle,
            bounds: None,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Drop incremental progress. Called on every viewport change.
    pub fn invalidate(&mut self) {
        self.state = ScanState::Idle;
        self.bounds = None;
    }

    /// Plan the next frame for an `nrows x ncols` matrix.
    pub fn plan(&mut self, extents: &WorldExtents, nrows: usize, ncols: usize) -> RenderTask {
        if extents.max_extent() < self.partial_extent_threshold {
            self.invalidate();
            return RenderTask::visible(extents, nrows, ncols);
        }

        if nrows < self.full_row_limit {
            self.invalidate();
            return RenderTask {
                strategy: RenderStrategy::Full,
                rows: 0..nrows,
                cols: 0..ncols,
                clip: false,
                clear: true,
                finished: true,
            };
        }

        let rows = extents.row_bounds(nrows);
        let cols = extents.col_bounds(ncols);
        let bounds = (rows.clone(), cols.clone());
        if self.bounds.as_ref() != Some(&bounds) {
            self.state = ScanState::Idle;
            self.bounds = Some(bounds);
        }

        let (offset, clear) = match self.state {
            ScanState::Idle => (rows.start, true),
            ScanState::Scanning { offset } => (offset, false),
            ScanState::Done => {
                return RenderTask {
                    strategy: RenderStrategy::Incremental,
                    rows: rows.end..rows.end,
                    cols,
                    clip: true,
                    clear: false,
                    finished: true,
                };
            }
        };

        let end = offset.saturating_add(self.chunk_rows).min(rows.end);
        let finished = end >= rows.end;
        self.state = if finished {
            ScanState::Done
        } else {
            ScanState::Scanning { offset: end }
        };

        RenderTask {
            strategy: RenderStrategy::Incremental,
            rows: offset..end,
            cols,
            clip: true,
            clear,
            finished,
        }
    }
}

// =============================================================================
// Point Emission
// =============================================================================

/// Read-only inputs of one frame's point walk.
#[derive(Clone, Copy)]
pub struct FrameInputs<'a> {
    pub matrix: &'a SparseMatrix,
    pub norms: &'a NormalizationVectors,
    pub normalization: NormalizationMode,
    /// Row permutation, if rows are drawn permuted.
    pub row_perm: Option<&'a Permutation>,
    /// Column permutation, if columns are drawn permuted.
    pub col_perm: Option<&'a Permutation>,
    pub colors: ColorScale,
}

/// Walk `task` and emit one point per selected nonzero. Returns the number
/// of points emitted.
///
/// The row/column factor and index lookups are chosen once here; the inner
/// loop is monomorphized per combination.
pub fn emit_task<S: PointSink + ?Sized>(
    inputs: &FrameInputs<'_>,
    task: &RenderTask,
    sink: &mut S,
) -> usize {
    let row_norm = inputs.norms.row_norm.as_slice();
    let col_norm = inputs.norms.col_norm.as_slice();
    match inputs.normalization {
        NormalizationMode::None => with_orders(inputs, task, sink, UnitScale, UnitScale),
        NormalizationMode::Row => with_orders(inputs, task, sink, row_norm, UnitScale),
        NormalizationMode::Column => with_orders(inputs, task, sink, UnitScale, col_norm),
        NormalizationMode::RowAndColumn => with_orders(inputs, task, sink, row_norm, col_norm),
    }
}

fn with_orders<S, RS, CS>(
    inputs: &FrameInputs<'_>,
    task: &RenderTask,
    sink: &mut S,
    row_scale: RS,
    col_scale: CS,
) -> usize
where
    S: PointSink + ?Sized,
    RS: AxisScale,
    CS: AxisScale,
{
    // Rows are walked in display order (position -> storage index); stored
    // columns are placed through the forward map (storage -> position).
    let walk = Walk {
        matrix: inputs.matrix,
        colors: inputs.colors,
        row_scale,
        col_scale,
    };
    match (inputs.row_perm, inputs.col_perm) {
        (None, None) => walk.run(task, sink, IdentityOrder, IdentityOrder),
        (Some(r), None) => walk.run(task, sink, r.inverse(), IdentityOrder),
        (None, Some(c)) => walk.run(task, sink, IdentityOrder, c.forward()),
        (Some(r), Some(c)) => walk.run(task, sink, r.inverse(), c.forward()),
    }
}

struct Walk<'a, RS, CS> {
    matrix: &'a SparseMatrix,
    colors: ColorScale,
    row_scale: RS,
    col_scale: CS,
}

impl<RS: AxisScale, CS: AxisScale> Walk<'_, RS, CS> {
    fn run<S, RO, CO>(&self, task: &RenderTask, sink: &mut S, row_order: RO, col_order: CO) -> usize
    where
        S: PointSink + ?Sized,
        RO: AxisOrder,
        CO: AxisOrder,
    {
        let row_start = self.matrix.row_start();
        let col_index = self.matrix.col_index();
        let values = self.matrix.values();

        let mut emitted = 0;
        for p in task.rows.clone() {
            let i = row_order.map(p);
            let rf = self.row_scale.factor(i);
            let y = p as f32;
            for k in row_start[i]..row_start[i + 1] {
                let j = col_index[k] as usize;
                let pj = col_order.map(j);
                if task.clip && !task.cols.contains(&pj) {
                    continue;
                }
                let v = values[k] * rf * self.col_scale.factor(j);
                sink.emit_point(pj as f32, y, self.colors.color(v));
                emitted += 1;
            }
        }
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{LoadedMatrix, Triplet};
    use crate::render::sink::PointBuffer;
    use crate::util::color::{Palette, ValueRange};

    fn planner() -> RenderPlanner {
        RenderPlanner::new(&RenderConfig::default())
    }

    fn full_width(ncols: usize, y1: f32, y2: f32) -> WorldExtents {
        WorldExtents::new(-0.5, y1, ncols as f32 - 0.5, y2)
    }

    #[test]
    fn test_partial_small_view() {
        // 2x2 world units centered on a 3x3 matrix.
        let extents = WorldExtents::new(0.0, 0.0, 2.0, 2.0);
        let task = planner().plan(&extents, 3, 3);
        assert_eq!(task.strategy, RenderStrategy::Partial);
        assert_eq!(task.rows, 0..3);
        assert_eq!(task.cols, 0..3);
        assert!(task.clip && task.clear && task.finished);
    }

    #[test]
    fn test_bounds_clip_to_matrix() {
        let extents = WorldExtents::new(-10.0, 1.5, 1.2, 100.0);
        assert_eq!(extents.row_bounds(5), 1..5);
        assert_eq!(extents.col_bounds(5), 0..2);

        // A row whose center sits on the lower edge is half visible and kept,
        // the same as columns.
        let edge = WorldExtents::new(0.0, 0.0, 2.0, 2.0);
        assert_eq!(edge.row_bounds(5), 0..3);
        assert_eq!(edge.col_bounds(5), 0..3);

        let outside = WorldExtents::new(10.0, -20.0, 12.0, -15.0);
        assert!(outside.row_bounds(5).is_empty());
        assert!(outside.col_bounds(5).is_empty());
    }

    #[test]
    fn test_full_for_small_matrix_zoomed_out() {
        let extents = WorldExtents::new(-20_000.0, -20_000.0, 20_000.0, 20_000.0);
        let task = planner().plan(&extents, 1000, 800);
        assert_eq!(task.strategy, RenderStrategy::Full);
        assert_eq!(task.rows, 0..1000);
        assert_eq!(task.cols, 0..800);
        assert!(!task.clip);
        assert!(task.finished);
    }

    #[test]
    fn test_incremental_scan() {
        let mut planner = planner();
        let extents = full_width(50_000, -0.5, 49_999.5);

        let first = planner.plan(&extents, 50_000, 50_000);
        assert_eq!(first.strategy, RenderStrategy::Incremental);
        assert_eq!(first.rows, 0..16_384);
        assert!(first.clear);
        assert!(!first.finished);

        let second = planner.plan(&extents, 50_000, 50_000);
        assert_eq!(second.rows, 16_384..32_768);
        assert!(!second.clear);
        assert!(!second.finished);

        let third = planner.plan(&extents, 50_000, 50_000);
        assert_eq!(third.rows, 32_768..49_152);
        let fourth = planner.plan(&extents, 50_000, 50_000);
        assert_eq!(fourth.rows, 49_152..50_000);
        assert!(fourth.finished);
        assert_eq!(planner.state(), ScanState::Done);

        let idle = planner.plan(&extents, 50_000, 50_000);
        assert!(idle.is_empty());
        assert!(idle.finished);
        assert!(!idle.clear);
    }

    #[test]
    fn test_viewport_change_resets_scan() {
        let mut planner = planner();
        let extents = full_width(50_000, -0.5, 49_999.5);
        planner.plan(&extents, 50_000, 50_000);

        // Explicit invalidation restarts at the visible start.
        planner.invalidate();
        let restarted = planner.plan(&extents, 50_000, 50_000);
        assert_eq!(restarted.rows, 0..16_384);
        assert!(restarted.clear);

        // A pan shows up as new bounds even without invalidation.
        let panned = full_width(50_000, 1000.0, 40_000.0);
        let task = planner.plan(&panned, 50_000, 50_000);
        assert_eq!(task.rows, 1000..17_384);
        assert!(task.clear);
        assert_eq!(planner.state(), ScanState::Scanning { offset: 17_384 });
    }

    #[test]
    fn test_thresholds_come_from_config() {
        let config = RenderConfig {
            partial_extent_threshold: 10.0,
            full_row_limit: 5,
            incremental_chunk_rows: 4,
            ..RenderConfig::default()
        };
        let mut planner = RenderPlanner::new(&config);
        let extents = full_width(20, -0.5, 19.5);
        assert_eq!(planner.plan(&extents, 20, 20).rows, 0..4);
        assert_eq!(planner.plan(&extents, 20, 20).rows, 4..8);
    }

    fn sample() -> LoadedMatrix {
        // [1 0 2]
        // [0 0 3]
        // [4 0 0]
        let entries = vec![
            Triplet { row: 0, col: 0, value: 1.0 },
            Triplet { row: 0, col: 2, value: 2.0 },
            Triplet { row: 1, col: 2, value: 3.0 },
            Triplet { row: 2, col: 0, value: 4.0 },
        ];
        let (matrix, _) = SparseMatrix::from_triplets(3, 3, entries, false);
        LoadedMatrix::new(matrix)
    }

    fn inputs<'a>(
        loaded: &'a LoadedMatrix,
        normalization: NormalizationMode,
        row_perm: Option<&'a Permutation>,
        col_perm: Option<&'a Permutation>,
    ) -> FrameInputs<'a> {
        let range = normalization.value_range(&loaded.stats);
        FrameInputs {
            matrix: &loaded.matrix,
            norms: &loaded.norms,
            normalization,
            row_perm,
            col_perm,
            colors: ColorScale::new(Palette::Rainbow, range, false, 0.5),
        }
    }

    fn positions(buf: &PointBuffer) -> Vec<(f32, f32)> {
        buf.points.iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn test_emit_unpermuted() {
        let loaded = sample();
        let frame = inputs(&loaded, NormalizationMode::None, None, None);
        let task = RenderTask::visible(&WorldExtents::new(0.0, 0.0, 2.0, 2.0), 3, 3);

        let mut buf = PointBuffer::new();
        assert_eq!(emit_task(&frame, &task, &mut buf), 4);
        assert_eq!(
            positions(&buf),
            vec![(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (0.0, 2.0)]
        );
        // Min value at palette start, max at palette end.
        let table = Palette::Rainbow.table();
        assert_eq!(buf.points[0].color.rgb(), table[0]);
        assert_eq!(buf.points[3].color.rgb(), table[table.len() - 1]);
        assert!(buf.points.iter().all(|p| p.color.a == 0.5));
    }

    #[test]
    fn test_emit_clips_display_columns() {
        let loaded = sample();
        let frame = inputs(&loaded, NormalizationMode::None, None, None);
        let task = RenderTask::visible(&WorldExtents::new(1.5, 0.0, 2.5, 2.0), 3, 3);
        assert_eq!(task.cols, 1..3);

        let mut buf = PointBuffer::new();
        emit_task(&frame, &task, &mut buf);
        assert_eq!(positions(&buf), vec![(2.0, 0.0), (2.0, 1.0)]);
    }

    #[test]
    fn test_emit_permuted() {
        let loaded = sample();
        // Display row 0 shows storage row 2, etc.
        let rows = Permutation::from_inverse(vec![2, 0, 1]).unwrap();
        // Storage column 0 is shown at display column 2.
        let cols = Permutation::from_inverse(vec![2, 1, 0]).unwrap();
        let frame = inputs(&loaded, NormalizationMode::None, Some(&rows), Some(&cols));
        let task = RenderTask::visible(&WorldExtents::new(0.0, 0.0, 2.0, 2.0), 3, 3);

        let mut buf = PointBuffer::new();
        emit_task(&frame, &task, &mut buf);
        let mut got = positions(&buf);
        got.sort_by(|a, b| a.partial_cmp(b).unwrap());
        // (2,0)->(row 0, col 2); (0,0)->(1,2); (0,2)->(1,0); (1,2)->(2,0).
        assert_eq!(got, vec![(0.0, 1.0), (0.0, 2.0), (2.0, 0.0), (2.0, 1.0)]);
    }

    #[test]
    fn test_emit_normalized_values() {
        let loaded = sample();
        let frame = inputs(&loaded, NormalizationMode::Row, None, None);
        let task = RenderTask::visible(&WorldExtents::new(0.0, 1.0, 2.0, 1.0), 3, 3);
        assert_eq!(task.rows, 1..2);

        // Row 1 holds a single entry, so its normalized value is exactly 1.
        let mut buf = PointBuffer::new();
        emit_task(&frame, &task, &mut buf);
        let scale = ColorScale::new(Palette::Rainbow, ValueRange::UNIT, false, 0.5);
        assert_eq!(buf.points, vec![crate::render::sink::Point {
            x: 2.0,
            y: 1.0,
            color: scale.color(1.0),
        }]);
    }
}
