//! The per-session matrix view: loaded data plus everything the user can
//! change about how it is drawn.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::types::{Background, Command, Cursor, ViewportState};
use crate::config::RenderConfig;
use crate::matrix::{Labels, LoadedMatrix, MatrixPermutations, Permutation, PermutationMode};
use crate::render::{
    emit_task, AlphaPolicy, FrameInputs, NormalizationMode, PointSink, RenderPlanner, RenderTask,
    SvgWriter,
};
use crate::util::color::{ColorScale, Palette};

/// Outcome of one rendered frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameReport {
    pub task: RenderTask,
    /// Points emitted this frame.
    pub points: usize,
}

/// What the cursor is pointing at, resolved to storage indices.
#[derive(Clone, Debug, PartialEq)]
pub struct CursorReadout {
    /// Storage row under the cursor.
    pub row: usize,
    /// Storage column under the cursor.
    pub col: usize,
    pub value: f64,
    pub row_label: String,
    pub col_label: String,
}

// =============================================================================
// MatrixView
// =============================================================================

/// A loaded matrix and its interactive view state.
pub struct MatrixView {
    data: LoadedMatrix,
    permutations: MatrixPermutations,
    labels: Labels,
    viewport: ViewportState,
    planner: RenderPlanner,
    palette: Palette,
    invert: bool,
    normalization: NormalizationMode,
    permutation: PermutationMode,
    alpha: AlphaPolicy,
    cursor: Cursor,
    background: Background,
}

impl MatrixView {
    /// Create a view sized for a `width x height` pixel canvas.
    pub fn new(
        data: LoadedMatrix,
        permutations: MatrixPermutations,
        labels: Labels,
        config: &RenderConfig,
        width: f32,
        height: f32,
    ) -> Self {
        let viewport = ViewportState::new(
            data.matrix.nrows(),
            data.matrix.ncols(),
            width,
            height,
            config.initial_zoom,
        );
        Self {
            data,
            permutations,
            labels,
            viewport,
            planner: RenderPlanner::new(config),
            palette: Palette::default(),
            invert: false,
            normalization: NormalizationMode::None,
            permutation: PermutationMode::None,
            alpha: AlphaPolicy::new(config.point_alpha),
            cursor: Cursor::default(),
            background: Background::default(),
        }
    }

    pub fn data(&self) -> &LoadedMatrix {
        &self.data
    }

    pub fn nrows(&self) -> usize {
        self.data.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.matrix.ncols()
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn inverted(&self) -> bool {
        self.invert
    }

    pub fn normalization(&self) -> NormalizationMode {
        self.normalization
    }

    pub fn permutation(&self) -> PermutationMode {
        self.permutation
    }

    pub fn permutations(&self) -> &MatrixPermutations {
        &self.permutations
    }

    pub fn point_alpha(&self) -> f32 {
        self.alpha.point_alpha()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn background(&self) -> Background {
        self.background
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Apply a command. Returns `true` when the view changed and must be
    /// redrawn; repeating a command that is already in effect returns
    /// `false`.
    pub fn apply(&mut self, command: Command) -> bool {
        let changed = match command {
            Command::SetColormap(palette) => replace(&mut self.palette, palette),
            Command::NextColormap => {
                self.palette = self.palette.next();
                true
            }
            Command::InvertColormap => {
                self.invert = !self.invert;
                true
            }
            Command::SetNormalization(mode) => replace(&mut self.normalization, mode),
            Command::SetPermutation(mode) => {
                if !self.permutations.supports(mode) {
                    log::warn!(
                        "cannot permute {}: permutation not loaded",
                        mode.name()
                    );
                    return false;
                }
                replace(&mut self.permutation, mode)
            }
            Command::SetPointAlpha(a) => {
                if self.alpha.point_alpha() == a {
                    false
                } else if self.alpha.set_point_alpha(a) {
                    true
                } else {
                    log::warn!("ignoring point alpha {a}: must be within [0, 1]");
                    false
                }
            }
            Command::SetAspect(aspect) => {
                if !(aspect > 0.0) {
                    log::warn!("ignoring aspect ratio {aspect}");
                }
                self.viewport.set_aspect(aspect)
            }
            Command::Home => self.viewport.home(),
            Command::ToggleCursor => {
                self.cursor.visible = !self.cursor.visible;
                true
            }
            Command::SetBackground(bg) => replace(&mut self.background, bg),
        };
        if changed {
            log::debug!("{command:?}");
            self.planner.invalidate();
        }
        changed
    }

    /// Flip row normalization, keeping the column setting.
    pub fn toggle_row_normalization(&mut self) -> bool {
        let mode = self.normalization;
        self.apply(Command::SetNormalization(NormalizationMode::from_axes(
            !mode.normalizes_rows(),
            mode.normalizes_cols(),
        )))
    }

    pub fn toggle_col_normalization(&mut self) -> bool {
        let mode = self.normalization;
        self.apply(Command::SetNormalization(NormalizationMode::from_axes(
            mode.normalizes_rows(),
            !mode.normalizes_cols(),
        )))
    }

    pub fn toggle_row_permutation(&mut self) -> bool {
        let mode = self.permutation;
        self.apply(Command::SetPermutation(PermutationMode::from_axes(
            !mode.permutes_rows(),
            mode.permutes_cols(),
        )))
    }

    pub fn toggle_col_permutation(&mut self) -> bool {
        let mode = self.permutation;
        self.apply(Command::SetPermutation(PermutationMode::from_axes(
            mode.permutes_rows(),
            !mode.permutes_cols(),
        )))
    }

    // -------------------------------------------------------------------------
    // Viewport
    // -------------------------------------------------------------------------

    fn viewport_changed(&mut self, changed: bool) -> bool {
        if changed {
            self.planner.invalidate();
        }
        changed
    }

    pub fn pan_pixels(&mut self, dx: f32, dy: f32) -> bool {
        let changed = self.viewport.pan_pixels(eframe::egui::vec2(dx, dy));
        self.viewport_changed(changed)
    }

    pub fn zoom_about(&mut self, factor: f32, x: f32, y: f32) -> bool {
        let changed = self.viewport.zoom_about(factor, eframe::egui::pos2(x, y));
        self.viewport_changed(changed)
    }

    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        let changed = self.viewport.resize(width, height);
        self.viewport_changed(changed)
    }

    /// Opacity of points at the current zoom.
    pub fn current_alpha(&self) -> f32 {
        let vp = &self.viewport;
        self.alpha.alpha(
            vp.zoom,
            vp.pixel_size().x,
            vp.virtual_size().x,
            vp.aspect,
        )
    }

    // -------------------------------------------------------------------------
    // Cursor
    // -------------------------------------------------------------------------

    pub fn move_cursor(&mut self, drow: isize, dcol: isize) -> bool {
        let (nrows, ncols) = (self.nrows(), self.ncols());
        self.cursor.step(drow, dcol, nrows, ncols)
    }

    /// Put the cursor on the display cell under a canvas pixel. Clicks
    /// outside the matrix are ignored.
    pub fn select_at(&mut self, x: f32, y: f32) -> bool {
        let world = self.viewport.screen_to_world(eframe::egui::pos2(x, y));
        let row = (world.y + 0.5).floor();
        let col = (world.x + 0.5).floor();
        if row < 0.0 || col < 0.0 || row >= self.nrows() as f32 || col >= self.ncols() as f32 {
            return false;
        }
        self.cursor.set(row as usize, col as usize)
    }

    /// Value and labels under the cursor.
    pub fn cursor_readout(&self) -> CursorReadout {
        let row = to_storage(
            self.permutations.active_rows(self.permutation),
            self.cursor.row,
        );
        let col = to_storage(
            self.permutations.active_cols(self.permutation),
            self.cursor.col,
        );
        CursorReadout {
            row,
            col,
            value: self.data.matrix.value_at(row, col),
            row_label: self.labels.row_label(row).to_string(),
            col_label: self.labels.column_label(col).to_string(),
        }
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    fn frame_inputs(&self, alpha: f32) -> FrameInputs<'_> {
        let range = self.normalization.value_range(&self.data.stats);
        FrameInputs {
            matrix: &self.data.matrix,
            norms: &self.data.norms,
            normalization: self.normalization,
            row_perm: self.permutations.active_rows(self.permutation),
            col_perm: self.permutations.active_cols(self.permutation),
            colors: ColorScale::new(self.palette, range, self.invert, alpha),
        }
    }

    /// Plan the next frame and emit its points into `sink`.
    pub fn render_frame<S: PointSink + ?Sized>(&mut self, sink: &mut S) -> FrameReport {
        let extents = self.viewport.world_extents();
        let task = self.planner.plan(&extents, self.nrows(), self.ncols());
        // An empty clearing task still has to wipe what the sink accumulated.
        if task.clear || !task.is_empty() {
            sink.begin_task(&task);
        }
        if task.is_empty() {
            return FrameReport { task, points: 0 };
        }

        let points = emit_task(&self.frame_inputs(self.current_alpha()), &task, sink);
        log::debug!(
            "drawing {} matrix: rows {:?}, columns {:?}, {} points",
            task.strategy.name(),
            task.rows,
            task.cols,
            points
        );
        FrameReport { task, points }
    }

    /// Write the visible region as an SVG document. Returns the number of
    /// points written.
    pub fn write_svg<W: Write>(&self, out: W) -> io::Result<usize> {
        let e = self.viewport.world_extents();
        let task = RenderTask::visible(&e, self.nrows(), self.ncols());
        let mut svg = SvgWriter::new(out, (e.x1, e.y1, e.x2, e.y2), self.background.color())?;
        emit_task(&self.frame_inputs(self.current_alpha()), &task, &mut svg);
        let written = svg.written();
        svg.finish()?;
        Ok(written)
    }

    /// Write the visible region to `path`.
    pub fn export_svg(&self, path: &Path) -> io::Result<usize> {
        let file = File::create(path)?;
        let written = self.write_svg(BufWriter::new(file))?;
        log::info!("wrote {} points to {}", written, path.display());
        Ok(written)
    }
}

/// `<stem>.svg` next to the matrix file.
pub fn svg_path(matrix_path: &Path) -> PathBuf {
    let mut path = matrix_path.to_path_buf();
    // Strip a compression suffix first so "a.smat.gz" becomes "a.svg".
    if path.extension().is_some_and(|e| e == "gz") {
        path.set_extension("");
    }
    path.set_extension("svg");
    path
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn to_storage(perm: Option<&Permutation>, p: usize) -> usize {
    match perm {
        Some(perm) if p < perm.len() => perm.to_storage(p),
        _ => p,
    }
}
