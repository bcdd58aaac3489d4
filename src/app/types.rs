//! Core types for the interactive view: viewport, cursor, commands.

use eframe::egui::{Pos2, Vec2};

use crate::matrix::PermutationMode;
use crate::render::{NormalizationMode, WorldExtents};
use crate::util::color::{Palette, Rgba};

// =============================================================================
// Constants
// =============================================================================

/// Zoom limits applied by every zoom mutation.
pub const MIN_ZOOM: f32 = 1e-4;
pub const MAX_ZOOM: f32 = 1e6;

/// Aspect ratios offered by the controls (column width : row height).
pub const ASPECT_CHOICES: &[(f32, &str)] = &[
    (1.0, "1:1"),
    (2.0, "1:2 (wide)"),
    (4.0, "1:4 (wide)"),
    (0.5, "2:1 (tall)"),
    (0.25, "4:1 (tall)"),
];

// =============================================================================
// Viewport
// =============================================================================

/// Pan/zoom state over the matrix world.
///
/// World `x` is the display column and `y` the display row, so rows grow
/// downward just like screen coordinates. At zoom 1 the "virtual" world
/// (the matrix widened on one axis to the window's aspect) exactly fills
/// the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    /// Zoom level (1.0 = the whole virtual world is visible).
    pub zoom: f32,
    /// Pan offset of the view centre from `center_world`, in world units.
    pub translation: Vec2,
    /// World point shown at the window centre when `translation` is zero.
    pub center_world: Pos2,
    /// Horizontal stretch of the world; 2.0 shows twice as many columns.
    pub aspect: f32,
    natural_size: Vec2,
    pixel_size: Vec2,
    initial_zoom: f32,
}

impl ViewportState {
    /// Viewport for an `nrows x ncols` matrix in a `width x height` window.
    pub fn new(nrows: usize, ncols: usize, width: f32, height: f32, initial_zoom: f32) -> Self {
        Self {
            zoom: initial_zoom,
            translation: Vec2::ZERO,
            center_world: Pos2::new(
                (ncols as f32 - 1.0).max(0.0) / 2.0,
                (nrows as f32 - 1.0).max(0.0) / 2.0,
            ),
            aspect: 1.0,
            natural_size: Vec2::new((ncols as f32).max(1.0), (nrows as f32).max(1.0)),
            pixel_size: Vec2::new(width.max(1.0), height.max(1.0)),
            initial_zoom,
        }
    }

    pub fn pixel_size(&self) -> Vec2 {
        self.pixel_size
    }

    /// Natural size widened to the window aspect ratio.
    pub fn virtual_size(&self) -> Vec2 {
        let natural = self.natural_size;
        let window_ratio = self.pixel_size.x / self.pixel_size.y;
        if natural.x / natural.y < window_ratio {
            Vec2::new(natural.y * window_ratio, natural.y)
        } else {
            Vec2::new(natural.x, natural.x / window_ratio)
        }
    }

    /// Screen pixels per world unit along each axis.
    pub fn pixels_per_unit(&self) -> Vec2 {
        let virt = self.virtual_size();
        Vec2::new(
            self.zoom * self.pixel_size.x / (virt.x * self.aspect),
            self.zoom * self.pixel_size.y / virt.y,
        )
    }

    /// On-screen width of one column, used as the point size.
    pub fn point_size(&self) -> f32 {
        self.pixels_per_unit().x
    }

    /// World position shown at the window centre.
    pub fn view_center(&self) -> Pos2 {
        self.center_world + self.translation
    }

    /// Visible world rectangle.
    pub fn world_extents(&self) -> WorldExtents {
        let half = self.pixel_size / self.pixels_per_unit() / 2.0;
        let c = self.view_center();
        WorldExtents::new(c.x - half.x, c.y - half.y, c.x + half.x, c.y + half.y)
    }

    /// Window pixel (origin top-left) of a world point.
    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        let ppu = self.pixels_per_unit();
        let c = self.view_center();
        Pos2::new(
            self.pixel_size.x / 2.0 + (world.x - c.x) * ppu.x,
            self.pixel_size.y / 2.0 + (world.y - c.y) * ppu.y,
        )
    }

    /// World point under a window pixel.
    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        let ppu = self.pixels_per_unit();
        let c = self.view_center();
        Pos2::new(
            c.x + (screen.x - self.pixel_size.x / 2.0) / ppu.x,
            c.y + (screen.y - self.pixel_size.y / 2.0) / ppu.y,
        )
    }

    /// Drag the content by a pixel delta. Returns whether anything moved.
    pub fn pan_pixels(&mut self, delta: Vec2) -> bool {
        if delta == Vec2::ZERO {
            return false;
        }
        self.translation -= delta / self.pixels_per_unit();
        true
    }

    /// Multiply the zoom keeping the world point under `anchor` fixed.
    pub fn zoom_about(&mut self, factor: f32, anchor: Pos2) -> bool {
        if !(factor > 0.0) || factor == 1.0 {
            return false;
        }
        let before = self.screen_to_world(anchor);
        let zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if zoom == self.zoom {
            return false;
        }
        self.zoom = zoom;
        let after = self.screen_to_world(anchor);
        self.translation += before - after;
        true
    }

    /// Reset zoom and pan to the startup view.
    pub fn home(&mut self) -> bool {
        let changed = self.zoom != self.initial_zoom || self.translation != Vec2::ZERO;
        self.zoom = self.initial_zoom;
        self.translation = Vec2::ZERO;
        changed
    }

    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        let size = Vec2::new(width.max(1.0), height.max(1.0));
        if size == self.pixel_size {
            return false;
        }
        self.pixel_size = size;
        true
    }

    pub fn set_aspect(&mut self, aspect: f32) -> bool {
        if !(aspect > 0.0) || aspect == self.aspect {
            return false;
        }
        self.aspect = aspect;
        true
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// Selected display cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
    pub visible: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            row: 0,
            col: 0,
            visible: true,
        }
    }
}

impl Cursor {
    /// Move by a signed offset, clamped to an `nrows x ncols` matrix.
    pub fn step(&mut self, drow: isize, dcol: isize, nrows: usize, ncols: usize) -> bool {
        let row = clamp_step(self.row, drow, nrows);
        let col = clamp_step(self.col, dcol, ncols);
        self.set(row, col)
    }

    pub fn set(&mut self, row: usize, col: usize) -> bool {
        if (row, col) == (self.row, self.col) {
            return false;
        }
        self.row = row;
        self.col = col;
        true
    }
}

fn clamp_step(pos: usize, delta: isize, n: usize) -> usize {
    let last = n.saturating_sub(1);
    pos.saturating_add_signed(delta).min(last)
}

// =============================================================================
// Background
// =============================================================================

/// Canvas background; border and cursor colors follow it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Background {
    #[default]
    Black,
    White,
}

impl Background {
    pub fn name(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::White => "white",
        }
    }

    pub fn color(self) -> Rgba {
        match self {
            Self::Black => Rgba::opaque([0.0, 0.0, 0.0]),
            Self::White => Rgba::opaque([1.0, 1.0, 1.0]),
        }
    }

    pub fn border_color(self) -> Rgba {
        match self {
            Self::Black => Rgba::opaque([1.0, 1.0, 1.0]),
            Self::White => Rgba::opaque([0.0, 0.0, 0.0]),
        }
    }

    pub fn cursor_color(self) -> Rgba {
        match self {
            Self::Black => Rgba::opaque([1.0, 1.0, 0.0]),
            Self::White => Rgba::opaque([1.0, 0.0, 0.0]),
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// View mutations exposed to the controls and key bindings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    SetColormap(Palette),
    InvertColormap,
    NextColormap,
    SetNormalization(NormalizationMode),
    SetPermutation(PermutationMode),
    SetPointAlpha(f32),
    SetAspect(f32),
    Home,
    ToggleCursor,
    SetBackground(Background),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> ViewportState {
        ViewportState::new(3, 3, 200.0, 200.0, 1.5)
    }

    #[test]
    fn test_extents_centered_on_matrix() {
        let vp = square();
        assert_eq!(vp.center_world, Pos2::new(1.0, 1.0));
        let e = vp.world_extents();
        assert!((e.x1 - 0.0).abs() < 1e-5 && (e.x2 - 2.0).abs() < 1e-5);
        assert!((e.y1 - 0.0).abs() < 1e-5 && (e.y2 - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_virtual_size_widens_to_window() {
        // Tall matrix in a wide window: width is widened.
        let vp = ViewportState::new(100, 10, 400.0, 200.0, 1.0);
        assert_eq!(vp.virtual_size(), Vec2::new(200.0, 100.0));
        let ppu = vp.pixels_per_unit();
        assert_eq!(ppu.x, ppu.y);

        // Wide matrix in a square window: height is widened.
        let vp = ViewportState::new(10, 100, 200.0, 200.0, 1.0);
        assert_eq!(vp.virtual_size(), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_screen_world_inverse() {
        let mut vp = ViewportState::new(1000, 500, 640.0, 480.0, 0.95);
        vp.translation = Vec2::new(12.0, -30.0);
        let p = Pos2::new(123.0, 321.0);
        let back = vp.world_to_screen(vp.screen_to_world(p));
        assert!((back - p).length() < 1e-2);
    }

    #[test]
    fn test_pan_moves_content_with_pointer() {
        let mut vp = square();
        let world = Pos2::new(2.0, 2.0);
        let before = vp.world_to_screen(world);
        assert!(vp.pan_pixels(Vec2::new(10.0, -5.0)));
        let after = vp.world_to_screen(world);
        assert!((after - before - Vec2::new(10.0, -5.0)).length() < 1e-3);
        assert!(!vp.pan_pixels(Vec2::ZERO));
    }

    #[test]
    fn test_zoom_about_keeps_anchor() {
        let mut vp = square();
        let anchor = Pos2::new(150.0, 40.0);
        let world = vp.screen_to_world(anchor);
        assert!(vp.zoom_about(2.0, anchor));
        assert_eq!(vp.zoom, 3.0);
        assert!((vp.screen_to_world(anchor) - world).length() < 1e-4);
        assert!(!vp.zoom_about(1.0, anchor));
        assert!(!vp.zoom_about(-1.0, anchor));
    }

    #[test]
    fn test_home_and_aspect() {
        let mut vp = square();
        assert!(!vp.home());
        vp.pan_pixels(Vec2::new(3.0, 3.0));
        assert!(vp.home());
        assert_eq!(vp.translation, Vec2::ZERO);

        let narrow = vp.point_size();
        assert!(vp.set_aspect(2.0));
        assert!((vp.point_size() - narrow / 2.0).abs() < 1e-5);
        assert!(!vp.set_aspect(2.0));
        assert!(!vp.set_aspect(0.0));
    }

    #[test]
    fn test_cursor_clamps() {
        let mut cursor = Cursor::default();
        assert!(!cursor.step(-1, -1, 3, 3));
        assert!(cursor.step(5, 1, 3, 3));
        assert_eq!((cursor.row, cursor.col), (2, 1));
    }

    #[test]
    fn test_background_colors() {
        assert_eq!(Background::default(), Background::Black);
        assert_eq!(Background::White.border_color(), Rgba::opaque([0.0; 3]));
        assert_eq!(Background::Black.cursor_color(), Rgba::opaque([1.0, 1.0, 0.0]));
    }
}
