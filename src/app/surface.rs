//! CPU rasterization of emitted points into an egui image.
//!
//! The image persists across frames so incremental scans accumulate; it is
//! reset when a render task asks for a clear or the canvas is resized.

use eframe::egui::{Color32, ColorImage, Vec2};

use super::types::ViewportState;
use crate::render::{PointSink, RenderTask};
use crate::util::color::{channel_to_u8, Rgba};

/// An opaque image that points are alpha-blended into.
pub struct PointSurface {
    image: ColorImage,
    background: Color32,
    /// `screen = world * scale + offset`.
    scale: Vec2,
    offset: Vec2,
    /// Side length of one point in pixels.
    point: Vec2,
    dirty: bool,
}

impl Default for PointSurface {
    fn default() -> Self {
        Self {
            image: ColorImage::new([1, 1], Color32::BLACK),
            background: Color32::BLACK,
            scale: Vec2::splat(1.0),
            offset: Vec2::ZERO,
            point: Vec2::splat(1.0),
            dirty: true,
        }
    }
}

impl PointSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> &ColorImage {
        &self.image
    }

    /// Whether the image changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Set up the world-to-pixel transform for the next frame.
    pub fn set_view(&mut self, viewport: &ViewportState, background: Rgba) {
        let px = viewport.pixel_size();
        let size = [px.x.round().max(1.0) as usize, px.y.round().max(1.0) as usize];
        self.background = background.into();
        if size != self.image.size {
            self.image = ColorImage::new(size, self.background);
            self.dirty = true;
        }

        let ppu = viewport.pixels_per_unit();
        self.scale = ppu;
        self.offset = px / 2.0 - viewport.view_center().to_vec2() * ppu;
        self.point = Vec2::new(ppu.x.max(1.0), ppu.y.max(1.0));
    }

    /// Fill with the background color.
    pub fn clear(&mut self) {
        self.image = ColorImage::new(self.image.size, self.background);
        self.dirty = true;
    }

    fn blend(&mut self, x: usize, y: usize, color: Rgba) {
        let idx = y * self.image.size[0] + x;
        let dst = self.image.pixels[idx];
        let a = color.a;
        let mix = |src: f32, dst: u8| channel_to_u8(src * a + (f32::from(dst) / 255.0) * (1.0 - a));
        self.image.pixels[idx] = Color32::from_rgb(
            mix(color.r, dst.r()),
            mix(color.g, dst.g()),
            mix(color.b, dst.b()),
        );
    }
}

impl PointSink for PointSurface {
    fn begin_task(&mut self, task: &RenderTask) {
        if task.clear {
            self.clear();
        }
    }

    fn emit_point(&mut self, x: f32, y: f32, color: Rgba) {
        let [w, h] = self.image.size;
        let cx = x * self.scale.x + self.offset.x;
        let cy = y * self.scale.y + self.offset.y;
        let left = (cx - self.point.x / 2.0).round();
        let top = (cy - self.point.y / 2.0).round();
        let x0 = left.max(0.0);
        let y0 = top.max(0.0);
        let x1 = (left + self.point.x.round().max(1.0)).min(w as f32);
        let y1 = (top + self.point.y.round().max(1.0)).min(h as f32);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        self.dirty = true;
        for py in y0 as usize..y1 as usize {
            for px in x0 as usize..x1 as usize {
                self.blend(px, py, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderStrategy;

    fn viewport() -> ViewportState {
        // 3x3 matrix, view [0, 2] over 200 px: 100 px per cell.
        ViewportState::new(3, 3, 200.0, 200.0, 1.5)
    }

    fn task(clear: bool) -> RenderTask {
        RenderTask {
            strategy: RenderStrategy::Incremental,
            rows: 0..3,
            cols: 0..3,
            clip: true,
            clear,
            finished: true,
        }
    }

    fn black() -> Rgba {
        Rgba::opaque([0.0; 3])
    }

    #[test]
    fn test_point_covers_its_cell() {
        let mut surface = PointSurface::new();
        surface.set_view(&viewport(), black());
        assert_eq!(surface.image().size, [200, 200]);
        assert_eq!(surface.image().pixels.len(), 200 * 200);

        surface.emit_point(1.0, 1.0, Rgba::new(1.0, 0.0, 0.0, 1.0));
        let at = |x: usize, y: usize| surface.image().pixels[y * 200 + x];
        assert_eq!(at(100, 100), Color32::from_rgb(255, 0, 0));
        assert_eq!(at(51, 51), Color32::from_rgb(255, 0, 0));
        assert_eq!(at(20, 20), Color32::BLACK);
    }

    #[test]
    fn test_alpha_blends_and_accumulates() {
        let mut surface = PointSurface::new();
        let vp = viewport();
        surface.set_view(&vp, black());
        surface.emit_point(0.0, 0.0, Rgba::new(1.0, 1.0, 1.0, 0.5));
        assert_eq!(surface.image().pixels[0], Color32::from_gray(128));
        assert!(surface.take_dirty());
        assert!(!surface.take_dirty());

        // Tasks that do not clear keep earlier points.
        surface.set_view(&vp, black());
        surface.begin_task(&task(false));
        assert_eq!(surface.image().pixels[0], Color32::from_gray(128));

        surface.set_view(&vp, Rgba::opaque([1.0; 3]));
        surface.begin_task(&task(true));
        assert_eq!(surface.image().pixels[0], Color32::WHITE);
    }

    #[test]
    fn test_offscreen_points_are_dropped() {
        let mut surface = PointSurface::new();
        surface.set_view(&viewport(), black());
        surface.take_dirty();
        surface.emit_point(-10.0, 50.0, Rgba::new(1.0, 1.0, 1.0, 1.0));
        assert!(surface.image().pixels.iter().all(|&p| p == Color32::BLACK));
        assert!(!surface.take_dirty());
    }
}
