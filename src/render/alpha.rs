//! Point opacity derived from the zoom level.
//!
//! Zoomed out, many points overlap and translucency shows density. Once a
//! point covers two or more pixels it is drawn fully opaque. In between,
//! opacity ramps linearly from the configured translucency.

/// Point size (pixels per world unit) at which points become opaque.
pub const OPAQUE_POINT_SIZE: f32 = 2.0;

/// Zoom-dependent alpha with a configurable zoomed-out translucency.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlphaPolicy {
    point_alpha: f32,
}

impl AlphaPolicy {
    pub fn new(point_alpha: f32) -> Self {
        Self {
            point_alpha: point_alpha.clamp(0.0, 1.0),
        }
    }

    pub fn point_alpha(&self) -> f32 {
        self.point_alpha
    }

    /// Set the zoomed-out translucency; values outside `[0, 1]` are ignored.
    pub fn set_point_alpha(&mut self, a: f32) -> bool {
        if (0.0..=1.0).contains(&a) {
            self.point_alpha = a;
            true
        } else {
            false
        }
    }

    /// Opacity for the current view.
    ///
    /// `world_width` is the virtual world width spanned by the viewport at
    /// zoom 1 and `viewport_width_px` its width in pixels.
    pub fn alpha(&self, zoom: f32, viewport_width_px: f32, world_width: f32, aspect: f32) -> f32 {
        let unit = world_width * aspect / viewport_width_px;
        let point_size = zoom / unit;

        if zoom < 1.0 {
            self.point_alpha
        } else if point_size >= OPAQUE_POINT_SIZE {
            1.0
        } else {
            let zoom_1 = 1.0;
            let zoom_2 = OPAQUE_POINT_SIZE * unit;
            1.0 - (zoom_2 - zoom) / (zoom_2 - zoom_1) * (1.0 - self.point_alpha)
        }
    }
}

impl Default for AlphaPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_POINT_ALPHA)
    }
}
