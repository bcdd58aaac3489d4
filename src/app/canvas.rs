//! The matrix window: key bindings and mouse handling on top of
//! [`MatrixView`].

use std::path::PathBuf;

use eframe::egui::Pos2;

use super::state::{FrameReport, MatrixView};
use super::types::Command;
use crate::render::PointSink;
use crate::window::{Key, MouseButton, WindowHandler};

/// Zoom change per pixel of vertical secondary-button drag.
const DRAG_ZOOM_RATE: f32 = 0.01;

/// Zoom change per scroll unit.
const SCROLL_ZOOM_RATE: f32 = 0.002;

/// Pointer travel (pixels) below which a press and release count as a click.
const CLICK_SLOP: f32 = 3.0;

#[derive(Clone, Copy, Debug)]
struct Drag {
    button: MouseButton,
    start: Pos2,
    last: Pos2,
    moved: bool,
}

/// A [`MatrixView`] wired to window events.
pub struct MatrixCanvas {
    pub view: MatrixView,
    /// Target of the SVG export key.
    svg_path: Option<PathBuf>,
    drag: Option<Drag>,
}

impl MatrixCanvas {
    pub fn new(view: MatrixView, svg_path: Option<PathBuf>) -> Self {
        Self {
            view,
            svg_path,
            drag: None,
        }
    }

    pub fn apply(&mut self, command: Command) -> bool {
        self.view.apply(command)
    }

    /// Write the visible region to the configured SVG path.
    pub fn export_svg(&self) {
        let Some(path) = &self.svg_path else {
            log::warn!("no SVG output path");
            return;
        };
        if let Err(e) = self.view.export_svg(path) {
            log::error!("failed to write {}: {e}", path.display());
        }
    }
}

impl WindowHandler for MatrixCanvas {
    fn on_display(&mut self, sink: &mut dyn PointSink) -> FrameReport {
        self.view.render_frame(sink)
    }

    fn on_reshape(&mut self, width: f32, height: f32) -> bool {
        self.view.resize(width, height)
    }

    fn on_key(&mut self, key: Key) -> bool {
        match key {
            Key::Up => self.view.move_cursor(-1, 0),
            Key::Down => self.view.move_cursor(1, 0),
            Key::Left => self.view.move_cursor(0, -1),
            Key::Right => self.view.move_cursor(0, 1),
            Key::Char(c) => match c.to_ascii_lowercase() {
                'c' => self.view.apply(Command::NextColormap),
                'i' => self.view.apply(Command::InvertColormap),
                'h' => self.view.apply(Command::Home),
                't' => self.view.apply(Command::ToggleCursor),
                'r' => self.view.toggle_row_normalization(),
                'k' => self.view.toggle_col_normalization(),
                'p' => self.view.toggle_row_permutation(),
                'q' => self.view.toggle_col_permutation(),
                'o' => {
                    self.export_svg();
                    false
                }
                _ => false,
            },
        }
    }

    fn on_motion(&mut self, x: f32, y: f32) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        let pos = Pos2::new(x, y);
        let delta = pos - drag.last;
        drag.last = pos;
        if (pos - drag.start).length() > CLICK_SLOP {
            drag.moved = true;
        }
        let (button, anchor) = (drag.button, drag.start);

        match button {
            MouseButton::Primary => self.view.pan_pixels(delta.x, delta.y),
            MouseButton::Secondary => {
                let factor = (-delta.y * DRAG_ZOOM_RATE).exp();
                self.view.zoom_about(factor, anchor.x, anchor.y)
            }
            MouseButton::Middle => false,
        }
    }

    fn on_click(&mut self, button: MouseButton, pressed: bool, x: f32, y: f32) -> bool {
        let pos = Pos2::new(x, y);
        if pressed {
            self.drag = Some(Drag {
                button,
                start: pos,
                last: pos,
                moved: false,
            });
            return false;
        }

        match self.drag.take() {
            Some(drag) if drag.button == MouseButton::Primary && !drag.moved => {
                self.view.select_at(x, y)
            }
            _ => false,
        }
    }

    fn on_scroll(&mut self, delta: f32, x: f32, y: f32) -> bool {
        if delta == 0.0 {
            return false;
        }
        self.view.zoom_about((delta * SCROLL_ZOOM_RATE).exp(), x, y)
    }
}
