//! Interactive view state.
//!
//! - `MatrixView` - loaded matrix, view settings and the frame driver
//! - `MatrixCanvas` - key and mouse bindings for a `MatrixView`
//! - `PointSurface` - rasterizes emitted points into an egui image
//! - `ViewportState` - pan/zoom geometry
//! - `Cursor`, `Background`, `Command` - smaller pieces of view state

mod canvas;
mod state;
mod surface;
mod types;

pub use canvas::MatrixCanvas;
pub use state::{svg_path, CursorReadout, FrameReport, MatrixView};
pub use surface::PointSurface;
pub use types::{
    Background, Command, Cursor, ViewportState, ASPECT_CHOICES, MAX_ZOOM, MIN_ZOOM,
};
