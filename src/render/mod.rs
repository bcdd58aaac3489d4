//! Frame planning and point emission.
//!
//! - `normalization` - row/column scale factors and color ranges
//! - `alpha` - point opacity from zoom
//! - `planner` - Partial/Full/Incremental selection and the point walk
//! - `sink` - the draw-point primitive, an in-memory buffer and SVG output

pub mod alpha;
pub mod normalization;
pub mod planner;
pub mod sink;

pub use alpha::AlphaPolicy;
pub use normalization::{AxisScale, NormalizationMode, UnitScale};
pub use planner::{
    emit_task, FrameInputs, RenderPlanner, RenderStrategy, RenderTask, ScanState, WorldExtents,
};
pub use sink::{Point, PointBuffer, PointSink, SvgWriter};
