//! Spyglass - interactive scatter-plot viewer for large sparse matrices.
//!
//! Each nonzero of a matrix is drawn as a colored point at its (column, row)
//! position. The library holds everything except the window toolkit:
//! - Compressed-row storage with per-row/column statistics
//! - Optional row/column permutations and labels
//! - Row/column normalization and palette color mapping
//! - Viewport-driven render planning (partial, full or incremental scans)
//! - Zoom-dependent point opacity
//! - Pan/zoom/cursor interaction state and window event routing

pub mod app;
pub mod config;
pub mod error;
pub mod matrix;
pub mod render;
pub mod util;
pub mod window;

pub use error::LoadError;
