//! Utility functions shared across the application.
//!
//! This module provides common utilities for:
//! - Colormaps and value-to-color mapping
//! - Human-readable formatting

pub mod color;
pub mod format;

pub use color::{map_color, ColorScale, Palette, Rgba, ValueRange};
pub use format::{format_bytes, format_count, format_value};
