//! Render configuration.
//!
//! Planner thresholds and point opacity. Every field has a default that a JSON
//! config file (or the command line) may override.

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Visible extent (world units) below which only the clipped window is drawn.
pub const DEFAULT_PARTIAL_EXTENT_THRESHOLD: f32 = 16384.0;

/// Row count below which the whole matrix is drawn in one frame.
pub const DEFAULT_FULL_ROW_LIMIT: usize = 32768;

/// Rows drawn per frame during an incremental scan.
pub const DEFAULT_INCREMENTAL_CHUNK_ROWS: usize = 16384;

/// Point translucency used when zoomed out.
pub const DEFAULT_POINT_ALPHA: f32 = 0.5;

/// Zoom applied on load and by the home command.
pub const DEFAULT_INITIAL_ZOOM: f32 = 0.95;

/// Tunables for the render planner and alpha policy.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub partial_extent_threshold: f32,
    pub full_row_limit: usize,
    pub incremental_chunk_rows: usize,
    pub point_alpha: f32,
    pub initial_zoom: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            partial_extent_threshold: DEFAULT_PARTIAL_EXTENT_THRESHOLD,
            full_row_limit: DEFAULT_FULL_ROW_LIMIT,
            incremental_chunk_rows: DEFAULT_INCREMENTAL_CHUNK_ROWS,
            point_alpha: DEFAULT_POINT_ALPHA,
            initial_zoom: DEFAULT_INITIAL_ZOOM,
        }
    }
}

impl RenderConfig {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config.sanitized())
    }

    /// Replace nonsensical values with defaults.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.partial_extent_threshold > 0.0) {
            self.partial_extent_threshold = defaults.partial_extent_threshold;
        }
        if self.incremental_chunk_rows == 0 {
            self.incremental_chunk_rows = defaults.incremental_chunk_rows;
        }
        if !(0.0..=1.0).contains(&self.point_alpha) {
            self.point_alpha = defaults.point_alpha;
        }
        if !(self.initial_zoom > 0.0) {
            self.initial_zoom = defaults.initial_zoom;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: RenderConfig =
            serde_json::from_str(r#"{ "incremental_chunk_rows": 1024 }"#).unwrap();
        assert_eq!(config.incremental_chunk_rows, 1024);
        assert_eq!(config.full_row_limit, DEFAULT_FULL_ROW_LIMIT);
        assert_eq!(config.point_alpha, DEFAULT_POINT_ALPHA);
    }

    #[test]
    fn test_sanitized_rejects_bad_values() {
        let config = RenderConfig {
            partial_extent_threshold: -1.0,
            incremental_chunk_rows: 0,
            point_alpha: 3.0,
            initial_zoom: 0.0,
            ..RenderConfig::default()
        }
        .sanitized();
        assert_eq!(config, RenderConfig::default());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{ "point_alpha": 0.25 }"#).unwrap();
        let config = RenderConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.point_alpha, 0.25);
    }
}
