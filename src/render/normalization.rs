//! Row/column normalization of displayed values.
//!
//! A raw entry `(i, j, v)` is displayed as `v * row_factor(i) * col_factor(j)`
//! where each factor is either the precomputed reciprocal norm or 1.

use crate::matrix::{MatrixStats, NormalizationVectors};
use crate::util::color::ValueRange;

/// Which axes are scaled by their reciprocal L2 norm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NormalizationMode {
    #[default]
    None,
    Row,
    Column,
    RowAndColumn,
}

impl NormalizationMode {
    pub fn from_axes(rows: bool, cols: bool) -> Self {
        match (rows, cols) {
            (false, false) => Self::None,
            (true, false) => Self::Row,
            (false, true) => Self::Column,
            (true, true) => Self::RowAndColumn,
        }
    }

    pub fn normalizes_rows(self) -> bool {
        matches!(self, Self::Row | Self::RowAndColumn)
    }

    pub fn normalizes_cols(self) -> bool {
        matches!(self, Self::Column | Self::RowAndColumn)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Row => "rows",
            Self::Column => "columns",
            Self::RowAndColumn => "rows and columns",
        }
    }

    /// Range used for color scaling.
    ///
    /// Normalized values are assumed to lie in `[0, 1]`; the actual extrema
    /// of the normalized data are not computed.
    pub fn value_range(self, stats: &MatrixStats) -> ValueRange {
        match self {
            Self::None => ValueRange::new(stats.min_val, stats.max_val),
            Self::Row | Self::Column | Self::RowAndColumn => ValueRange::UNIT,
        }
    }

    /// Displayed value of a single entry (used outside the render loop).
    pub fn apply(self, norms: &NormalizationVectors, i: usize, j: usize, v: f64) -> f64 {
        let rf = if self.normalizes_rows() {
            norms.row_norm.get(i).copied().unwrap_or(0.0)
        } else {
            1.0
        };
        let cf = if self.normalizes_cols() {
            norms.col_norm.get(j).copied().unwrap_or(0.0)
        } else {
            1.0
        };
        v * rf * cf
    }
}

/// A per-index scale factor along one axis.
///
/// Implemented for `&[f64]` so the load-time norm vectors are read in place.
pub trait AxisScale: Copy {
    fn factor(self, i: usize) -> f64;
}

/// Constant factor 1; nothing is materialized.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnitScale;

impl AxisScale for UnitScale {
    #[inline(always)]
    fn factor(self, _i: usize) -> f64 {
        1.0
    }
}

impl AxisScale for &[f64] {
    #[inline(always)]
    fn factor(self, i: usize) -> f64 {
        self[i]
    }
}
