//! Row and column permutations (display position <-> storage index).
//!
//! A permutation file lists, for each display position `p`, the storage
//! index drawn there. That is the inverse permutation; the forward map is
//! built as its positional inverse so both directions always agree.

use std::path::Path;

use super::triplets::{as_text, read_input};
use crate::error::LoadError;

/// A bijection on `[0, n)` stored in both directions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permutation {
    /// Storage index -> display position.
    forward: Vec<usize>,
    /// Display position -> storage index.
    inverse: Vec<usize>,
}

impl Permutation {
    /// Build from the display-order listing (`inverse[p]` = storage index).
    ///
    /// Returns the offending position when `inverse` is not a bijection.
    pub fn from_inverse(inverse: Vec<usize>) -> Result<Self, usize> {
        let n = inverse.len();
        let mut forward = vec![usize::MAX; n];
        for (p, &i) in inverse.iter().enumerate() {
            if i >= n || forward[i] != usize::MAX {
                return Err(p);
            }
            forward[i] = p;
        }
        Ok(Self { forward, inverse })
    }

    pub fn identity(n: usize) -> Self {
        let ids: Vec<usize> = (0..n).collect();
        Self {
            forward: ids.clone(),
            inverse: ids,
        }
    }

    pub fn len(&self) -> usize {
        self.inverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inverse.is_empty()
    }

    /// Display position of storage index `i`.
    #[inline]
    pub fn to_display(&self, i: usize) -> usize {
        self.forward[i]
    }

    /// Storage index shown at display position `p`.
    #[inline]
    pub fn to_storage(&self, p: usize) -> usize {
        self.inverse[p]
    }

    pub fn forward(&self) -> &[usize] {
        &self.forward
    }

    pub fn inverse(&self) -> &[usize] {
        &self.inverse
    }
}

// =============================================================================
// Permutation Mode and Index Lookup
// =============================================================================

/// Which axes are currently drawn in permuted order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PermutationMode {
    #[default]
    None,
    Row,
    Column,
    RowAndColumn,
}

impl PermutationMode {
    pub fn from_axes(rows: bool, cols: bool) -> Self {
        match (rows, cols) {
            (false, false) => Self::None,
            (true, false) => Self::Row,
            (false, true) => Self::Column,
            (true, true) => Self::RowAndColumn,
        }
    }

    pub fn permutes_rows(self) -> bool {
        matches!(self, Self::Row | Self::RowAndColumn)
    }

    pub fn permutes_cols(self) -> bool {
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
}

/// An index remapping along one axis, either a table or the identity.
///
/// Implemented for `&[usize]` so a loaded permutation is used in place.
pub trait AxisOrder: Copy {
    fn map(self, i: usize) -> usize;
}

/// The identity remapping; no table is allocated.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityOrder;

impl AxisOrder for IdentityOrder {
    #[inline(always)]
    fn map(self, i: usize) -> usize {
        i
    }
}

impl AxisOrder for &[usize] {
    #[inline(always)]
    fn map(self, i: usize) -> usize {
        self[i]
    }
}

/// Optional permutations for each axis of a loaded matrix.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatrixPermutations {
    pub rows: Option<Permutation>,
    pub cols: Option<Permutation>,
}

impl MatrixPermutations {
    /// Load either or both permutation files for an `nrows x ncols` matrix.
    pub fn load(
        row_file: Option<&Path>,
        col_file: Option<&Path>,
        nrows: usize,
        ncols: usize,
    ) -> Result<Self, LoadError> {
        let rows = row_file.map(|p| read_permutation(p, nrows)).transpose()?;
        let cols = col_file.map(|p| read_permutation(p, ncols)).transpose()?;
        Ok(Self { rows, cols })
    }

    /// Whether every axis that `mode` permutes has a loaded permutation.
    pub fn supports(&self, mode: PermutationMode) -> bool {
        (!mode.permutes_rows() || self.rows.is_some())
            && (!mode.permutes_cols() || self.cols.is_some())
    }

    /// Row permutation if `mode` uses it.
    pub fn active_rows(&self, mode: PermutationMode) -> Option<&Permutation> {
        self.rows.as_ref().filter(|_| mode.permutes_rows())
    }

    /// Column permutation if `mode` uses it.
    pub fn active_cols(&self, mode: PermutationMode) -> Option<&Permutation> {
        self.cols.as_ref().filter(|_| mode.permutes_cols())
    }
}

/// Read a permutation of length `n` from a plain or gzip-compressed file.
pub fn read_permutation(path: &Path, n: usize) -> Result<Permutation, LoadError> {
    log::info!("reading {}", path.display());

    let bytes = read_input(path)?;
    let text = as_text(path, &bytes)?;

    let mut inverse = Vec::with_capacity(n);
    for (line_no, line) in text.lines().enumerate() {
        for token in line.split_whitespace() {
            let index = token.parse::<usize>().map_err(|_| {
                LoadError::parse(path, line_no + 1, format!("invalid index '{token}'"))
            })?;
            inverse.push(index);
        }
    }

    if inverse.len() != n {
        return Err(LoadError::SizeMismatch {
            path: path.to_path_buf(),
            what: "entries",
            expected: n,
            found: inverse.len(),
        });
    }

    Permutation::from_inverse(inverse).map_err(|p| {
        LoadError::parse(
            path,
            0,
            format!("entry {p} is out of range or repeated; not a permutation of 0..{n}"),
        )
    })
}
