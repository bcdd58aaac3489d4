//! Row and column labels for the cursor readout.

use std::path::Path;

use super::triplets::read_input;
use crate::error::LoadError;

/// Optional per-axis label lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Labels {
    rows: Vec<String>,
    cols: Vec<String>,
}

impl Labels {
    pub fn new(rows: Vec<String>, cols: Vec<String>) -> Self {
        Self { rows, cols }
    }

    /// Load either or both label files for an `nrows x ncols` matrix.
    pub fn load(
        row_file: Option<&Path>,
        col_file: Option<&Path>,
        nrows: usize,
        ncols: usize,
    ) -> Result<Self, LoadError> {
        let rows = match row_file {
            Some(path) => read_labels(path, nrows)?,
            None => Vec::new(),
        };
        let cols = match col_file {
            Some(path) => read_labels(path, ncols)?,
            None => Vec::new(),
        };
        Ok(Self { rows, cols })
    }

    /// Label of storage row `i`, or `""`.
    pub fn row_label(&self, i: usize) -> &str {
        self.rows.get(i).map_or("", String::as_str)
    }

    /// Label of storage column `j`, or `""`.
    pub fn column_label(&self, j: usize) -> &str {
        self.cols.get(j).map_or("", String::as_str)
    }
}

/// Read exactly `n` newline-separated labels.
pub fn read_labels(path: &Path, n: usize) -> Result<Vec<String>, LoadError> {
    log::info!("reading {}", path.display());

    let bytes = read_input(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let labels: Vec<String> = text
        .lines()
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect();

    if labels.len() != n {
        return Err(LoadError::SizeMismatch {
            path: path.to_path_buf(),
            what: "labels",
            expected: n,
            found: labels.len(),
        });
    }
    Ok(labels)
}
