//! Compressed-row sparse matrix store and its load-time statistics.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;

use super::triplets::{read_triplets, Triplet};
use crate::error::LoadError;
use crate::util::format::format_count;

// =============================================================================
// Sparse Matrix
// =============================================================================

/// Immutable compressed-row matrix.
///
/// Within each row the column indices are strictly increasing; duplicate
/// input positions have already been summed and zeros dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix {
    nrows: usize,
    ncols: usize,
    row_start: Vec<usize>,
    col_index: Vec<u32>,
    values: Vec<f64>,
}

/// Counters produced while packing triplets into compressed rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    /// Entries handed to the assembler (after symmetrization).
    pub input_entries: usize,
    /// Entries folded into an earlier entry at the same position.
    pub merged_duplicates: usize,
    /// Entries dropped because their merged value was exactly zero.
    pub dropped_zeros: usize,
}

impl SparseMatrix {
    /// Assemble compressed rows from unordered triplets.
    ///
    /// With `symmetrize`, the transpose of every entry is added first so the
    /// result holds `A + A^T` on a square `max(nrows, ncols)` shape.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        mut entries: Vec<Triplet>,
        symmetrize: bool,
    ) -> (Self, AssemblyReport) {
        let (nrows, ncols) = if symmetrize {
            let transposed: Vec<Triplet> = entries
                .iter()
                .map(|t| Triplet {
                    row: t.col,
                    col: t.row,
                    value: t.value,
                })
                .collect();
            entries.extend(transposed);
            let n = nrows.max(ncols);
            (n, n)
        } else {
            (nrows, ncols)
        };

        let mut report = AssemblyReport {
            input_entries: entries.len(),
            ..AssemblyReport::default()
        };

        // Stable so that duplicate sums are accumulated in file order.
        entries.par_sort_by_key(|t| (t.row, t.col));

        let mut packed: Vec<Triplet> = Vec::with_capacity(entries.len());
        for t in entries {
            match packed.last_mut() {
                Some(last) if last.row == t.row && last.col == t.col => {
                    last.value += t.value;
                    report.merged_duplicates += 1;
                }
                _ => packed.push(t),
            }
        }

        let before = packed.len();
        packed.retain(|t| t.value != 0.0);
        report.dropped_zeros = before - packed.len();

        let mut row_start = vec![0usize; nrows + 1];
        for t in &packed {
            row_start[t.row as usize + 1] += 1;
        }
        for r in 0..nrows {
            row_start[r + 1] += row_start[r];
        }

        let col_index = packed.iter().map(|t| t.col).collect();
        let values = packed.iter().map(|t| t.value).collect();

        let matrix = Self {
            nrows,
            ncols,
            row_start,
            col_index,
            values,
        };
        (matrix, report)
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Row offsets, `nrows + 1` long.
    pub fn row_start(&self) -> &[usize] {
        &self.row_start
    }

    pub fn col_index(&self) -> &[u32] {
        &self.col_index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Column indices and values of row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> (&[u32], &[f64]) {
        let range = self.row_start[i]..self.row_start[i + 1];
        (&self.col_index[range.clone()], &self.values[range])
    }

    /// Number of stored entries in row `i`.
    #[inline]
    pub fn degree(&self, i: usize) -> usize {
        self.row_start[i + 1] - self.row_start[i]
    }

    /// Stored value at `(row, col)`, or 0 when absent or out of bounds.
    ///
    /// Used for the cursor readout only; the render path walks rows directly.
    pub fn value_at(&self, row: usize, col: usize) -> f64 {
        if row >= self.nrows || col >= self.ncols {
            return 0.0;
        }
        let (cols, vals) = self.row(row);
        match cols.binary_search(&(col as u32)) {
            Ok(k) => vals[k],
            Err(_) => 0.0,
        }
    }
}

// =============================================================================
// Statistics and Normalization Vectors
// =============================================================================

/// Value and degree extrema, computed once at load.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatrixStats {
    pub min_val: f64,
    pub max_val: f64,
    pub min_degree: usize,
    pub max_degree: usize,
}

/// Reciprocal Euclidean norms of every row and column (0 for empty ones).
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizationVectors {
    pub row_norm: Vec<f64>,
    pub col_norm: Vec<f64>,
}

#[inline]
fn reciprocal_norm(sum_sq: f64) -> f64 {
    if sum_sq > 0.0 {
        1.0 / sum_sq.sqrt()
    } else {
        0.0
    }
}

/// Scan every entry once, gathering extrema and squared norms.
pub fn compute_stats(matrix: &SparseMatrix) -> (MatrixStats, NormalizationVectors) {
    let mut stats = MatrixStats {
        min_val: f64::INFINITY,
        max_val: f64::NEG_INFINITY,
        min_degree: usize::MAX,
        max_degree: 0,
    };
    let mut row_norm = vec![0.0; matrix.nrows()];
    let mut col_norm = vec![0.0; matrix.ncols()];

    for (r, row_sq) in row_norm.iter_mut().enumerate() {
        let degree = matrix.degree(r);
        stats.min_degree = stats.min_degree.min(degree);
        stats.max_degree = stats.max_degree.max(degree);

        let (cols, vals) = matrix.row(r);
        for (&c, &v) in cols.iter().zip(vals) {
            stats.min_val = stats.min_val.min(v);
            stats.max_val = stats.max_val.max(v);
            *row_sq += v * v;
            col_norm[c as usize] += v * v;
        }
    }

    if matrix.nrows() == 0 {
        stats.min_degree = 0;
    }
    if matrix.nnz() == 0 {
        stats.min_val = 0.0;
        stats.max_val = 0.0;
    }

    for x in row_norm.iter_mut().chain(col_norm.iter_mut()) {
        *x = reciprocal_norm(*x);
    }

    (stats, NormalizationVectors { row_norm, col_norm })
}

// =============================================================================
// Loading
// =============================================================================

/// A matrix together with everything derived from it at load time.
#[derive(Clone, Debug)]
pub struct LoadedMatrix {
    pub matrix: SparseMatrix,
    pub stats: MatrixStats,
    pub norms: NormalizationVectors,
}

impl LoadedMatrix {
    /// Wrap an assembled matrix, computing its statistics.
    pub fn new(matrix: SparseMatrix) -> Self {
        let (stats, norms) = compute_stats(&matrix);
        Self {
            matrix,
            stats,
            norms,
        }
    }
}

/// Load a triplet file into compressed-row form.
pub fn load_matrix(path: &Path, symmetrize: bool) -> Result<LoadedMatrix, LoadError> {
    log::info!("loading {}...", path.display());

    let t0 = Instant::now();
    let triplets = read_triplets(path)?;
    log::info!(
        "read {} entries in {:.2?}",
        format_count(triplets.entries.len()),
        t0.elapsed()
    );

    let t0 = Instant::now();
    let (matrix, report) =
        SparseMatrix::from_triplets(triplets.nrows, triplets.ncols, triplets.entries, symmetrize);
    if symmetrize {
        log::info!("symmetrized matrix");
    }
    log::info!(
        "packed matrix in {:.2?}: removed {} nzs ({} duplicates, {} zeros)",
        t0.elapsed(),
        format_count(report.merged_duplicates + report.dropped_zeros),
        format_count(report.merged_duplicates),
        format_count(report.dropped_zeros)
    );

    let loaded = LoadedMatrix::new(matrix);
    log::info!(
        "matrix {}: {} rows, {} columns, {} nonzeros",
        path.display(),
        format_count(loaded.matrix.nrows()),
        format_count(loaded.matrix.ncols()),
        format_count(loaded.matrix.nnz())
    );
    log::debug!(
        "values in [{}, {}], row degrees in [{}, {}]",
        loaded.stats.min_val,
        loaded.stats.max_val,
        loaded.stats.min_degree,
        loaded.stats.max_degree
    );

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn t(row: u32, col: u32, value: f64) -> Triplet {
        Triplet { row, col, value }
    }

    fn write_smat(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    fn assert_compressed_row_invariants(m: &SparseMatrix) {
        let rs = m.row_start();
        assert_eq!(rs.len(), m.nrows() + 1);
        assert_eq!(rs[0], 0);
        assert_eq!(rs[m.nrows()], m.nnz());
        assert!(rs.windows(2).all(|w| w[0] <= w[1]));
        for r in 0..m.nrows() {
            let (cols, _) = m.row(r);
            assert!(cols.windows(2).all(|w| w[0] < w[1]), "row {r} not strictly sorted");
            assert!(cols.iter().all(|&c| (c as usize) < m.ncols()));
        }
    }

    #[test]
    fn test_assembly_sorts_and_merges() {
        let entries = vec![t(2, 1, 1.0), t(0, 2, 2.0), t(0, 0, 3.0), t(2, 1, 4.0), t(1, 1, 0.0)];
        let (m, report) = SparseMatrix::from_triplets(3, 3, entries, false);

        assert_compressed_row_invariants(&m);
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.row_start(), &[0, 2, 2, 3]);
        assert_eq!(m.col_index(), &[0, 2, 1]);
        assert_eq!(m.values(), &[3.0, 2.0, 5.0]);
        assert_eq!(report.merged_duplicates, 1);
        assert_eq!(report.dropped_zeros, 1);
    }

    #[test]
    fn test_cancelling_duplicates_are_dropped() {
        let (m, report) = SparseMatrix::from_triplets(2, 2, vec![t(0, 1, 2.0), t(0, 1, -2.0)], false);
        assert_eq!(m.nnz(), 0);
        assert_eq!(report.dropped_zeros, 1);
        assert_compressed_row_invariants(&m);
    }

    #[test]
    fn test_symmetrize_property() {
        let entries = vec![t(0, 1, 1.0), t(1, 0, 2.0), t(2, 3, 5.0), t(1, 1, 0.5)];
        let (m, _) = SparseMatrix::from_triplets(3, 4, entries, true);

        assert_eq!(m.nrows(), 4);
        assert_eq!(m.ncols(), 4);
        assert_compressed_row_invariants(&m);

        for i in 0..m.nrows() {
            let (cols, vals) = m.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                assert_eq!(m.value_at(j as usize, i), v, "({i}, {j}) has no mirror");
            }
        }
        // Union sums both directions rather than overwriting.
        assert_eq!(m.value_at(0, 1), 3.0);
        assert_eq!(m.value_at(1, 0), 3.0);
        assert_eq!(m.value_at(3, 2), 5.0);
        assert_eq!(m.value_at(1, 1), 1.0);
    }

    #[test]
    fn test_value_at() {
        let (m, _) = SparseMatrix::from_triplets(3, 3, vec![t(1, 2, 7.5), t(0, 0, -1.0)], false);
        assert_eq!(m.value_at(1, 2), 7.5);
        assert_eq!(m.value_at(0, 0), -1.0);
        assert_eq!(m.value_at(1, 1), 0.0);
        assert_eq!(m.value_at(2, 0), 0.0);
        assert_eq!(m.value_at(3, 0), 0.0);
        assert_eq!(m.value_at(0, 99), 0.0);
    }

    #[test]
    fn test_stats_and_norms() {
        let entries = vec![t(0, 0, 3.0), t(0, 1, 4.0), t(2, 1, -2.0)];
        let (m, _) = SparseMatrix::from_triplets(3, 3, entries, false);
        let loaded = LoadedMatrix::new(m);

        assert_eq!(loaded.stats.min_val, -2.0);
        assert_eq!(loaded.stats.max_val, 4.0);
        assert_eq!(loaded.stats.min_degree, 0);
        assert_eq!(loaded.stats.max_degree, 2);

        let norms = &loaded.norms;
        assert!((norms.row_norm[0] - 0.2).abs() < 1e-12);
        assert_eq!(norms.row_norm[1], 0.0);
        assert!((norms.row_norm[2] - 0.5).abs() < 1e-12);
        assert!((norms.col_norm[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((norms.col_norm[1] - 1.0 / 20f64.sqrt()).abs() < 1e-12);
        assert_eq!(norms.col_norm[2], 0.0);
    }

    #[test]
    fn test_empty_matrix_stats() {
        let (m, _) = SparseMatrix::from_triplets(2, 2, Vec::new(), false);
        let loaded = LoadedMatrix::new(m);
        assert_eq!(loaded.stats.min_val, 0.0);
        assert_eq!(loaded.stats.max_val, 0.0);
        assert_eq!(loaded.stats.min_degree, 0);
    }

    #[test]
    fn test_load_is_idempotent() {
        let file = write_smat("4 4 5\n3 0 1\n0 3 2\n1 1 3\n0 3 4\n2 2 -1\n");
        let a = load_matrix(file.path(), false).unwrap();
        let b = load_matrix(file.path(), false).unwrap();
        assert_eq!(a.matrix, b.matrix);
        assert_eq!(a.norms, b.norms);
        assert_eq!(a.matrix.value_at(0, 3), 6.0);
        assert_compressed_row_invariants(&a.matrix);
    }

    #[test]
    fn test_load_errors() {
        let err = load_matrix(Path::new("/nonexistent/spyglass.smat"), false).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));

        let file = write_smat("2 2 1\n0 0 abc\n");
        let err = load_matrix(file.path(), false).unwrap_err();
        assert!(matches!(err, LoadError::ParseError { line: 2, .. }));
    }
}
