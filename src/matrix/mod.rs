//! Sparse matrix data: the compressed-row store, its load-time statistics,
//! permutations and labels.
//!
//! Everything in this module is built once before the interactive loop and
//! read-only afterwards.

pub mod labels;
pub mod permutation;
pub mod store;
pub mod triplets;

pub use labels::Labels;
pub use permutation::{
    AxisOrder, IdentityOrder, MatrixPermutations, Permutation, PermutationMode,
};
pub use store::{
    load_matrix, AssemblyReport, LoadedMatrix, MatrixStats, NormalizationVectors, SparseMatrix,
};
pub use triplets::Triplet;
