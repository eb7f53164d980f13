//! Error types for interpolation.

use mf_core::{IndexKind, MfError};
use thiserror::Error;

pub type InterpResult<T> = Result<T, InterpError>;

/// Errors raised while regridding interval data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpError {
    /// Only interval-indexed tables can be regridded.
    #[error("Only 1D interval indexes can be interpolated, got a {kind} index")]
    UnsupportedIndex { kind: IndexKind },

    #[error("Cannot interpolate a table without rows")]
    EmptyInput,

    /// Interpolating along more than one dimension at once.
    #[error("Interpolation along more than one dimension is not supported (got {dimensions:?})")]
    MultipleDimensions { dimensions: Vec<String> },

    #[error("Dimension {dimension} does not match the table index {index}")]
    UnknownDimension { dimension: String, index: String },

    /// The cumulative input decreases; the data was not a mass distribution.
    #[error("The input data is not monotonic in column {column} at knot {position}")]
    NonMonotonicInput { column: String, position: usize },

    /// The spline produced a decreasing cumulative mass, so mass was not preserved.
    #[error("The interpolation is not monotonic in column {column} at grid point {position}")]
    NonMonotonicOutput { column: String, position: usize },

    #[error("Invalid interpolation grid: {what}")]
    InvalidGrid { what: String },

    #[error("Table error: {0}")]
    Table(#[from] MfError),
}
