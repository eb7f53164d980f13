//! Target grids for regridding.

use mf_core::{IntervalIndex, round_to};

use crate::error::{InterpError, InterpResult};

/// Requested output boundaries.
#[derive(Debug, Clone, PartialEq)]
pub enum Grid {
    /// Explicit edge values, in any order.
    Edges(Vec<f64>),
    /// Split every input interval into this many equal parts.
    Factor(usize),
}

impl From<Vec<f64>> for Grid {
    fn from(edges: Vec<f64>) -> Self {
        Grid::Edges(edges)
    }
}

impl From<&[f64]> for Grid {
    fn from(edges: &[f64]) -> Self {
        Grid::Edges(edges.to_vec())
    }
}

impl From<usize> for Grid {
    fn from(factor: usize) -> Self {
        Grid::Factor(factor)
    }
}

/// Sort ascending and drop exact duplicates.
pub(crate) fn sorted_unique(mut edges: Vec<f64>) -> Vec<f64> {
    edges.sort_by(f64::total_cmp);
    edges.dedup();
    edges
}

/// Edges splitting every interval of `index` into `factor` equal parts.
pub fn upsample_grid(index: &IntervalIndex, factor: usize) -> InterpResult<Vec<f64>> {
    if factor == 0 {
        return Err(InterpError::InvalidGrid {
            what: "upsampling factor must be at least 1".to_string(),
        });
    }
    let Some(lowest) = index.min_left() else {
        return Err(InterpError::EmptyInput);
    };

    let mut edges = vec![lowest];
    for interval in index.intervals() {
        let step = interval.width() / factor as f64;
        edges.extend((1..factor).map(|i| interval.left + i as f64 * step));
        edges.push(interval.right);
    }
    Ok(sorted_unique(edges))
}

/// `grid` plus every edge of `index`, sorted and deduplicated.
pub fn merge_edges(grid: &[f64], index: &IntervalIndex) -> Vec<f64> {
    let mut edges = grid.to_vec();
    edges.extend(index.edges());
    sorted_unique(edges)
}

pub(crate) fn round_edges(edges: &[f64], decimals: u32) -> Vec<f64> {
    edges.iter().map(|&e| round_to(e, decimals)).collect()
}
