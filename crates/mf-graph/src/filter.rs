//! Row filters applied along a named index dimension.

use std::collections::BTreeSet;
use std::fmt;

use mf_core::Coord;

use crate::error::{GraphError, GraphResult};

type Predicate = Box<dyn Fn(&Coord) -> bool + Send + Sync>;

/// A predicate over the index entries of one dimension.
pub struct DimensionFilter {
    dimension: String,
    predicate: Predicate,
}

impl fmt::Debug for DimensionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DimensionFilter")
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl DimensionFilter {
    pub fn new<F>(dimension: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Coord) -> bool + Send + Sync + 'static,
    {
        Self {
            dimension: dimension.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Keep interval rows lying entirely within `[lo, hi]`.
    pub fn interval_within(dimension: impl Into<String>, lo: f64, hi: f64) -> Self {
        Self::new(dimension, move |c| {
            matches!(c, Coord::Interval(i) if i.left >= lo && i.right <= hi)
        })
    }

    /// Keep rows whose integer label is one of `labels`.
    pub fn labels_in(dimension: impl Into<String>, labels: Vec<i64>) -> Self {
        Self::new(dimension, move |c| {
            matches!(c, Coord::Label(l) if labels.contains(l))
        })
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn matches(&self, coord: &Coord) -> bool {
        (self.predicate)(coord)
    }
}

/// The one dimension a set of filters applies to.
///
/// `None` for an empty set; more than one distinct dimension is unsupported.
pub(crate) fn single_dimension(filters: &[DimensionFilter]) -> GraphResult<Option<&str>> {
    let dims: BTreeSet<&str> = filters.iter().map(|f| f.dimension()).collect();
    match dims.len() {
        0 => Ok(None),
        1 => Ok(dims.into_iter().next()),
        _ => Err(GraphError::UnsupportedDimension {
            dimensions: dims.into_iter().map(str::to_string).collect(),
        }),
    }
}
