//! Labelled, column-oriented tables.
//!
//! A [`Table`] is the payload carried by every stream: a row index (plain labels or
//! size-fraction intervals) plus any number of named `f64` columns of equal length.

use crate::{MfError, MfResult};
use std::fmt;

/// Side on which the intervals of an [`IntervalIndex`] are closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Closed {
    #[default]
    Left,
    Right,
}

/// A half-open interval between two finite edges (`left < right`).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "serde_repr::IntervalRepr"))]
pub struct Interval {
    pub left: f64,
    pub right: f64,
}

impl Interval {
    pub fn new(left: f64, right: f64) -> MfResult<Self> {
        crate::ensure_finite(left, "interval left edge")?;
        crate::ensure_finite(right, "interval right edge")?;
        if left >= right {
            return Err(MfError::InvalidArg {
                what: "interval left edge must be below its right edge",
            });
        }
        Ok(Self { left, right })
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn mid(&self) -> f64 {
        0.5 * (self.left + self.right)
    }

    pub fn contains(&self, x: f64, closed: Closed) -> bool {
        match closed {
            Closed::Left => self.left <= x && x < self.right,
            Closed::Right => self.left < x && x <= self.right,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.left, self.right)
    }
}

/// An ordered set of non-overlapping intervals along one named dimension.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "serde_repr::IntervalIndexRepr"))]
pub struct IntervalIndex {
    name: String,
    closed: Closed,
    intervals: Vec<Interval>,
}

impl IntervalIndex {
    /// Build an index, rejecting intervals that overlap once sorted.
    pub fn new(
        name: impl Into<String>,
        closed: Closed,
        intervals: Vec<Interval>,
    ) -> MfResult<Self> {
        let mut sorted = intervals.clone();
        sorted.sort_by(|a, b| a.left.total_cmp(&b.left));
        for w in sorted.windows(2) {
            if w[1].left < w[0].right {
                return Err(MfError::InvalidArg {
                    what: "interval index entries overlap",
                });
            }
        }
        Ok(Self {
            name: name.into(),
            closed,
            intervals,
        })
    }

    /// Build from parallel arrays of left and right edges.
    pub fn from_arrays(
        name: impl Into<String>,
        closed: Closed,
        lefts: &[f64],
        rights: &[f64],
    ) -> MfResult<Self> {
        if lefts.len() != rights.len() {
            return Err(MfError::InvalidArg {
                what: "left and right edge arrays differ in length",
            });
        }
        let intervals = lefts
            .iter()
            .zip(rights)
            .map(|(&l, &r)| Interval::new(l, r))
            .collect::<MfResult<Vec<_>>>()?;
        Self::new(name, closed, intervals)
    }

    /// Build contiguous intervals between consecutive edges (ascending order).
    pub fn from_edges(name: impl Into<String>, closed: Closed, edges: &[f64]) -> MfResult<Self> {
        let intervals = edges
            .windows(2)
            .map(|w| Interval::new(w[0], w[1]))
            .collect::<MfResult<Vec<_>>>()?;
        Self::new(name, closed, intervals)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn closed(&self) -> Closed {
        self.closed
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn lefts(&self) -> Vec<f64> {
        self.intervals.iter().map(|i| i.left).collect()
    }

    pub fn rights(&self) -> Vec<f64> {
        self.intervals.iter().map(|i| i.right).collect()
    }

    pub fn min_left(&self) -> Option<f64> {
        self.intervals.iter().map(|i| i.left).reduce(f64::min)
    }

    pub fn max_right(&self) -> Option<f64> {
        self.intervals.iter().map(|i| i.right).reduce(f64::max)
    }

    /// True when entries run from coarse to fine (the usual size-fraction layout).
    pub fn is_descending(&self) -> bool {
        self.intervals.len() > 1
            && self.intervals.windows(2).all(|w| w[0].left > w[1].left)
    }

    /// Row positions ordered by ascending left edge.
    pub fn ascending_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.intervals.len()).collect();
        order.sort_by(|&a, &b| self.intervals[a].left.total_cmp(&self.intervals[b].left));
        order
    }

    /// All distinct edges, sorted ascending.
    pub fn edges(&self) -> Vec<f64> {
        let mut edges: Vec<f64> = self
            .intervals
            .iter()
            .flat_map(|i| [i.left, i.right])
            .collect();
        edges.sort_by(f64::total_cmp);
        edges.dedup();
        edges
    }

    fn with_intervals(&self, intervals: Vec<Interval>) -> Self {
        Self {
            name: self.name.clone(),
            closed: self.closed,
            intervals,
        }
    }
}

/// Kind of row index, used when checking that tables can be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Positional,
    Named,
    Interval,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IndexKind::Positional => "positional",
            IndexKind::Named => "named",
            IndexKind::Interval => "interval",
        };
        f.write_str(s)
    }
}

/// A single entry of a row index.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Coord {
    Label(i64),
    Name(String),
    Interval(Interval),
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coord::Label(l) => write!(f, "{l}"),
            Coord::Name(n) => f.write_str(n),
            Coord::Interval(i) => write!(f, "{i}"),
        }
    }
}

/// Row index of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RowIndex {
    Positional { name: String, labels: Vec<i64> },
    Named { name: String, labels: Vec<String> },
    Interval(IntervalIndex),
}

impl RowIndex {
    /// Plain `0..len` labels.
    pub fn range(name: impl Into<String>, len: usize) -> Self {
        RowIndex::Positional {
            name: name.into(),
            labels: (0..len as i64).collect(),
        }
    }

    pub fn named(name: impl Into<String>, labels: Vec<String>) -> Self {
        RowIndex::Named {
            name: name.into(),
            labels,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RowIndex::Positional { name, .. } | RowIndex::Named { name, .. } => name,
            RowIndex::Interval(idx) => idx.name(),
        }
    }

    pub fn kind(&self) -> IndexKind {
        match self {
            RowIndex::Positional { .. } => IndexKind::Positional,
            RowIndex::Named { .. } => IndexKind::Named,
            RowIndex::Interval(_) => IndexKind::Interval,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RowIndex::Positional { labels, .. } => labels.len(),
            RowIndex::Named { labels, .. } => labels.len(),
            RowIndex::Interval(idx) => idx.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_interval(&self) -> Option<&IntervalIndex> {
        match self {
            RowIndex::Interval(idx) => Some(idx),
            _ => None,
        }
    }

    /// Entry at row `i`.
    pub fn coord(&self, i: usize) -> Option<Coord> {
        match self {
            RowIndex::Positional { labels, .. } => labels.get(i).map(|l| Coord::Label(*l)),
            RowIndex::Named { labels, .. } => labels.get(i).map(|n| Coord::Name(n.clone())),
            RowIndex::Interval(idx) => idx.intervals.get(i).map(|iv| Coord::Interval(*iv)),
        }
    }

    pub fn coords(&self) -> Vec<Coord> {
        match self {
            RowIndex::Positional { labels, .. } => {
                labels.iter().map(|l| Coord::Label(*l)).collect()
            }
            RowIndex::Named { labels, .. } => labels.iter().cloned().map(Coord::Name).collect(),
            RowIndex::Interval(idx) => idx.intervals.iter().map(|i| Coord::Interval(*i)).collect(),
        }
    }

    /// Row position holding `coord`, if any.
    pub fn position(&self, coord: &Coord) -> Option<usize> {
        match (self, coord) {
            (RowIndex::Positional { labels, .. }, Coord::Label(l)) => {
                labels.iter().position(|x| x == l)
            }
            (RowIndex::Named { labels, .. }, Coord::Name(n)) => labels.iter().position(|x| x == n),
            (RowIndex::Interval(idx), Coord::Interval(i)) => {
                idx.intervals.iter().position(|x| x == i)
            }
            _ => None,
        }
    }

    /// Index restricted to the given row positions, in that order.
    pub fn select(&self, rows: &[usize]) -> MfResult<RowIndex> {
        check_rows(rows, self.len())?;
        Ok(self.take(rows))
    }

    fn take(&self, rows: &[usize]) -> RowIndex {
        match self {
            RowIndex::Positional { name, labels } => RowIndex::Positional {
                name: name.clone(),
                labels: rows.iter().map(|&r| labels[r]).collect(),
            },
            RowIndex::Named { name, labels } => RowIndex::Named {
                name: name.clone(),
                labels: rows.iter().map(|&r| labels[r].clone()).collect(),
            },
            RowIndex::Interval(idx) => {
                let intervals = rows.iter().map(|&r| idx.intervals[r]).collect();
                RowIndex::Interval(idx.with_intervals(intervals))
            }
        }
    }
}

fn check_rows(rows: &[usize], len: usize) -> MfResult<()> {
    match rows.iter().find(|&&r| r >= len) {
        Some(r) => Err(MfError::IndexMismatch {
            what: format!("row {r} is out of range for {len} rows"),
        }),
        None => Ok(()),
    }
}

/// A named column of values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Row index plus named numeric columns of equal length.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "serde_repr::TableRepr"))]
pub struct Table {
    index: RowIndex,
    columns: Vec<Column>,
}

impl Table {
    /// Create a table, validating column lengths and name uniqueness.
    pub fn new<S>(index: RowIndex, columns: Vec<(S, Vec<f64>)>) -> MfResult<Self>
    where
        S: Into<String>,
    {
        let expected = index.len();
        let mut out: Vec<Column> = Vec::with_capacity(columns.len());
        for (name, values) in columns {
            let name = name.into();
            if values.len() != expected {
                return Err(MfError::LengthMismatch {
                    column: name,
                    len: values.len(),
                    expected,
                });
            }
            if out.iter().any(|c| c.name == name) {
                return Err(MfError::InvalidArg {
                    what: "duplicate column name",
                });
            }
            out.push(Column { name, values });
        }
        Ok(Self {
            index,
            columns: out,
        })
    }

    /// A table with the given columns and no rows.
    pub fn empty(columns: &[&str]) -> Self {
        Self {
            index: RowIndex::range("index", 0),
            columns: columns
                .iter()
                .map(|c| Column {
                    name: c.to_string(),
                    values: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Like [`Table::column`] but missing columns are an error.
    pub fn require(&self, name: &str) -> MfResult<&[f64]> {
        self.column(name).ok_or_else(|| MfError::MissingColumn {
            column: name.to_string(),
        })
    }

    /// Replace the values of an existing column, or append a new one.
    pub fn set_column(&mut self, name: &str, values: Vec<f64>) -> MfResult<()> {
        if values.len() != self.len() {
            return Err(MfError::LengthMismatch {
                column: name.to_string(),
                len: values.len(),
                expected: self.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(col) => col.values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    /// Same columns over a different index of the same length.
    pub fn with_index(&self, index: RowIndex) -> MfResult<Self> {
        if index.len() != self.len() {
            return Err(MfError::IndexMismatch {
                what: format!("new index has {} rows, table has {}", index.len(), self.len()),
            });
        }
        Ok(Self {
            index,
            columns: self.columns.clone(),
        })
    }

    /// Rows at the given positions, in that order.
    pub fn select_rows(&self, rows: &[usize]) -> MfResult<Self> {
        check_rows(rows, self.len())?;
        Ok(self.take_rows(rows))
    }

    fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            index: self.index.take(rows),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: rows.iter().map(|&r| c.values[r]).collect(),
                })
                .collect(),
        }
    }

    /// Rows whose index entry satisfies `pred`.
    pub fn filter_index<F>(&self, mut pred: F) -> Self
    where
        F: FnMut(&Coord) -> bool,
    {
        let rows: Vec<usize> = self
            .index
            .coords()
            .iter()
            .enumerate()
            .filter(|(_, c)| pred(c))
            .map(|(i, _)| i)
            .collect();
        self.take_rows(&rows)
    }

    /// Rows whose index entry is one of `coords`, in this table's order.
    pub fn retain_coords(&self, coords: &[Coord]) -> Self {
        self.filter_index(|c| coords.contains(c))
    }

    /// Values of row `i`, in column order.
    pub fn row(&self, i: usize) -> Option<Vec<f64>> {
        if i >= self.len() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[i]).collect())
    }

    /// Column totals, in column order.
    pub fn column_sums(&self) -> Vec<(String, f64)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.values.iter().sum()))
            .collect()
    }

    /// Reorder/extend rows to match `index`; rows absent from `self` are set to `fill`.
    ///
    /// Entries of `self` missing from `index` are an error.
    pub fn reindex(&self, index: RowIndex, fill: f64) -> MfResult<Self> {
        let coords = self.index.coords();
        for c in &coords {
            if index.position(c).is_none() {
                return Err(MfError::IndexMismatch {
                    what: format!("row {c} is not present in the target index"),
                });
            }
        }
        let mapping: Vec<Option<usize>> = index
            .coords()
            .iter()
            .map(|c| self.index.position(c))
            .collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: mapping
                    .iter()
                    .map(|m| m.map_or(fill, |r| c.values[r]))
                    .collect(),
            })
            .collect();
        Ok(Self { index, columns })
    }
}

/// Unchecked shapes that deserialize into the validated types.
#[cfg(feature = "serde")]
mod serde_repr {
    use super::{Closed, Column, Interval, IntervalIndex, RowIndex, Table};
    use crate::MfError;

    #[derive(serde::Deserialize)]
    pub(super) struct IntervalRepr {
        left: f64,
        right: f64,
    }

    impl TryFrom<IntervalRepr> for Interval {
        type Error = MfError;

        fn try_from(raw: IntervalRepr) -> Result<Self, Self::Error> {
            Interval::new(raw.left, raw.right)
        }
    }

    #[derive(serde::Deserialize)]
    pub(super) struct IntervalIndexRepr {
        name: String,
        closed: Closed,
        intervals: Vec<Interval>,
    }

    impl TryFrom<IntervalIndexRepr> for IntervalIndex {
        type Error = MfError;

        fn try_from(raw: IntervalIndexRepr) -> Result<Self, Self::Error> {
            IntervalIndex::new(raw.name, raw.closed, raw.intervals)
        }
    }

    #[derive(serde::Deserialize)]
    pub(super) struct TableRepr {
        index: RowIndex,
        columns: Vec<Column>,
    }

    impl TryFrom<TableRepr> for Table {
        type Error = MfError;

        fn try_from(raw: TableRepr) -> Result<Self, Self::Error> {
            let columns = raw.columns.into_iter().map(|c| (c.name, c.values)).collect();
            Table::new(raw.index, columns)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized() -> Table {
        let index = IntervalIndex::from_arrays(
            "size",
            Closed::Left,
            &[1.0, 0.5, 0.0],
            &[2.0, 1.0, 0.5],
        )
        .unwrap();
        Table::new(
            RowIndex::Interval(index),
            vec![("mass_dry", vec![1.0, 2.0, 3.0]), ("Fe", vec![50.0, 55.0, 60.0])],
        )
        .unwrap()
    }

    #[test]
    fn interval_rejects_inverted_edges() {
        assert!(Interval::new(1.0, 0.5).is_err());
        assert!(Interval::new(0.5, 0.5).is_err());
        assert!(Interval::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn interval_index_rejects_overlap() {
        let res = IntervalIndex::from_arrays("size", Closed::Left, &[0.0, 0.5], &[1.0, 2.0]);
        assert!(res.is_err());
    }

    #[test]
    fn interval_index_edges_and_order() {
        let t = sized();
        let idx = t.index().as_interval().unwrap();
        assert!(idx.is_descending());
        assert_eq!(idx.edges(), vec![0.0, 0.5, 1.0, 2.0]);
        assert_eq!(idx.ascending_order(), vec![2, 1, 0]);
        assert_eq!(idx.min_left(), Some(0.0));
        assert_eq!(idx.max_right(), Some(2.0));
    }

    #[test]
    fn table_rejects_bad_lengths() {
        let err = Table::new(RowIndex::range("index", 2), vec![("a", vec![1.0])]).unwrap_err();
        assert!(matches!(err, MfError::LengthMismatch { .. }));

        let err = Table::new(
            RowIndex::range("index", 1),
            vec![("a", vec![1.0]), ("a", vec![2.0])],
        )
        .unwrap_err();
        assert!(matches!(err, MfError::InvalidArg { .. }));
    }

    #[test]
    fn filter_and_retain() {
        let t = sized();
        let coarse = t.filter_index(|c| matches!(c, Coord::Interval(i) if i.left >= 0.5));
        assert_eq!(coarse.len(), 2);
        assert_eq!(coarse.column("mass_dry").unwrap(), &[1.0, 2.0]);

        let kept = t.retain_coords(&coarse.index().coords());
        assert_eq!(kept, coarse);
    }

    #[test]
    fn reindex_fills_missing_rows() {
        let t = sized().select_rows(&[1, 2]).unwrap();
        let full = sized().index().clone();
        let filled = t.reindex(full, 0.0).unwrap();
        assert_eq!(filled.column("mass_dry").unwrap(), &[0.0, 2.0, 3.0]);
        assert_eq!(filled.column("Fe").unwrap(), &[0.0, 55.0, 60.0]);
    }

    #[test]
    fn out_of_range_rows_are_reported() {
        let t = sized();
        assert_eq!(t.index().coord(2), Some(Coord::Interval(Interval { left: 0.0, right: 0.5 })));
        assert_eq!(t.index().coord(3), None);
        assert_eq!(t.row(0), Some(vec![1.0, 50.0]));
        assert_eq!(t.row(3), None);
        assert!(matches!(
            t.select_rows(&[0, 7]),
            Err(MfError::IndexMismatch { .. })
        ));
        assert!(t.index().select(&[4]).is_err());
    }

    #[test]
    fn set_column_appends_and_replaces() {
        let mut t = sized();
        t.set_column("Fe", vec![1.0, 1.0, 1.0]).unwrap();
        t.set_column("SiO2", vec![2.0, 2.0, 2.0]).unwrap();
        assert_eq!(t.column_names(), vec!["mass_dry", "Fe", "SiO2"]);
        assert!(t.set_column("x", vec![1.0]).is_err());
        assert!(matches!(t.require("nope"), Err(MfError::MissingColumn { .. })));
    }
}
