//! Mass-preserving regridding of interval data.
//!
//! Composition is converted to mass, cumulated over the intervals in ascending order
//! and fitted with a shape-preserving cubic. Evaluating that cumulative curve at the new
//! edges and differencing gives the mass of every new interval, so the total is kept.

use std::collections::BTreeMap;

use mf_core::composition::{to_composition, to_mass};
use mf_core::{
    Interval, IntervalIndex, MassBasis, RowIndex, Table, Tolerances, first_decrease, round_to,
};

use crate::error::{InterpError, InterpResult};
use crate::grid::{self, Grid};
use crate::pchip::Pchip;

/// Regridding settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MassPreservingInterp {
    pub basis: MassBasis,
    pub tolerances: Tolerances,
    /// Merge the input's own edges into the requested grid.
    pub include_original_edges: bool,
    /// Decimal places applied to input edges and grid before fitting.
    pub precision: Option<u32>,
}

impl Default for MassPreservingInterp {
    fn default() -> Self {
        Self {
            basis: MassBasis::default(),
            tolerances: Tolerances::default(),
            include_original_edges: true,
            precision: None,
        }
    }
}

/// Fail when a cumulative series decreases.
pub fn ensure_cumulative(column: &str, values: &[f64], tol: Tolerances) -> InterpResult<()> {
    match first_decrease(values, tol) {
        Some(i) => Err(InterpError::NonMonotonicInput {
            column: column.to_string(),
            position: i + 1,
        }),
        None => Ok(()),
    }
}

/// Fail when the fitted cumulative curve decreases between grid points.
fn check_fitted(column: &str, fitted: &[f64], tol: Tolerances) -> InterpResult<()> {
    match first_decrease(fitted, tol) {
        Some(i) => Err(InterpError::NonMonotonicOutput {
            column: column.to_string(),
            position: i + 1,
        }),
        None => Ok(()),
    }
}

impl MassPreservingInterp {
    pub fn new(basis: MassBasis) -> Self {
        Self {
            basis,
            ..Self::default()
        }
    }

    pub fn include_original_edges(mut self, include: bool) -> Self {
        self.include_original_edges = include;
        self
    }

    pub fn precision(mut self, decimals: Option<u32>) -> Self {
        self.precision = decimals;
        self
    }

    /// Regrid `table` onto `grid`.
    ///
    /// The output starts at the lowest input edge and keeps the input's closed side and
    /// row order. Grid points past the highest input edge receive no extra mass; a grid
    /// that stops short of it drops the mass beyond its last point.
    pub fn interpolate(&self, table: &Table, grid: impl Into<Grid>) -> InterpResult<Table> {
        let Some(original) = table.index().as_interval() else {
            return Err(InterpError::UnsupportedIndex {
                kind: table.index().kind(),
            });
        };
        if original.is_empty() {
            return Err(InterpError::EmptyInput);
        }

        let (table, index) = match self.precision {
            Some(p) => {
                let intervals = original
                    .intervals()
                    .iter()
                    .map(|i| Interval::new(round_to(i.left, p), round_to(i.right, p)))
                    .collect::<Result<Vec<_>, _>>()?;
                let rounded = IntervalIndex::new(original.name(), original.closed(), intervals)?;
                (
                    table.with_index(RowIndex::Interval(rounded.clone()))?,
                    rounded,
                )
            }
            None => (table.clone(), original.clone()),
        };

        let mut edges = match grid.into() {
            Grid::Edges(e) => e,
            Grid::Factor(k) => grid::upsample_grid(&index, k)?,
        };
        if let Some(p) = self.precision {
            edges = grid::round_edges(&edges, p);
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(InterpError::InvalidGrid {
                what: "grid edges must be finite".to_string(),
            });
        }
        let edges = if self.include_original_edges {
            grid::merge_edges(&edges, &index)
        } else {
            grid::sorted_unique(edges)
        };

        let anchor = index.min_left().ok_or(InterpError::EmptyInput)?;
        let top = index.max_right().ok_or(InterpError::EmptyInput)?;
        let mut out_edges = vec![anchor];
        out_edges.extend(edges.iter().copied().filter(|e| *e > anchor));
        if out_edges.len() < 2 {
            return Err(InterpError::InvalidGrid {
                what: format!("no grid edge lies above the lowest input edge {anchor}"),
            });
        }
        let grid_top = out_edges[out_edges.len() - 1];
        if grid_top < top {
            tracing::warn!(
                grid_top,
                data_top = top,
                "grid stops below the data range; mass above it is dropped"
            );
        }
        let extra: Vec<f64> = out_edges.iter().copied().filter(|e| *e > top).collect();
        if !extra.is_empty() {
            tracing::warn!(
                points = extra.len(),
                data_top = top,
                "grid extends past the data range; extrapolating flat"
            );
        }

        // Cumulative mass at the right edge of every interval, ascending
        let mass = to_mass(&table, &self.basis)?;
        let order = index.ascending_order();
        let mut knots = vec![anchor];
        knots.extend(order.iter().map(|&r| index.intervals()[r].right));
        knots.extend(extra.iter().copied());

        let mut columns: Vec<(String, Vec<f64>)> = Vec::with_capacity(mass.columns().len());
        for col in mass.columns() {
            let mut cum = Vec::with_capacity(knots.len());
            let mut total = 0.0;
            cum.push(total);
            for &r in &order {
                total += col.values[r];
                cum.push(total);
            }
            ensure_cumulative(&col.name, &cum, self.tolerances)?;
            cum.extend(std::iter::repeat_n(total, extra.len()));

            let curve = Pchip::new(&knots, &cum)?;
            let fitted = curve.eval_many(&out_edges);
            check_fitted(&col.name, &fitted, self.tolerances)?;
            let fractions: Vec<f64> = fitted.windows(2).map(|w| w[1] - w[0]).collect();
            columns.push((col.name.clone(), fractions));
        }

        let mut intervals = out_edges
            .windows(2)
            .map(|w| Interval::new(w[0], w[1]))
            .collect::<Result<Vec<_>, _>>()?;
        if index.is_descending() {
            intervals.reverse();
            for (_, values) in &mut columns {
                values.reverse();
            }
        }
        let new_index = IntervalIndex::new(index.name(), index.closed(), intervals)?;
        let regridded = Table::new(RowIndex::Interval(new_index), columns)?;
        tracing::debug!(
            rows_in = table.len(),
            rows_out = regridded.len(),
            dimension = index.name(),
            "regridded interval data"
        );
        Ok(to_composition(&regridded, &self.basis)?)
    }
}

/// Regrid `table` onto `grid` with default tolerances.
pub fn mass_preserving_interp(
    table: &Table,
    grid: impl Into<Grid>,
    include_original_edges: bool,
    precision: Option<u32>,
    basis: &MassBasis,
) -> InterpResult<Table> {
    MassPreservingInterp::new(basis.clone())
        .include_original_edges(include_original_edges)
        .precision(precision)
        .interpolate(table, grid)
}

/// Regrid along a named dimension.
///
/// `coords` maps dimension names to grids. Exactly one dimension is supported and it
/// must be the table's index; an empty map returns the table unchanged.
pub fn interp_along(
    table: &Table,
    coords: &BTreeMap<String, Grid>,
    include_original_edges: bool,
    basis: &MassBasis,
) -> InterpResult<Table> {
    if coords.len() > 1 {
        return Err(InterpError::MultipleDimensions {
            dimensions: coords.keys().cloned().collect(),
        });
    }
    let Some((dimension, grid)) = coords.iter().next() else {
        return Ok(table.clone());
    };
    if dimension != table.index().name() {
        return Err(InterpError::UnknownDimension {
            dimension: dimension.clone(),
            index: table.index().name().to_string(),
        });
    }
    mass_preserving_interp(table, grid.clone(), include_original_edges, None, basis)
}
