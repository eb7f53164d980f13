//! mf-interp: mass-preserving regridding of interval-indexed composition data.
//!
//! Provides:
//! - A shape-preserving cubic (PCHIP) through cumulative mass
//! - Grid construction (explicit edges, upsampling factors, merging original edges)
//! - `mass_preserving_interp` and the dimension-keyed `interp_along`
//!
//! # Example
//!
//! ```
//! use mf_core::{Closed, IntervalIndex, MassBasis, RowIndex, Table};
//! use mf_interp::mass_preserving_interp;
//!
//! let index = IntervalIndex::from_edges("size", Closed::Right, &[0.0, 1.0, 2.0]).unwrap();
//! let table = Table::new(
//!     RowIndex::Interval(index),
//!     vec![("mass_wet", vec![10.0, 20.0]), ("mass_dry", vec![10.0, 20.0])],
//! )
//! .unwrap();
//!
//! let fine = mass_preserving_interp(&table, 4usize, true, None, &MassBasis::default()).unwrap();
//! let total: f64 = fine.column("mass_dry").unwrap().iter().sum();
//! assert_eq!(fine.len(), 8);
//! assert!((total - 30.0).abs() < 1e-9);
//! ```

pub mod error;
pub mod grid;
pub mod mass_preserving;
pub mod pchip;

pub use error::{InterpError, InterpResult};
pub use grid::{Grid, merge_edges, upsample_grid};
pub use mass_preserving::{
    MassPreservingInterp, ensure_cumulative, interp_along, mass_preserving_interp,
};
pub use pchip::Pchip;
