//! mf-core: stable foundation for massflow.
//!
//! Contains:
//! - table (labelled tables with positional or interval row indexes)
//! - composition (relative composition <-> absolute mass)
//! - numeric (Real + tolerances + float helpers)
//! - ids (stable compact IDs for graph nodes, plus an explicit id source)
//! - error (shared error types)

pub mod composition;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod table;

// Re-exports: nice ergonomics for downstream crates
pub use composition::{ColumnFormat, ColumnRole, MassBasis};
pub use error::{MfError, MfResult};
pub use ids::*;
pub use numeric::*;
pub use table::{Closed, Column, Coord, IndexKind, Interval, IntervalIndex, RowIndex, Table};
