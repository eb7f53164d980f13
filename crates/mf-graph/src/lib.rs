//! mf-graph: flowsheet graph layer for massflow.
//!
//! Provides:
//! - Streams (named mass/composition payloads between two nodes) and nodes with
//!   derived balance status
//! - A graph builder that renumbers nodes densely and wires input/output lists
//! - The flowsheet engine: queries, rewiring with full rebuild, reports and exports
//!
//! # Example
//!
//! ```
//! use mf_core::{NodeId, RowIndex, Table};
//! use mf_graph::{Flowsheet, Stream};
//!
//! let data = |dry: f64| {
//!     Table::new(
//!         RowIndex::range("index", 1),
//!         vec![("mass_wet", vec![dry]), ("mass_dry", vec![dry]), ("Fe", vec![60.0])],
//!     )
//!     .unwrap()
//! };
//! let id = NodeId::from_index;
//! let fs = Flowsheet::from_streams(
//!     "demo",
//!     [
//!         Stream::new("Feed", data(10.0)).with_endpoints(id(0), id(1)),
//!         Stream::new("Conc", data(4.0)).with_endpoints(id(1), id(2)),
//!         Stream::new("Tail", data(6.0)).with_endpoints(id(1), id(3)),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(fs.node_count(), 4);
//! assert!(fs.balanced());
//! ```

pub mod align;
pub mod builder;
pub mod error;
pub mod filter;
pub mod flowsheet;
mod graph;
pub mod node;
pub mod options;
pub mod report;
pub mod stream;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use align::SIZE_DIMENSION;
pub use builder::{GraphBuilder, NodeMeta};
pub use error::{GraphError, GraphResult};
pub use filter::DimensionFilter;
pub use flowsheet::Flowsheet;
pub use node::{FlowNode, NodeKind};
pub use options::FlowsheetOptions;
pub use report::{TidyKey, TidyTable};
pub use stream::{Endpoints, Stream, StreamStatus};
