//! fdm-core: stable foundation for the flight dynamics engine.
//!
//! Contains:
//! - error (shared error taxonomy + context chaining)
//! - numeric (breakpoint ordering checks)
//! - ids (compact ids for arena-stored objects)
//! - units (uom SI types + display conversions)
//! - bus (named data bus: `DataNode` tree, `DataRef` handles)
//! - table (piecewise-linear `Table1D` and bilinear `Table2D`)

pub mod bus;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod table;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use bus::{DataBus, DataNode, DataRef, NodeKind};
pub use error::{FdmError, FdmResult, ResultExt};
pub use ids::*;
pub use numeric::*;
pub use table::{Table1D, Table2D};
