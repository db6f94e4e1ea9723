//! gridsheet - spreadsheet computation engine.
//!
//! A sparse 2-D grid of cells holding text, numeric literals, or arithmetic
//! formulas over cell references. Mutating a cell rewires the dependency
//! graph (rejecting anything cyclic) and transitively invalidates dependent
//! caches; values are recomputed lazily, at most once per invalidation
//! epoch.

pub mod cell;
pub mod dep_graph;
pub mod error;
pub mod formula;
pub mod position;
pub mod sheet;
pub mod value;

pub use cell::{Cell, CellContent, ESCAPE_MARKER, FORMULA_MARKER};
pub use dep_graph::DepGraph;
pub use error::SheetError;
pub use formula::Formula;
pub use position::{Position, Size, MAX_COLS, MAX_ROWS};
pub use sheet::Sheet;
pub use value::{CellValue, FormulaError};
