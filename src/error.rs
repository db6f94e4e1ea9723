//! Structural error types.
//!
//! These surface to the caller of a mutating sheet operation and always
//! leave the sheet unchanged. Evaluation failures are not errors in this
//! sense; they are ordinary [`crate::CellValue::Error`] results.

use thiserror::Error;

use crate::position::Position;

/// Errors returned by sheet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    #[error("invalid position: row {}, col {}", .0.row, .0.col)]
    InvalidPosition(Position),

    #[error("circular dependency: {cell} cannot reference {via}")]
    CircularDependency { cell: Position, via: Position },

    #[error("formula syntax error: {0}")]
    FormulaSyntax(String),
}

pub type Result<T> = std::result::Result<T, SheetError>;
