//! Observable cell values and evaluation-failure categories.

use serde::{Deserialize, Serialize};

/// Why a formula evaluation failed.
///
/// These are ordinary values, not structural errors: they flow through
/// arithmetic exactly like numbers and end up stored in the referencing
/// cell's cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormulaError {
    /// A referenced position lies outside the addressable bounds.
    Ref,
    /// A referenced cell's text cannot be coerced to a number.
    Value,
    /// Evaluation produced a non-finite result (division by zero, overflow).
    Arithmetic,
}

impl std::fmt::Display for FormulaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Every category renders as the same token. The distinction is kept
        // in the value for propagation, not for display.
        write!(f, "#ARITHM!")
    }
}

/// The externally observable result of a cell.
///
/// An empty cell reads as `Text("")`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl CellValue {
    /// True for the empty-text value an Empty cell produces.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}
