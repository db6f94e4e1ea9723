//! Formula parsing and evaluation.
//!
//! A [`Formula`] is a parsed, evaluable arithmetic expression over cell
//! references. It knows nothing about cells or caching; the sheet supplies a
//! resolver callback at evaluation time.

pub mod eval;
pub mod parser;

use crate::position::Position;
use crate::value::FormulaError;

use parser::Expr;

/// A parsed formula expression (the text after the leading `=`).
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    expr: Expr,
}

impl Formula {
    /// Parse formula expression text (without its leading `=`).
    pub fn parse(input: &str) -> Result<Formula, String> {
        Ok(Formula { expr: parser::parse(input)? })
    }

    /// Evaluate against a resolver mapping referenced positions to numbers.
    pub fn evaluate<R>(&self, resolver: &mut R) -> Result<f64, FormulaError>
    where
        R: FnMut(Position) -> Result<f64, FormulaError>,
    {
        eval::evaluate(&self.expr, resolver)
    }

    /// All cell references in source order, duplicates and out-of-bounds
    /// entries included.
    pub fn referenced_cells(&self) -> Vec<Position> {
        let mut refs = Vec::new();
        eval::collect_refs(&self.expr, &mut refs);
        refs
    }

    /// Canonical expression text. Not necessarily byte-identical to the
    /// parsed input, but reparses to the same expression.
    pub fn text(&self) -> String {
        parser::render(&self.expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_text() {
        let f = Formula::parse("a1 + (2*3)").unwrap();
        assert_eq!(f.text(), "A1+2*3");
    }

    #[test]
    fn test_parse_failure() {
        assert!(Formula::parse("1+").is_err());
    }

    #[test]
    fn test_referenced_cells_raw() {
        let f = Formula::parse("A1+B2+A1").unwrap();
        assert_eq!(
            f.referenced_cells(),
            vec![Position::new(0, 0), Position::new(1, 1), Position::new(0, 0)]
        );
    }

    #[test]
    fn test_evaluate() {
        let f = Formula::parse("2+A1").unwrap();
        let result = f.evaluate(&mut |_| Ok(5.0));
        assert_eq!(result, Ok(7.0));
    }
}
