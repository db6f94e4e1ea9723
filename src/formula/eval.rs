// Formula evaluator - walks the AST against a cell-value resolver.

use crate::position::Position;
use crate::value::FormulaError;

use super::parser::{Expr, Op, UnaryOp};

/// Evaluate an expression against a resolver that maps a referenced position
/// to a number (or an evaluation failure, which short-circuits).
///
/// Any arithmetic step producing a non-finite result yields
/// [`FormulaError::Arithmetic`].
pub fn evaluate<R>(expr: &Expr, resolver: &mut R) -> Result<f64, FormulaError>
where
    R: FnMut(Position) -> Result<f64, FormulaError>,
{
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Ref(pos) => resolver(*pos),
        Expr::Unary { op, operand } => {
            let v = evaluate(operand, resolver)?;
            Ok(match op {
                UnaryOp::Plus => v,
                UnaryOp::Minus => -v,
            })
        }
        Expr::Binary { op, left, right } => {
            let l = evaluate(left, resolver)?;
            let r = evaluate(right, resolver)?;
            let result = match op {
                Op::Add => l + r,
                Op::Sub => l - r,
                Op::Mul => l * r,
                Op::Div => l / r,
            };
            if result.is_finite() {
                Ok(result)
            } else {
                Err(FormulaError::Arithmetic)
            }
        }
    }
}

/// Append every cell reference in the expression to `out`, in source order,
/// duplicates and out-of-bounds references included. Callers dedup and
/// validity-filter as needed.
pub fn collect_refs(expr: &Expr, out: &mut Vec<Position>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Ref(pos) => out.push(*pos),
        Expr::Unary { operand, .. } => collect_refs(operand, out),
        Expr::Binary { left, right, .. } => {
            collect_refs(left, out);
            collect_refs(right, out);
        }
    }
}
