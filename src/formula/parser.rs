// Formula parser - converts formula expression text into an AST.
// Supports: numbers, cell refs (A1), unary +/-, basic math (+, -, *, /), parentheses.

use crate::position::Position;

/// Expression AST for an arithmetic formula over cell references.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Cell reference. May address an out-of-bounds position; validity is
    /// checked at evaluation and edge-wiring time, not at parse time.
    Ref(Position),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

/// Parse formula expression text (without its leading `=`) into an AST.
pub fn parse(input: &str) -> Result<Expr, String> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err("empty formula".to_string());
    }
    let (expr, pos) = parse_add_sub(&tokens, 0)?;
    if pos != tokens.len() {
        return Err(format!("unexpected trailing token at position {}", pos));
    }
    Ok(expr)
}

#[derive(Debug, Clone)]
enum Token {
    Number(f64),
    CellRef(Position),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => { chars.next(); }
            '+' => { tokens.push(Token::Plus); chars.next(); }
            '-' => { tokens.push(Token::Minus); chars.next(); }
            '*' => { tokens.push(Token::Star); chars.next(); }
            '/' => { tokens.push(Token::Slash); chars.next(); }
            '(' => { tokens.push(Token::LParen); chars.next(); }
            ')' => { tokens.push(Token::RParen); chars.next(); }
            'A'..='Z' | 'a'..='z' => {
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_alphanumeric() {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match Position::parse_a1(&ident) {
                    Some(pos) => tokens.push(Token::CellRef(pos)),
                    None => return Err(format!("invalid cell reference: {}", ident)),
                }
            }
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num_str.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| format!("invalid number: {}", num_str))?;
                // A literal too large for f64 parses to infinity; reject it
                // so every Number token is finite.
                if !num.is_finite() {
                    return Err(format!("number out of range: {}", num_str));
                }
                tokens.push(Token::Number(num));
            }
            _ => return Err(format!("unexpected character: {}", c)),
        }
    }

    Ok(tokens)
}

fn parse_add_sub(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_mul_div(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Plus => Op::Add,
            Token::Minus => Op::Sub,
            _ => break,
        };
        let (right, new_pos) = parse_mul_div(tokens, pos + 1)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_mul_div(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_unary(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Star => Op::Mul,
            Token::Slash => Op::Div,
            _ => break,
        };
        let (right, new_pos) = parse_unary(tokens, pos + 1)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_unary(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    if pos >= tokens.len() {
        return Err("unexpected end of formula".to_string());
    }

    let op = match &tokens[pos] {
        Token::Plus => Some(UnaryOp::Plus),
        Token::Minus => Some(UnaryOp::Minus),
        _ => None,
    };

    if let Some(op) = op {
        let (operand, new_pos) = parse_unary(tokens, pos + 1)?;
        return Ok((
            Expr::Unary {
                op,
                operand: Box::new(operand),
            },
            new_pos,
        ));
    }

    parse_primary(tokens, pos)
}

fn parse_primary(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    match &tokens[pos] {
        Token::Number(n) => Ok((Expr::Number(*n), pos + 1)),
        Token::CellRef(p) => Ok((Expr::Ref(*p), pos + 1)),
        Token::LParen => {
            let (expr, new_pos) = parse_add_sub(tokens, pos + 1)?;
            match tokens.get(new_pos) {
                Some(Token::RParen) => Ok((expr, new_pos + 1)),
                _ => Err("expected closing parenthesis".to_string()),
            }
        }
        t => Err(format!("unexpected token: {:?}", t)),
    }
}

// =============================================================================
// Canonical rendering
// =============================================================================

// Precedence levels used to decide where parentheses are required when
// rendering an AST back to text. Atoms bind tightest.
const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_UNARY: u8 = 3;
const PREC_ATOM: u8 = 4;

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Number(_) | Expr::Ref(_) => PREC_ATOM,
        Expr::Unary { .. } => PREC_UNARY,
        Expr::Binary { op: Op::Add | Op::Sub, .. } => PREC_ADD,
        Expr::Binary { op: Op::Mul | Op::Div, .. } => PREC_MUL,
    }
}

/// Render an expression with the minimal set of parentheses that preserves
/// its structure. `parse(render(e)) == e` for every valid `e`.
pub fn render(expr: &Expr) -> String {
    let mut out = String::new();
    render_into(expr, &mut out);
    out
}

fn render_into(expr: &Expr, out: &mut String) {
    match expr {
        Expr::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                out.push_str(&format!("{}", *n as i64));
            } else {
                out.push_str(&format!("{}", n));
            }
        }
        Expr::Ref(pos) => out.push_str(&pos.to_string()),
        Expr::Unary { op, operand } => {
            out.push(match op {
                UnaryOp::Plus => '+',
                UnaryOp::Minus => '-',
            });
            render_child(operand, precedence(operand) < PREC_UNARY, out);
        }
        Expr::Binary { op, left, right } => {
            let prec = precedence(expr);
            render_child(left, precedence(left) < prec, out);
            out.push(match op {
                Op::Add => '+',
                Op::Sub => '-',
                Op::Mul => '*',
                Op::Div => '/',
            });
            // Subtraction and division are left-associative; a right operand
            // at equal precedence must keep its parentheses (1-(2-3)).
            let right_needs = precedence(right) < prec
                || (precedence(right) == prec && matches!(op, Op::Sub | Op::Div));
            render_child(right, right_needs, out);
        }
    }
}

fn render_child(expr: &Expr, parens: bool, out: &mut String) {
    if parens {
        out.push('(');
        render_into(expr, out);
        out.push(')');
    } else {
        render_into(expr, out);
    }
}
