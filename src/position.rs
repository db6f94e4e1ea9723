//! Cell addressing for the sheet.
//!
//! A `Position` uniquely identifies a cell within a sheet and doubles as the
//! node identity in the dependency graph. `Size` is the derived printable
//! extent of a sheet.

use serde::{Deserialize, Serialize};

/// Maximum number of rows a position may address.
pub const MAX_ROWS: usize = 16384;
/// Maximum number of columns a position may address.
pub const MAX_COLS: usize = 16384;

/// Zero-based cell coordinates.
///
/// Used as the unique key identifying a cell and as a graph node in the
/// dependency graph. A position may be out of bounds (e.g. produced by a
/// formula reference like `ZZZZ100000`); such positions are never stored in
/// a sheet and resolve to a `#REF`-category error during evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Row index (0-based)
    pub row: usize,
    /// Column index (0-based)
    pub col: usize,
}

impl Position {
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// True iff both coordinates lie within the addressable bounds.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.row < MAX_ROWS && self.col < MAX_COLS
    }

    /// Parse a conventional A1-style reference (`A1`, `AA10`).
    ///
    /// Column letters are case-insensitive, the row is 1-based. Returns
    /// `None` for anything that is not letters followed by digits, or for a
    /// row of `0`. The result may still be out of bounds; callers check
    /// `is_valid` separately.
    pub fn parse_a1(s: &str) -> Option<Position> {
        let letters: String = s.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        let digits = &s[letters.len()..];
        if letters.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        // Checked arithmetic: a long letter run must fail the parse, not
        // wrap around into an unrelated in-bounds column.
        let mut col: usize = 0;
        for c in letters.chars() {
            col = col
                .checked_mul(26)?
                .checked_add(c.to_ascii_uppercase() as usize - 'A' as usize + 1)?;
        }
        let col = col - 1;
        let row: usize = digits.parse().ok()?;
        if row == 0 {
            return None;
        }

        Some(Position::new(row - 1, col))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), self.row + 1)
    }
}

/// Convert 0-based column index to spreadsheet-style letter(s).
/// 0=A, 1=B, ..., 25=Z, 26=AA, etc.
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// The smallest rectangle (from the origin) containing every occupied cell.
///
/// Derived by the sheet, never stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub rows: usize,
    pub cols: usize,
}

impl Size {
    #[inline]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }
}
