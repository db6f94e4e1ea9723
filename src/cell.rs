//! A single grid location: its content and its cached evaluation result.

use crate::formula::Formula;
use crate::position::Position;
use crate::value::CellValue;
use rustc_hash::FxHashSet;

/// Marker introducing a formula (`=A1+1`).
pub const FORMULA_MARKER: char = '=';
/// Marker forcing literal interpretation (`'=not a formula`).
pub const ESCAPE_MARKER: char = '\'';

/// What a cell holds. Exactly one variant at a time; content is replaced
/// wholesale on every write.
#[derive(Debug, Clone, Default)]
pub enum CellContent {
    #[default]
    Empty,
    /// Raw literal text, escape marker included.
    Text(String),
    Formula(Formula),
}

impl CellContent {
    /// Classify raw input text.
    ///
    /// Empty input is Empty content; `=` followed by at least one character
    /// parses as a formula (a lone `=` is literal text); anything else is
    /// literal text.
    pub fn from_input(text: &str) -> Result<CellContent, String> {
        if text.is_empty() {
            return Ok(CellContent::Empty);
        }
        if text.len() > 1 && text.starts_with(FORMULA_MARKER) {
            let formula = Formula::parse(&text[1..])?;
            return Ok(CellContent::Formula(formula));
        }
        Ok(CellContent::Text(text.to_string()))
    }
}

/// One materialized cell.
///
/// Holds content plus the lazily populated value cache. Dependency edges are
/// not stored here; they live in the sheet's [`crate::DepGraph`], keyed by
/// position.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    content: CellContent,
    cache: Option<CellValue>,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &CellContent {
        &self.content
    }

    /// Install new content, dropping any cached result.
    pub fn set_content(&mut self, content: CellContent) {
        self.content = content;
        self.cache = None;
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.content, CellContent::Empty)
    }

    pub fn formula(&self) -> Option<&Formula> {
        match &self.content {
            CellContent::Formula(f) => Some(f),
            _ => None,
        }
    }

    /// The raw text of this cell: empty string, the literal text as typed
    /// (escape marker included), or `=` plus the canonical expression.
    pub fn text(&self) -> String {
        match &self.content {
            CellContent::Empty => String::new(),
            CellContent::Text(s) => s.clone(),
            CellContent::Formula(f) => format!("{}{}", FORMULA_MARKER, f.text()),
        }
    }

    /// The value of non-formula content. `None` for a formula, whose value
    /// requires sheet-mediated evaluation.
    pub fn literal_value(&self) -> Option<CellValue> {
        match &self.content {
            CellContent::Empty => Some(CellValue::default()),
            CellContent::Text(s) => {
                let value = match s.strip_prefix(ESCAPE_MARKER) {
                    Some(rest) => rest.to_string(),
                    None => s.clone(),
                };
                Some(CellValue::Text(value))
            }
            CellContent::Formula(_) => None,
        }
    }

    /// Distinct, in-bounds referenced positions in first-seen source order.
    /// Empty for non-formula content.
    pub fn referenced_cells(&self) -> Vec<Position> {
        let Some(formula) = self.formula() else {
            return Vec::new();
        };
        let mut seen = FxHashSet::default();
        formula
            .referenced_cells()
            .into_iter()
            .filter(|p| p.is_valid() && seen.insert(*p))
            .collect()
    }

    // Cache management. Population happens in the sheet, which is the only
    // place evaluation can run.

    pub fn cached_value(&self) -> Option<&CellValue> {
        self.cache.as_ref()
    }

    pub fn set_cached_value(&mut self, value: CellValue) {
        self.cache = Some(value);
    }

    pub fn is_cache_valid(&self) -> bool {
        self.cache.is_some()
    }

    pub fn invalidate_cache(&mut self) {
        self.cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_classification() {
        assert!(matches!(CellContent::from_input("").unwrap(), CellContent::Empty));
        assert!(matches!(
            CellContent::from_input("hello").unwrap(),
            CellContent::Text(_)
        ));
        assert!(matches!(
            CellContent::from_input("=A1+1").unwrap(),
            CellContent::Formula(_)
        ));
        // A lone formula marker is literal text
        assert!(matches!(CellContent::from_input("=").unwrap(), CellContent::Text(_)));
    }

    #[test]
    fn test_malformed_formula_rejected() {
        assert!(CellContent::from_input("=1+").is_err());
        assert!(CellContent::from_input("=SUM(A1)").is_err());
    }

    #[test]
    fn test_text_preserves_escape_marker() {
        let mut cell = Cell::new();
        cell.set_content(CellContent::from_input("'=A1").unwrap());
        assert_eq!(cell.text(), "'=A1");
        assert_eq!(cell.literal_value(), Some(CellValue::Text("=A1".to_string())));
    }

    #[test]
    fn test_plain_text_value() {
        let mut cell = Cell::new();
        cell.set_content(CellContent::from_input("42").unwrap());
        assert_eq!(cell.literal_value(), Some(CellValue::Text("42".to_string())));
        assert_eq!(cell.text(), "42");
    }

    #[test]
    fn test_formula_text_is_canonical() {
        let mut cell = Cell::new();
        cell.set_content(CellContent::from_input("=a1 + (2*3)").unwrap());
        assert_eq!(cell.text(), "=A1+2*3");
        assert_eq!(cell.literal_value(), None);
    }

    #[test]
    fn test_referenced_cells_dedup_and_filter() {
        let mut cell = Cell::new();
        cell.set_content(CellContent::from_input("=B1+A1+B1").unwrap());
        assert_eq!(
            cell.referenced_cells(),
            vec![Position::new(0, 1), Position::new(0, 0)]
        );

        // Out-of-bounds references are dropped from the dependency set
        cell.set_content(CellContent::from_input("=A99999+B1").unwrap());
        assert_eq!(cell.referenced_cells(), vec![Position::new(0, 1)]);
    }

    #[test]
    fn test_set_content_drops_cache() {
        let mut cell = Cell::new();
        cell.set_content(CellContent::from_input("=1+1").unwrap());
        cell.set_cached_value(CellValue::Number(2.0));
        assert!(cell.is_cache_valid());

        cell.set_content(CellContent::from_input("=1+2").unwrap());
        assert!(!cell.is_cache_valid());
    }

    #[test]
    fn test_empty_cell() {
        let cell = Cell::new();
        assert!(cell.is_empty());
        assert_eq!(cell.text(), "");
        assert_eq!(cell.literal_value(), Some(CellValue::default()));
        assert!(cell.referenced_cells().is_empty());
    }
}
