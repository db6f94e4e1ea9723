//! The sheet: sparse cell arena, mutation entry points, lazy evaluation.
//!
//! All structural change goes through [`Sheet::set_cell`] /
//! [`Sheet::clear_cell`]. A mutation parses the new content, runs the cycle
//! pre-check against the unmodified graph, and only then commits: rewire
//! edges, install content, materialize referenced blanks, invalidate caches
//! transitively. A rejected mutation leaves the sheet byte-for-byte as it
//! was.

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cell::{Cell, CellContent};
use crate::dep_graph::DepGraph;
use crate::error::{Result, SheetError};
use crate::position::{Position, Size};
use crate::value::{CellValue, FormulaError};

/// A sparse 2-D grid of cells with automatic recomputation.
#[derive(Debug, Default)]
pub struct Sheet {
    cells: FxHashMap<Position, Cell>,
    graph: DepGraph,
    /// Number of formula evaluations performed. Each formula evaluates at
    /// most once per invalidation epoch; this counter makes that observable.
    eval_count: u64,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell's content from raw text.
    ///
    /// Empty text clears the content (the cell stays materialized); text
    /// starting with `=` (and longer than the marker alone) is parsed as a
    /// formula; anything else is a literal. Referenced blank positions are
    /// materialized as empty cells so their dependents survive lookups.
    ///
    /// Fails without touching the sheet if `pos` is out of bounds, the
    /// formula does not parse, or the new references would close a cycle.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<()> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }

        let content = CellContent::from_input(text).map_err(SheetError::FormulaSyntax)?;

        let new_deps: FxHashSet<Position> = match &content {
            CellContent::Formula(f) => f
                .referenced_cells()
                .into_iter()
                .filter(|p| p.is_valid())
                .collect(),
            _ => FxHashSet::default(),
        };

        // Pre-check against the existing edges only; nothing has been
        // installed yet, so reachability along dependents is exactly the set
        // of cells already contingent on this one.
        if let Some(via) = self.graph.would_create_cycle(pos, &new_deps) {
            debug!("set {} rejected: would create cycle via {}", pos, via);
            return Err(SheetError::CircularDependency { cell: pos, via });
        }

        debug!("set {}: {:?} ({} refs)", pos, text, new_deps.len());

        // Commit. A formula may reference a cell nobody has written yet;
        // materialize it so `get_cell` and `is_referenced` see it.
        for &dep in &new_deps {
            self.cells.entry(dep).or_default();
        }
        self.graph.replace_edges(pos, new_deps);
        self.cells.entry(pos).or_default().set_content(content);

        self.invalidate_from(pos);
        Ok(())
    }

    /// Clear a cell's content.
    ///
    /// The cell is physically removed unless some formula still references
    /// it, in which case it stays materialized as an empty placeholder.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        if !self.cells.contains_key(&pos) {
            return Ok(());
        }

        self.set_cell(pos, "")?;
        if !self.graph.is_referenced(pos) {
            self.cells.remove(&pos);
            trace!("removed {}", pos);
        }
        Ok(())
    }

    /// The cell at `pos`, if one is materialized there.
    ///
    /// A referenced-but-never-written position returns a materialized empty
    /// cell; a never-touched position returns `None`. Both read as empty.
    pub fn get_cell(&self, pos: Position) -> Result<Option<&Cell>> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        Ok(self.cells.get(&pos))
    }

    /// The observable value at `pos`, evaluating (and caching) a formula if
    /// its cache is empty. A never-touched position reads as empty text.
    pub fn cell_value(&mut self, pos: Position) -> Result<CellValue> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        Ok(self.eval_value(pos))
    }

    /// The raw text at `pos`: literal text as typed, or `=` plus the
    /// canonical expression for a formula.
    pub fn cell_text(&self, pos: Position) -> Result<String> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        Ok(self.cells.get(&pos).map(Cell::text).unwrap_or_default())
    }

    /// True iff some formula reads `pos`.
    pub fn is_referenced(&self, pos: Position) -> bool {
        self.graph.is_referenced(pos)
    }

    /// One past the maximum occupied row/col over cells with non-empty
    /// text. Empty placeholders kept alive by references do not count.
    pub fn printable_size(&self) -> Size {
        let mut size = Size::default();
        for (pos, cell) in &self.cells {
            if !cell.is_empty() {
                size.rows = size.rows.max(pos.row + 1);
                size.cols = size.cols.max(pos.col + 1);
            }
        }
        size
    }

    /// Render every value in the printable rectangle, row-major,
    /// tab-separated, one row per line.
    pub fn render_values(&mut self) -> String {
        let size = self.printable_size();
        let mut out = String::new();
        for row in 0..size.rows {
            for col in 0..size.cols {
                if col > 0 {
                    out.push('\t');
                }
                let pos = Position::new(row, col);
                let occupied = self.cells.get(&pos).map_or(false, |c| !c.is_empty());
                if occupied {
                    out.push_str(&self.eval_value(pos).to_string());
                }
            }
            out.push('\n');
        }
        out
    }

    /// Render every cell's raw text in the printable rectangle, row-major,
    /// tab-separated, one row per line.
    pub fn render_texts(&self) -> String {
        let size = self.printable_size();
        let mut out = String::new();
        for row in 0..size.rows {
            for col in 0..size.cols {
                if col > 0 {
                    out.push('\t');
                }
                if let Some(cell) = self.cells.get(&Position::new(row, col)) {
                    if !cell.is_empty() {
                        out.push_str(&cell.text());
                    }
                }
            }
            out.push('\n');
        }
        out
    }

    /// Total formula evaluations performed so far.
    pub fn eval_count(&self) -> u64 {
        self.eval_count
    }

    // =========================================================================
    // Evaluation + invalidation internals
    // =========================================================================

    /// Value of a valid position. Absent cells read as empty text.
    fn eval_value(&mut self, pos: Position) -> CellValue {
        let formula = match self.cells.get(&pos) {
            None => return CellValue::default(),
            Some(cell) => {
                if let Some(value) = cell.literal_value() {
                    return value;
                }
                if let Some(cached) = cell.cached_value() {
                    return cached.clone();
                }
                // Formula with an empty cache; clone the expression so the
                // borrow on the arena is released before recursing.
                cell.formula().cloned()
            }
        };

        let Some(formula) = formula else {
            return CellValue::default();
        };

        self.eval_count += 1;
        let value = match formula.evaluate(&mut |p| self.resolve_number(p)) {
            Ok(n) => CellValue::Number(n),
            Err(e) => CellValue::Error(e),
        };
        trace!("eval {} -> {}", pos, value);

        if let Some(cell) = self.cells.get_mut(&pos) {
            cell.set_cached_value(value.clone());
        }
        value
    }

    /// Value resolution protocol: convert the cell at `pos` into a number a
    /// formula can consume.
    fn resolve_number(&mut self, pos: Position) -> std::result::Result<f64, FormulaError> {
        if !pos.is_valid() {
            return Err(FormulaError::Ref);
        }
        if !self.cells.contains_key(&pos) {
            return Ok(0.0);
        }
        match self.eval_value(pos) {
            CellValue::Number(n) => Ok(n),
            CellValue::Text(s) => {
                if s.is_empty() {
                    Ok(0.0)
                } else {
                    // The entire text must parse; trailing characters make
                    // the reference a #VALUE-category failure.
                    s.parse::<f64>().map_err(|_| FormulaError::Value)
                }
            }
            CellValue::Error(e) => Err(e),
        }
    }

    /// Clear the changed cell's cache unconditionally, then walk dependents
    /// with an explicit worklist. A cell whose cache is already empty has
    /// already had its subtree cleared, so it is not re-descended.
    fn invalidate_from(&mut self, pos: Position) {
        if let Some(cell) = self.cells.get_mut(&pos) {
            cell.invalidate_cache();
        }

        let mut stack: Vec<Position> = self.graph.dependents(pos).collect();
        let mut cleared = 0usize;
        while let Some(current) = stack.pop() {
            if let Some(cell) = self.cells.get_mut(&current) {
                if cell.is_cache_valid() {
                    cell.invalidate_cache();
                    cleared += 1;
                    stack.extend(self.graph.dependents(current));
                }
            }
        }
        if cleared > 0 {
            trace!("invalidated {} dependents of {}", cleared, pos);
        }
    }
}
