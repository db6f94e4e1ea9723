//! Dependency graph for formula cells.
//!
//! Tracks dependencies (cells a formula reads) and dependents (cells whose
//! formula reads a given cell) as the two directions of the same edge.
//!
//! # Edge Direction
//!
//! ```text
//! A → B  means  "B depends on A"  (A is a dependency of B)
//! ```
//!
//! This makes "what goes stale if A changes?" a walk over outgoing edges.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::position::Position;

/// Bidirectional dependency adjacency over cell positions.
///
/// # Invariants
///
/// 1. **Symmetry:** `A ∈ deps[B]` iff `B ∈ dependents[A]`.
/// 2. **No dangling entries:** empty sets are removed, not stored.
/// 3. **Atomic updates:** [`DepGraph::replace_edges`] is the only mutator
///    that touches both maps.
///
/// The graph stores positions, never cell references; a position is the
/// cell's identity, so edges stay meaningful whether or not the target cell
/// is currently materialized.
#[derive(Default, Debug, Clone)]
pub struct DepGraph {
    /// For each formula cell B, the cells it reads. B -> {A1, A2, ...}
    preds: FxHashMap<Position, FxHashSet<Position>>,

    /// For each referenced cell A, the formula cells reading it. A -> {B1, ...}
    succs: FxHashMap<Position, FxHashSet<Position>>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cells this cell's formula reads.
    pub fn dependencies(&self, cell: Position) -> impl Iterator<Item = Position> + '_ {
        self.preds
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// The cells whose formulas read this cell.
    pub fn dependents(&self, cell: Position) -> impl Iterator<Item = Position> + '_ {
        self.succs
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// True iff at least one formula reads this cell.
    pub fn is_referenced(&self, cell: Position) -> bool {
        self.succs.contains_key(&cell)
    }

    /// Replace all edges for a formula cell atomically.
    ///
    /// Removes the cell from every old dependency's dependents set, then
    /// installs the new dependency set and the matching reverse edges.
    /// Pass an empty set to clear all edges for this cell.
    pub fn replace_edges(&mut self, cell: Position, new_deps: FxHashSet<Position>) {
        if let Some(old_deps) = self.preds.remove(&cell) {
            for dep in old_deps {
                if let Some(readers) = self.succs.get_mut(&dep) {
                    readers.remove(&cell);
                    // Clean up empty entries (invariant: no dangling)
                    if readers.is_empty() {
                        self.succs.remove(&dep);
                    }
                }
            }
        }

        if new_deps.is_empty() {
            return;
        }

        for dep in &new_deps {
            self.succs.entry(*dep).or_default().insert(cell);
        }
        self.preds.insert(cell, new_deps);
    }

    /// Clear all edges for a cell (formula replaced by a literal, or cell
    /// removed).
    pub fn clear_cell(&mut self, cell: Position) {
        self.replace_edges(cell, FxHashSet::default());
    }

    /// Check whether giving `cell` the dependency set `new_deps` would close
    /// a cycle in the current graph.
    ///
    /// Does not modify the graph and only inspects the existing edges: a
    /// cycle arises exactly when some member of `new_deps` is reachable from
    /// `cell` along dependent edges (everything reachable that way is
    /// already contingent on `cell`'s value). Returns the offending
    /// would-be dependency, or `None` if the assignment is acyclic.
    ///
    /// Explicit-stack DFS, so pathological chains cannot overflow the call
    /// stack.
    pub fn would_create_cycle(&self, cell: Position, new_deps: &FxHashSet<Position>) -> Option<Position> {
        if new_deps.is_empty() {
            return None;
        }
        if new_deps.contains(&cell) {
            return Some(cell);
        }

        let mut visited = FxHashSet::default();
        let mut stack = vec![cell];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }

            if let Some(readers) = self.succs.get(&current) {
                for &reader in readers {
                    if new_deps.contains(&reader) {
                        return Some(reader);
                    }
                    stack.push(reader);
                }
            }
        }

        None
    }

    /// Check all invariants. Panics if any are violated.
    #[cfg(test)]
    pub fn assert_consistent(&self) {
        for (cell, deps) in &self.preds {
            assert!(!deps.is_empty(), "empty deps set stored for {}", cell);
            for dep in deps {
                assert!(
                    self.succs.get(dep).map_or(false, |s| s.contains(cell)),
                    "missing reverse edge: {} should be in dependents of {}",
                    cell,
                    dep
                );
            }
        }

        for (cell, readers) in &self.succs {
            assert!(!readers.is_empty(), "empty dependents set stored for {}", cell);
            for reader in readers {
                assert!(
                    self.preds.get(reader).map_or(false, |s| s.contains(cell)),
                    "missing forward edge: {} should be in deps of {}",
                    cell,
                    reader
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    fn set(cells: &[Position]) -> FxHashSet<Position> {
        cells.iter().copied().collect()
    }

    #[test]
    fn test_empty_graph() {
        let graph = DepGraph::new();

        assert!(!graph.is_referenced(pos(0, 0)));
        assert_eq!(graph.dependencies(pos(0, 0)).count(), 0);
        assert_eq!(graph.dependents(pos(0, 0)).count(), 0);

        graph.assert_consistent();
    }

    #[test]
    fn test_single_edge() {
        // B1 = A1
        let mut graph = DepGraph::new();
        let a1 = pos(0, 0);
        let b1 = pos(0, 1);

        graph.replace_edges(b1, set(&[a1]));
        graph.assert_consistent();

        assert_eq!(graph.dependencies(b1).collect::<Vec<_>>(), vec![a1]);
        assert_eq!(graph.dependents(a1).collect::<Vec<_>>(), vec![b1]);
        assert!(graph.is_referenced(a1));
        assert!(!graph.is_referenced(b1));
    }

    #[test]
    fn test_rewiring() {
        // B1 = A1, then change to B1 = A2
        let mut graph = DepGraph::new();
        let a1 = pos(0, 0);
        let a2 = pos(1, 0);
        let b1 = pos(0, 1);

        graph.replace_edges(b1, set(&[a1]));
        graph.replace_edges(b1, set(&[a2]));
        graph.assert_consistent();

        assert_eq!(graph.dependencies(b1).collect::<Vec<_>>(), vec![a2]);
        assert_eq!(graph.dependents(a2).collect::<Vec<_>>(), vec![b1]);
        // A1 dropped out of the graph entirely (sparse)
        assert!(!graph.is_referenced(a1));
    }

    #[test]
    fn test_unwiring() {
        let mut graph = DepGraph::new();
        let a1 = pos(0, 0);
        let b1 = pos(0, 1);

        graph.replace_edges(b1, set(&[a1]));
        graph.clear_cell(b1);
        graph.assert_consistent();

        assert_eq!(graph.dependencies(b1).count(), 0);
        assert!(!graph.is_referenced(a1));
    }

    #[test]
    fn test_diamond() {
        //     A1
        //    /  \
        //   B1   C1
        //    \  /
        //     D1
        let mut graph = DepGraph::new();
        let a1 = pos(0, 0);
        let b1 = pos(0, 1);
        let c1 = pos(0, 2);
        let d1 = pos(0, 3);

        graph.replace_edges(b1, set(&[a1]));
        graph.replace_edges(c1, set(&[a1]));
        graph.replace_edges(d1, set(&[b1, c1]));
        graph.assert_consistent();

        let mut a1_deps: Vec<_> = graph.dependents(a1).collect();
        a1_deps.sort_by_key(|c| c.col);
        assert_eq!(a1_deps, vec![b1, c1]);

        let mut d1_reads: Vec<_> = graph.dependencies(d1).collect();
        d1_reads.sort_by_key(|c| c.col);
        assert_eq!(d1_reads, vec![b1, c1]);
    }

    #[test]
    fn test_cycle_self_reference() {
        let graph = DepGraph::new();
        let a1 = pos(0, 0);

        assert_eq!(graph.would_create_cycle(a1, &set(&[a1])), Some(a1));
    }

    #[test]
    fn test_cycle_two_cell() {
        // A1 = B1, then B1 = A1 would close the loop
        let mut graph = DepGraph::new();
        let a1 = pos(0, 0);
        let b1 = pos(0, 1);

        graph.replace_edges(a1, set(&[b1]));
        assert!(graph.would_create_cycle(b1, &set(&[a1])).is_some());
    }

    #[test]
    fn test_cycle_indirect() {
        // B reads A, C reads B; A = C would close the loop
        let mut graph = DepGraph::new();
        let a = pos(0, 0);
        let b = pos(0, 1);
        let c = pos(0, 2);

        graph.replace_edges(b, set(&[a]));
        graph.replace_edges(c, set(&[b]));
        assert!(graph.would_create_cycle(a, &set(&[c])).is_some());
    }

    #[test]
    fn test_no_cycle_valid_graph() {
        let mut graph = DepGraph::new();
        let a = pos(0, 0);
        let b = pos(0, 1);
        let c = pos(0, 2);

        graph.replace_edges(b, set(&[a]));
        graph.replace_edges(c, set(&[b]));

        let d = pos(0, 3);
        assert_eq!(graph.would_create_cycle(d, &set(&[c])), None);
        // Re-pointing B at a fresh cell is fine too
        assert_eq!(graph.would_create_cycle(b, &set(&[d])), None);
    }

    #[test]
    fn test_cycle_check_does_not_mutate() {
        let mut graph = DepGraph::new();
        let a = pos(0, 0);
        let b = pos(0, 1);

        graph.replace_edges(a, set(&[b]));
        let before = graph.clone();

        let _ = graph.would_create_cycle(b, &set(&[a]));
        assert_eq!(graph.preds.len(), before.preds.len());
        assert_eq!(graph.succs.len(), before.succs.len());
        graph.assert_consistent();
    }

    #[test]
    fn test_deep_chain_cycle_check() {
        // A long dependent chain must not overflow the stack.
        let mut graph = DepGraph::new();
        for i in 1..5000 {
            graph.replace_edges(pos(i, 0), set(&[pos(i - 1, 0)]));
        }
        assert!(graph
            .would_create_cycle(pos(0, 0), &set(&[pos(4999, 0)]))
            .is_some());
        assert_eq!(graph.would_create_cycle(pos(0, 0), &set(&[pos(0, 1)])), None);
    }
}
