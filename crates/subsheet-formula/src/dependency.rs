//! Dependency tracking for formula calculation
//!
//! Each formula cell records the distinct cell tokens its formula mentions.
//! Ranges are not expanded: `A1..A3` contributes `A1` and `A3` only.

use crate::lexer::{tokenize, Token, TokenKind};
use ahash::{AHashMap, AHashSet};
use subsheet_core::CellAddress;
use std::collections::VecDeque;

/// Distinct cell references among the tokens, in order of first appearance
pub fn extract_references(tokens: &[Token]) -> Vec<CellAddress> {
    let mut seen = AHashSet::new();
    tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Cell)
        .filter_map(|t| CellAddress::parse(&t.lexeme).ok())
        .filter(|addr| seen.insert(*addr))
        .collect()
}

/// References of formula source text (without the sigil)
///
/// Text that fails to tokenize references nothing.
pub fn formula_references(source: &str) -> Vec<CellAddress> {
    match tokenize(source) {
        Ok(tokens) => extract_references(&tokens),
        Err(_) => Vec::new(),
    }
}

/// Result of scheduling a recomputation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Cells to evaluate, each after every cell it references
    pub order: Vec<CellAddress>,
    /// Cells lying on a cross-cell cycle, row-major
    pub cyclic: Vec<CellAddress>,
}

impl Schedule {
    pub fn has_cycle(&self) -> bool {
        !self.cyclic.is_empty()
    }
}

/// Dependency graph for formula cells
///
/// Nodes are formula cells; an edge runs from a referencing cell to each
/// cell it references.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Formula cells in insertion order
    nodes: Vec<CellAddress>,
    /// Cell → cells it references (precedents)
    references: AHashMap<CellAddress, AHashSet<CellAddress>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a formula cell with its references, replacing any previous entry
    pub fn add_cell(&mut self, cell: CellAddress, references: impl IntoIterator<Item = CellAddress>) {
        if !self.references.contains_key(&cell) {
            self.nodes.push(cell);
        }
        self.references.insert(cell, references.into_iter().collect());
    }

    /// Remove a formula cell and its outgoing edges
    pub fn remove_cell(&mut self, cell: CellAddress) {
        if self.references.remove(&cell).is_some() {
            self.nodes.retain(|n| *n != cell);
        }
    }

    pub fn contains(&self, cell: CellAddress) -> bool {
        self.references.contains_key(&cell)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Cells the given cell references
    pub fn get_precedents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.references
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Formula cells that reference the given cell
    pub fn get_dependents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.nodes
            .iter()
            .copied()
            .filter(move |n| self.references.get(n).map_or(false, |refs| refs.contains(&cell)))
    }

    /// Number of other formula cells referencing the given cell
    pub fn in_degree(&self, cell: CellAddress) -> usize {
        self.get_dependents(cell).filter(|n| *n != cell).count()
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.references.clear();
    }

    /// Edges between formula cells, self-loops dropped
    fn formula_edges(&self) -> AHashMap<CellAddress, Vec<CellAddress>> {
        self.nodes
            .iter()
            .map(|&node| {
                let mut targets: Vec<_> = self
                    .get_precedents(node)
                    .filter(|t| *t != node && self.contains(*t))
                    .collect();
                targets.sort_unstable();
                (node, targets)
            })
            .collect()
    }

    /// Compute an evaluation order and the cells caught in cycles
    ///
    /// Kahn's algorithm runs from the unreferenced cells towards their
    /// references. Cells it cannot drain are then peeled from the other end,
    /// starting with those that reference nothing still pending. Of what is
    /// left, the cells that can reach themselves form the cycles.
    pub fn schedule(&self) -> Schedule {
        let edges = self.formula_edges();

        // === Kahn: referencing cells first ===
        let mut in_degree: AHashMap<CellAddress, usize> =
            self.nodes.iter().map(|&n| (n, 0)).collect();
        for targets in edges.values() {
            for target in targets {
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree += 1;
                }
            }
        }

        let mut queue: VecDeque<CellAddress> = self
            .nodes
            .iter()
            .copied()
            .filter(|n| in_degree.get(n) == Some(&0))
            .collect();
        let mut drained = Vec::with_capacity(self.nodes.len());

        while let Some(node) = queue.pop_front() {
            drained.push(node);
            for target in edges.get(&node).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*target);
                    }
                }
            }
        }

        let drained_set: AHashSet<CellAddress> = drained.iter().copied().collect();
        let pending: Vec<CellAddress> = self
            .nodes
            .iter()
            .copied()
            .filter(|n| !drained_set.contains(n))
            .collect();

        if pending.is_empty() {
            drained.reverse();
            return Schedule {
                order: drained,
                cyclic: Vec::new(),
            };
        }

        // === Peel pending cells whose references are all settled ===
        let pending_set: AHashSet<CellAddress> = pending.iter().copied().collect();
        let mut out_degree: AHashMap<CellAddress, usize> = AHashMap::new();
        let mut referencers: AHashMap<CellAddress, Vec<CellAddress>> = AHashMap::new();
        for &node in &pending {
            let targets = edges.get(&node).map(Vec::as_slice).unwrap_or_default();
            let mut count = 0;
            for target in targets.iter().filter(|t| pending_set.contains(*t)) {
                count += 1;
                referencers.entry(*target).or_default().push(node);
            }
            out_degree.insert(node, count);
        }

        let mut queue: VecDeque<CellAddress> = pending
            .iter()
            .copied()
            .filter(|n| out_degree.get(n) == Some(&0))
            .collect();
        let mut peeled = Vec::new();

        while let Some(node) = queue.pop_front() {
            peeled.push(node);
            for referencer in referencers.get(&node).into_iter().flatten() {
                if let Some(degree) = out_degree.get_mut(referencer) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*referencer);
                    }
                }
            }
        }

        let peeled_set: AHashSet<CellAddress> = peeled.iter().copied().collect();
        let core: AHashSet<CellAddress> = pending
            .iter()
            .copied()
            .filter(|n| !peeled_set.contains(n))
            .collect();

        let mut cyclic = Vec::new();
        let mut between = Vec::new();
        for &node in &pending {
            if !core.contains(&node) {
                continue;
            }
            if reaches_itself(node, &edges, &core) {
                cyclic.push(node);
            } else {
                between.push(node);
            }
        }
        cyclic.sort_unstable_by_key(|a| (a.row, a.col));

        drained.reverse();
        let mut order = peeled;
        order.extend(between);
        order.extend(drained);

        Schedule { order, cyclic }
    }
}

/// Depth-first search for a path from `start` back to itself within `within`
fn reaches_itself(
    start: CellAddress,
    edges: &AHashMap<CellAddress, Vec<CellAddress>>,
    within: &AHashSet<CellAddress>,
) -> bool {
    let mut visited = AHashSet::new();
    let mut stack = vec![start];

    while let Some(node) = stack.pop() {
        for &target in edges.get(&node).into_iter().flatten() {
            if target == start {
                return true;
            }
            if within.contains(&target) && visited.insert(target) {
                stack.push(target);
            }
        }
    }

    false
}
