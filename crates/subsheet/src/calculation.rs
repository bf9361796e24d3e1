//! Worksheet calculation engine
//!
//! Recomputes every formula cell of a worksheet in dependency order and
//! marks cross-cell cycles.
//!
//! # Example
//!
//! ```rust
//! use subsheet::prelude::*;
//!
//! let mut sheet = Worksheet::default();
//! sheet.set_cell("A1", "10").unwrap();
//! sheet.set_cell("A2", "20").unwrap();
//! sheet.set_cell("A3", "=A1+A2").unwrap();
//!
//! // Calculate all formulas
//! let stats = sheet.calculate().unwrap();
//! assert_eq!(stats.cells_calculated, 1);
//! assert_eq!(sheet.get_display("A3").unwrap(), "30");
//! ```

use crate::{
    evaluate_source, CellAddress, EvalError, EvalResult, EvaluationContext, FormulaError,
    Result, Worksheet,
};
use ahash::AHashSet;
use subsheet_formula::dependency::{formula_references, DependencyGraph, Schedule};
use subsheet_formula::{CellQuery, EvalDepth, CIRCULAR_REFERENCE_MARKER, DEFAULT_MAX_DEPTH};
use tracing::{debug, trace, warn};

/// Options for worksheet calculation
#[derive(Debug, Clone)]
pub struct CalculationOptions {
    /// Ceiling for nested cell reads (default: 128)
    pub max_depth: usize,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Total number of formula cells
    pub formula_count: usize,
    /// Number of cells evaluated
    pub cells_calculated: usize,
    /// Number of formula cells left showing an error marker
    pub errors: usize,
    /// Number of cells caught in cross-cell cycles
    pub circular_references: usize,
}

/// Extension trait for Worksheet to add calculation methods
pub trait WorksheetCalculationExt {
    /// Calculate all formulas in the worksheet with default options
    fn calculate(&mut self) -> Result<CalculationStats>;

    /// Calculate all formulas with custom options
    fn calculate_with_options(&mut self, options: &CalculationOptions) -> Result<CalculationStats>;

    /// Evaluate a single cell, recomputing the formula cells it reads
    ///
    /// Returns the cell's new display text.
    fn evaluate_cell(&mut self, address: CellAddress) -> Result<String>;

    /// Store raw content, then recalculate the whole sheet
    fn set_and_calculate(&mut self, address: CellAddress, content: &str) -> Result<CalculationStats>;
}

impl WorksheetCalculationExt for Worksheet {
    fn calculate(&mut self) -> Result<CalculationStats> {
        self.calculate_with_options(&CalculationOptions::default())
    }

    fn calculate_with_options(&mut self, options: &CalculationOptions) -> Result<CalculationStats> {
        let mut stats = CalculationStats::default();

        // Phase 1: Scan formulas and build the dependency graph
        let graph = build_dependency_graph(self);
        stats.formula_count = graph.len();

        if stats.formula_count == 0 {
            return Ok(stats);
        }

        // Phase 2: Order cells and find cycles
        let Schedule { order, cyclic } = graph.schedule();
        debug!(order = ?order, "computed evaluation order");
        stats.circular_references = cyclic.len();

        let mut pass = Recalculation::new(self, options.max_depth);

        // Phase 3: Mark cycles
        if !cyclic.is_empty() {
            warn!(cells = ?cyclic, "circular reference between cells");
            for &address in &cyclic {
                pass.resolve(address, CIRCULAR_REFERENCE_MARKER.to_string());
                pass.errors += 1;
            }
        }

        // Phase 4: Calculate cells in order
        for &address in &order {
            if pass.is_resolved(address) {
                continue;
            }
            if let Err(e) = pass.compute(address, EvalDepth::default()) {
                warn!(cell = %address, error = %e, "calculation failed");
            }
        }

        stats.cells_calculated = pass.calculated;
        stats.errors = pass.errors;
        debug!(?stats, "calculation finished");

        Ok(stats)
    }

    fn evaluate_cell(&mut self, address: CellAddress) -> Result<String> {
        if !self.is_formula_at(address) {
            return Ok(self.display_text_at(address)?.to_string());
        }

        let mut pass = Recalculation::new(self, DEFAULT_MAX_DEPTH);
        match pass.compute(address, EvalDepth::default()) {
            Ok(text) => Ok(text),
            Err(e) => Ok(FormulaError::from(e).marker()),
        }
    }

    fn set_and_calculate(&mut self, address: CellAddress, content: &str) -> Result<CalculationStats> {
        self.set_content_at(address, content)?;
        self.calculate()
    }
}

/// Build the reference graph of every formula cell
///
/// References outside the grid are dropped; formulas that fail to
/// tokenize have no references.
fn build_dependency_graph(sheet: &Worksheet) -> DependencyGraph {
    let mut graph = DependencyGraph::new();

    for (address, source) in sheet.formula_cells() {
        let references = formula_references(source)
            .into_iter()
            .filter(|r| sheet.contains(r));
        graph.add_cell(address, references);
    }

    graph
}

/// State of one recalculation pass
///
/// Serves as the evaluator's view of the sheet. A formula cell read before
/// it is resolved in this pass is computed on the spot.
struct Recalculation<'a> {
    sheet: &'a mut Worksheet,
    resolved: AHashSet<CellAddress>,
    /// Cell whose formula is being evaluated
    current: CellAddress,
    max_depth: usize,
    calculated: usize,
    errors: usize,
}

impl<'a> Recalculation<'a> {
    fn new(sheet: &'a mut Worksheet, max_depth: usize) -> Self {
        Self {
            sheet,
            resolved: AHashSet::new(),
            current: CellAddress::new(1, 1),
            max_depth,
            calculated: 0,
            errors: 0,
        }
    }

    fn is_resolved(&self, address: CellAddress) -> bool {
        self.resolved.contains(&address)
    }

    fn resolve(&mut self, address: CellAddress, text: String) {
        if let Some(cell) = self.sheet.cell_at_mut(address) {
            cell.set_display(text);
        }
        self.resolved.insert(address);
    }

    /// Evaluate a formula cell and store its display text
    ///
    /// Errors render as markers, except that recursion exhaustion inside a
    /// nested read is handed back to the reader and leaves the cell
    /// unresolved.
    fn compute(&mut self, address: CellAddress, depth: EvalDepth) -> EvalResult<String> {
        let source = match self.sheet.cell_at(address).and_then(|c| c.formula_source()) {
            Some(source) => source.to_string(),
            None => return self.display_text(address),
        };

        let previous = std::mem::replace(&mut self.current, address);
        let max_depth = self.max_depth;
        let result = {
            let mut ctx = EvaluationContext::new(self)
                .with_max_depth(max_depth)
                .with_depth(depth);
            evaluate_source(&source, &mut ctx)
        };
        self.current = previous;

        let text = match result.and_then(|value| Ok(value.to_display_text()?)) {
            Ok(text) => text,
            Err(FormulaError::Eval(EvalError::CircularReference)) if depth.reads > 0 => {
                return Err(EvalError::CircularReference);
            }
            Err(e) => {
                debug!(cell = %address, error = %e, "formula error");
                self.errors += 1;
                e.marker()
            }
        };

        debug!(cell = %address, display = %text, "calculated");
        self.calculated += 1;
        self.resolve(address, text.clone());
        Ok(text)
    }

    fn display_text(&self, address: CellAddress) -> EvalResult<String> {
        self.sheet
            .display_text_at(address)
            .map(str::to_string)
            .map_err(|_| EvalError::InvalidCell)
    }
}

impl CellQuery for Recalculation<'_> {
    fn read_display_text(&mut self, address: CellAddress, depth: EvalDepth) -> EvalResult<String> {
        if !self.sheet.contains(&address) {
            return Err(EvalError::InvalidCell);
        }

        if self.sheet.is_formula_at(address) && !self.is_resolved(address) {
            trace!(
                cell = %address,
                reader = %self.current,
                reads = depth.reads,
                "computing referenced cell"
            );
            return self.compute(address, depth);
        }

        self.display_text(address)
    }

    fn self_address(&self) -> CellAddress {
        self.current
    }
}
