//! Worksheet type

use crate::cell::{Cell, CellAddress, CellRange};
use crate::error::{Error, Result};
use crate::{DEFAULT_COLS, DEFAULT_ROWS};

/// A fixed-size grid of cells
///
/// Addresses are 1-based; every address inside `rows × cols` has a cell.
#[derive(Debug, Clone)]
pub struct Worksheet {
    rows: u32,
    cols: u32,
    cells: Vec<Cell>,
}

impl Default for Worksheet {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}

impl Worksheet {
    /// Create an empty worksheet with the given dimensions
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::default(); rows as usize * cols as usize],
        }
    }

    /// Number of rows
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// The range covering the whole grid
    pub fn bounds(&self) -> Option<CellRange> {
        if self.rows == 0 || self.cols == 0 {
            return None;
        }
        Some(CellRange::new(
            CellAddress::new(1, 1),
            CellAddress::new(self.cols, self.rows),
        ))
    }

    /// Check whether an address lies inside the grid
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= 1 && addr.row <= self.rows && addr.col >= 1 && addr.col <= self.cols
    }

    fn index(&self, addr: &CellAddress) -> Result<usize> {
        if addr.row < 1 || addr.row > self.rows {
            return Err(Error::RowOutOfBounds(addr.row, self.rows));
        }
        if addr.col < 1 || addr.col > self.cols {
            return Err(Error::ColumnOutOfBounds(addr.col, self.cols));
        }
        Ok((addr.row - 1) as usize * self.cols as usize + (addr.col - 1) as usize)
    }

    /// Get a cell
    pub fn cell_at(&self, addr: CellAddress) -> Option<&Cell> {
        self.index(&addr).ok().map(|i| &self.cells[i])
    }

    /// Get a mutable cell
    pub fn cell_at_mut(&mut self, addr: CellAddress) -> Option<&mut Cell> {
        match self.index(&addr) {
            Ok(i) => Some(&mut self.cells[i]),
            Err(_) => None,
        }
    }

    /// Get a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<&Cell> {
        let addr = CellAddress::parse(address)?;
        let i = self.index(&addr)?;
        Ok(&self.cells[i])
    }

    /// Set raw content by address string
    pub fn set_cell<S: Into<String>>(&mut self, address: &str, content: S) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_content_at(addr, content)
    }

    /// Set raw content
    pub fn set_content_at<S: Into<String>>(&mut self, addr: CellAddress, content: S) -> Result<()> {
        let i = self.index(&addr)?;
        self.cells[i].set_content(content);
        Ok(())
    }

    /// Raw content of a cell
    pub fn content_at(&self, addr: CellAddress) -> Result<&str> {
        let i = self.index(&addr)?;
        Ok(self.cells[i].content())
    }

    /// Display text by address string
    pub fn get_display(&self, address: &str) -> Result<&str> {
        self.cell(address).map(Cell::display)
    }

    /// Display text of a cell
    pub fn display_text_at(&self, addr: CellAddress) -> Result<&str> {
        let i = self.index(&addr)?;
        Ok(self.cells[i].display())
    }

    /// Overwrite the cached display text of a cell
    pub fn set_display_text_at<S: Into<String>>(&mut self, addr: CellAddress, text: S) -> Result<()> {
        let i = self.index(&addr)?;
        self.cells[i].set_display(text);
        Ok(())
    }

    /// Whether the cell at `addr` holds a formula
    pub fn is_formula_at(&self, addr: CellAddress) -> bool {
        self.cell_at(addr).map_or(false, Cell::is_formula)
    }

    /// Clear a cell's content and display
    pub fn clear_cell_at(&mut self, addr: CellAddress) -> Result<()> {
        let i = self.index(&addr)?;
        self.cells[i] = Cell::default();
        Ok(())
    }

    /// Iterate over all cells with their addresses (row by row)
    pub fn cells(&self) -> impl Iterator<Item = (CellAddress, &Cell)> + '_ {
        let cols = self.cols as usize;
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let addr = CellAddress::new((i % cols) as u32 + 1, (i / cols) as u32 + 1);
            (addr, cell)
        })
    }

    /// Iterate over formula cells as `(address, formula source after the sigil)`
    pub fn formula_cells(&self) -> impl Iterator<Item = (CellAddress, &str)> + '_ {
        self.cells()
            .filter_map(|(addr, cell)| cell.formula_source().map(|src| (addr, src)))
    }

    /// Iterate over cells that have content or display text
    pub fn non_empty_cells(&self) -> impl Iterator<Item = (CellAddress, &Cell)> + '_ {
        self.cells().filter(|(_, cell)| !cell.is_empty())
    }
}
