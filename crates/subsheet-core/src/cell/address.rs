//! Cell address and range types

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g., "A1", "AB23")
///
/// Both coordinates are 1-based: column `A` is 1, `Z` is 26, `AA` is 27, and
/// row `1` is the first row. The textual form is one or more uppercase column
/// letters followed by the decimal row number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    /// Row index (1-based)
    pub row: u32,
    /// Column index (1-based, A=1, B=2, ...)
    pub col: u32,
}

impl CellAddress {
    /// Create a new cell address from a 1-based column and row
    pub fn new(col: u32, row: u32) -> Self {
        Self { row, col }
    }

    /// Parse a cell address from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use subsheet_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("A1").unwrap();
    /// assert_eq!(addr.col, 1);
    /// assert_eq!(addr.row, 1);
    ///
    /// let addr = CellAddress::parse("AB23").unwrap();
    /// assert_eq!(addr.col, 28);
    /// assert_eq!(addr.row, 23);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let bytes = s.as_bytes();
        let mut pos = 0;

        while pos < bytes.len() && bytes[pos].is_ascii_uppercase() {
            pos += 1;
        }

        if pos == 0 {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }

        let col = Self::letters_to_column(&s[..pos])?;

        let row_str = &s[pos..];
        if row_str.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }
        if !row_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAddress(format!(
                "invalid row number in '{}'",
                s
            )));
        }
        // Leading zeros would not survive rendering
        if row_str.starts_with('0') {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{}'",
                s
            )));
        }

        let row: u32 = row_str
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("row number too large in '{}'", s)))?;

        Ok(Self { row, col })
    }

    /// Convert a 1-based column index to letters (1 = A, 26 = Z, 27 = AA, etc.)
    pub fn column_to_letters(col: u32) -> String {
        let mut result = String::new();
        let mut n = col;

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Convert uppercase column letters to a 1-based index (A = 1, Z = 26, AA = 27, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_uppercase() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col
                .checked_mul(26)
                .and_then(|v| v.checked_add(c as u32 - 'A' as u32 + 1))
                .ok_or_else(|| Error::InvalidAddress(format!("column too large: {}", letters)))?;
        }

        Ok(col)
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        let mut result = Self::column_to_letters(self.col);
        result.push_str(&self.row.to_string());
        result
    }

    /// Create a range from this address to another
    pub fn to(&self, other: CellAddress) -> CellRange {
        CellRange::new(*self, other)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// An inclusive rectangle of cells (e.g., "A1..B3")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        // Normalize so start is top-left and end is bottom-right
        let (start_row, end_row) = if start.row <= end.row {
            (start.row, end.row)
        } else {
            (end.row, start.row)
        };

        let (start_col, end_col) = if start.col <= end.col {
            (start.col, end.col)
        } else {
            (end.col, start.col)
        };

        Self {
            start: CellAddress::new(start_col, start_row),
            end: CellAddress::new(end_col, end_row),
        }
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Parse a range from `A1..B3` notation
    pub fn parse(s: &str) -> Result<Self> {
        match s.split_once("..") {
            Some((start, end)) => Ok(Self::new(
                CellAddress::parse(start)?,
                CellAddress::parse(end)?,
            )),
            None => Ok(Self::single(CellAddress::parse(s)?)),
        }
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Get the total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.col_count() as u64
    }

    /// Iterate over all cell addresses in the range (row by row, column fastest)
    pub fn cells(&self) -> CellRangeIterator {
        CellRangeIterator {
            range: *self,
            current_row: self.start.row,
            current_col: self.start.col,
            remaining: self.cell_count(),
        }
    }

    /// Format as `A1..B3`
    pub fn to_a1_string(&self) -> String {
        format!("{}..{}", self.start, self.end)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Iterator over cells in a range
pub struct CellRangeIterator {
    range: CellRange,
    current_row: u32,
    current_col: u32,
    remaining: u64,
}

impl Iterator for CellRangeIterator {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let addr = CellAddress::new(self.current_col, self.current_row);
        self.remaining -= 1;

        if self.current_col == self.range.end.col {
            self.current_col = self.range.start.col;
            self.current_row = self.current_row.saturating_add(1);
        } else {
            self.current_col += 1;
        }

        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CellRangeIterator {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(CellAddress::column_to_letters(1), "A");
        assert_eq!(CellAddress::column_to_letters(2), "B");
        assert_eq!(CellAddress::column_to_letters(26), "Z");
        assert_eq!(CellAddress::column_to_letters(27), "AA");
        assert_eq!(CellAddress::column_to_letters(28), "AB");
        assert_eq!(CellAddress::column_to_letters(702), "ZZ");
        assert_eq!(CellAddress::column_to_letters(703), "AAA");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(CellAddress::letters_to_column("A").unwrap(), 1);
        assert_eq!(CellAddress::letters_to_column("Z").unwrap(), 26);
        assert_eq!(CellAddress::letters_to_column("AA").unwrap(), 27);
        assert_eq!(CellAddress::letters_to_column("ZZ").unwrap(), 702);

        assert!(CellAddress::letters_to_column("a").is_err());
    }

    #[test]
    fn test_cell_address_parse() {
        let addr = CellAddress::parse("A1").unwrap();
        assert_eq!(addr, CellAddress::new(1, 1));

        let addr = CellAddress::parse("C7").unwrap();
        assert_eq!(addr.col, 3);
        assert_eq!(addr.row, 7);

        let addr = CellAddress::parse("AB23").unwrap();
        assert_eq!(addr, CellAddress::new(28, 23));
    }

    #[test]
    fn test_cell_address_parse_errors() {
        assert!(CellAddress::parse("").is_err());
        assert!(CellAddress::parse("A").is_err());
        assert!(CellAddress::parse("1").is_err());
        assert!(CellAddress::parse("A0").is_err());
        assert!(CellAddress::parse("A01").is_err());
        assert!(CellAddress::parse("a1").is_err());
        assert!(CellAddress::parse("A1B").is_err());
        assert!(CellAddress::parse("A99999999999").is_err());
    }

    #[test]
    fn test_cell_address_display() {
        assert_eq!(CellAddress::new(1, 1).to_string(), "A1");
        assert_eq!(CellAddress::new(3, 100).to_string(), "C100");
        assert_eq!(CellAddress::new(27, 4).to_string(), "AA4");
    }

    #[test]
    fn test_cell_range_parse() {
        let range = CellRange::parse("A1..B2").unwrap();
        assert_eq!(range.start, CellAddress::new(1, 1));
        assert_eq!(range.end, CellAddress::new(2, 2));

        let range = CellRange::parse("C3").unwrap();
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn test_cell_range_normalizes() {
        let range = CellRange::new(CellAddress::new(3, 4), CellAddress::new(1, 2));
        assert_eq!(range.start, CellAddress::new(1, 2));
        assert_eq!(range.end, CellAddress::new(3, 4));
        assert_eq!(range.to_string(), "A2..C4");
    }

    #[test]
    fn test_cell_range_contains() {
        let range = CellRange::parse("B2..D4").unwrap();

        assert!(range.contains(&CellAddress::new(2, 2)));
        assert!(range.contains(&CellAddress::new(4, 4)));
        assert!(range.contains(&CellAddress::new(3, 3)));

        assert!(!range.contains(&CellAddress::new(1, 1)));
        assert!(!range.contains(&CellAddress::new(2, 5)));
    }

    #[test]
    fn test_cell_range_iterator() {
        let range = CellRange::parse("A1..B2").unwrap();
        let cells: Vec<_> = range.cells().map(|a| a.to_string()).collect();

        assert_eq!(cells, vec!["A1", "B1", "A2", "B2"]);
        assert_eq!(range.cells().len(), 4);
    }

    proptest! {
        #[test]
        fn address_text_round_trips(col in 1u32..20_000, row in 1u32..1_000_000) {
            let text = CellAddress::new(col, row).to_string();
            let parsed = CellAddress::parse(&text).unwrap();
            prop_assert_eq!(parsed.to_string(), text);
            prop_assert_eq!(parsed, CellAddress::new(col, row));
        }

        #[test]
        fn range_expansion_covers_rectangle(
            c1 in 1u32..30, r1 in 1u32..30, c2 in 1u32..30, r2 in 1u32..30,
        ) {
            let range = CellRange::new(CellAddress::new(c1, r1), CellAddress::new(c2, r2));
            let cells: Vec<_> = range.cells().collect();

            let expected = (c1.abs_diff(c2) as usize + 1) * (r1.abs_diff(r2) as usize + 1);
            prop_assert_eq!(cells.len(), expected);

            let unique: HashSet<_> = cells.iter().copied().collect();
            prop_assert_eq!(unique.len(), expected);

            // Row-major: rows never decrease, columns increase within a row
            for pair in cells.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                prop_assert!(b.row > a.row || (b.row == a.row && b.col == a.col + 1));
            }
        }
    }
}
