//! Per-cell storage

use crate::FORMULA_SIGIL;

/// A single grid cell
///
/// `content` is what the user typed. `display` is what the grid shows: the
/// content itself for plain cells, the last computed result (or error marker)
/// for formula cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    content: String,
    display: String,
}

impl Cell {
    /// Create a cell from raw content
    pub fn new<S: Into<String>>(content: S) -> Self {
        let mut cell = Self::default();
        cell.set_content(content);
        cell
    }

    /// Raw content as entered
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Cached display text
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Whether the content starts with the formula sigil
    pub fn is_formula(&self) -> bool {
        self.content.starts_with(FORMULA_SIGIL)
    }

    /// The formula source after the sigil, if this is a formula cell
    pub fn formula_source(&self) -> Option<&str> {
        self.content.strip_prefix(FORMULA_SIGIL)
    }

    /// Replace the raw content.
    ///
    /// Plain content is mirrored into the display text right away; a formula
    /// cell keeps its previous display until it is recomputed.
    pub fn set_content<S: Into<String>>(&mut self, content: S) {
        self.content = content.into();
        if !self.is_formula() {
            self.display = self.content.clone();
        }
    }

    /// Overwrite the cached display text
    pub fn set_display<S: Into<String>>(&mut self, display: S) {
        self.display = display.into();
    }

    /// True when both content and display are empty
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.display.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_content_mirrors_display() {
        let cell = Cell::new("hello");
        assert!(!cell.is_formula());
        assert_eq!(cell.display(), "hello");
        assert_eq!(cell.formula_source(), None);
    }

    #[test]
    fn test_formula_content_keeps_display() {
        let mut cell = Cell::new("5");
        cell.set_content("=1+2");
        assert!(cell.is_formula());
        assert_eq!(cell.formula_source(), Some("1+2"));
        assert_eq!(cell.display(), "5");

        cell.set_display("3");
        assert_eq!(cell.display(), "3");
    }
}
