//! Grid pages: the cell-addressed surface shared by spreadsheet-like formats.
//!
//! A page is a rectangular grid of text cells addressed as (column, row).
//! Missing and empty cells are the same thing on the read side, so format
//! backends only have to produce the cells they actually have.

use std::collections::HashMap;

use crate::error::PageError;

/// Read access to one sheet's grid.
pub trait GridPage {
    /// The cell at (column, row), or `None` when the cell is missing or
    /// empty.
    fn cell(&self, col: usize, row: usize) -> Option<&str>;
}

impl<T: GridPage + ?Sized> GridPage for &T {
    fn cell(&self, col: usize, row: usize) -> Option<&str> {
        (**self).cell(col, row)
    }
}

/// Write access to one sheet's grid. Writing past the current extent grows
/// the grid, padding with empty cells.
pub trait WritePage {
    fn set(&mut self, col: usize, row: usize, text: &str);
}

/// Supplies pages by sheet name.
pub trait PageSource {
    /// The page for a sheet, `Ok(None)` if the source has no such sheet.
    fn page(&self, sheet: &str) -> Result<Option<Box<dyn GridPage + '_>>, PageError>;
}

/// Receives pages by sheet name.
pub trait PageSink {
    fn create(&mut self, sheet: &str) -> &mut dyn WritePage;
}

/// An in-memory grid of rows of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = &'static str>,
    {
        Grid {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(str::to_string).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl GridPage for Grid {
    fn cell(&self, col: usize, row: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .filter(|c| !c.is_empty())
    }
}

impl WritePage for Grid {
    fn set(&mut self, col: usize, row: usize, text: &str) {
        while self.rows.len() <= row {
            self.rows.push(Vec::new());
        }
        let r = &mut self.rows[row];
        while r.len() <= col {
            r.push(String::new());
        }
        r[col] = text.to_string();
    }
}

/// A [`PageSource`] over named in-memory grids. Mostly for tests and for
/// formats that materialize grids up front.
#[derive(Debug, Default)]
pub struct MemorySource {
    pages: HashMap<String, Grid>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sheet: impl Into<String>, grid: Grid) {
        self.pages.insert(sheet.into(), grid);
    }
}

impl PageSource for MemorySource {
    fn page(&self, sheet: &str) -> Result<Option<Box<dyn GridPage + '_>>, PageError> {
        Ok(self
            .pages
            .get(sheet)
            .map(|g| Box::new(g) as Box<dyn GridPage + '_>))
    }
}

/// A [`PageSink`] collecting named grids in creation order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pages: Vec<(String, Grid)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid(&self, sheet: &str) -> Option<&Grid> {
        self.pages
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, g)| g)
    }

    pub fn pages(&self) -> &[(String, Grid)] {
        &self.pages
    }
}

impl PageSink for MemorySink {
    fn create(&mut self, sheet: &str) -> &mut dyn WritePage {
        self.pages.push((sheet.to_string(), Grid::new()));
        let last = self.pages.len() - 1;
        &mut self.pages[last].1
    }
}
