//! CSV pages for datasheet tables.
//!
//! One CSV file is one sheet. The grid codec in `datasheet-core` does the
//! record work; this crate only maps CSV text to and from cell grids,
//! following RFC 4180 quoting: cells containing commas, quotes, or line
//! breaks are quoted, and quotes are doubled inside quoted cells.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use datasheet_core::error::PageError;
use datasheet_core::page::{Grid, GridPage, PageSink, PageSource, WritePage};

// ============================================================================
// Text <-> grid
// ============================================================================

/// Parse CSV text into a grid. Empty text parses as a grid with no rows.
pub fn parse_csv(text: &str) -> Grid {
    let mut grid = Grid::new();
    if text.is_empty() {
        return grid;
    }

    let mut row = 0;
    let mut col = 0;
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    let mut flush_cell = |grid: &mut Grid, row: usize, col: &mut usize, cell: &mut String| {
        grid.set(*col, row, cell);
        cell.clear();
        *col += 1;
    };

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => quoted = false,
                _ => cell.push(c),
            }
            continue;
        }
        match c {
            '"' if cell.is_empty() => quoted = true,
            ',' => flush_cell(&mut grid, row, &mut col, &mut cell),
            '\r' => {}
            '\n' => {
                flush_cell(&mut grid, row, &mut col, &mut cell);
                row += 1;
                col = 0;
            }
            _ => cell.push(c),
        }
    }
    // A final line without a trailing newline still counts.
    if !cell.is_empty() || col > 0 {
        grid.set(col, row, &cell);
    }
    grid
}

fn escape(cell: &str) -> String {
    if cell.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Render a grid as CSV text, one line per row including the last.
pub fn write_csv(grid: &Grid) -> String {
    let mut out = String::new();
    for row in grid.rows() {
        let line: Vec<String> = row.iter().map(|c| escape(c)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

// ============================================================================
// Source and sink
// ============================================================================

/// A [`PageSource`] over named CSV texts.
#[derive(Debug, Default)]
pub struct CsvSource {
    texts: HashMap<String, String>,
}

impl CsvSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sheet: impl Into<String>, text: impl Into<String>) {
        self.texts.insert(sheet.into(), text.into());
    }

    /// Read every `*.csv` file in a directory, keyed by file stem.
    pub fn from_dir(dir: &Path) -> Result<Self, PageError> {
        let io = |source| PageError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut texts = HashMap::new();
        for entry in fs::read_dir(dir).map_err(io)? {
            let path = entry.map_err(io)?.path();
            if path.extension().is_none_or(|e| e != "csv") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let text = fs::read_to_string(&path).map_err(|source| PageError::Io {
                path: path.clone(),
                source,
            })?;
            texts.insert(stem.to_string(), text);
        }
        Ok(CsvSource { texts })
    }
}

impl PageSource for CsvSource {
    fn page(&self, sheet: &str) -> Result<Option<Box<dyn GridPage + '_>>, PageError> {
        Ok(self
            .texts
            .get(sheet)
            .map(|text| Box::new(parse_csv(text)) as Box<dyn GridPage>))
    }
}

/// A [`PageSink`] rendering each exported sheet as CSV text.
#[derive(Debug, Default)]
pub struct CsvSink {
    pages: Vec<(String, Grid)>,
}

impl CsvSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The rendered CSV for a sheet, if it was exported.
    pub fn csv(&self, sheet: &str) -> Option<String> {
        self.pages
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, grid)| write_csv(grid))
    }

    /// Write every exported sheet as `<name>.csv` under a directory.
    pub fn save_dir(&self, dir: &Path) -> Result<(), PageError> {
        for (name, grid) in &self.pages {
            let path = dir.join(format!("{name}.csv"));
            fs::write(&path, write_csv(grid)).map_err(|source| PageError::Io {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

impl PageSink for CsvSink {
    fn create(&mut self, sheet: &str) -> &mut dyn WritePage {
        self.pages.push((sheet.to_string(), Grid::new()));
        let last = self.pages.len() - 1;
        &mut self.pages[last].1
    }
}
