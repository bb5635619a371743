//! Grid export: laying keyed records back out as a cell grid.
//!
//! Columns are data-driven: the union of every present leaf path across the
//! table, key column first, then first-seen order. A record occupies one
//! physical row per element (at least one); body values and the key go on the
//! record's first physical row. Data rows are padded to the full column
//! width so the grid stays rectangular.

use std::collections::{HashMap, HashSet};

use crate::config;
use crate::convert::{DefaultConverter, ValueConverter};
use crate::diag::Diagnostics;
use crate::error::PageError;
use crate::page::{PageSink, WritePage};
use crate::schema::Schema;
use crate::table::Table;

/// Consumes one table per sheet name.
pub trait SheetExporter {
    fn export(
        &mut self,
        sheet: &str,
        schema: &Schema,
        table: &Table,
        diag: &mut Diagnostics,
    ) -> Result<(), PageError>;
}

/// Exports grid pages into any [`PageSink`].
pub struct GridExporter<S> {
    sink: S,
    converter: Box<dyn ValueConverter>,
    split_header: bool,
}

impl<S: PageSink> GridExporter<S> {
    pub fn new(sink: S) -> Self {
        GridExporter {
            sink,
            converter: Box::new(DefaultConverter::utc()),
            split_header: false,
        }
    }

    /// Lay the header out as one row per path segment instead of one row of
    /// full paths. The importer reads both layouts back identically.
    pub fn split_header(mut self, split: bool) -> Self {
        self.split_header = split;
        self
    }

    pub fn with_converter(mut self, converter: Box<dyn ValueConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: PageSink> SheetExporter for GridExporter<S> {
    fn export(
        &mut self,
        sheet: &str,
        schema: &Schema,
        table: &Table,
        _diag: &mut Diagnostics,
    ) -> Result<(), PageError> {
        let columns = collect_columns(schema, table);
        let page = self.sink.create(sheet);

        let header_rows = if self.split_header {
            write_split_header(page, &columns)
        } else {
            for (col, path) in columns.iter().enumerate() {
                page.set(col, 0, path);
            }
            1
        };

        let index: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();

        let mut row = header_rows;
        for record in table.iter() {
            let physical = if schema.has_elements() {
                record.element_count().max(1)
            } else {
                1
            };
            let mut cells = vec![vec![String::new(); columns.len()]; physical];
            cells[0][0] = record.key().to_string();

            for (path, value) in schema.enumerate_body(record) {
                if let Some(&col) = index.get(path.as_str()) {
                    cells[0][col] = self.converter.format(value);
                }
            }
            for (e, element) in record.elements().iter().enumerate() {
                for (path, value) in schema.enumerate_element(element) {
                    if let Some(&col) = index.get(path.as_str()) {
                        cells[e][col] = self.converter.format(value);
                    }
                }
            }

            for line in &cells {
                for (col, text) in line.iter().enumerate() {
                    page.set(col, row, text);
                }
                row += 1;
            }
        }
        Ok(())
    }
}

/// The union of present leaf paths across the table, key column first, then
/// in first-seen order. A path first seen on a later record lands after every
/// earlier-seen column, so sibling dictionary keys are not necessarily
/// adjacent in the header.
fn collect_columns(schema: &Schema, table: &Table) -> Vec<String> {
    let mut columns = vec![config::KEY_COLUMN.to_string()];
    let mut seen: HashSet<String> = columns.iter().cloned().collect();

    for record in table.iter() {
        for (path, _) in schema.enumerate_body(record) {
            if seen.insert(path.clone()) {
                columns.push(path);
            }
        }
        for element in record.elements() {
            for (path, _) in schema.enumerate_element(element) {
                if seen.insert(path.clone()) {
                    columns.push(path);
                }
            }
        }
    }
    columns
}

/// Write a multi-row header. Each column prints its segments starting at the
/// first depth where it diverges from the previous column; shallower shared
/// prefixes stay blank and the importer carries them over. Returns the number
/// of header rows.
fn write_split_header(page: &mut dyn WritePage, columns: &[String]) -> usize {
    let split: Vec<Vec<&str>> = columns
        .iter()
        .map(|c| c.split(config::PATH_DELIMITER).collect())
        .collect();
    let header_rows = split.iter().map(Vec::len).max().unwrap_or(1);

    let mut prev: &[&str] = &[];
    for (col, segments) in split.iter().enumerate() {
        let mut diverged = false;
        for (row, segment) in segments.iter().enumerate() {
            if !diverged && prev.get(row) == Some(segment) {
                continue;
            }
            diverged = true;
            page.set(col, row, segment);
        }
        prev = segments;
    }
    header_rows
}

// ============================================================================
// Tests
// ============================================================================
