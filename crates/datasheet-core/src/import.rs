//! Grid import: reconstructing keyed records from a cell grid.
//!
//! The grid layout is: a header block naming one column path per physical
//! column, then data rows until the first fully empty row. A data row with a
//! non-empty key cell starts a new record; rows with an empty key cell
//! continue the previous record as further element entries. Rows and columns
//! whose name starts with the comment marker are skipped.

use crate::config;
use crate::convert::{DefaultConverter, ValueConverter};
use crate::diag::{Diagnostics, Scope};
use crate::error::{PageError, TableError};
use crate::page::{GridPage, PageSource};
use crate::record::Record;
use crate::schema::Schema;
use crate::table::Table;

/// Produces one table per sheet name.
pub trait SheetImporter {
    /// Import the named sheet. `Ok(None)` means the source has no usable
    /// sheet of that name; recoverable problems go to `diag`.
    fn import(
        &self,
        sheet: &str,
        schema: &Schema,
        diag: &mut Diagnostics,
    ) -> Result<Option<Table>, PageError>;
}

/// Imports grid pages from any [`PageSource`].
pub struct GridImporter<S> {
    source: S,
    converter: Box<dyn ValueConverter>,
}

impl<S: PageSource> GridImporter<S> {
    pub fn new(source: S) -> Self {
        GridImporter {
            source,
            converter: Box::new(DefaultConverter::utc()),
        }
    }

    pub fn with_converter(source: S, converter: Box<dyn ValueConverter>) -> Self {
        GridImporter { source, converter }
    }
}

impl<S: PageSource> SheetImporter for GridImporter<S> {
    fn import(
        &self,
        sheet: &str,
        schema: &Schema,
        diag: &mut Diagnostics,
    ) -> Result<Option<Table>, PageError> {
        let Some(page) = self.source.page(sheet)? else {
            return Ok(None);
        };
        Ok(import_page(&*page, sheet, schema, &*self.converter, diag))
    }
}

// ============================================================================
// Page walk
// ============================================================================

/// A column counts while any cell up to the current row gives it extent.
fn is_valid_column(page: &dyn GridPage, col: usize, row: usize) -> bool {
    (0..=row).any(|r| page.cell(col, r).is_some())
}

/// A row is empty when every column with extent is empty at it.
fn is_empty_row(page: &dyn GridPage, row: usize) -> bool {
    let mut col = 0;
    while is_valid_column(page, col, row) {
        if page.cell(col, row).is_some() {
            return false;
        }
        col += 1;
    }
    true
}

/// Reconstruct full column paths from the header block. Header cells are
/// sticky: a split header leaves prefix cells blank and they carry over from
/// the previous column. A column's depth is its own last non-empty header row.
fn read_columns(page: &dyn GridPage, header_rows: usize) -> Vec<String> {
    let mut columns = Vec::new();
    let mut segments: Vec<String> = vec![String::new(); header_rows];

    for col in 0.. {
        let mut last_valid = None;
        for (row, segment) in segments.iter_mut().enumerate() {
            if let Some(text) = page.cell(col, row) {
                *segment = text.to_string();
                last_valid = Some(row);
            }
        }
        let Some(last_valid) = last_valid else { break };
        columns.push(segments[..=last_valid].join(config::PATH_DELIMITER));
    }
    columns
}

/// Import one page into a table. Returns `None` when the page cannot be read
/// as a table at all; partial problems leave their records out and the rest
/// of the table loads.
pub fn import_page(
    page: &dyn GridPage,
    sheet: &str,
    schema: &Schema,
    converter: &dyn ValueConverter,
    diag: &mut Diagnostics,
) -> Option<Table> {
    if is_empty_row(page, 0) {
        diag.warning(
            Scope::table(sheet),
            &TableError::MalformedSource {
                sheet: sheet.to_string(),
            },
        );
        return None;
    }

    let first = page.cell(0, 0).unwrap_or("");
    if first != config::KEY_COLUMN {
        diag.error(
            Scope::table(sheet),
            &TableError::SchemaMismatch {
                expected: config::KEY_COLUMN,
                found: first.to_string(),
            },
        );
        return None;
    }

    let mut header_rows = 1;
    while page.cell(0, header_rows).is_none() && !is_empty_row(page, header_rows) {
        header_rows += 1;
    }
    let columns = read_columns(page, header_rows);

    let mut table = Table::new(sheet);
    let mut current: Option<Record> = None;
    let mut elem_row = 0;

    let mut row = header_rows;
    while !is_empty_row(page, row) {
        let id_cell = page.cell(0, row).unwrap_or("");

        if !id_cell.is_empty() {
            // Comment rows neither start a record nor advance the element
            // cursor of the current one.
            if id_cell.starts_with(config::COMMENT_MARKER) {
                row += 1;
                continue;
            }
            commit(&mut table, current.take(), sheet, diag);
            current = Some(Record::unkeyed(schema.def()));
            elem_row = 0;
        }

        if let Some(record) = current.as_mut() {
            for (col, path) in columns.iter().enumerate() {
                if path.starts_with(config::COMMENT_MARKER) {
                    continue;
                }
                let Some(text) = page.cell(col, row) else {
                    continue;
                };
                if let Err(err) = schema.bind(record, elem_row, path, text, converter) {
                    let key = if record.key().is_empty() {
                        id_cell
                    } else {
                        record.key()
                    };
                    let mut scope = Scope::table(sheet).with_column(path.as_str());
                    if !key.is_empty() {
                        scope = scope.with_record(key);
                    }
                    diag.error(scope, &err);
                }
            }
            elem_row += 1;
        }

        row += 1;
    }
    commit(&mut table, current.take(), sheet, diag);

    Some(table)
}

/// Finish the pending record. A record whose key never converted stays out
/// silently (the cell failure was already reported); a key collision keeps
/// the earlier record and reports the later one.
fn commit(table: &mut Table, record: Option<Record>, sheet: &str, diag: &mut Diagnostics) {
    let Some(record) = record else { return };
    if record.key().is_empty() {
        return;
    }
    let key = record.key().to_string();
    if let Err(err) = table.insert(record) {
        diag.error(Scope::table(sheet).with_record(key), &err);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::ProblemKind;
    use crate::page::{Grid, MemorySource};
    use crate::test_utils::fixtures;
    use crate::value::Value;

    fn import_grid(grid: Grid, schema: &Schema) -> (Option<Table>, Diagnostics) {
        let mut source = MemorySource::new();
        source.insert("Tests", grid);
        let importer = GridImporter::new(source);
        let mut diag = Diagnostics::new();
        let table = importer.import("Tests", schema, &mut diag).unwrap();
        (table, diag)
    }

    #[test]
    fn missing_sheet_is_absent_without_events() {
        let importer = GridImporter::new(MemorySource::new());
        let mut diag = Diagnostics::new();
        let schema = Schema::compile(fixtures::basic_def());
        let table = importer.import("Tests", &schema, &mut diag).unwrap();
        assert!(table.is_none());
        assert!(diag.events().is_empty());
    }

    #[test]
    fn imports_simple_rows() {
        let grid = Grid::from_rows([
            vec!["Id", "Content"],
            vec!["Alpha", "First"],
            vec!["Bravo", "Second"],
        ]);
        let schema = Schema::compile(fixtures::basic_def());
        let (table, diag) = import_grid(grid, &schema);
        diag.assert_no_errors();

        let table = table.unwrap();
        assert_eq!(table.len(), 2);
        let record = table.get("Alpha").unwrap();
        let content = schema.enumerate_body(record);
        assert_eq!(content[0].1.as_str(), Some("First"));
    }

    #[test]
    fn continuation_rows_become_elements() {
        let grid = Grid::from_rows([
            vec!["Id", "Content", "ElemContent"],
            vec!["TestId", "TestContent", "TestElemContent1"],
            vec!["", "", "TestElemContent2"],
        ]);
        let schema = Schema::compile(fixtures::array_def());
        let (table, diag) = import_grid(grid, &schema);
        diag.assert_no_errors();

        let table = table.unwrap();
        let record = table.get("TestId").unwrap();
        assert_eq!(record.element_count(), 2);
        assert_eq!(
            schema.enumerate_element(&record.elements()[1])[0].1,
            &Value::Str("TestElemContent2".to_string())
        );
    }

    #[test]
    fn split_headers_reconstruct_nested_paths() {
        let grid = Grid::from_rows([
            vec!["Id", "Struct", "", "StructList", ""],
            vec!["", "XInt", "YFloat", "1", "2"],
            vec!["", "", "", "XInt", "XInt"],
            vec!["Row", "1", "0.5", "7", "8"],
        ]);
        let schema = Schema::compile(fixtures::nested_def());
        let (table, diag) = import_grid(grid, &schema);
        diag.assert_no_errors();

        let table = table.unwrap();
        let record = table.get("Row").unwrap();
        let paths: Vec<String> = schema
            .enumerate_body(record)
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        assert_eq!(
            paths,
            vec![
                "Struct:XInt",
                "Struct:YFloat",
                "StructList:1:XInt",
                "StructList:2:XInt"
            ]
        );
    }

    #[test]
    fn comment_rows_and_columns_are_skipped() {
        let grid = Grid::from_rows([
            vec!["Id", "$Note", "Content", "ElemContent"],
            vec!["A", "ignored", "Body", "E1"],
            vec!["$comment", "x", "y", "z"],
            vec!["", "", "", "E2"],
        ]);
        let schema = Schema::compile(fixtures::array_def());
        let (table, diag) = import_grid(grid, &schema);
        diag.assert_no_errors();

        let table = table.unwrap();
        let record = table.get("A").unwrap();
        // The comment row does not advance the element cursor.
        assert_eq!(record.element_count(), 2);
    }

    #[test]
    fn duplicate_keys_keep_first_and_report_each_later_one() {
        let grid = Grid::from_rows([
            vec!["Id", "Content"],
            vec!["A", "1"],
            vec!["B", "1"],
            vec!["A", "2"],
            vec!["B", "2"],
        ]);
        let schema = Schema::compile(fixtures::basic_def());
        let (table, diag) = import_grid(grid, &schema);

        let table = table.unwrap();
        assert_eq!(table.len(), 2);
        let record = table.get("A").unwrap();
        assert_eq!(schema.enumerate_body(record)[0].1.as_str(), Some("1"));
        assert_eq!(diag.error_count(), 2);
        assert!(diag
            .errors()
            .all(|e| e.kind == ProblemKind::DuplicateKey));
    }

    #[test]
    fn bad_cells_report_and_leave_the_rest_loaded() {
        let grid = Grid::from_rows([
            vec!["Id", "IntColumn"],
            vec!["Alpha", "oops"],
            vec!["Bravo", "3"],
        ]);
        let schema = Schema::compile(fixtures::types_def());
        let (table, diag) = import_grid(grid, &schema);

        let table = table.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(diag.error_count(), 1);
        let event = diag.errors().next().unwrap();
        assert_eq!(event.kind, ProblemKind::Conversion);
        assert_eq!(event.scope.column.as_deref(), Some("IntColumn"));
        assert_eq!(event.scope.record.as_deref(), Some("Alpha"));
    }

    #[test]
    fn unconvertible_key_drops_the_whole_record() {
        let grid = Grid::from_rows([
            vec!["Id", "IntColumn"],
            vec!["NotAVariant", "1"],
            vec!["Alpha", "2"],
        ]);
        let schema = Schema::compile(fixtures::types_def());
        let (table, diag) = import_grid(grid, &schema);

        let table = table.unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.get("Alpha").is_some());
        assert_eq!(diag.error_count(), 1);
    }

    #[test]
    fn empty_page_is_malformed_warning() {
        let schema = Schema::compile(fixtures::basic_def());
        let (table, diag) = import_grid(Grid::new(), &schema);
        assert!(table.is_none());
        assert_eq!(diag.events().len(), 1);
        assert_eq!(diag.events()[0].kind, ProblemKind::MalformedSource);
        assert!(!diag.has_errors());
    }

    #[test]
    fn wrong_first_header_is_a_schema_mismatch() {
        let grid = Grid::from_rows([vec!["Key", "Content"], vec!["A", "x"]]);
        let schema = Schema::compile(fixtures::basic_def());
        let (table, diag) = import_grid(grid, &schema);
        assert!(table.is_none());
        assert_eq!(diag.error_count(), 1);
        assert_eq!(diag.events()[0].kind, ProblemKind::SchemaMismatch);
    }
}
