//! Datasheet Core -- a data-table codec for game and application configuration.
//!
//! This crate converts between spreadsheet-like cell grids and strongly
//! shaped, keyed records: nested structs, lists, dictionaries, element
//! arrays, and weak cross-table references, with verification on top.
//!
//! # Load Lifecycle
//!
//! A [`container::Container`] is declared once from record definitions and
//! then cycles through a fixed sequence:
//!
//! 1. **Load** -- Each declared table is imported from a
//!    [`import::SheetImporter`]; recoverable problems are collected as
//!    [`diag::Diagnostics`] events and the rest of the data still loads.
//! 2. **Post-load** -- Weak references are resolved to record handles,
//!    silently leaving dangling keys unresolved.
//! 3. **Verify** -- Dangling references and annotated leaves are checked and
//!    reported with their full scope (table, record, element, column).
//!
//! # Key Types
//!
//! - [`descriptor::RecordDef`] -- Declares a record type: key kind, body
//!   fields, and an optional element array.
//! - [`schema::Schema`] -- A compiled definition; binds column paths into
//!   records and enumerates them back out.
//! - [`container::Container`] -- The named table set plus lifecycle.
//! - [`value::RefValue`] -- A foreign key with a lazily resolved handle;
//!   handles are invalidated by the next load.
//! - [`import::GridImporter`] / [`export::GridExporter`] -- The shared grid
//!   codec any cell-addressed format plugs into via [`page::PageSource`] and
//!   [`page::PageSink`].

pub mod config;
pub mod container;
pub mod convert;
pub mod descriptor;
pub mod diag;
pub mod error;
pub mod export;
pub mod import;
pub mod page;
pub mod record;
mod resolve;
pub mod schema;
pub mod table;
pub mod value;
pub mod verify;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
