//! Structured problem reporting with explicit scope.
//!
//! Every recoverable problem is recorded as an [`Event`] carrying the table
//! name, record key, element index, and column path it occurred at, passed
//! down the import/export call chain as plain data. Events are additionally
//! mirrored to the `log` facade for hosts that install a logger.

use std::fmt;

use serde::Serialize;

use crate::error::TableError;

/// How bad a reported problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// Which class of problem an event reports. Mirrors [`TableError`] variants
/// so callers can filter without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProblemKind {
    SchemaMismatch,
    Conversion,
    UnknownColumn,
    DuplicateKey,
    MalformedSource,
    UnresolvedReference,
    Verification,
    Page,
}

impl TableError {
    /// The [`ProblemKind`] this error reports as.
    pub fn kind(&self) -> ProblemKind {
        match self {
            TableError::SchemaMismatch { .. } => ProblemKind::SchemaMismatch,
            TableError::Conversion { .. } => ProblemKind::Conversion,
            TableError::UnknownColumn { .. } => ProblemKind::UnknownColumn,
            TableError::DuplicateKey { .. } => ProblemKind::DuplicateKey,
            TableError::MalformedSource { .. } => ProblemKind::MalformedSource,
            TableError::UnresolvedReference { .. } => ProblemKind::UnresolvedReference,
            TableError::Verification(_) => ProblemKind::Verification,
            TableError::Page(_) => ProblemKind::Page,
        }
    }
}

/// Where a problem happened: table, record key, element index, column path.
/// All parts are optional; whatever is known at the report site is filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scope {
    pub table: Option<String>,
    pub record: Option<String>,
    pub element: Option<usize>,
    pub column: Option<String>,
}

impl Scope {
    pub fn table(name: impl Into<String>) -> Self {
        Scope {
            table: Some(name.into()),
            ..Scope::default()
        }
    }

    pub fn with_record(mut self, key: impl Into<String>) -> Self {
        self.record = Some(key.into());
        self
    }

    pub fn with_element(mut self, index: usize) -> Self {
        self.element = Some(index);
        self
    }

    pub fn with_column(mut self, path: impl Into<String>) -> Self {
        self.column = Some(path.into());
        self
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        let mut part = |f: &mut fmt::Formatter<'_>, label: &str, text: &str| -> fmt::Result {
            if wrote {
                write!(f, ", ")?;
            }
            wrote = true;
            write!(f, "{label} {text}")
        };
        write!(f, "[")?;
        if let Some(t) = &self.table {
            part(f, "table", t)?;
        }
        if let Some(r) = &self.record {
            part(f, "row", r)?;
        }
        if let Some(e) = self.element {
            part(f, "elem", &e.to_string())?;
        }
        if let Some(c) = &self.column {
            part(f, "column", c)?;
        }
        write!(f, "]")
    }
}

/// One reported problem.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub severity: Severity,
    pub kind: ProblemKind,
    pub message: String,
    pub scope: Scope,
}

/// Collector for the problems of one load/store/verify pass.
#[derive(Debug, Default)]
pub struct Diagnostics {
    events: Vec<Event>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error-severity problem.
    pub fn error(&mut self, scope: Scope, err: &TableError) {
        self.push(Severity::Error, scope, err);
    }

    /// Record a warning-severity problem.
    pub fn warning(&mut self, scope: Scope, err: &TableError) {
        self.push(Severity::Warning, scope, err);
    }

    fn push(&mut self, severity: Severity, scope: Scope, err: &TableError) {
        let message = err.to_string();
        match severity {
            Severity::Error => log::error!(target: "datasheet", "{scope} {message}"),
            Severity::Warning => log::warn!(target: "datasheet", "{scope} {message}"),
        }
        self.events.push(Event {
            severity,
            kind: err.kind(),
            message,
            scope,
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn errors(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|e| e.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Append all events from another collector, preserving order.
    pub fn merge(&mut self, other: Diagnostics) {
        self.events.extend(other.events);
    }

    /// Panic with a listing of all events if any error was recorded.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn assert_no_errors(&self) {
        if self.has_errors() {
            let listing: Vec<String> = self
                .events
                .iter()
                .map(|e| format!("{:?} {} {}", e.severity, e.scope, e.message))
                .collect();
            panic!("unexpected diagnostics:\n{}", listing.join("\n"));
        }
    }
}
