//! Error types for the mapping engine and its page boundary.
//!
//! Per-cell and per-row failures are recovered locally and reported through
//! [`crate::diag::Diagnostics`]; only a page-level failure or a header
//! mismatch may abort a single table's import, and nothing aborts the whole
//! container load.

use std::path::PathBuf;

/// A problem detected while mapping between grids and records.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// The first header cell does not name the key column.
    #[error("first header column must be named \"{expected}\", found \"{found}\"")]
    SchemaMismatch {
        expected: &'static str,
        found: String,
    },

    /// A cell's text cannot become the target leaf type.
    #[error("cannot convert \"{text}\" to {kind}")]
    Conversion { text: String, kind: String },

    /// A column path does not address any leaf of the record type.
    #[error("no column \"{path}\" in this record type")]
    UnknownColumn { path: String },

    /// A second record with an already-used key. The first record wins.
    #[error("already has row with key \"{key}\"")]
    DuplicateKey { key: String },

    /// The underlying source is not structured tabular data at all.
    /// Treated as "zero rows found"; the table ends up absent.
    #[error("source for \"{sheet}\" is not tabular data")]
    MalformedSource { sheet: String },

    /// A non-empty reference key that matched nothing in its target table.
    /// Only surfaced by the verification pass, never by resolution.
    #[error("unresolved reference \"{key}\" into table \"{target}\"")]
    UnresolvedReference { key: String, target: String },

    /// A host verification hook rejected a leaf value.
    #[error("{0}")]
    Verification(String),

    /// A page-level failure from the source/sink collaborator.
    #[error(transparent)]
    Page(#[from] PageError),
}

/// A failure at the page source/sink boundary.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// The page content could not be framed at all.
    #[error("unreadable page: {detail}")]
    Parse { detail: String },

    /// An I/O error while reading or writing page data.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A failure while fixing the table set of a container.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("duplicate table name \"{0}\"")]
    DuplicateTable(String),

    /// A reference field targets a table the container does not hold.
    #[error("reference at \"{table}.{path}\" targets unknown table \"{target}\"")]
    UnknownRefTarget {
        table: String,
        path: String,
        target: String,
    },
}
