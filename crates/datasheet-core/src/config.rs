//! Reserved names and markers shared by every grid layout.

/// Header name of the key column. The first header cell of every sheet must
/// match this exactly.
pub const KEY_COLUMN: &str = "Id";

/// Separator between path segments in a column header.
pub const PATH_DELIMITER: &str = ":";

/// Rows and columns whose first cell starts with this marker are skipped.
pub const COMMENT_MARKER: &str = "$";
