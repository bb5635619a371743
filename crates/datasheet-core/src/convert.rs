//! String to value conversion at the cell boundary.
//!
//! The conversion function is pluggable so concrete formats can override it;
//! [`DefaultConverter`] implements the invariant rules: locale-independent
//! numeric parsing, case-insensitive booleans, case-sensitive enums, and
//! date-times interpreted in a configured fixed offset.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};

use crate::descriptor::ScalarKind;
use crate::error::TableError;
use crate::value::Value;

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_TIME_FORMAT_T: &str = "%Y-%m-%dT%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Converts cell text to leaf values and back.
pub trait ValueConverter: Send + Sync {
    /// Convert cell text into a value of the given kind. A failure is
    /// reported per cell by the caller; it never aborts a row.
    fn parse(&self, kind: &ScalarKind, text: &str) -> Result<Value, TableError>;

    /// Render a leaf value back to cell text. Not-present values render as
    /// the empty cell.
    fn format(&self, value: &Value) -> String;
}

/// The standard conversion rules, parameterized by the time zone offset that
/// date-time cells are authored in.
#[derive(Debug, Clone)]
pub struct DefaultConverter {
    offset: FixedOffset,
}

impl DefaultConverter {
    pub fn utc() -> Self {
        DefaultConverter { offset: Utc.fix() }
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        DefaultConverter { offset }
    }

    fn parse_date_time(&self, text: &str) -> Option<DateTime<Utc>> {
        let naive = NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT_T))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, DATE_FORMAT)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })?;
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn conversion_error(kind: &ScalarKind, text: &str) -> TableError {
        TableError::Conversion {
            text: text.to_string(),
            kind: kind.describe(),
        }
    }
}

impl Default for DefaultConverter {
    fn default() -> Self {
        Self::utc()
    }
}

impl ValueConverter for DefaultConverter {
    fn parse(&self, kind: &ScalarKind, text: &str) -> Result<Value, TableError> {
        match kind {
            ScalarKind::Str => Ok(Value::Str(text.to_string())),
            ScalarKind::Int => text
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| Self::conversion_error(kind, text)),
            ScalarKind::Float => text
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| Self::conversion_error(kind, text)),
            ScalarKind::Bool => {
                if text.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if text.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(Self::conversion_error(kind, text))
                }
            }
            ScalarKind::DateTime => self
                .parse_date_time(text)
                .map(Value::DateTime)
                .ok_or_else(|| Self::conversion_error(kind, text)),
            // Enums never fall back to a default value on mismatch.
            ScalarKind::Enum(def) => {
                if def.contains(text) {
                    Ok(Value::Enum(text.to_string()))
                } else {
                    Err(Self::conversion_error(kind, text))
                }
            }
        }
    }

    fn format(&self, value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::Str(s) | Value::Enum(s) => s.clone(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Bool(v) => v.to_string(),
            Value::DateTime(dt) => dt
                .with_timezone(&self.offset)
                .format(DATE_TIME_FORMAT)
                .to_string(),
            // References render as their key string.
            Value::Ref(r) => r.key.clone(),
            // Containers have no cell text of their own.
            Value::List(_) | Value::Dict(_) | Value::Struct(_) => String::new(),
        }
    }
}
