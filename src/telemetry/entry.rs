use chrono::{Local, NaiveDateTime};
use serde_json::json;

use crate::store::Row;

/// Store-side `DateTime` text format
pub const STORE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One telemetry row for an intercepted prediction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub predicted_tip: String,
    pub words_count: i32,
    /// Local wall-clock time the request finished handling
    pub timestamp: NaiveDateTime,
}

impl LogEntry {
    /// Entry stamped with the current local time
    pub fn new(predicted_tip: impl Into<String>, words_count: i32) -> Self {
        Self::at(predicted_tip, words_count, Local::now().naive_local())
    }

    pub fn at(predicted_tip: impl Into<String>, words_count: i32, timestamp: NaiveDateTime) -> Self {
        Self {
            predicted_tip: predicted_tip.into(),
            words_count,
            timestamp,
        }
    }

    /// Values in the column order of the built-in telemetry entity
    pub fn to_row(&self) -> Row {
        vec![
            json!(self.predicted_tip),
            json!(self.words_count),
            json!(self.timestamp.format(STORE_DATETIME_FORMAT).to_string()),
        ]
    }
}
