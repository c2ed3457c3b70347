//! Analytical store access
//!
//! The telemetry pipeline only needs three things from the store: idempotent
//! table creation, batched inserts and read-only queries. [`AnalyticalStore`]
//! is that seam; [`ClickHouseClient`] implements it over the ClickHouse HTTP
//! interface.

pub mod clickhouse;

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::schema::{self, SchemaRegistry};

pub use clickhouse::ClickHouseClient;

/// One row of values, positionally matching the insert's column list
pub type Row = Vec<serde_json::Value>;

/// Named query parameters, bound server-side (`{name:Type}` placeholders)
pub type QueryParams = BTreeMap<String, String>;

/// Tabular query result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Row {row} has {values} values but {columns} columns were given")]
    ColumnMismatch {
        row: usize,
        values: usize,
        columns: usize,
    },

    #[error("Refusing non-idempotent DDL: {0}")]
    NotIdempotent(String),

    #[error("Failed to encode rows: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Unexpected store response: {0}")]
    Decode(String),

    #[error("Store client is closed")]
    Closed,
}

#[async_trait]
pub trait AnalyticalStore: Send + Sync {
    /// Database every unqualified table lives in
    fn database(&self) -> &str;

    /// Run a statement that returns no rows
    async fn execute(&self, sql: &str) -> Result<(), StoreError>;

    /// Create a table from a `CREATE TABLE IF NOT EXISTS` statement
    async fn create_table_if_missing(&self, ddl: &str) -> Result<(), StoreError> {
        ensure_idempotent_ddl(ddl)?;
        self.execute(ddl).await
    }

    /// Write all rows in one batch. An error means the batch must be treated
    /// as not written.
    async fn insert(&self, table: &str, columns: &[String], rows: &[Row]) -> Result<(), StoreError>;

    /// Read query. Failures are logged and reported as `None`.
    async fn query(&self, sql: &str, params: &QueryParams) -> Option<QueryResult>;

    /// Release the connection. Calls after this fail with [`StoreError::Closed`].
    async fn close(&self) {}
}

fn ensure_idempotent_ddl(ddl: &str) -> Result<(), StoreError> {
    let normalized = ddl
        .split_whitespace()
        .take(5)
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();
    if normalized.starts_with("CREATE TABLE IF NOT EXISTS") {
        Ok(())
    } else {
        Err(StoreError::NotIdempotent(ddl.to_string()))
    }
}

/// Neutralize a string destined for unparameterized SQL text.
///
/// Unescaped `'` become `''` and unescaped `\` become `\\`; `;`, `--` and
/// `/*` are removed. Applying it twice gives the same result as applying it
/// once.
pub fn sanitize_sql_value(input: &str) -> String {
    let mut stripped = input.replace(';', "");
    loop {
        let next = stripped.replace("--", "").replace("/*", "");
        if next == stripped {
            break;
        }
        stripped = next;
    }

    let mut out = String::with_capacity(stripped.len() + 4);
    let mut chars = stripped.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            // an existing `''` pair is already escaped
            if chars.peek() == Some(&'\'') {
                chars.next();
            }
            out.push_str("''");
        } else if c == '\\' {
            if chars.peek() == Some(&'\\') {
                chars.next();
            }
            out.push_str("\\\\");
        } else {
            out.push(c);
        }
    }
    out
}

/// Backtick-quoted identifier with the value sanitized
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", sanitize_sql_value(&name.replace('`', "")))
}

/// `` `database`.`table` ``
pub fn qualified_table(database: &str, table: &str) -> String {
    format!("{}.{}", quote_identifier(database), quote_identifier(table))
}

/// Create every registered table. Failures are logged and skipped.
///
/// Returns the number of tables whose DDL succeeded.
pub async fn create_registered_tables(store: &dyn AnalyticalStore, registry: &SchemaRegistry) -> usize {
    let mut created = 0;
    for descriptor in registry.all_descriptors() {
        let ddl = schema::create_table_statement(descriptor, Some(store.database()));
        match store.create_table_if_missing(&ddl).await {
            Ok(()) => {
                created += 1;
                tracing::info!(table = descriptor.name, "Table created or already exists");
            }
            Err(e) => {
                tracing::error!(table = descriptor.name, error = %e, "Failed to create table");
            }
        }
    }
    created
}
