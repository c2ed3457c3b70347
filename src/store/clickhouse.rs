//! ClickHouse client over the HTTP interface
//!
//! Statements are POSTed to `http://host:port/`. Inserts use
//! `FORMAT JSONEachRow`, reads use `FORMAT JSONCompact` with server-side
//! bound parameters (`param_<name>` URL arguments).

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::{qualified_table, quote_identifier, AnalyticalStore, QueryParams, QueryResult, Row, StoreError};
use crate::config::StoreConfig;

/// One query in flight at a time across the whole process
static QUERY_LOCK: Mutex<()> = Mutex::const_new(());

pub struct ClickHouseClient {
    http: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
    database: String,
    closed: AtomicBool,
}

#[derive(Debug, Deserialize)]
struct JsonCompactResponse {
    meta: Vec<ColumnMeta>,
    data: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct ColumnMeta {
    name: String,
}

impl ClickHouseClient {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            username: config.username.clone(),
            password: config.password.clone(),
            database: config.database.clone(),
            closed: AtomicBool::new(false),
        })
    }

    /// Create the configured database. Runs without a database context.
    pub async fn create_database_if_missing(&self) -> Result<(), StoreError> {
        let sql = format!("CREATE DATABASE IF NOT EXISTS {}", quote_identifier(&self.database));
        self.post(&sql, false, &[], String::new()).await?;
        tracing::info!(database = %self.database, "Database created or already exists");
        Ok(())
    }

    /// Send one request. `sql` goes in the body when `body` is empty,
    /// otherwise in the `query` URL argument.
    async fn post(
        &self,
        sql: &str,
        with_database: bool,
        params: &[(String, String)],
        body: String,
    ) -> Result<String, StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }

        let mut args: Vec<(String, String)> = Vec::with_capacity(params.len() + 2);
        if with_database {
            args.push(("database".to_string(), self.database.clone()));
        }
        let body = if body.is_empty() {
            sql.to_string()
        } else {
            args.push(("query".to_string(), sql.to_string()));
            body
        };
        args.extend(params.iter().cloned());

        let response = self
            .http
            .post(&self.endpoint)
            .query(&args)
            .header("X-ClickHouse-User", &self.username)
            .header("X-ClickHouse-Key", &self.password)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Server {
                status: status.as_u16(),
                message: text.trim().to_string(),
            });
        }
        Ok(text)
    }

    async fn run_query(&self, sql: &str, params: &QueryParams) -> Result<QueryResult, StoreError> {
        let sql = format!("{} FORMAT JSONCompact", sql.trim().trim_end_matches(';'));
        let bound: Vec<(String, String)> = params
            .iter()
            .map(|(name, value)| (format!("param_{}", name), value.clone()))
            .collect();

        let text = self.post(&sql, true, &bound, String::new()).await?;
        let parsed: JsonCompactResponse =
            serde_json::from_str(&text).map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(QueryResult {
            columns: parsed.meta.into_iter().map(|m| m.name).collect(),
            rows: parsed.data,
        })
    }
}

/// Encode rows as newline-delimited JSON objects keyed by column
fn encode_json_each_row(columns: &[String], rows: &[Row]) -> Result<String, StoreError> {
    let mut body = String::new();
    for (index, row) in rows.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(StoreError::ColumnMismatch {
                row: index,
                values: row.len(),
                columns: columns.len(),
            });
        }
        let object: serde_json::Map<String, serde_json::Value> = columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect();
        body.push_str(&serde_json::to_string(&object)?);
        body.push('\n');
    }
    Ok(body)
}

#[async_trait]
impl AnalyticalStore for ClickHouseClient {
    fn database(&self) -> &str {
        &self.database
    }

    async fn execute(&self, sql: &str) -> Result<(), StoreError> {
        self.post(sql, true, &[], String::new()).await.map(|_| ())
    }

    async fn insert(&self, table: &str, columns: &[String], rows: &[Row]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let full_table = qualified_table(&self.database, table);
        let column_list = columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("INSERT INTO {} ({}) FORMAT JSONEachRow", full_table, column_list);
        let body = encode_json_each_row(columns, rows)?;

        self.post(&sql, false, &[], body).await?;
        tracing::debug!(table = %full_table, rows = rows.len(), "Inserted batch");
        Ok(())
    }

    async fn query(&self, sql: &str, params: &QueryParams) -> Option<QueryResult> {
        let _guard = QUERY_LOCK.lock().await;
        match self.run_query(sql, params).await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::error!(error = %e, "Query failed");
                None
            }
        }
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!(endpoint = %self.endpoint, "Store client closed");
        }
    }
}
