//! Read-only label distribution over the telemetry table
//!
//! Filters are passed as bound query parameters, never spliced into the SQL.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AppState;
use crate::{
    error::AppError,
    schema::MODEL_LOGS_TABLE,
    store::{qualified_table, QueryParams, QueryResult},
    telemetry::entry::STORE_DATETIME_FORMAT,
};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct StatsQuery {
    pub label: Option<String>,
    /// Lower bound on `datetime`, `YYYY-MM-DD HH:MM:SS`
    pub since: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LabelStats {
    pub predicted_tip: String,
    pub requests: u64,
    pub avg_words: f64,
}

/// SQL plus bound parameters for `query`
pub fn build_stats_query(database: &str, query: &StatsQuery) -> Result<(String, QueryParams), AppError> {
    let mut params = QueryParams::new();
    let mut filters = Vec::new();

    if let Some(label) = query.label.as_deref().filter(|l| !l.is_empty()) {
        filters.push("predicted_tip = {label:String}");
        params.insert("label".to_string(), label.to_string());
    }

    if let Some(since) = query.since.as_deref().filter(|s| !s.is_empty()) {
        NaiveDateTime::parse_from_str(since, STORE_DATETIME_FORMAT).map_err(|e| {
            AppError::Validation(format!("since must be 'YYYY-MM-DD HH:MM:SS': {}", e))
        })?;
        filters.push("datetime >= {since:DateTime}");
        params.insert("since".to_string(), since.to_string());
    }

    let mut sql = format!(
        "SELECT predicted_tip, count() AS requests, avg(words_count) AS avg_words FROM {}",
        qualified_table(database, MODEL_LOGS_TABLE)
    );
    if !filters.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&filters.join(" AND "));
    }
    sql.push_str(" GROUP BY predicted_tip ORDER BY requests DESC");

    Ok((sql, params))
}

// 64-bit integers come back quoted from the store's JSON formats
fn value_as_u64(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn value_as_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub fn parse_label_stats(result: &QueryResult) -> Vec<LabelStats> {
    let (Some(tip), Some(requests), Some(avg)) = (
        result.column_index("predicted_tip"),
        result.column_index("requests"),
        result.column_index("avg_words"),
    ) else {
        return Vec::new();
    };

    result
        .rows
        .iter()
        .filter_map(|row| {
            Some(LabelStats {
                predicted_tip: row.get(tip)?.as_str()?.to_string(),
                requests: value_as_u64(row.get(requests)?),
                avg_words: value_as_f64(row.get(avg)?),
            })
        })
        .collect()
}

/// Handle /stats endpoint
pub async fn handle_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Value>, AppError> {
    let (sql, params) = build_stats_query(state.store.database(), &query)?;
    let pending = state.pipeline.pending_len();

    let body = match state.store.query(&sql, &params).await {
        Some(result) => json!({
            "available": true,
            "labels": parse_label_stats(&result),
            "pending": pending,
        }),
        None => json!({
            "available": false,
            "labels": [],
            "pending": pending,
        }),
    };

    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_stats_query_without_filters() {
        let (sql, params) = build_stats_query("default", &StatsQuery::default()).unwrap();
        assert_eq!(
            sql,
            "SELECT predicted_tip, count() AS requests, avg(words_count) AS avg_words \
             FROM `default`.`ModelLogs` GROUP BY predicted_tip ORDER BY requests DESC"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_build_stats_query_binds_filters() {
        let query = StatsQuery {
            label: Some("joy'; DROP TABLE x".to_string()),
            since: Some("2024-05-01 00:00:00".to_string()),
        };
        let (sql, params) = build_stats_query("default", &query).unwrap();

        assert!(sql.contains("WHERE predicted_tip = {label:String} AND datetime >= {since:DateTime}"));
        assert!(!sql.contains("DROP"));
        assert_eq!(params["label"], "joy'; DROP TABLE x");
        assert_eq!(params["since"], "2024-05-01 00:00:00");
    }

    #[test]
    fn test_build_stats_query_rejects_bad_since() {
        let query = StatsQuery {
            label: None,
            since: Some("yesterday".to_string()),
        };
        assert!(build_stats_query("default", &query).is_err());
    }

    #[test]
    fn test_parse_label_stats_handles_quoted_counts() {
        let result = QueryResult {
            columns: vec!["predicted_tip".into(), "requests".into(), "avg_words".into()],
            rows: vec![
                vec![json!("joy"), json!("12"), json!(3.5)],
                vec![json!("fear"), json!(2), json!("1")],
            ],
        };
        assert_eq!(
            parse_label_stats(&result),
            vec![
                LabelStats { predicted_tip: "joy".into(), requests: 12, avg_words: 3.5 },
                LabelStats { predicted_tip: "fear".into(), requests: 2, avg_words: 1.0 },
            ]
        );
    }
}
