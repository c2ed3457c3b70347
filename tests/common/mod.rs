//! Shared fixtures for router-level tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use predict_telemetry::{
    config::TelemetryConfig,
    handlers::AppState,
    predictor::LexiconPredictor,
    server::create_router,
    store::{AnalyticalStore, QueryParams, QueryResult, Row, StoreError},
    telemetry::TelemetryPipeline,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Store double that keeps every inserted batch in memory
#[derive(Default)]
pub struct MemoryStore {
    batches: Mutex<Vec<Vec<Row>>>,
    failures_left: AtomicUsize,
    query_result: Mutex<Option<QueryResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn set_query_result(&self, result: QueryResult) {
        *self.query_result.lock().unwrap() = Some(result);
    }

    pub fn batches(&self) -> Vec<Vec<Row>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalyticalStore for MemoryStore {
    fn database(&self) -> &str {
        "default"
    }

    async fn execute(&self, _sql: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert(&self, _table: &str, _columns: &[String], rows: &[Row]) -> Result<(), StoreError> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Server {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        self.batches.lock().unwrap().push(rows.to_vec());
        Ok(())
    }

    async fn query(&self, _sql: &str, _params: &QueryParams) -> Option<QueryResult> {
        self.query_result.lock().unwrap().clone()
    }
}

pub fn telemetry_config(dir: &Path) -> TelemetryConfig {
    TelemetryConfig {
        monitored_path: "/predict".to_string(),
        flush_threshold: 5,
        snapshot_path: dir.join("logs.json"),
    }
}

pub fn snapshot_path(dir: &Path) -> PathBuf {
    telemetry_config(dir).snapshot_path
}

/// Router wired exactly as the server wires it, minus the global recorder
pub async fn build_app(
    store: Arc<dyn AnalyticalStore>,
    dir: &Path,
) -> (Router, Arc<TelemetryPipeline>) {
    let pipeline =
        Arc::new(TelemetryPipeline::bootstrap(&telemetry_config(dir), store.clone()).await);
    let state = AppState {
        predictor: Arc::new(LexiconPredictor::new()),
        store,
        pipeline: pipeline.clone(),
    };
    let handle = Arc::new(PrometheusBuilder::new().build_recorder().handle());

    (create_router(state, handle), pipeline)
}

pub fn predict_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
