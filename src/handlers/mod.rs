pub mod health;
pub mod metrics_handler;
pub mod predict;
pub mod stats;

use std::sync::Arc;

use crate::{predictor::Predictor, store::AnalyticalStore, telemetry::TelemetryPipeline};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<dyn Predictor>,
    pub store: Arc<dyn AnalyticalStore>,
    pub pipeline: Arc<TelemetryPipeline>,
}
