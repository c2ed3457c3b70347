use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    config::Config,
    handlers::{self, AppState},
    metrics,
    predictor::LexiconPredictor,
    schema,
    signals::shutdown_signal,
    store::{self, AnalyticalStore, ClickHouseClient},
    telemetry::{interceptor::MAX_BODY_BYTES, telemetry_middleware, TelemetryPipeline},
};

/// Start the prediction service
///
/// This function:
/// 1. Initializes metrics
/// 2. Connects the store client and creates the database and every registered table
/// 3. Restores pending telemetry from the snapshot
/// 4. Serves requests until SIGTERM/SIGINT
/// 5. Closes the store client
pub async fn start_server(config: Config) -> Result<()> {
    info!("Initializing Prometheus metrics...");
    let metrics_handle = Arc::new(metrics::init_metrics()?);

    let client = Arc::new(ClickHouseClient::new(&config.store)?);
    let store: Arc<dyn AnalyticalStore> = client.clone();

    // Store problems are logged; the service still starts and buffers telemetry
    if let Err(e) = client.create_database_if_missing().await {
        error!(error = %e, database = %config.store.database, "Failed to create database");
    }
    let registry = schema::register_builtin_entities();
    let created = store::create_registered_tables(store.as_ref(), &registry).await;
    info!(
        "Schema ready: {}/{} tables",
        created,
        registry.all_descriptors().len()
    );

    let pipeline = Arc::new(TelemetryPipeline::bootstrap(&config.telemetry, store.clone()).await);

    let app_state = AppState {
        predictor: Arc::new(LexiconPredictor::new()),
        store: store.clone(),
        pipeline,
    };

    let app = create_router(app_state, metrics_handle);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting prediction service on {}", addr);
    info!(
        "Telemetry: monitoring {}, flush threshold {}, snapshot {}",
        config.telemetry.monitored_path,
        config.telemetry.flush_threshold,
        config.telemetry.snapshot_path.display()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(app_state: AppState, metrics_handle: Arc<PrometheusHandle>) -> Router {
    let pipeline = app_state.pipeline.clone();
    let predict_path = pipeline.monitored_path().to_string();

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route(&predict_path, post(handlers::predict::handle_predict))
        .route("/stats", get(handlers::stats::handle_stats))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .with_state(app_state)
        .merge(metrics_routes)
        .layer(middleware::from_fn_with_state(pipeline, telemetry_middleware))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}
