//! Metrics HTTP server for the external autoscaler.

use crate::metrics::{SystemMetrics, TrafficMetrics};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub struct MetricsState {
    pub traffic: Arc<TrafficMetrics>,
    pub system: SystemMetrics,
}

/// Shape of `GET /metrics`, consumed by the scaling script.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub rps: f64,
    pub error_rate: f64,
    pub p50_latency: u64,
    pub p95_latency: u64,
    pub p99_latency: u64,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub load_average: f64,
    pub timestamp: i64,
}

pub fn build_router(state: Arc<MetricsState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        // The scaling dashboard is served from another origin.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn metrics(State(state): State<Arc<MetricsState>>) -> Json<MetricsResponse> {
    let traffic = state.traffic.snapshot();
    let system = state.system.sample();
    Json(MetricsResponse {
        rps: traffic.rps,
        error_rate: traffic.error_rate,
        p50_latency: traffic.p50_latency,
        p95_latency: traffic.p95_latency,
        p99_latency: traffic.p99_latency,
        cpu_usage: system.cpu_usage,
        memory_usage: system.memory_usage,
        load_average: system.load_average,
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0),
    })
}

async fn health() -> &'static str {
    "OK"
}

/// Bind and serve the metrics endpoints until the process exits.
pub async fn serve(port: u16, state: Arc<MetricsState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "metrics server listening");
    axum::serve(listener, build_router(state)).await
}
