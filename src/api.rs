//! HTTP surface for the exporter.
//!
//! - `GET /metrics` – Current gauge values in the Prometheus text exposition format.
//! - `GET /status` – JSON counters describing collection cycle health.
//!
//! Handlers only read shared state; the collection task is the sole writer.

use crate::metrics::{CycleMetrics, CycleSnapshot};
use crate::registry::{MetricRegistry, RegistryError};
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;

/// State shared between the HTTP handlers and the collection task.
pub struct ExporterState {
    /// Published per-index gauges.
    pub registry: Arc<MetricRegistry>,
    /// Cycle bookkeeping counters.
    pub cycles: Arc<CycleMetrics>,
}

/// Build the HTTP router exposing the metrics endpoint.
pub fn create_router(state: Arc<ExporterState>) -> Router {
    Router::new()
        .route("/metrics", get(get_metrics))
        .route("/status", get(get_status))
        .with_state(state)
}

/// Render every registered metric for a Prometheus scrape.
async fn get_metrics(State(state): State<Arc<ExporterState>>) -> Result<Response, AppError> {
    let body = state.registry.encode()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response())
}

/// Return cycle counters for quick health checks.
async fn get_status(State(state): State<Arc<ExporterState>>) -> Json<CycleSnapshot> {
    Json(state.cycles.snapshot())
}

struct AppError(RegistryError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Failed to render metrics");
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

impl From<RegistryError> for AppError {
    fn from(inner: RegistryError) -> Self {
        Self(inner)
    }
}
