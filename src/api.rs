use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::aggregator::Aggregator;
use crate::snapshot::AggregatedSnapshot;

/// Body text of every 500 this service returns.
pub const INTERNAL_ERROR_MESSAGE: &str = "Ocurrió un error interno en el servidor.";

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
}

impl AppState {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/all_instrument_data", get(all_instrument_data))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::very_permissive())
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("aggregation failed: {0:#}")]
    Aggregation(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "fatal error in /all_instrument_data");
        internal_error()
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": INTERNAL_ERROR_MESSAGE })),
    )
        .into_response()
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = detail, "handler panicked");
    internal_error()
}

async fn all_instrument_data(
    State(state): State<AppState>,
) -> Result<Json<AggregatedSnapshot>, ApiError> {
    let snapshot = state.aggregator.snapshot().await?;
    Ok(Json(snapshot))
}
