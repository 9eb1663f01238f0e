// src/lib.rs

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod promotion;
pub mod state;
pub mod storage;

use crate::handlers::{
    get_counters, health_check, method_not_allowed, metrics_handler, post_counters, preflight,
};
use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request as AxumRequest},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::{sync::Arc, time::Instant};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use state::AppState;

/// Primary path for the counter endpoint.
pub const COUNTERS_PATH: &str = "/promotion-counters";
/// Path the page script historically called; served by the same handlers.
pub const LEGACY_COUNTERS_PATH: &str = "/api/wheel-global";

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Builds the application router with CORS applied.
pub fn create_router(state: Arc<AppState>) -> Router {
    let counters = get(get_counters)
        .post(post_counters)
        .options(preflight)
        .fallback(method_not_allowed);

    Router::new()
        .route(COUNTERS_PATH, counters.clone())
        .route(LEGACY_COUNTERS_PATH, counters)
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(cors_layer())
        .with_state(state)
}

/// Adds a request id span around each request and echoes it as `X-Request-ID`.
async fn trace_requests(
    mut req: AxumRequest<Body>,
    next: axum::middleware::Next,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        http.method = %method,
        url.path = %path,
    );

    req.extensions_mut().insert(request_id);

    async move {
        let mut response = next.run(req).await;
        let elapsed = start_time.elapsed();

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert("X-Request-ID", value);
        }

        info!(
            http.response.duration = ?elapsed,
            http.status_code = response.status().as_u16(),
            "Finished processing request"
        );

        response
    }
    .instrument(span)
    .await
}

/// Wires the configured store into the router with the request-level layers.
pub fn build_app(config: &AppConfig) -> Result<Router> {
    info!("Starting promotion counter service...");

    let state = AppState::from_config(config)?.with_metrics(metrics::install_recorder());

    let app = create_router(Arc::new(state)).layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn(trace_requests))
            .layer(TimeoutLayer::new(std::time::Duration::from_secs(
                config.server.request_timeout_secs,
            ))),
    );

    Ok(app)
}
