use std::sync::Arc;

use axum::{Router, http::HeaderName, middleware::from_fn_with_state, routing::get};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// The gate core: token decoding, path classification, decision table.
pub mod auth;
pub mod classifier;
pub mod gate;
pub mod models;
pub mod policy;

// Service plumbing around the core.
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod upstream;

// --- Public Re-exports ---

pub use config::{AppConfig, GateConfig};
pub use gate::Gate;
pub use middleware::RequestMatcher;
pub use models::{Claims, Decision, RedirectTarget, Role, RouteCategory};
pub use upstream::Upstream;

/// AppState
///
/// The immutable state shared by every request: the loaded configuration, the gate
/// built from it, and the filter deciding which requests the gate sees.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub gate: Arc<Gate>,
    pub matcher: Arc<RequestMatcher>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let gate = Arc::new(Gate::from_config(&config.gate));
        let matcher = Arc::new(RequestMatcher::from_config(&config.gate));

        Self {
            config,
            gate,
            matcher,
        }
    }
}

/// create_router
///
/// Assembles the service: `/health` is answered locally, every other request falls
/// through to `upstream`. The edge gate wraps both, so nothing reaches a page
/// without a decision.
pub fn create_router(state: AppState, upstream: Router) -> Router {
    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .route("/health", get(handlers::health))
        .fallback_service(upstream)
        .layer(from_fn_with_state(state.clone(), middleware::edge_gate))
        .with_state(state);

    // Observability and correlation layers, outermost so redirects are traced too.
    base_router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Span for one request, correlated by the `x-request-id` set above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
