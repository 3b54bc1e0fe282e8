use crate::handlers::{self, AppState};
use crate::openapi::ApiDoc;
use axum::{
    http::{header, Method},
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Legacy mount point kept for front-ends built against the serverless deployment.
pub const LEGACY_GATEWAY_PATH: &str = "/.netlify/functions/api";

/// Wildcard CORS for the browser front-end.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Builds the application router.
///
/// With `rate_limited`, gateway routes are wrapped in a per-IP governor
/// (configured from `state.config`). The server must then be started with
/// connect info so the peer address is available. `/health` always bypasses
/// rate limiting.
pub fn build_router(state: Arc<AppState>, rate_limited: bool) -> anyhow::Result<Router> {
    let mut gateway_routes = Router::new()
        .route("/api", any(handlers::gateway))
        .route(LEGACY_GATEWAY_PATH, any(handlers::gateway));

    if rate_limited {
        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(state.config.rate_limit_per_second)
                .burst_size(state.config.rate_limit_burst)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?,
        );
        gateway_routes = gateway_routes.layer(ServiceBuilder::new().layer(GovernorLayer {
            config: governor_conf,
        }));
    }

    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(gateway_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer());

    Ok(app)
}
