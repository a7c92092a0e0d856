//! Router construction and middleware wiring.

use std::env;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    handler::HandlerWithoutStateExt,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info_span, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::app::AppState;
use crate::domain::AppError;

use super::handlers::{
    ApiDoc, health_check_handler, liveness_handler, not_found_handler, proof_handler,
    readiness_handler,
};

/// Primary proof route
pub const PROOF_PATH: &str = "/proof";

/// Legacy alias of [`PROOF_PATH`]
pub const PROOF_ALIAS_PATH: &str = "/brevis-network/transaction/proof";

/// Default directory served for unmatched paths
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Global request rate limit
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub requests_per_second: NonZeroU32,
    pub burst_size: NonZeroU32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN),
            burst_size: NonZeroU32::new(20).unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl RateLimitConfig {
    /// Read `RATE_LIMIT_RPS` and `RATE_LIMIT_BURST`, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |key: &str, fallback: NonZeroU32| {
            env::var(key)
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .and_then(NonZeroU32::new)
                .unwrap_or(fallback)
        };
        Self {
            requests_per_second: read("RATE_LIMIT_RPS", defaults.requests_per_second),
            burst_size: read("RATE_LIMIT_BURST", defaults.burst_size),
        }
    }
}

/// Router construction options
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub rate_limit: Option<RateLimitConfig>,
    pub static_dir: PathBuf,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            rate_limit: None,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

/// Create the router without rate limiting
pub fn create_router(state: Arc<AppState>) -> Router {
    create_router_with_options(state, RouterOptions::default())
}

/// Create the router with a global rate limit
pub fn create_router_with_rate_limit(state: Arc<AppState>, config: RateLimitConfig) -> Router {
    create_router_with_options(
        state,
        RouterOptions {
            rate_limit: Some(config),
            ..RouterOptions::default()
        },
    )
}

pub fn create_router_with_options(state: Arc<AppState>, options: RouterOptions) -> Router {
    let api = Router::new()
        .route(PROOF_PATH, get(proof_handler))
        .route(PROOF_ALIAS_PATH, get(proof_handler))
        .route("/health", get(health_check_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .method_not_allowed_fallback(not_found_handler)
        .with_state(state);

    let api = match options.rate_limit {
        Some(config) => {
            let quota =
                Quota::per_second(config.requests_per_second).allow_burst(config.burst_size);
            let limiter = Arc::new(RateLimiter::direct(quota));
            api.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        }
        None => api,
    };

    // Non-GET requests that match no route fall through to the plain 404 as well
    let static_files = ServeDir::new(&options.static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(not_found_handler.into_service());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback_service(static_files)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                info_span!(
                    "http_request",
                    request_id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(cors)
}

async fn rate_limit_middleware(
    State(limiter): State<Arc<DefaultDirectRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if limiter.check().is_err() {
        warn!(uri = %request.uri(), "Rate limit exceeded");
        return AppError::RateLimited.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_defaults() {
        let config = RateLimitConfig::default();
        assert_eq!(config.requests_per_second.get(), 10);
        assert_eq!(config.burst_size.get(), 20);
    }

    #[test]
    fn test_router_options_default() {
        let options = RouterOptions::default();
        assert!(options.rate_limit.is_none());
        assert_eq!(options.static_dir, PathBuf::from("static"));
    }
}
