//! HTTP request handlers with OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, error, info, instrument};
use utoipa::OpenApi;

use crate::app::AppState;
use crate::domain::{
    AppError, CODE_UNCLASSIFIED, FailureResponse, HealthResponse, HealthStatus,
    MESSAGE_UNCLASSIFIED, ProofQuery, RateLimitResponse, SuccessResponse, ValidationError,
};

/// Body returned for any unmatched path
pub const NOT_FOUND_BODY: &str = "404 Not Found";

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Transaction Proof Relayer API",
        version = "0.1.0",
        description = "Locates the latest transaction of a wallet, proves it and relays the proof for attestation",
        license(
            name = "MIT"
        )
    ),
    paths(
        proof_handler,
        health_check_handler,
        liveness_handler,
        readiness_handler,
    ),
    components(
        schemas(
            SuccessResponse,
            FailureResponse,
            HealthResponse,
            HealthStatus,
            RateLimitResponse,
        )
    ),
    tags(
        (name = "proof", description = "Transaction proof generation"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Generate and attest a proof for a wallet's most recent transaction
///
/// Runs the whole pipeline synchronously: analytics lookup, transaction
/// fetch, proving and attestation. Business failures are reported in-band
/// with HTTP 200 and a `{code, message}` body.
#[utoipa::path(
    get,
    path = "/proof",
    tag = "proof",
    params(ProofQuery),
    responses(
        (status = 200, description = "Proof attested", body = SuccessResponse),
        (status = 200, description = "Pipeline failure, see `code`", body = FailureResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse)
    )
)]
#[instrument(skip(state, query))]
pub async fn proof_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ProofQuery>, QueryRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Query(params) = query.map_err(|e| {
        debug!(error = %e, "Rejected proof query string");
        AppError::Validation(ValidationError::AddressRequired)
    })?;

    info!(address = ?params.address, "Proof requested");
    state.service.generate_proof(&params).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.service.health_check().await;
    Json(health)
}

/// Kubernetes liveness check
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness check
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Application is ready to serve traffic"),
        (status = 503, description = "Chain node unreachable")
    )
)]
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    let health = state.service.health_check().await;
    match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Plain-text 404 for unmatched routes
pub async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if let AppError::RateLimited = self {
            let body = Json(RateLimitResponse {
                code: "rate_limited".to_string(),
                message: "Rate limit exceeded".to_string(),
                retry_after: 1,
            });
            return (StatusCode::TOO_MANY_REQUESTS, body).into_response();
        }

        let body = match self.business_code() {
            Some((code, message)) => FailureResponse::new(code, message),
            None => {
                error!(error = %self, "Unclassified error");
                FailureResponse::new(CODE_UNCLASSIFIED, MESSAGE_UNCLASSIFIED)
            }
        };

        (StatusCode::OK, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AttestationError, CODE_ADDRESS_REQUIRED, CODE_ATTESTATION_TIMEOUT, QueryError,
    };
    use http_body_util::BodyExt;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_business_error_is_in_band() {
        let (status, body) = render(AppError::Validation(ValidationError::AddressRequired)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], CODE_ADDRESS_REQUIRED);
        assert_eq!(body["message"], "Address is required");
    }

    #[tokio::test]
    async fn test_attestation_timeout_code() {
        let (status, body) = render(AttestationError::Timeout(600).into()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], CODE_ATTESTATION_TIMEOUT);
    }

    #[tokio::test]
    async fn test_unclassified_error_hides_details() {
        let (status, body) = render(AppError::Internal("secret detail".to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], CODE_UNCLASSIFIED);
        assert_eq!(body["message"], MESSAGE_UNCLASSIFIED);
    }

    #[tokio::test]
    async fn test_rate_limited_is_429() {
        let (status, body) = render(AppError::RateLimited).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["retry_after"], 1);
    }

    #[tokio::test]
    async fn test_query_failure_code() {
        let (_, body) = render(QueryError::Failed("QUERY_STATE_FAILED".to_string()).into()).await;
        assert_eq!(body["code"], crate::domain::CODE_QUERY_FAILED);
    }
}
