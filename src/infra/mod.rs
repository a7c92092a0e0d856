//! Infrastructure layer implementations.

pub mod analytics;
pub mod attestation;
pub mod blockchain;
pub mod prover;

use std::time::Duration;

use reqwest::Client;

use crate::domain::{AppError, ExternalServiceError};

pub use analytics::DuneAnalyticsClient;
pub use attestation::{AttestationConfig, BrevisGatewayClient};
pub use blockchain::{EvmRpcClient, RpcClientConfig};
pub use prover::BrevisProverClient;

/// Build the pooled HTTP client shared by a service client
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client, AppError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::ExternalService(ExternalServiceError::Network(e.to_string())))
}
