//! Brevis gateway attestation client.
//!
//! Submits a proved request for relaying and polls the gateway until the
//! submission reaches a terminal status on the destination chain.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{
    AppError, AttestationClient, AttestationError, AttestationHandle, AttestationRoute,
    ExternalServiceError, ProofPayload, ProofRequest, TransactionData,
};
use crate::infra::build_http_client;

pub const SUBMIT_PATH: &str = "/v1/queries";
pub const STATUS_PATH: &str = "/v1/queries/status";

/// Polling behavior while waiting for finalization
#[derive(Debug, Clone)]
pub struct AttestationConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for AttestationConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    src_chain_id: u64,
    dst_chain_id: u64,
    option: u32,
    /// Empty when no address is configured
    callback_addr: &'a str,
    refund_addr: &'a str,
    transactions: &'a [TransactionData],
    proof: &'a str,
}

impl<'a> SubmitBody<'a> {
    fn new(
        request: &'a ProofRequest,
        proof: &'a ProofPayload,
        route: &'a AttestationRoute,
    ) -> Self {
        Self {
            src_chain_id: route.source_chain_id,
            dst_chain_id: route.dest_chain_id,
            option: route.option,
            callback_addr: route.callback_address.as_deref().unwrap_or(""),
            refund_addr: route.refund_address.as_deref().unwrap_or(""),
            transactions: &request.transactions,
            proof: proof.as_str(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GatewayErr {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    query_key: Option<AttestationHandle>,
    #[serde(default)]
    err: Option<GatewayErr>,
}

#[derive(Debug, Serialize)]
struct StatusBody<'a> {
    query_key: &'a AttestationHandle,
    target_chain_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum SubmissionStatus {
    Completed,
    Failed,
    #[serde(other)]
    Pending,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: SubmissionStatus,
    #[serde(default)]
    err: Option<GatewayErr>,
}

/// Attestation client for the Brevis gateway
#[derive(Debug, Clone)]
pub struct BrevisGatewayClient {
    http_client: Client,
    base_url: String,
    config: AttestationConfig,
}

impl BrevisGatewayClient {
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        config: AttestationConfig,
    ) -> Result<Self, AppError> {
        info!(gateway_url = %base_url, "Gateway client created");
        Ok(Self {
            http_client: build_http_client(request_timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, url = %url, "Gateway request failed");
                AppError::ExternalService(ExternalServiceError::from(e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Gateway returned error status");
            return Err(AppError::ExternalService(ExternalServiceError::ApiError {
                status_code: status.as_u16(),
                message: body,
            }));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse gateway response");
            AppError::ExternalService(ExternalServiceError::ParseError(e.to_string()))
        })
    }

    async fn poll_until_final(
        &self,
        handle: &AttestationHandle,
        dest_chain_id: u64,
    ) -> Result<(), AppError> {
        let body = StatusBody {
            query_key: handle,
            target_chain_id: dest_chain_id,
        };
        loop {
            let response: StatusResponse = self.post(STATUS_PATH, &body).await?;
            match response.status {
                SubmissionStatus::Completed => return Ok(()),
                SubmissionStatus::Failed => {
                    let reason = response
                        .err
                        .map(|e| format!("{}: {}", e.code, e.msg))
                        .unwrap_or_else(|| "submission failed".to_string());
                    warn!(reason = %reason, "Attestation failed");
                    return Err(AttestationError::Rejected(reason).into());
                }
                SubmissionStatus::Pending => {
                    debug!("Attestation pending");
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
    }
}

#[async_trait]
impl AttestationClient for BrevisGatewayClient {
    #[instrument(skip(self, request, proof), fields(tx_hash = ?request.primary_hash()))]
    async fn submit(
        &self,
        request: &ProofRequest,
        proof: &ProofPayload,
        route: &AttestationRoute,
    ) -> Result<AttestationHandle, AppError> {
        let body = SubmitBody::new(request, proof, route);

        let response: SubmitResponse = self.post(SUBMIT_PATH, &body).await?;
        if let Some(err) = response.err {
            warn!(code = err.code, msg = %err.msg, "Gateway rejected submission");
            return Err(AttestationError::Rejected(format!("{}: {}", err.code, err.msg)).into());
        }

        let handle = response.query_key.ok_or_else(|| {
            AppError::ExternalService(ExternalServiceError::ParseError(
                "gateway response missing query_key".to_string(),
            ))
        })?;
        info!(query_hash = %handle.query_hash, nonce = handle.nonce, "Attestation submitted");
        Ok(handle)
    }

    #[instrument(skip(self, handle), fields(query_hash = %handle.query_hash))]
    async fn wait(&self, handle: &AttestationHandle, dest_chain_id: u64) -> Result<(), AppError> {
        match tokio::time::timeout(
            self.config.timeout,
            self.poll_until_final(handle, dest_chain_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = self.config.timeout.as_secs(), "Attestation wait timed out");
                Err(AttestationError::Timeout(self.config.timeout.as_secs()).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        let parse = |s: &str| {
            serde_json::from_value::<StatusResponse>(serde_json::json!({ "status": s }))
                .unwrap()
                .status
        };
        assert_eq!(parse("COMPLETED"), SubmissionStatus::Completed);
        assert_eq!(parse("FAILED"), SubmissionStatus::Failed);
        assert_eq!(parse("WAITING_FOR_PROOF"), SubmissionStatus::Pending);
    }

    #[test]
    fn test_submit_body_sends_missing_addresses_as_empty() {
        let request = ProofRequest::default();
        let proof = ProofPayload("0xproof".to_string());
        let route = AttestationRoute {
            refund_address: Some("0xrefund".to_string()),
            ..AttestationRoute::default()
        };
        let json = serde_json::to_value(SubmitBody::new(&request, &proof, &route)).unwrap();
        assert_eq!(json["callback_addr"], "");
        assert_eq!(json["refund_addr"], "0xrefund");
        assert_eq!(json["src_chain_id"], 56);
        assert_eq!(json["proof"], "0xproof");
    }

    #[test]
    fn test_default_config() {
        let config = AttestationConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(600));
    }
}
