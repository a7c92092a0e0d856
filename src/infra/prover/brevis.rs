//! Brevis prover client.
//!
//! Submits proof requests to a prover service and turns its loosely typed
//! `{proof, err}` response into a [`ProofResult`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::domain::{
    AppError, ExternalServiceError, ProofClient, ProofPayload, ProofRequest, ProofResult,
    ProveErrorKind,
};
use crate::infra::build_http_client;

/// Path of the prove endpoint relative to the prover base URL
pub const PROVE_PATH: &str = "/zk/prove";

#[derive(Debug, Deserialize)]
struct ProveResponse {
    #[serde(default)]
    proof: Option<String>,
    #[serde(default)]
    err: Option<ProveErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ProveErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

impl ProveResponse {
    fn into_result(self) -> ProofResult {
        if let Some(err) = self.err {
            return ProofResult::Error {
                kind: ProveErrorKind::from_code(err.code),
                message: err.msg,
            };
        }
        match self.proof {
            Some(proof) if !proof.is_empty() => ProofResult::Proof(ProofPayload(proof)),
            _ => ProofResult::Error {
                kind: ProveErrorKind::ProveFailed,
                message: "prover returned an empty proof".to_string(),
            },
        }
    }
}

/// Proof client for a Brevis prover service
#[derive(Debug, Clone)]
pub struct BrevisProverClient {
    http_client: Client,
    base_url: String,
}

impl BrevisProverClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        info!(prover_url = %base_url, "Prover client created");
        Ok(Self {
            http_client: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProofClient for BrevisProverClient {
    #[instrument(skip(self, request), fields(tx_hash = ?request.primary_hash()))]
    async fn prove(&self, request: &ProofRequest) -> Result<ProofResult, AppError> {
        let url = format!("{}{}", self.base_url, PROVE_PATH);
        debug!(url = %url, "Calling prover");

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Prover request failed");
                AppError::ExternalService(ExternalServiceError::from(e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Prover returned error status");
            return Err(AppError::ExternalService(ExternalServiceError::ApiError {
                status_code: status.as_u16(),
                message: body,
            }));
        }

        let prove_response: ProveResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse prover response");
            AppError::ExternalService(ExternalServiceError::ParseError(e.to_string()))
        })?;

        Ok(prove_response.into_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> ProofResult {
        serde_json::from_value::<ProveResponse>(json)
            .unwrap()
            .into_result()
    }

    #[test]
    fn test_proof_response() {
        let result = parse(serde_json::json!({"proof": "0xabcdef"}));
        assert_eq!(result, ProofResult::Proof(ProofPayload("0xabcdef".to_string())));
    }

    #[test]
    fn test_error_response_kinds() {
        let cases = [
            (1, ProveErrorKind::InvalidInput),
            (2, ProveErrorKind::InvalidCustomInput),
            (3, ProveErrorKind::ProveFailed),
        ];
        for (code, kind) in cases {
            let result = parse(serde_json::json!({
                "proof": "",
                "err": {"code": code, "msg": "bad receipt"}
            }));
            assert_eq!(
                result,
                ProofResult::Error {
                    kind,
                    message: "bad receipt".to_string()
                }
            );
        }
    }

    #[test]
    fn test_null_err_with_proof_is_success() {
        let result = parse(serde_json::json!({"proof": "0x01", "err": null}));
        assert!(matches!(result, ProofResult::Proof(_)));
    }

    #[test]
    fn test_empty_proof_is_failure() {
        let result = parse(serde_json::json!({}));
        assert!(matches!(
            result,
            ProofResult::Error {
                kind: ProveErrorKind::ProveFailed,
                ..
            }
        ));
    }
}
