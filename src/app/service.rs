//! Proof pipeline service.
//!
//! Sequences the analytics lookup, chain read, field mapping, proving and
//! attestation stages for a single wallet address. Stages run strictly one
//! after another and any failure short-circuits the rest.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

use crate::domain::{
    AnalyticsClient, AppError, AttestationClient, AttestationHandle, AttestationRoute,
    BlockchainError, ChainReader, ExecutionResults, ExternalServiceError, HealthResponse,
    HealthStatus, ProofClient, ProofPayload, ProofQuery, ProofRequest, ProofResult,
    ProveErrorKind, ProverError, QueryError, TransactionRecord, ValidationError,
};

use super::mapper::map_to_proof_request;

/// Default delay between analytics result polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default deadline for an analytics query to reach a terminal state
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration for the proof pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub poll_interval: Duration,
    pub query_timeout: Duration,
    pub route: AttestationRoute,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            route: AttestationRoute::default(),
        }
    }
}

/// Progress of a single proof request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    AddressValidated,
    TransactionLocated,
    TransactionFetched,
    RequestMapped,
    Proved,
    Attested,
    Responded,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::AddressValidated => "address_validated",
            Self::TransactionLocated => "transaction_located",
            Self::TransactionFetched => "transaction_fetched",
            Self::RequestMapped => "request_mapped",
            Self::Proved => "proved",
            Self::Attested => "attested",
            Self::Responded => "responded",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    debug!(from = %stage, to = %next, "Pipeline stage transition");
    *stage = next;
}

/// Service orchestrating the proof pipeline
pub struct ProofService {
    analytics: Arc<dyn AnalyticsClient>,
    chain_reader: Arc<dyn ChainReader>,
    prover: Arc<dyn ProofClient>,
    attestation: Arc<dyn AttestationClient>,
    config: PipelineConfig,
}

impl ProofService {
    #[must_use]
    pub fn new(
        analytics: Arc<dyn AnalyticsClient>,
        chain_reader: Arc<dyn ChainReader>,
        prover: Arc<dyn ProofClient>,
        attestation: Arc<dyn AttestationClient>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            analytics,
            chain_reader,
            prover,
            attestation,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole pipeline for the address in `query`.
    ///
    /// Returns once the proof has been attested on the destination chain.
    #[instrument(skip(self, query), fields(address = ?query.address))]
    pub async fn generate_proof(&self, query: &ProofQuery) -> Result<(), AppError> {
        let mut stage = PipelineStage::Received;
        let result = self.run_stages(query, &mut stage).await;

        match &result {
            Ok(()) => {
                advance(&mut stage, PipelineStage::Responded);
                info!("Proof pipeline completed");
            }
            Err(e) => warn!(stage = %stage, error = %e, "Proof pipeline failed"),
        }
        result
    }

    async fn run_stages(
        &self,
        query: &ProofQuery,
        stage: &mut PipelineStage,
    ) -> Result<(), AppError> {
        query.validate().map_err(|e| {
            debug!(error = %e, "Address validation failed");
            AppError::Validation(ValidationError::AddressRequired)
        })?;
        let address = query
            .address
            .as_deref()
            .ok_or(AppError::Validation(ValidationError::AddressRequired))?;
        advance(stage, PipelineStage::AddressValidated);

        info!(address = %address, "Generating transaction proof");
        let tx_hash = self.find_transaction_for_address(address).await?;
        advance(stage, PipelineStage::TransactionLocated);

        let record = self.fetch_transaction(&tx_hash).await?;
        advance(stage, PipelineStage::TransactionFetched);

        let request = map_to_proof_request(&record);
        advance(stage, PipelineStage::RequestMapped);

        let proof = self.prove(&request).await?;
        advance(stage, PipelineStage::Proved);

        self.attest(&request, &proof).await?;
        advance(stage, PipelineStage::Attested);

        Ok(())
    }

    /// Locate the transaction for `address` through the analytics service.
    ///
    /// Polls every `poll_interval` until the execution reaches a terminal
    /// state or `query_timeout` elapses.
    #[instrument(skip(self))]
    pub async fn find_transaction_for_address(&self, address: &str) -> Result<String, AppError> {
        let execution = self.analytics.execute_query(address).await.map_err(|e| {
            error!(error = %e, "Failed to submit analytics query");
            e
        })?;
        info!(execution_id = %execution.execution_id, "Analytics query submitted");

        let timeout = self.config.query_timeout;
        match tokio::time::timeout(timeout, self.poll_execution(&execution.execution_id)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    execution_id = %execution.execution_id,
                    timeout_secs = timeout.as_secs(),
                    "Analytics query did not reach a terminal state in time"
                );
                Err(QueryError::Timeout(timeout.as_secs()).into())
            }
        }
    }

    async fn poll_execution(&self, execution_id: &str) -> Result<String, AppError> {
        loop {
            let results = self
                .analytics
                .get_execution_results(execution_id)
                .await
                .map_err(|e| {
                    error!(execution_id = %execution_id, error = %e, "Failed to fetch query results");
                    e
                })?;

            let state = results.state;
            if !state.is_terminal() {
                debug!(
                    execution_id = %execution_id,
                    state = %state,
                    "Query still running, retrying in {:?}",
                    self.config.poll_interval
                );
                tokio::time::sleep(self.config.poll_interval).await;
                continue;
            }
            if state.is_failure() {
                warn!(execution_id = %execution_id, state = %state, "Analytics query failed");
                return Err(QueryError::Failed(state.to_string()).into());
            }
            return first_transaction_hash(&results);
        }
    }

    /// Fetch the transaction and confirm its receipt on the chain node
    #[instrument(skip(self))]
    pub async fn fetch_transaction(&self, tx_hash: &str) -> Result<TransactionRecord, AppError> {
        info!("Fetching transaction");
        let record = self
            .chain_reader
            .get_transaction(tx_hash)
            .await?
            .ok_or_else(|| {
                warn!("Chain node returned no transaction");
                AppError::Blockchain(BlockchainError::TransactionNotFound(tx_hash.to_string()))
            })?;

        match self.chain_reader.get_transaction_receipt(tx_hash).await? {
            Some(receipt) => debug!(
                block_number = ?receipt.block_number,
                success = receipt.success,
                "Transaction receipt found"
            ),
            None => warn!("Transaction has no receipt yet"),
        }

        Ok(record)
    }

    /// Submit a mapped request to the proving service
    #[instrument(skip(self, request), fields(tx_hash = ?request.primary_hash()))]
    pub async fn prove(&self, request: &ProofRequest) -> Result<ProofPayload, AppError> {
        info!("Sending prove request");
        match self.prover.prove(request).await? {
            ProofResult::Proof(proof) => {
                info!(proof_len = proof.as_str().len(), "Proof generated");
                Ok(proof)
            }
            ProofResult::Error { kind, message } => {
                error!(kind = kind.as_str(), message = %message, "Proving service returned an error");
                let err = match kind {
                    ProveErrorKind::InvalidInput => ProverError::InvalidInput(message),
                    ProveErrorKind::InvalidCustomInput => ProverError::InvalidCustomInput(message),
                    ProveErrorKind::ProveFailed => ProverError::ProveFailed(message),
                };
                Err(err.into())
            }
        }
    }

    /// Submit the proof for attestation and wait for finalization
    #[instrument(skip(self, request, proof), fields(tx_hash = ?request.primary_hash()))]
    pub async fn attest(
        &self,
        request: &ProofRequest,
        proof: &ProofPayload,
    ) -> Result<AttestationHandle, AppError> {
        let route = &self.config.route;
        let handle = self
            .attestation
            .submit(request, proof, route)
            .await
            .map_err(|e| {
                error!(error = %e, "Attestation submission failed");
                e
            })?;
        info!(
            query_hash = %handle.query_hash,
            nonce = handle.nonce,
            dest_chain_id = route.dest_chain_id,
            "Proof submitted for attestation"
        );

        self.attestation
            .wait(&handle, route.dest_chain_id)
            .await
            .map_err(|e| {
                error!(query_hash = %handle.query_hash, error = %e, "Attestation did not finalize");
                e
            })?;
        info!(query_hash = %handle.query_hash, "Attestation finalized");

        Ok(handle)
    }

    /// Report chain node connectivity
    pub async fn health_check(&self) -> HealthResponse {
        let blockchain = match self.chain_reader.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = %e, "Chain node health check failed");
                HealthStatus::Unhealthy
            }
        };
        HealthResponse::new(blockchain)
    }
}

/// Extract the `hash` column of the first row of a completed execution
fn first_transaction_hash(results: &ExecutionResults) -> Result<String, AppError> {
    let row = match results.rows().first() {
        Some(row) if results.row_count() > 0 => row,
        _ => {
            info!(execution_id = %results.execution_id, "Query returned no rows");
            return Err(QueryError::NoTransactionFound.into());
        }
    };

    let hash = row
        .get("hash")
        .and_then(|h| h.as_str())
        .ok_or_else(|| {
            ExternalServiceError::ParseError("query row has no 'hash' column".to_string())
        })?;

    info!(tx_hash = %hash, "Transaction located");
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QueryResult, QueryResultMetadata, QueryState};

    fn completed(rows: Vec<serde_json::Value>) -> ExecutionResults {
        ExecutionResults {
            execution_id: "exec-1".to_string(),
            state: QueryState::Completed,
            result: Some(QueryResult {
                metadata: QueryResultMetadata {
                    row_count: rows.len() as u64,
                },
                rows,
            }),
        }
    }

    #[test]
    fn test_first_transaction_hash_picks_first_row() {
        let results = completed(vec![
            serde_json::json!({"hash": "0xfirst"}),
            serde_json::json!({"hash": "0xsecond"}),
        ]);
        assert_eq!(first_transaction_hash(&results).unwrap(), "0xfirst");
    }

    #[test]
    fn test_first_transaction_hash_no_rows() {
        let results = completed(vec![]);
        assert!(matches!(
            first_transaction_hash(&results),
            Err(AppError::Query(QueryError::NoTransactionFound))
        ));
    }

    #[test]
    fn test_first_transaction_hash_missing_column() {
        let results = completed(vec![serde_json::json!({"tx": "0xfirst"})]);
        assert!(matches!(
            first_transaction_hash(&results),
            Err(AppError::ExternalService(ExternalServiceError::ParseError(_)))
        ));
    }

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.query_timeout, Duration::from_secs(300));
        assert_eq!(config.route.dest_chain_id, 97);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::Received.to_string(), "received");
        assert_eq!(PipelineStage::Attested.to_string(), "attested");
    }
}
