//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::error::AppError;
use super::types::{
    AttestationHandle, AttestationRoute, ExecutionResults, ProofPayload, ProofRequest,
    ProofResult, QueryExecution, TransactionReceipt, TransactionRecord,
};

/// Analytics service executing parameterized queries over indexed chain data
#[async_trait]
pub trait AnalyticsClient: Send + Sync {
    /// Start an execution of the configured query bound to `wallet_address`
    async fn execute_query(&self, wallet_address: &str) -> Result<QueryExecution, AppError>;

    /// Fetch the current state (and rows, once completed) of an execution
    async fn get_execution_results(&self, execution_id: &str)
    -> Result<ExecutionResults, AppError>;
}

/// Read access to an EVM chain node
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Check node connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// Look up a transaction by hash; `Ok(None)` when the node does not know it
    async fn get_transaction(&self, hash: &str) -> Result<Option<TransactionRecord>, AppError>;

    /// Look up a transaction receipt by hash; `Ok(None)` while pending or unknown
    async fn get_transaction_receipt(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionReceipt>, AppError>;
}

/// Zero-knowledge proving service
#[async_trait]
pub trait ProofClient: Send + Sync {
    /// Submit a request for proving.
    ///
    /// Service-reported failures come back as `Ok(ProofResult::Error { .. })`;
    /// `Err` is reserved for transport failures.
    async fn prove(&self, request: &ProofRequest) -> Result<ProofResult, AppError>;
}

/// Attestation/bridge gateway relaying proofs to a destination chain
#[async_trait]
pub trait AttestationClient: Send + Sync {
    /// Submit a proved request and obtain its query key
    async fn submit(
        &self,
        request: &ProofRequest,
        proof: &ProofPayload,
        route: &AttestationRoute,
    ) -> Result<AttestationHandle, AppError>;

    /// Wait until the submission is finalized for `dest_chain_id`
    async fn wait(&self, handle: &AttestationHandle, dest_chain_id: u64) -> Result<(), AppError>;
}
