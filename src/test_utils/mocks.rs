//! Mock implementations for testing.

use alloy::primitives::{U256, address};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::app::{AppState, PipelineConfig};
use crate::domain::{
    AnalyticsClient, AppError, AttestationClient, AttestationError, AttestationHandle,
    AttestationRoute, BlockchainError, ChainReader, ExecutionResults, ExternalServiceError,
    ProofClient, ProofPayload, ProofRequest, ProofResult, ProveErrorKind, QueryExecution,
    QueryResult, QueryResultMetadata, QueryState, TransactionReceipt, TransactionRecord,
};

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }

    fn check(&self) -> Result<(), AppError> {
        if self.should_fail {
            let msg = self
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock error".to_string());
            return Err(AppError::ExternalService(ExternalServiceError::Network(msg)));
        }
        Ok(())
    }
}

/// A dynamic-fee transaction as returned by a chain node
#[must_use]
pub fn sample_transaction(hash: &str) -> TransactionRecord {
    TransactionRecord {
        hash: hash.to_string(),
        chain_id: 56,
        block_number: Some(41_000_000),
        nonce: 7,
        tx_type: 2,
        gas_price: None,
        max_priority_fee_per_gas: Some(U256::from(1_000_000_000u64)),
        max_fee_per_gas: Some(U256::from(2_000_000_000u64)),
        gas_limit: 21_000,
        from: address!("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
        to: Some(address!("fb6916095ca1df60bb79ce92ce3ea74c37c5d359")),
        value: U256::from(1_000_000_000_000_000_000u64),
    }
}

/// Build an execution result in `state` carrying `rows`
#[must_use]
pub fn execution_results(state: QueryState, rows: Vec<serde_json::Value>) -> ExecutionResults {
    ExecutionResults {
        execution_id: "mock-execution".to_string(),
        state,
        result: Some(QueryResult {
            metadata: QueryResultMetadata {
                row_count: rows.len() as u64,
            },
            rows,
        }),
    }
}

/// Mock analytics client replaying scripted poll responses
pub struct MockAnalyticsClient {
    responses: Mutex<VecDeque<ExecutionResults>>,
    config: MockConfig,
    results_config: MockConfig,
    execute_calls: AtomicUsize,
    result_calls: AtomicUsize,
    addresses: Mutex<Vec<String>>,
}

impl MockAnalyticsClient {
    /// Completes on the first poll with a single row for `tx_hash`
    #[must_use]
    pub fn with_transaction(tx_hash: &str) -> Self {
        Self::with_responses(vec![execution_results(
            QueryState::Completed,
            vec![serde_json::json!({ "hash": tx_hash })],
        )])
    }

    /// Completes on the first poll without any rows
    #[must_use]
    pub fn empty() -> Self {
        Self::with_responses(vec![execution_results(QueryState::Completed, vec![])])
    }

    /// Replays `responses` in order; the last one repeats once exhausted
    #[must_use]
    pub fn with_responses(responses: Vec<ExecutionResults>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            config: MockConfig::success(),
            results_config: MockConfig::success(),
            execute_calls: AtomicUsize::new(0),
            result_calls: AtomicUsize::new(0),
            addresses: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        let mut mock = Self::empty();
        mock.config = MockConfig::failure(message);
        mock
    }

    /// Executions are accepted but every poll fails
    #[must_use]
    pub fn failing_results(message: impl Into<String>) -> Self {
        let mut mock = Self::empty();
        mock.results_config = MockConfig::failure(message);
        mock
    }

    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }

    pub fn result_calls(&self) -> usize {
        self.result_calls.load(Ordering::SeqCst)
    }

    /// Addresses the query was executed for
    pub fn addresses(&self) -> Vec<String> {
        self.addresses.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalyticsClient for MockAnalyticsClient {
    async fn execute_query(&self, wallet_address: &str) -> Result<QueryExecution, AppError> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        self.config.check()?;
        self.addresses
            .lock()
            .unwrap()
            .push(wallet_address.to_string());
        Ok(QueryExecution {
            execution_id: "mock-execution".to_string(),
            state: QueryState::Pending,
        })
    }

    async fn get_execution_results(
        &self,
        _execution_id: &str,
    ) -> Result<ExecutionResults, AppError> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        self.config.check()?;
        self.results_config.check()?;
        let mut responses = self.responses.lock().unwrap();
        let next = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        next.ok_or_else(|| AppError::Internal("no scripted analytics response".to_string()))
    }
}

/// Mock chain reader serving at most one transaction
pub struct MockChainReader {
    transaction: Option<TransactionRecord>,
    receipt: Option<TransactionReceipt>,
    config: MockConfig,
    is_healthy: AtomicBool,
    requested: Mutex<Vec<String>>,
}

impl MockChainReader {
    /// Serves [`sample_transaction`] for any hash, with a receipt
    #[must_use]
    pub fn new() -> Self {
        Self::with_transaction(sample_transaction("0xabc"))
    }

    #[must_use]
    pub fn with_transaction(transaction: TransactionRecord) -> Self {
        let receipt = TransactionReceipt {
            transaction_hash: transaction.hash.clone(),
            block_number: transaction.block_number,
            success: true,
        };
        Self {
            transaction: Some(transaction),
            receipt: Some(receipt),
            config: MockConfig::success(),
            is_healthy: AtomicBool::new(true),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// The node knows no transaction
    #[must_use]
    pub fn missing() -> Self {
        Self {
            transaction: None,
            receipt: None,
            config: MockConfig::success(),
            is_healthy: AtomicBool::new(true),
            requested: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn without_receipt(mut self) -> Self {
        self.receipt = None;
        self
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        let mut mock = Self::missing();
        mock.config = MockConfig::failure(message);
        mock
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Hashes passed to `get_transaction`
    pub fn requested_hashes(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

impl Default for MockChainReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn health_check(&self) -> Result<(), AppError> {
        if self.is_healthy.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(AppError::Blockchain(BlockchainError::Connection(
                "Mock node unreachable".to_string(),
            )))
        }
    }

    async fn get_transaction(&self, hash: &str) -> Result<Option<TransactionRecord>, AppError> {
        self.requested.lock().unwrap().push(hash.to_string());
        if self.config.should_fail {
            return Err(AppError::Blockchain(BlockchainError::Connection(
                self.config.error_message.clone().unwrap_or_default(),
            )));
        }
        Ok(self.transaction.clone().map(|mut tx| {
            tx.hash = hash.to_string();
            tx
        }))
    }

    async fn get_transaction_receipt(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionReceipt>, AppError> {
        Ok(self.receipt.clone().map(|mut receipt| {
            receipt.transaction_hash = hash.to_string();
            receipt
        }))
    }
}

/// Mock proving service with a fixed outcome
pub struct MockProofClient {
    outcome: ProofResult,
    config: MockConfig,
    requests: Mutex<Vec<ProofRequest>>,
}

impl MockProofClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_outcome(ProofResult::Proof(ProofPayload("0xproof".to_string())))
    }

    #[must_use]
    pub fn with_outcome(outcome: ProofResult) -> Self {
        Self {
            outcome,
            config: MockConfig::success(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// The prover answers with an in-band error of `kind`
    #[must_use]
    pub fn with_error(kind: ProveErrorKind, message: impl Into<String>) -> Self {
        Self::with_outcome(ProofResult::Error {
            kind,
            message: message.into(),
        })
    }

    /// The prover is unreachable
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        let mut mock = Self::new();
        mock.config = MockConfig::failure(message);
        mock
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ProofRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for MockProofClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProofClient for MockProofClient {
    async fn prove(&self, request: &ProofRequest) -> Result<ProofResult, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        self.config.check()?;
        Ok(self.outcome.clone())
    }
}

#[derive(Debug, Clone)]
enum AttestationOutcome {
    Finalized,
    Rejected(String),
    TimedOut(u64),
}

/// Mock attestation gateway
pub struct MockAttestationClient {
    outcome: AttestationOutcome,
    submit_calls: AtomicUsize,
    wait_calls: AtomicUsize,
    routes: Mutex<Vec<AttestationRoute>>,
    proofs: Mutex<Vec<ProofPayload>>,
}

impl MockAttestationClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_outcome(AttestationOutcome::Finalized)
    }

    /// Submissions are accepted, then fail while waiting
    #[must_use]
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self::with_outcome(AttestationOutcome::Rejected(message.into()))
    }

    #[must_use]
    pub fn timing_out(secs: u64) -> Self {
        Self::with_outcome(AttestationOutcome::TimedOut(secs))
    }

    fn with_outcome(outcome: AttestationOutcome) -> Self {
        Self {
            outcome,
            submit_calls: AtomicUsize::new(0),
            wait_calls: AtomicUsize::new(0),
            routes: Mutex::new(Vec::new()),
            proofs: Mutex::new(Vec::new()),
        }
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn wait_calls(&self) -> usize {
        self.wait_calls.load(Ordering::SeqCst)
    }

    pub fn routes(&self) -> Vec<AttestationRoute> {
        self.routes.lock().unwrap().clone()
    }

    pub fn proofs(&self) -> Vec<ProofPayload> {
        self.proofs.lock().unwrap().clone()
    }
}

impl Default for MockAttestationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttestationClient for MockAttestationClient {
    async fn submit(
        &self,
        _request: &ProofRequest,
        proof: &ProofPayload,
        route: &AttestationRoute,
    ) -> Result<AttestationHandle, AppError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.routes.lock().unwrap().push(route.clone());
        self.proofs.lock().unwrap().push(proof.clone());
        Ok(AttestationHandle {
            query_hash: "0xquery".to_string(),
            nonce: 1,
        })
    }

    async fn wait(&self, _handle: &AttestationHandle, _dest_chain_id: u64) -> Result<(), AppError> {
        self.wait_calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            AttestationOutcome::Finalized => Ok(()),
            AttestationOutcome::Rejected(msg) => Err(AttestationError::Rejected(msg.clone()).into()),
            AttestationOutcome::TimedOut(secs) => Err(AttestationError::Timeout(*secs).into()),
        }
    }
}

/// Shared handles to a full set of mocks
pub struct MockSet {
    pub analytics: Arc<MockAnalyticsClient>,
    pub chain: Arc<MockChainReader>,
    pub prover: Arc<MockProofClient>,
    pub attestation: Arc<MockAttestationClient>,
}

impl MockSet {
    /// Mocks for a pipeline that succeeds for `tx_hash`
    #[must_use]
    pub fn succeeding(tx_hash: &str) -> Self {
        Self {
            analytics: Arc::new(MockAnalyticsClient::with_transaction(tx_hash)),
            chain: Arc::new(MockChainReader::new()),
            prover: Arc::new(MockProofClient::new()),
            attestation: Arc::new(MockAttestationClient::new()),
        }
    }

    /// Application state wired to these mocks
    #[must_use]
    pub fn app_state(&self, config: PipelineConfig) -> Arc<AppState> {
        Arc::new(AppState::with_config(
            Arc::clone(&self.analytics) as _,
            Arc::clone(&self.chain) as _,
            Arc::clone(&self.prover) as _,
            Arc::clone(&self.attestation) as _,
            config,
        ))
    }
}
