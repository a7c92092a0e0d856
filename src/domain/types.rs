//! Domain types with validation support.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

// ============================================================================
// ANALYTICS QUERY
// ============================================================================

/// Execution state reported by the analytics service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QueryState {
    #[serde(rename = "QUERY_STATE_PENDING")]
    Pending,
    #[serde(rename = "QUERY_STATE_EXECUTING")]
    Executing,
    #[serde(rename = "QUERY_STATE_COMPLETED")]
    Completed,
    #[serde(rename = "QUERY_STATE_COMPLETED_PARTIAL")]
    CompletedPartial,
    #[serde(rename = "QUERY_STATE_FAILED")]
    Failed,
    #[serde(rename = "QUERY_STATE_CANCELLED")]
    Cancelled,
    #[serde(rename = "QUERY_STATE_EXPIRED")]
    Expired,
    /// Any state this client does not know about; treated as still running
    #[serde(other)]
    Unknown,
}

impl QueryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "QUERY_STATE_PENDING",
            Self::Executing => "QUERY_STATE_EXECUTING",
            Self::Completed => "QUERY_STATE_COMPLETED",
            Self::CompletedPartial => "QUERY_STATE_COMPLETED_PARTIAL",
            Self::Failed => "QUERY_STATE_FAILED",
            Self::Cancelled => "QUERY_STATE_CANCELLED",
            Self::Expired => "QUERY_STATE_EXPIRED",
            Self::Unknown => "QUERY_STATE_UNKNOWN",
        }
    }

    /// Whether polling should stop at this state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Executing | Self::Unknown)
    }

    /// Terminal states that carry no usable result
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::CompletedPartial | Self::Failed | Self::Cancelled | Self::Expired
        )
    }
}

impl std::fmt::Display for QueryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Handle for a submitted query execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryExecution {
    pub execution_id: String,
    pub state: QueryState,
}

/// One poll of an execution's results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResults {
    pub execution_id: String,
    pub state: QueryState,
    #[serde(default)]
    pub result: Option<QueryResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    #[serde(default)]
    pub rows: Vec<serde_json::Value>,
    #[serde(default)]
    pub metadata: QueryResultMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResultMetadata {
    #[serde(default)]
    pub row_count: u64,
}

impl ExecutionResults {
    /// Rows reported by a completed execution (empty while running)
    pub fn rows(&self) -> &[serde_json::Value] {
        self.result.as_ref().map(|r| r.rows.as_slice()).unwrap_or(&[])
    }

    pub fn row_count(&self) -> u64 {
        self.result
            .as_ref()
            .map(|r| r.metadata.row_count.max(r.rows.len() as u64))
            .unwrap_or(0)
    }
}

// ============================================================================
// CHAIN DATA
// ============================================================================

/// Legacy (pre EIP-1559) transaction type
pub const LEGACY_TX_TYPE: u64 = 0;

/// Transaction as fetched from the chain node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub hash: String,
    pub chain_id: u64,
    /// `None` while the transaction is pending
    pub block_number: Option<u64>,
    pub nonce: u64,
    pub tx_type: u64,
    pub gas_price: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub gas_limit: u64,
    pub from: Address,
    /// `None` for contract creation
    pub to: Option<Address>,
    pub value: U256,
}

impl TransactionRecord {
    pub fn is_legacy(&self) -> bool {
        self.tx_type == LEGACY_TX_TYPE
    }
}

/// Receipt as fetched from the chain node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    pub block_number: Option<u64>,
    /// `false` when the transaction reverted
    pub success: bool,
}

// ============================================================================
// PROOF REQUEST
// ============================================================================

/// Transaction entry in the proving service schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionData {
    pub hash: String,
    pub chain_id: u64,
    pub block_num: Option<u64>,
    pub nonce: u64,
    pub gas_tip_cap_or_gas_price: String,
    pub gas_fee_cap: String,
    /// Decimal string
    pub gas_limit: String,
    pub from: String,
    pub to: Option<String>,
    pub value: String,
}

/// Request submitted to the proving service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProofRequest {
    pub transactions: Vec<TransactionData>,
    pub receipts: Vec<serde_json::Value>,
    pub storages: Vec<serde_json::Value>,
    pub custom_input: Option<serde_json::Value>,
}

impl ProofRequest {
    #[must_use]
    pub fn with_transaction(transaction: TransactionData) -> Self {
        Self {
            transactions: vec![transaction],
            ..Default::default()
        }
    }

    /// Hash of the first transaction in the request
    pub fn primary_hash(&self) -> Option<&str> {
        self.transactions.first().map(|t| t.hash.as_str())
    }
}

/// Proof bytes as returned by the proving service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ProofPayload(pub String);

impl ProofPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Kind of failure reported by the proving service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProveErrorKind {
    InvalidInput,
    InvalidCustomInput,
    ProveFailed,
}

impl ProveErrorKind {
    /// Map the service's numeric error code; unknown codes are prove failures
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::InvalidInput,
            2 => Self::InvalidCustomInput,
            _ => Self::ProveFailed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::InvalidCustomInput => "invalid_custom_input",
            Self::ProveFailed => "prove_failed",
        }
    }
}

/// Outcome of a prove call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofResult {
    Proof(ProofPayload),
    Error { kind: ProveErrorKind, message: String },
}

// ============================================================================
// ATTESTATION
// ============================================================================

/// Routing parameters for attestation submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationRoute {
    pub source_chain_id: u64,
    pub dest_chain_id: u64,
    pub option: u32,
    pub callback_address: Option<String>,
    pub refund_address: Option<String>,
}

impl Default for AttestationRoute {
    fn default() -> Self {
        Self {
            source_chain_id: 56,
            dest_chain_id: 97,
            option: 0,
            callback_address: None,
            refund_address: None,
        }
    }
}

/// Query key returned by the attestation gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttestationHandle {
    pub query_hash: String,
    #[serde(default)]
    pub nonce: u64,
}

// ============================================================================
// API TYPES
// ============================================================================

/// Query parameters of the proof endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProofQuery {
    /// Wallet address whose transaction should be proved
    #[validate(
        required(message = "Address is required"),
        length(min = 1, message = "Address is required")
    )]
    #[param(example = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")]
    pub address: Option<String>,
}

/// Success acknowledgment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct SuccessResponse {
    #[schema(example = true)]
    pub success: bool,
}

impl SuccessResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// In-band failure body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct FailureResponse {
    #[schema(example = "-10001")]
    pub code: String,
    #[schema(example = "Address is required")]
    pub message: String,
}

impl FailureResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Health status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall system status
    pub status: HealthStatus,
    /// Chain node connectivity
    pub blockchain: HealthStatus,
    pub timestamp: DateTime<Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
}

impl HealthResponse {
    #[must_use]
    pub fn new(blockchain: HealthStatus) -> Self {
        Self {
            status: blockchain,
            blockchain,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Rate limit exceeded response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RateLimitResponse {
    pub code: String,
    pub message: String,
    /// Seconds until a request will be admitted again
    #[schema(example = 1)]
    pub retry_after: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_state_parsing() {
        let states = vec![
            ("QUERY_STATE_PENDING", QueryState::Pending, false),
            ("QUERY_STATE_EXECUTING", QueryState::Executing, false),
            ("QUERY_STATE_COMPLETED", QueryState::Completed, true),
            ("QUERY_STATE_COMPLETED_PARTIAL", QueryState::CompletedPartial, true),
            ("QUERY_STATE_FAILED", QueryState::Failed, true),
            ("QUERY_STATE_CANCELLED", QueryState::Cancelled, true),
            ("QUERY_STATE_EXPIRED", QueryState::Expired, true),
        ];

        for (string, state, terminal) in states {
            let parsed: QueryState = serde_json::from_value(serde_json::json!(string)).unwrap();
            assert_eq!(parsed, state);
            assert_eq!(parsed.as_str(), string);
            assert_eq!(parsed.is_terminal(), terminal);
        }

        let unknown: QueryState =
            serde_json::from_value(serde_json::json!("QUERY_STATE_SOMETHING_NEW")).unwrap();
        assert_eq!(unknown, QueryState::Unknown);
        assert!(!unknown.is_terminal());
    }

    #[test]
    fn test_completed_is_not_a_failure() {
        assert!(!QueryState::Completed.is_failure());
        assert!(QueryState::CompletedPartial.is_failure());
        assert!(QueryState::Expired.is_failure());
    }

    #[test]
    fn test_execution_results_deserialize_running() {
        let json = serde_json::json!({
            "execution_id": "01HX",
            "state": "QUERY_STATE_EXECUTING"
        });
        let results: ExecutionResults = serde_json::from_value(json).unwrap();
        assert!(results.rows().is_empty());
        assert_eq!(results.row_count(), 0);
    }

    #[test]
    fn test_execution_results_deserialize_completed() {
        let json = serde_json::json!({
            "execution_id": "01HX",
            "state": "QUERY_STATE_COMPLETED",
            "result": {
                "rows": [{"hash": "0xdeadbeef", "block_time": "2024-01-01"}],
                "metadata": {"row_count": 1, "column_names": ["hash", "block_time"]}
            }
        });
        let results: ExecutionResults = serde_json::from_value(json).unwrap();
        assert_eq!(results.row_count(), 1);
        assert_eq!(results.rows()[0]["hash"], "0xdeadbeef");
    }

    #[test]
    fn test_prove_error_kind_from_code() {
        assert_eq!(ProveErrorKind::from_code(1), ProveErrorKind::InvalidInput);
        assert_eq!(ProveErrorKind::from_code(2), ProveErrorKind::InvalidCustomInput);
        assert_eq!(ProveErrorKind::from_code(3), ProveErrorKind::ProveFailed);
        assert_eq!(ProveErrorKind::from_code(0), ProveErrorKind::ProveFailed);
        assert_eq!(ProveErrorKind::from_code(42), ProveErrorKind::ProveFailed);
    }

    #[test]
    fn test_proof_query_validation() {
        let query = ProofQuery {
            address: Some("0xABC".to_string()),
        };
        assert!(query.validate().is_ok());

        let query = ProofQuery {
            address: Some(String::new()),
        };
        assert!(query.validate().is_err());

        let query = ProofQuery { address: None };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_success_response_serialization() {
        let json = serde_json::to_value(SuccessResponse::ok()).unwrap();
        assert_eq!(json, serde_json::json!({"success": true}));
    }

    #[test]
    fn test_attestation_route_defaults() {
        let route = AttestationRoute::default();
        assert_eq!(route.source_chain_id, 56);
        assert_eq!(route.dest_chain_id, 97);
        assert_eq!(route.option, 0);
        assert!(route.callback_address.is_none());
        assert!(route.refund_address.is_none());
    }
}
