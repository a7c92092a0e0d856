//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    AppError, AttestationError, BlockchainError, CODE_ADDRESS_REQUIRED, CODE_ATTESTATION_FAILED,
    CODE_ATTESTATION_TIMEOUT, CODE_NO_TRANSACTION_FOUND, CODE_PROVE_FAILED,
    CODE_PROVE_INVALID_CUSTOM_INPUT, CODE_PROVE_INVALID_INPUT, CODE_QUERY_FAILED,
    CODE_QUERY_TIMEOUT, CODE_TRANSACTION_NOT_FOUND, CODE_UNCLASSIFIED, CODE_UPSTREAM,
    ExternalServiceError, MESSAGE_UNCLASSIFIED, ProverError, QueryError, ValidationError,
};
pub use traits::{AnalyticsClient, AttestationClient, ChainReader, ProofClient};
pub use types::{
    AttestationHandle, AttestationRoute, ExecutionResults, FailureResponse, HealthResponse,
    HealthStatus, LEGACY_TX_TYPE, ProofPayload, ProofQuery, ProofRequest, ProofResult, ProveErrorKind,
    QueryExecution, QueryResult, QueryResultMetadata, QueryState, RateLimitResponse,
    SuccessResponse, TransactionData, TransactionReceipt, TransactionRecord,
};
