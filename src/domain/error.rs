//! Error taxonomy for the proof pipeline.
//!
//! Business errors carry a stable negative code that is reported in-band to
//! the caller. Everything else is unclassified and rendered as a generic
//! failure so that internal details never leak.

use thiserror::Error;

/// Code reported for upstream service failures.
pub const CODE_UPSTREAM: &str = "-10000";
/// Code reported when the address query parameter is missing or empty.
pub const CODE_ADDRESS_REQUIRED: &str = "-10001";
pub const CODE_QUERY_TIMEOUT: &str = "-10002";
pub const CODE_NO_TRANSACTION_FOUND: &str = "-10003";
pub const CODE_QUERY_FAILED: &str = "-10004";
pub const CODE_TRANSACTION_NOT_FOUND: &str = "-10005";
pub const CODE_PROVE_INVALID_INPUT: &str = "-10006";
pub const CODE_PROVE_INVALID_CUSTOM_INPUT: &str = "-10007";
pub const CODE_PROVE_FAILED: &str = "-10008";
pub const CODE_ATTESTATION_FAILED: &str = "-10009";
pub const CODE_ATTESTATION_TIMEOUT: &str = "-10010";

/// Code and message used for unclassified errors.
pub const CODE_UNCLASSIFIED: &str = "-99999";
pub const MESSAGE_UNCLASSIFIED: &str = "Internal server error";

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Blockchain error: {0}")]
    Blockchain(#[from] BlockchainError),

    #[error("Prover error: {0}")]
    Prover(#[from] ProverError),

    #[error("Attestation error: {0}")]
    Attestation(#[from] AttestationError),

    #[error("External service error: {0}")]
    ExternalService(#[from] ExternalServiceError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Caller input errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Address is required")]
    AddressRequired,
}

/// Analytics query errors
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("No transaction found")]
    NoTransactionFound,

    #[error("Query failed with state {0}")]
    Failed(String),

    #[error("Query did not complete within {0} seconds")]
    Timeout(u64),
}

/// Chain node errors
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Malformed RPC response: {0}")]
    Malformed(String),
}

/// Errors reported by the proving service
#[derive(Debug, Error)]
pub enum ProverError {
    #[error("Invalid receipt/storage/transaction input: {0}")]
    InvalidInput(String),

    #[error("Invalid custom input: {0}")]
    InvalidCustomInput(String),

    #[error("Failed to prove: {0}")]
    ProveFailed(String),
}

/// Errors reported by the attestation gateway
#[derive(Debug, Error)]
pub enum AttestationError {
    #[error("Attestation rejected: {0}")]
    Rejected(String),

    #[error("Attestation not finalized within {0} seconds")]
    Timeout(u64),
}

/// Transport-level errors from any HTTP collaborator
#[derive(Debug, Error)]
pub enum ExternalServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error ({status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl AppError {
    /// Business code and caller-facing message, or `None` for unclassified errors.
    pub fn business_code(&self) -> Option<(&'static str, String)> {
        match self {
            AppError::Validation(ValidationError::AddressRequired) => {
                Some((CODE_ADDRESS_REQUIRED, "Address is required".to_string()))
            }
            AppError::Query(QueryError::NoTransactionFound) => {
                Some((CODE_NO_TRANSACTION_FOUND, "No transaction found".to_string()))
            }
            AppError::Query(QueryError::Failed(_)) => {
                Some((CODE_QUERY_FAILED, "Query failed".to_string()))
            }
            AppError::Query(QueryError::Timeout(_)) => {
                Some((CODE_QUERY_TIMEOUT, "Query timed out".to_string()))
            }
            AppError::Blockchain(BlockchainError::TransactionNotFound(_)) => Some((
                CODE_TRANSACTION_NOT_FOUND,
                "Transaction not found".to_string(),
            )),
            AppError::Blockchain(e) => Some((CODE_UPSTREAM, e.to_string())),
            AppError::ExternalService(e) => Some((CODE_UPSTREAM, e.to_string())),
            AppError::Prover(e) => {
                let code = match e {
                    ProverError::InvalidInput(_) => CODE_PROVE_INVALID_INPUT,
                    ProverError::InvalidCustomInput(_) => CODE_PROVE_INVALID_CUSTOM_INPUT,
                    ProverError::ProveFailed(_) => CODE_PROVE_FAILED,
                };
                Some((code, e.to_string()))
            }
            AppError::Attestation(e) => {
                let code = match e {
                    AttestationError::Rejected(_) => CODE_ATTESTATION_FAILED,
                    AttestationError::Timeout(_) => CODE_ATTESTATION_TIMEOUT,
                };
                Some((code, e.to_string()))
            }
            AppError::Internal(_) | AppError::RateLimited => None,
        }
    }
}

impl From<reqwest::Error> for ExternalServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExternalServiceError::Timeout(err.to_string())
        } else if err.is_decode() {
            ExternalServiceError::ParseError(err.to_string())
        } else {
            ExternalServiceError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_required_code() {
        let err = AppError::Validation(ValidationError::AddressRequired);
        let (code, message) = err.business_code().unwrap();
        assert_eq!(code, "-10001");
        assert_eq!(message, "Address is required");
    }

    #[test]
    fn test_query_error_codes() {
        let (code, _) = AppError::from(QueryError::NoTransactionFound)
            .business_code()
            .unwrap();
        assert_eq!(code, "-10003");

        let (code, message) = AppError::from(QueryError::Failed("QUERY_STATE_FAILED".into()))
            .business_code()
            .unwrap();
        assert_eq!(code, "-10004");
        assert_eq!(message, "Query failed");
    }

    #[test]
    fn test_upstream_errors_carry_message() {
        let err = AppError::from(ExternalServiceError::Network("connection refused".into()));
        let (code, message) = err.business_code().unwrap();
        assert_eq!(code, CODE_UPSTREAM);
        assert!(message.contains("connection refused"));
    }

    #[test]
    fn test_transaction_not_found_code() {
        let err = AppError::from(BlockchainError::TransactionNotFound("0xdead".into()));
        assert_eq!(err.business_code().unwrap().0, "-10005");
    }

    #[test]
    fn test_prover_error_codes() {
        let cases = [
            (ProverError::InvalidInput("x".into()), "-10006"),
            (ProverError::InvalidCustomInput("x".into()), "-10007"),
            (ProverError::ProveFailed("x".into()), "-10008"),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).business_code().unwrap().0, expected);
        }
    }

    #[test]
    fn test_unclassified_errors_have_no_code() {
        assert!(AppError::Internal("boom".into()).business_code().is_none());
        assert!(AppError::RateLimited.business_code().is_none());
    }
}
