//! EVM JSON-RPC chain reader.
//!
//! Looks up transactions and receipts by hash over plain JSON-RPC 2.0 and
//! decodes them with alloy's RPC types. Transport failures are retried with a fixed delay; node-reported errors
//! are returned immediately.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, instrument, warn};

use alloy::consensus::Transaction as _;
use alloy::eips::Typed2718;
use alloy::primitives::{U64, U256};
use alloy::rpc::types::{Transaction, TransactionReceipt as RpcReceipt};

use crate::domain::{AppError, BlockchainError, ChainReader, TransactionReceipt, TransactionRecord};

/// Configuration for the RPC client
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Abstract transport for JSON-RPC calls to enable testing
#[async_trait]
pub trait EvmRpcProvider: Send + Sync {
    /// Send a JSON-RPC request; a `null` result is returned as `Value::Null`
    async fn send_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, AppError>;
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// HTTP-based JSON-RPC provider
pub struct HttpEvmRpcProvider {
    http_client: Client,
    rpc_url: String,
}

impl HttpEvmRpcProvider {
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Blockchain(BlockchainError::Connection(e.to_string())))?;

        Ok(Self {
            http_client,
            rpc_url: rpc_url.to_string(),
        })
    }
}

#[async_trait]
impl EvmRpcProvider for HttpEvmRpcProvider {
    async fn send_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, AppError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: method.to_string(),
            params,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Blockchain(BlockchainError::Timeout(e.to_string()))
                } else {
                    AppError::Blockchain(BlockchainError::Connection(e.to_string()))
                }
            })?;

        if !response.status().is_success() {
            return Err(AppError::Blockchain(BlockchainError::Connection(format!(
                "RPC endpoint returned HTTP {}",
                response.status()
            ))));
        }

        let rpc_response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| AppError::Blockchain(BlockchainError::Malformed(e.to_string())))?;

        if let Some(error) = rpc_response.error {
            return Err(AppError::Blockchain(BlockchainError::RpcError(format!(
                "{}: {}",
                error.code, error.message
            ))));
        }

        Ok(rpc_response.result.unwrap_or(serde_json::Value::Null))
    }
}

/// Decode a node transaction into a record keyed by the hash it was looked up with.
///
/// Pre-EIP-155 legacy transactions carry no chain id and report `0`.
fn transaction_record(hash: &str, tx: &Transaction) -> TransactionRecord {
    TransactionRecord {
        hash: hash.to_string(),
        chain_id: tx.chain_id().unwrap_or_default(),
        block_number: tx.block_number,
        nonce: tx.nonce(),
        tx_type: u64::from(tx.ty()),
        gas_price: tx.gas_price().map(U256::from),
        max_priority_fee_per_gas: tx.max_priority_fee_per_gas().map(U256::from),
        max_fee_per_gas: tx
            .is_dynamic_fee()
            .then(|| U256::from(tx.max_fee_per_gas())),
        gas_limit: tx.gas_limit(),
        from: tx.inner.signer(),
        to: tx.to(),
        value: tx.value(),
    }
}

fn transaction_receipt(receipt: &RpcReceipt) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: receipt.transaction_hash.to_string(),
        block_number: receipt.block_number,
        success: receipt.status(),
    }
}

/// JSON-RPC chain reader for EVM nodes
pub struct EvmRpcClient {
    provider: Box<dyn EvmRpcProvider>,
    config: RpcClientConfig,
}

impl EvmRpcClient {
    /// Create a client talking HTTP to `rpc_url`
    pub fn new(rpc_url: &str, config: RpcClientConfig) -> Result<Self, AppError> {
        let provider = HttpEvmRpcProvider::new(rpc_url, config.timeout)?;
        info!(rpc_url = %rpc_url, "EVM RPC client created");
        Ok(Self::with_provider(Box::new(provider), config))
    }

    pub fn with_defaults(rpc_url: &str) -> Result<Self, AppError> {
        Self::new(rpc_url, RpcClientConfig::default())
    }

    /// Create a client over a custom provider
    pub fn with_provider(provider: Box<dyn EvmRpcProvider>, config: RpcClientConfig) -> Self {
        Self { provider, config }
    }

    async fn rpc_call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<R, AppError> {
        let mut attempt = 0;
        loop {
            match self.provider.send_request(method, params.clone()).await {
                Ok(value) => {
                    return serde_json::from_value(value).map_err(|e| {
                        AppError::Blockchain(BlockchainError::Malformed(format!(
                            "{}: {}",
                            method, e
                        )))
                    });
                }
                Err(e) if attempt < self.config.max_retries && is_retryable(&e) => {
                    attempt += 1;
                    warn!(
                        method = %method,
                        attempt = attempt,
                        max_retries = self.config.max_retries,
                        error = %e,
                        "RPC call failed, retrying"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn is_retryable(err: &AppError) -> bool {
    matches!(
        err,
        AppError::Blockchain(BlockchainError::Connection(_) | BlockchainError::Timeout(_))
    )
}

#[async_trait]
impl ChainReader for EvmRpcClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        let chain_id: U64 = self.rpc_call("eth_chainId", serde_json::json!([])).await?;
        debug!(chain_id = %chain_id, "Chain node reachable");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_transaction(&self, hash: &str) -> Result<Option<TransactionRecord>, AppError> {
        let tx: Option<Transaction> = self
            .rpc_call("eth_getTransactionByHash", serde_json::json!([hash]))
            .await?;
        Ok(tx.map(|tx| transaction_record(hash, &tx)))
    }

    #[instrument(skip(self))]
    async fn get_transaction_receipt(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionReceipt>, AppError> {
        let receipt: Option<RpcReceipt> = self
            .rpc_call("eth_getTransactionReceipt", serde_json::json!([hash]))
            .await?;
        Ok(receipt.as_ref().map(transaction_receipt))
    }
}
