//! Dune analytics client.
//!
//! Executes a saved, parameterized Dune query bound to a wallet address and
//! fetches execution results by execution id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error, instrument, warn};

use crate::domain::{
    AnalyticsClient, AppError, ExecutionResults, ExternalServiceError, QueryExecution,
};
use crate::infra::build_http_client;

/// Default Dune API base URL
pub const DEFAULT_DUNE_API_URL: &str = "https://api.dune.com/api/v1";

/// Saved query returning the transactions of a wallet, newest first
pub const DEFAULT_QUERY_ID: u64 = 4_085_976;

/// Header carrying the Dune API key
pub const API_KEY_HEADER: &str = "X-Dune-API-Key";

#[derive(Debug, Serialize)]
struct ExecuteQueryBody<'a> {
    query_parameters: QueryParameters<'a>,
}

#[derive(Debug, Serialize)]
struct QueryParameters<'a> {
    wallet_address: &'a str,
}

/// Analytics client backed by the Dune API
#[derive(Debug, Clone)]
pub struct DuneAnalyticsClient {
    http_client: Client,
    api_key: Option<SecretString>,
    base_url: String,
    query_id: u64,
}

impl DuneAnalyticsClient {
    /// Create a new Dune client
    ///
    /// # Arguments
    /// * `api_key` - Dune API key. Requests are sent unauthenticated when `None`.
    /// * `base_url` - Optional custom API base URL. Defaults to the public Dune API.
    /// * `query_id` - Saved query to execute
    /// * `timeout` - Per-request timeout
    pub fn new(
        api_key: Option<SecretString>,
        base_url: Option<String>,
        query_id: u64,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        if api_key.is_none() {
            warn!("Dune client created without an API key");
        }
        Ok(Self {
            http_client: build_http_client(timeout)?,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_DUNE_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            query_id,
        })
    }

    pub fn query_id(&self) -> u64 {
        self.query_id
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key.expose_secret()),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let response = self.authorize(request).send().await.map_err(|e| {
            error!(error = %e, "Dune API request failed");
            AppError::ExternalService(ExternalServiceError::from(e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Dune API returned error");
            return Err(AppError::ExternalService(ExternalServiceError::ApiError {
                status_code: status.as_u16(),
                message: body,
            }));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Dune response");
            AppError::ExternalService(ExternalServiceError::ParseError(e.to_string()))
        })
    }
}

#[async_trait]
impl AnalyticsClient for DuneAnalyticsClient {
    #[instrument(skip(self))]
    async fn execute_query(&self, wallet_address: &str) -> Result<QueryExecution, AppError> {
        let url = format!("{}/query/{}/execute", self.base_url, self.query_id);
        debug!(url = %url, "Executing Dune query");

        let body = ExecuteQueryBody {
            query_parameters: QueryParameters { wallet_address },
        };
        self.send(self.http_client.post(&url).json(&body)).await
    }

    #[instrument(skip(self))]
    async fn get_execution_results(
        &self,
        execution_id: &str,
    ) -> Result<ExecutionResults, AppError> {
        let url = format!("{}/execution/{}/results", self.base_url, execution_id);
        debug!(url = %url, "Fetching Dune execution results");

        self.send(self.http_client.get(&url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let client =
            DuneAnalyticsClient::new(None, None, DEFAULT_QUERY_ID, Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url, DEFAULT_DUNE_API_URL);
        assert_eq!(client.query_id(), 4_085_976);
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = DuneAnalyticsClient::new(
            Some(SecretString::from("key")),
            Some("http://localhost:9000/api/v1/".to_string()),
            1,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:9000/api/v1");
    }

    #[test]
    fn test_execute_body_shape() {
        let body = ExecuteQueryBody {
            query_parameters: QueryParameters {
                wallet_address: "0xABC",
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"query_parameters": {"wallet_address": "0xABC"}})
        );
    }
}
