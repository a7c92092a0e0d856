//! Application state management.

use std::sync::Arc;

use crate::domain::{AnalyticsClient, AttestationClient, ChainReader, ProofClient};

use super::service::{PipelineConfig, ProofService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProofService>,
    pub analytics_client: Arc<dyn AnalyticsClient>,
    pub chain_reader: Arc<dyn ChainReader>,
    pub proof_client: Arc<dyn ProofClient>,
    pub attestation_client: Arc<dyn AttestationClient>,
}

impl AppState {
    /// Create a new application state with the default pipeline configuration
    #[must_use]
    pub fn new(
        analytics_client: Arc<dyn AnalyticsClient>,
        chain_reader: Arc<dyn ChainReader>,
        proof_client: Arc<dyn ProofClient>,
        attestation_client: Arc<dyn AttestationClient>,
    ) -> Self {
        Self::with_config(
            analytics_client,
            chain_reader,
            proof_client,
            attestation_client,
            PipelineConfig::default(),
        )
    }

    /// Create a new application state with a custom pipeline configuration
    #[must_use]
    pub fn with_config(
        analytics_client: Arc<dyn AnalyticsClient>,
        chain_reader: Arc<dyn ChainReader>,
        proof_client: Arc<dyn ProofClient>,
        attestation_client: Arc<dyn AttestationClient>,
        config: PipelineConfig,
    ) -> Self {
        let service = Arc::new(ProofService::new(
            Arc::clone(&analytics_client),
            Arc::clone(&chain_reader),
            Arc::clone(&proof_client),
            Arc::clone(&attestation_client),
            config,
        ));
        Self {
            service,
            analytics_client,
            chain_reader,
            proof_client,
            attestation_client,
        }
    }
}
