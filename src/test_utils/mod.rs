//! Test utilities and mock implementations.

pub mod mocks;

pub use mocks::{
    MockAnalyticsClient, MockAttestationClient, MockChainReader, MockConfig, MockProofClient,
    MockSet, execution_results, sample_transaction,
};
