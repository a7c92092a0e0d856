//! Attestation gateway implementations.

pub mod gateway;

pub use gateway::{AttestationConfig, BrevisGatewayClient, STATUS_PATH, SUBMIT_PATH};
