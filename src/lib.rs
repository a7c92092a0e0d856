//! Transaction proof relayer.
//!
//! Looks up the most recent transaction of a wallet through an analytics
//! query, reads it from an EVM node, proves it and relays the proof to an
//! attestation gateway.

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
