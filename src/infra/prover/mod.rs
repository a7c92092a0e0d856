//! Proving service implementations.

pub mod brevis;

pub use brevis::{BrevisProverClient, PROVE_PATH};
