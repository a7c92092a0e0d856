//! Application layer containing business logic and shared state.

pub mod mapper;
pub mod service;
pub mod state;

pub use mapper::{map_to_proof_request, quantity_hex};
pub use service::{PipelineConfig, PipelineStage, ProofService};
pub use state::AppState;
