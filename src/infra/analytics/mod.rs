//! Analytics query service implementations.

pub mod dune;

pub use dune::{DEFAULT_DUNE_API_URL, DEFAULT_QUERY_ID, DuneAnalyticsClient};
