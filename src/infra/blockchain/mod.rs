//! Blockchain client implementations.

pub mod evm;

pub use evm::{EvmRpcClient, EvmRpcProvider, HttpEvmRpcProvider, RpcClientConfig};
