//! JSON REST gateway over an Ethereum JSON-RPC endpoint.
pub mod api;
pub mod config;
pub mod contract;
pub mod error;
pub mod gateway;
pub mod models;
pub mod rpc;
