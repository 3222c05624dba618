//! Onoma API client, wire types, and batch dispatch.

pub mod client;
pub mod dispatch;
pub mod types;

pub use client::{OnomaClient, DEFAULT_BASE_URL};
pub use dispatch::{dispatch_batch, NameOracle, OracleFuture, Service};
pub use types::ScoredResult;
