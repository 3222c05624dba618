//! Bulk name scoring against the Onoma API.
//!
//! Streams delimited records from a file, groups them into per-shape
//! batches, submits each batch to a remote scoring service, and writes one
//! merged output row per record. Runs are resumable: a rerun replays the
//! output file and only submits records it has no row for.

pub mod api;
pub mod batch;
pub mod config;
pub mod digest;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod resume;
pub mod script;

pub use config::RunConfig;
pub use error::AppError;
pub use pipeline::{Pipeline, RunSummary};
