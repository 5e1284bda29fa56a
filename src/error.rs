//! Error types for the GPU scheduler kernel.
//!
//! One variant per subsystem, following the same struct-style shape
//! throughout so callers can match on fields instead of parsing messages.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// A request field violated a user-facing constraint (e.g. `coresreq > 100`).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// A per-family request asked for more partitions than the node has devices.
    #[error("node {node_id} cannot satisfy request for {requested} device(s), only {available} present")]
    CapacityExceeded {
        node_id: String,
        requested: u32,
        available: usize,
    },

    /// The advisory lock annotation is already held by another scheduler.
    #[error("node {node_id} lock contention: {reason}")]
    LockContention { node_id: String, reason: String },

    /// The advisory lock update failed after exhausting its retry budget.
    #[error("node {node_id} lock update exhausted {attempts} retries")]
    LockRetryExhausted { node_id: String, attempts: u32 },

    /// The lock annotation's timestamp could not be parsed as RFC-3339.
    #[error("node {node_id} lock timestamp is not valid RFC-3339: {source}")]
    TimestampParse {
        node_id: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The configuration file could not be parsed.
    #[error("configuration error: {message}")]
    Config { message: String },
}
