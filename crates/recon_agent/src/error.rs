//! Error types for the agent's fallible boundaries.
//!
//! None of these reach the game harness: the session recovers from each of
//! them locally and keeps playing at reduced confidence.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a query to the external evaluation engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The process is gone: it exited, closed its pipes, or missed a deadline.
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    /// The process answered, but not with something we could use.
    #[error("malformed engine response: {0}")]
    Malformed(String),
    /// The process could not be started at all.
    #[error("failed to spawn engine '{path}': {reason}")]
    Spawn { path: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Problems loading a recorded game for replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read game record {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML game record: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse JSON game record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid starting position: {0}")]
    Fen(#[from] chess_core::FenError),
}
