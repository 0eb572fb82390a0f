//! Error types for the StateBench domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all StateBench operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Strategy errors ---
    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    // --- Timeline errors ---
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum StrategyError {
    #[error("Unknown strategy: {name}. Available: {}", available.join(", "))]
    UnknownStrategy {
        name: String,
        available: Vec<String>,
    },
}

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("Unknown track: {name}. Available: {}", available.join(", "))]
    UnknownTrack {
        name: String,
        available: Vec<String>,
    },

    #[error("Malformed timeline on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Failed to read timelines from {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}
