//! Error types shared across the hooks.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn the hook's stdin payload into [`crate::models::HookInformation`].
#[derive(Error, Debug)]
pub enum HookInputError {
    #[error("Error reading hook input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error parsing hook input: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Pricing file not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Error reading pricing file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Error loading pricing data: {0}")]
    Invalid(#[from] serde_json::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TimestampError {
    #[error("unparsable timestamp: {0:?}")]
    Unparsable(String),
}

/// Aggregation is best-effort: callers log this and keep the session record.
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("failed to list {}: {source}", dir.display())]
    Scan {
        dir: PathBuf,
        source: walkdir::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize aggregation: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum GitError {
    #[error("failed to spawn git {args}: {source}")]
    Spawn {
        args: String,
        source: std::io::Error,
    },

    #[error("Git command failed: git {args}: {stderr}")]
    Command { args: String, stderr: String },
}
