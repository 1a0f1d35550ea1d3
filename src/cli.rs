//! CLI command implementations for Conquer.

pub(crate) mod mapgen;
pub(crate) mod replay;
pub(crate) mod simulate;

use clap::ValueEnum;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Output format for the `simulate` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// CLI error type.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// Reading or writing a file failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being done.
        context: String,
        /// Underlying failure.
        source: std::io::Error,
    },
    /// A JSON document could not be read or written.
    #[error("{context}: {source}")]
    Json {
        /// What was being done.
        context: String,
        /// Underlying failure.
        source: serde_json::Error,
    },
    /// Room settings were rejected.
    #[error("invalid settings: {0}")]
    Settings(#[from] conquer::SettingsError),
    /// Map generation failed.
    #[error(transparent)]
    Generation(#[from] conquer::GenerationError),
    /// A replay could not be loaded or played back.
    #[error(transparent)]
    Replay(#[from] conquer::ReplayError),
    /// Command-line arguments are inconsistent.
    #[error("{0}")]
    Usage(String),
}

/// The given seed, or one derived from the clock.
pub(crate) fn seed_or_clock(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()))
            .unwrap_or(42)
    })
}
