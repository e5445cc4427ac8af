// SPDX-License-Identifier: GPL-3.0-only
//! Error types for the application
//!
//! None of these are fatal to the running daemon: the controller logs them and
//! degrades to "not connected" or a no-op.

use std::path::PathBuf;

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// The connector hierarchy could not be listed
    #[error("Failed to enumerate connectors in {}: {source}", path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File watch setup failed
    #[error("Failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The mutator command line is empty or cannot be split
    #[error("Invalid mutator command '{0}'")]
    MutatorCommand(String),

    /// The mutator process could not be started
    #[error("Failed to spawn mutator {program}: {source}")]
    MutatorSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Unknown display mode name
    #[error("Unknown display mode '{0}' (expected internal, external, join or mirror)")]
    InvalidMode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;
