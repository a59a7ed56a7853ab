// src/infra/errors.rs — Error types for the TokenScript engine

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    // Caller errors
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    // Remote errors (never retried by the engine)
    #[error("Fetch from '{source_name}' failed: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    #[error("No definition source could resolve '{id}': {attempts}")]
    SourcesExhausted { id: String, attempts: String },

    // Completion errors
    #[error("'{operation}' ended without producing a result")]
    Abandoned { operation: String },

    // Infra
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    pub fn fetch(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Fetch {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn abandoned(operation: impl Into<String>) -> Self {
        EngineError::Abandoned {
            operation: operation.into(),
        }
    }

    /// True for failures that came from a remote origin rather than from
    /// local infrastructure.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            EngineError::Fetch { .. } | EngineError::SourcesExhausted { .. }
        )
    }
}

/// Failures of a [`DefinitionStore`](crate::storage::DefinitionStore)
/// backend. A miss is not an error; it is `Ok(None)`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Store task failed: {0}")]
    Task(String),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
