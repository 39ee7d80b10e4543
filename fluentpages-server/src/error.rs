use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the HTTP runtime.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] fluentpages_core::ConfigError),

    #[error("registry error: {0}")]
    Registry(#[from] fluentpages_core::RegistryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("request head not received within {0:?}")]
    Timeout(std::time::Duration),

    #[error("server error: {0}")]
    Runtime(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ServerError {
    ServerError::Io {
        path: path.into(),
        source,
    }
}
