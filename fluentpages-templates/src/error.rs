//! Error types for fluentpages-templates.

use std::path::PathBuf;

use thiserror::Error;

use fluentpages_core::{types::LayoutId, RegistryError};

/// All errors that can arise from listing, loading and scanning templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template name does not resolve to a file under the template root.
    #[error("template '{name}' does not exist")]
    NotFound { name: String },

    /// Filesystem error while listing or reading templates.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid template file pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A submitted template path is not one of the current choices.
    #[error("select a valid choice; '{value}' is not one of the available templates")]
    InvalidChoice { value: String },

    #[error("syntax error in template '{template}': {message}")]
    Syntax { template: String, message: String },

    /// `extends`/`include` chain loops back onto itself.
    #[error("template '{template}' includes itself through {chain}")]
    Recursion { template: String, chain: String },
}

/// Failure of a layout metadata lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Layout not found")]
    NotFound { id: LayoutId },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TemplateError {
    TemplateError::Io {
        path: path.into(),
        source,
    }
}
