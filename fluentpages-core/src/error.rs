//! Error types for fluentpages-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{LayoutId, PageId};

/// All errors that can arise from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse registry at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.fluentpages/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("layout {id} not found")]
    LayoutNotFound { id: LayoutId },

    #[error("page {id} not found")]
    PageNotFound { id: PageId },

    /// Key is not a slug (ASCII letters, digits, `-`, `_`).
    #[error("invalid layout key '{key}': use letters, numbers, underscores or hyphens")]
    InvalidKey { key: String },

    #[error("a layout with key '{key}' already exists")]
    DuplicateKey { key: String },

    #[error("invalid layout title: {reason}")]
    InvalidTitle { reason: &'static str },

    /// The template path is not one of the available template choices.
    #[error("'{path}' is not one of the available templates")]
    InvalidTemplatePath { path: String },

    /// A layout page cannot be saved without a layout.
    #[error("a layout must be selected before the page can be saved")]
    LayoutRequired,

    #[error("layout {id} is still used by {pages} page(s)")]
    LayoutInUse { id: LayoutId, pages: usize },

    #[error("page {id} does not use a layout")]
    NotALayoutPage { id: PageId },

    #[error("'{username}' may not change the layout of page {page}")]
    PermissionDenied { username: String, page: PageId },
}

/// Boot-time configuration errors. Any of these stops the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The setting `template_dir` or `template_dirs[0]` need to be defined!")]
    TemplateDirUndefined,

    #[error("The setting `{setting}` needs to be an absolute path!")]
    NotAbsolute { setting: &'static str, path: PathBuf },

    #[error("The path `{path}` in the setting `{setting}` does not exist!")]
    DoesNotExist { setting: &'static str, path: String },

    #[error("configuration not found at {path}")]
    NotFound { path: PathBuf },

    #[error("failed to parse configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Convenience constructor for [`RegistryError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RegistryError {
    RegistryError::Io {
        path: path.into(),
        source,
    }
}
