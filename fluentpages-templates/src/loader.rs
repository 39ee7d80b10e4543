//! Template source loading.

use std::path::{Component, Path, PathBuf};

use fluentpages_core::Settings;

use crate::error::{io_err, TemplateError};

/// A loaded template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Name the template was requested by.
    pub name: String,
    pub path: PathBuf,
    pub source: String,
}

/// Resolves template names against a single root directory.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    root: PathBuf,
}

impl TemplateLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.template_root().as_path())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path `name` refers to, without checking that it exists.
    ///
    /// Absolute names are taken as they are; relative names may not climb
    /// out of the root.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, TemplateError> {
        let candidate = Path::new(name);
        if candidate.is_absolute() {
            return Ok(candidate.to_path_buf());
        }
        let escapes = candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
        if name.is_empty() || escapes {
            return Err(TemplateError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(self.root.join(candidate))
    }

    pub fn get_template(&self, name: &str) -> Result<Template, TemplateError> {
        let path = self.resolve(name)?;
        if !path.is_file() {
            tracing::debug!(name, path = %path.display(), "template missing");
            return Err(TemplateError::NotFound {
                name: name.to_string(),
            });
        }
        let source = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        Ok(Template {
            name: name.to_string(),
            path,
            source,
        })
    }
}
