//! Template path form field.
//!
//! Offers the `.html` files under the template root as `(value, label)`
//! choices and converts stored values between their relative and absolute
//! forms. Which form is shown depends on the process-wide relative mode; see
//! the `settings` module of fluentpages-core for why the mode must not change
//! once layouts are stored.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;

use fluentpages_core::Settings;

use crate::error::TemplateError;
use crate::lister::TemplateLister;

/// File names offered as templates.
pub const HTML_PATTERN: &str = r".*\.html$";

/// One selectable template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateChoice {
    /// Stored value: relative to the root in relative mode, absolute otherwise.
    pub value: String,
    pub label: String,
}

impl TemplateChoice {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplatePathField {
    root: PathBuf,
    /// Root text with exactly one trailing `/`.
    prefix: String,
    relative_mode: bool,
    pattern: Regex,
    recursive: bool,
}

impl TemplatePathField {
    pub fn new(root: &Path, relative_mode: bool) -> Result<Self, TemplateError> {
        let root_text = root.to_string_lossy();
        Ok(Self {
            root: root.to_path_buf(),
            prefix: format!("{}/", root_text.trim_end_matches('/')),
            relative_mode,
            pattern: Regex::new(HTML_PATTERN)?,
            recursive: true,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, TemplateError> {
        Self::new(settings.template_root().as_path(), settings.relative_mode())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn relative_mode(&self) -> bool {
        self.relative_mode
    }

    /// Available templates, in presentation order.
    ///
    /// Relative mode sorts by label and strips the root from each value.
    /// Absolute mode keeps the lister's order untouched.
    pub fn choices<L: TemplateLister + ?Sized>(
        &self,
        lister: &L,
    ) -> Result<Vec<TemplateChoice>, TemplateError> {
        let files = lister.list_files(&self.root, &self.pattern, self.recursive)?;
        let mut choices: Vec<TemplateChoice> = files
            .iter()
            .map(|path| TemplateChoice::new(path.to_string_lossy(), label_for(path)))
            .collect();

        if self.relative_mode {
            choices.sort_by(|a, b| a.label.cmp(&b.label));
            for choice in &mut choices {
                choice.value = choice.value.replacen(&self.prefix, "", 1);
            }
        }
        Ok(choices)
    }

    /// Stored values of [`Self::choices`].
    pub fn values<L: TemplateLister + ?Sized>(&self, lister: &L) -> Result<Vec<String>, TemplateError> {
        Ok(self.choices(lister)?.into_iter().map(|c| c.value).collect())
    }

    /// Accept `value` only if it is one of the current choices.
    pub fn clean<L: TemplateLister + ?Sized>(
        &self,
        lister: &L,
        value: &str,
    ) -> Result<String, TemplateError> {
        if self.values(lister)?.iter().any(|v| v == value) {
            Ok(value.to_string())
        } else {
            Err(TemplateError::InvalidChoice {
                value: value.to_string(),
            })
        }
    }

    /// Bring a stored value into the form the current mode displays.
    ///
    /// Idempotent for a fixed mode. Absolute values outside the root are left
    /// as they are in relative mode.
    pub fn prepare_value(&self, value: Option<&str>) -> Option<String> {
        let value = value?;
        let absolute = Path::new(value).is_absolute();
        let prepared = match (self.relative_mode, absolute) {
            (true, true) if value.starts_with(&self.prefix) => self.strip_root(value),
            (false, false) => self.join_root(value),
            _ => value.to_string(),
        };
        Some(prepared)
    }

    /// Remove the root and any leading separators from `value`.
    ///
    /// Separators repeated right after the root are dropped, so
    /// `/tmpl//a.html` joins back as `/tmpl/a.html`.
    pub fn strip_root(&self, value: &str) -> String {
        value
            .strip_prefix(&self.prefix)
            .unwrap_or(value)
            .trim_start_matches('/')
            .to_string()
    }

    pub fn join_root(&self, value: &str) -> String {
        format!("{}{}", self.prefix, value)
    }
}

/// File stem of `path` (`layouts/two_col.html` → `two_col`).
fn label_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
