//! Process configuration, validated once at startup.
//!
//! `<home>/.fluentpages/config.yaml` is parsed into [`RawSettings`] and then
//! validated into an immutable [`Settings`]. Nothing else in the workspace
//! reads configuration; every component receives the validated object.
//!
//! # Relative mode
//!
//! `relative_template_dir` decides whether stored template paths omit the
//! template root. The flag is not recorded next to the stored values: if it is
//! flipped after layouts were saved, those values are interpreted in the new
//! mode. Relative values saved earlier become relative to nothing once the flag
//! is off, and absolute values are shown relative only while they still begin
//! with the root. Keep the flag fixed for the lifetime of a data directory.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::permissions::Principal;

pub const CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8765";
pub const DEFAULT_FALLBACK_LANGUAGE: &str = "en";

/// Allowed content kinds for one placeholder slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SlotConfig {
    #[serde(default)]
    pub plugins: Vec<String>,
}

/// Configuration file as written by the operator, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSettings {
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
    #[serde(default)]
    pub template_dirs: Vec<PathBuf>,
    #[serde(default = "default_true")]
    pub relative_template_dir: bool,
    #[serde(default)]
    pub placeholders: BTreeMap<String, SlotConfig>,
    #[serde(default)]
    pub fallback_language: Option<String>,
    #[serde(default)]
    pub principals: Vec<Principal>,
    #[serde(default)]
    pub listen: Option<String>,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            template_dir: None,
            template_dirs: Vec::new(),
            relative_template_dir: true,
            placeholders: BTreeMap::new(),
            fallback_language: None,
            principals: Vec::new(),
            listen: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Absolute, existing directory holding the page templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRoot(PathBuf);

impl TemplateRoot {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for TemplateRoot {
    /// Always rendered with one trailing separator, e.g. `/srv/templates/`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", with_trailing_slash(&self.0))
    }
}

/// Validated, immutable configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    template_root: TemplateRoot,
    relative_mode: bool,
    placeholders: BTreeMap<String, SlotConfig>,
    fallback_language: String,
    principals: Vec<Principal>,
    listen: String,
}

impl Settings {
    /// Validate raw settings. The explicit `template_dir` wins over
    /// `template_dirs[0]`; the chosen one must be absolute and exist.
    pub fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let (setting, dir) = match (raw.template_dir, raw.template_dirs.into_iter().next()) {
            (Some(dir), _) => ("template_dir", dir),
            (None, Some(dir)) => ("template_dirs[0]", dir),
            (None, None) => return Err(ConfigError::TemplateDirUndefined),
        };
        if dir.as_os_str().is_empty() {
            return Err(ConfigError::TemplateDirUndefined);
        }
        if !dir.is_absolute() {
            return Err(ConfigError::NotAbsolute { setting, path: dir });
        }
        if !dir.exists() {
            return Err(ConfigError::DoesNotExist {
                setting,
                path: with_trailing_slash(&dir),
            });
        }

        Ok(Settings {
            template_root: TemplateRoot(dir),
            relative_mode: raw.relative_template_dir,
            placeholders: raw.placeholders,
            fallback_language: raw
                .fallback_language
                .unwrap_or_else(|| DEFAULT_FALLBACK_LANGUAGE.to_string()),
            principals: raw.principals,
            listen: raw.listen.unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
        })
    }

    /// Minimal settings: a template root and the relative-mode flag.
    pub fn new(template_dir: impl Into<PathBuf>, relative_mode: bool) -> Result<Self, ConfigError> {
        Self::from_raw(RawSettings {
            template_dir: Some(template_dir.into()),
            relative_template_dir: relative_mode,
            ..RawSettings::default()
        })
    }

    pub fn template_root(&self) -> &TemplateRoot {
        &self.template_root
    }

    pub fn relative_mode(&self) -> bool {
        self.relative_mode
    }

    /// Allowed content kinds of `slot`; empty when the slot is not configured.
    pub fn allowed_plugins(&self, slot: &str) -> Vec<String> {
        self.placeholders
            .get(slot)
            .map(|c| c.plugins.clone())
            .unwrap_or_default()
    }

    pub fn fallback_language(&self) -> &str {
        &self.fallback_language
    }

    pub fn listen(&self) -> &str {
        &self.listen
    }

    /// The configured principal named `username`, or the anonymous principal.
    pub fn principal(&self, username: Option<&str>) -> Principal {
        username
            .and_then(|name| self.principals.iter().find(|p| p.username == name))
            .cloned()
            .unwrap_or_else(Principal::anonymous)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// `<home>/.fluentpages/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".fluentpages").join(CONFIG_FILE)
}

/// Load and validate `<home>/.fluentpages/config.yaml`.
pub fn load_at(home: &Path) -> Result<Settings, ConfigError> {
    load_from(&config_path_at(home))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Settings, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    load_at(&home)
}

/// Load and validate a configuration file at an explicit path.
pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawSettings = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Settings::from_raw(raw)
}

fn with_trailing_slash(path: &Path) -> String {
    let s = path.to_string_lossy();
    format!("{}/", s.trim_end_matches('/'))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
