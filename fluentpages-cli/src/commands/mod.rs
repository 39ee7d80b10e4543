pub mod check;
pub mod fetch;
pub mod layout;
pub mod page;
pub mod serve;
pub mod templates;

use std::path::PathBuf;

use anyhow::{Context, Result};

use fluentpages_core::{settings, Settings};

/// Home directory and validated settings; every command except `fetch --server` needs both.
pub(crate) fn load_context() -> Result<(PathBuf, Settings)> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    let settings = settings::load_at(&home).with_context(|| {
        format!(
            "invalid configuration in {}",
            settings::config_path_at(&home).display()
        )
    })?;
    Ok((home, settings))
}
