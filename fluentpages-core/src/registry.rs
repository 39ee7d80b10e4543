//! YAML registry of layouts and pages.
//!
//! # Storage layout
//!
//! ```text
//! ~/.fluentpages/
//!   config.yaml   (operator-written settings, see `settings`)
//!   layouts.yaml  (layout table: mode 0600)
//!   pages.yaml    (page table: mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every function takes the home directory explicitly (`fn_at(home, …)`);
//! [`home`] resolves it from `dirs::home_dir()`. Tests always pass a `TempDir`.
//!
//! Template paths are validated by the caller-supplied list of available
//! template values, so this crate never walks the template directory itself.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{io_err, RegistryError};
use crate::permissions::{LayoutChangePolicy, Principal};
use crate::types::{
    Layout, LayoutId, LayoutKey, LayoutTable, Page, PageId, PageKind, PageTable,
    CONTENTS_PAGE_TEMPLATE,
};

pub const LAYOUTS_FILE: &str = "layouts.yaml";
pub const PAGES_FILE: &str = "pages.yaml";

/// Longest accepted layout title, in characters.
pub const MAX_TITLE_LEN: usize = 255;

/// Fields of a layout that is about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDraft {
    pub key: LayoutKey,
    pub title: String,
    pub template_path: String,
}

/// Partial update of an existing layout; `None` leaves the field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayoutUpdate {
    pub key: Option<LayoutKey>,
    pub title: Option<String>,
    pub template_path: Option<String>,
}

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.fluentpages/`: pure, no I/O.
pub fn data_dir_path_at(home: &Path) -> PathBuf {
    home.join(".fluentpages")
}

/// `<home>/.fluentpages/`
///
/// Creates the directory (mode `0700`) if it does not yet exist.
pub fn data_dir_at(home: &Path) -> Result<PathBuf, RegistryError> {
    let dir = data_dir_path_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }
    Ok(dir)
}

/// `<home>/.fluentpages/layouts.yaml`: pure, no I/O.
pub fn layouts_path_at(home: &Path) -> PathBuf {
    data_dir_path_at(home).join(LAYOUTS_FILE)
}

/// `<home>/.fluentpages/pages.yaml`: pure, no I/O.
pub fn pages_path_at(home: &Path) -> PathBuf {
    data_dir_path_at(home).join(PAGES_FILE)
}

// ---------------------------------------------------------------------------
// 2. Load / save (atomic)
// ---------------------------------------------------------------------------

/// Load the layout table. A missing file is an empty table.
pub fn load_layouts_at(home: &Path) -> Result<LayoutTable, RegistryError> {
    load_table(&layouts_path_at(home))
}

/// Load the page table. A missing file is an empty table.
pub fn load_pages_at(home: &Path) -> Result<PageTable, RegistryError> {
    load_table(&pages_path_at(home))
}

pub fn save_layouts_at(home: &Path, table: &LayoutTable) -> Result<(), RegistryError> {
    data_dir_at(home)?;
    save_table(&layouts_path_at(home), table)
}

pub fn save_pages_at(home: &Path, table: &PageTable) -> Result<(), RegistryError> {
    data_dir_at(home)?;
    save_table(&pages_path_at(home), table)
}

fn load_table<T: DeserializeOwned + Default>(path: &Path) -> Result<T, RegistryError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| RegistryError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
fn save_table<T: Serialize>(path: &Path, table: &T) -> Result<(), RegistryError> {
    let tmp_path = path.with_extension("yaml.tmp");
    let yaml = serde_yaml::to_string(table)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// 3. Layouts
// ---------------------------------------------------------------------------

/// Create a layout and assign it the next id.
///
/// `templates` holds the storage values of the currently available templates;
/// `draft.template_path` must be one of them.
pub fn create_layout_at(
    home: &Path,
    draft: LayoutDraft,
    templates: &[String],
) -> Result<Layout, RegistryError> {
    validate_key(&draft.key)?;
    validate_title(&draft.title)?;
    validate_template_path(&draft.template_path, templates)?;

    let mut table = load_layouts_at(home)?;
    if table.layouts.iter().any(|l| l.key == draft.key) {
        return Err(RegistryError::DuplicateKey { key: draft.key.0 });
    }

    let now = Utc::now();
    table.last_id += 1;
    let layout = Layout {
        id: LayoutId(table.last_id),
        key: draft.key,
        title: draft.title,
        template_path: draft.template_path,
        created_at: now,
        updated_at: now,
    };
    table.layouts.push(layout.clone());
    save_layouts_at(home, &table)?;
    Ok(layout)
}

/// Returns `RegistryError::LayoutNotFound` if no layout has this id.
pub fn get_layout_at(home: &Path, id: LayoutId) -> Result<Layout, RegistryError> {
    load_layouts_at(home)?
        .get(id)
        .cloned()
        .ok_or(RegistryError::LayoutNotFound { id })
}

/// All layouts ordered by title.
pub fn list_layouts_at(home: &Path) -> Result<Vec<Layout>, RegistryError> {
    Ok(load_layouts_at(home)?.ordered())
}

pub fn update_layout_at(
    home: &Path,
    id: LayoutId,
    update: LayoutUpdate,
    templates: &[String],
) -> Result<Layout, RegistryError> {
    let mut table = load_layouts_at(home)?;

    if let Some(key) = &update.key {
        validate_key(key)?;
        if table.layouts.iter().any(|l| l.id != id && l.key == *key) {
            return Err(RegistryError::DuplicateKey { key: key.0.clone() });
        }
    }
    if let Some(title) = &update.title {
        validate_title(title)?;
    }
    if let Some(path) = &update.template_path {
        validate_template_path(path, templates)?;
    }

    let layout = table
        .layouts
        .iter_mut()
        .find(|l| l.id == id)
        .ok_or(RegistryError::LayoutNotFound { id })?;
    if let Some(key) = update.key {
        layout.key = key;
    }
    if let Some(title) = update.title {
        layout.title = title;
    }
    if let Some(path) = update.template_path {
        layout.template_path = path;
    }
    layout.updated_at = Utc::now();
    let updated = layout.clone();

    save_layouts_at(home, &table)?;
    Ok(updated)
}

/// Delete a layout. Refused while any page still references it.
pub fn delete_layout_at(home: &Path, id: LayoutId) -> Result<Layout, RegistryError> {
    let mut table = load_layouts_at(home)?;
    let index = table
        .layouts
        .iter()
        .position(|l| l.id == id)
        .ok_or(RegistryError::LayoutNotFound { id })?;

    let pages = load_pages_at(home)?
        .pages
        .iter()
        .filter(|p| p.kind.layout() == Some(id))
        .count();
    if pages > 0 {
        return Err(RegistryError::LayoutInUse { id, pages });
    }

    let removed = table.layouts.remove(index);
    save_layouts_at(home, &table)?;
    Ok(removed)
}

// ---------------------------------------------------------------------------
// 4. Pages
// ---------------------------------------------------------------------------

/// Create a layout page. The layout is required and must exist.
pub fn create_layout_page_at(
    home: &Path,
    title: String,
    layout: Option<LayoutId>,
) -> Result<Page, RegistryError> {
    let layout = layout.ok_or(RegistryError::LayoutRequired)?;
    get_layout_at(home, layout)?;
    insert_page(home, title, PageKind::LayoutPage { layout })
}

pub fn create_contents_page_at(home: &Path, title: String) -> Result<Page, RegistryError> {
    insert_page(home, title, PageKind::ContentsPage)
}

fn insert_page(home: &Path, title: String, kind: PageKind) -> Result<Page, RegistryError> {
    validate_title(&title)?;
    let mut table = load_pages_at(home)?;
    let now = Utc::now();
    table.last_id += 1;
    let page = Page {
        id: PageId(table.last_id),
        title,
        kind,
        created_at: now,
        updated_at: now,
    };
    table.pages.push(page.clone());
    save_pages_at(home, &table)?;
    Ok(page)
}

/// Returns `RegistryError::PageNotFound` if no page has this id.
pub fn get_page_at(home: &Path, id: PageId) -> Result<Page, RegistryError> {
    load_pages_at(home)?
        .get(id)
        .cloned()
        .ok_or(RegistryError::PageNotFound { id })
}

/// All pages ordered by id.
pub fn list_pages_at(home: &Path) -> Result<Vec<Page>, RegistryError> {
    let mut pages = load_pages_at(home)?.pages;
    pages.sort_by_key(|p| p.id);
    Ok(pages)
}

/// Point an existing layout page at another layout, if `policy` allows it.
pub fn set_page_layout_at<P: LayoutChangePolicy + ?Sized>(
    home: &Path,
    page_id: PageId,
    layout: LayoutId,
    principal: &Principal,
    policy: &P,
) -> Result<Page, RegistryError> {
    get_layout_at(home, layout)?;

    let mut table = load_pages_at(home)?;
    let page = table
        .pages
        .iter_mut()
        .find(|p| p.id == page_id)
        .ok_or(RegistryError::PageNotFound { id: page_id })?;
    if page.kind.layout().is_none() {
        return Err(RegistryError::NotALayoutPage { id: page_id });
    }
    if !policy.can_change_layout(principal, page) {
        return Err(RegistryError::PermissionDenied {
            username: principal.username.clone(),
            page: page_id,
        });
    }

    page.kind = PageKind::LayoutPage { layout };
    page.updated_at = Utc::now();
    let updated = page.clone();
    save_pages_at(home, &table)?;
    Ok(updated)
}

/// The template a page renders with.
pub fn template_name_at(home: &Path, page: &Page) -> Result<String, RegistryError> {
    match page.kind {
        PageKind::LayoutPage { layout } => Ok(get_layout_at(home, layout)?.template_path),
        PageKind::ContentsPage => Ok(CONTENTS_PAGE_TEMPLATE.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Home directory from `dirs::home_dir()`.
pub fn home() -> Result<PathBuf, RegistryError> {
    dirs::home_dir().ok_or(RegistryError::HomeNotFound)
}

fn validate_key(key: &LayoutKey) -> Result<(), RegistryError> {
    if key.is_slug() {
        Ok(())
    } else {
        Err(RegistryError::InvalidKey { key: key.0.clone() })
    }
}

fn validate_title(title: &str) -> Result<(), RegistryError> {
    if title.trim().is_empty() {
        return Err(RegistryError::InvalidTitle { reason: "title is required" });
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(RegistryError::InvalidTitle {
            reason: "title is longer than 255 characters",
        });
    }
    Ok(())
}

fn validate_template_path(path: &str, templates: &[String]) -> Result<(), RegistryError> {
    if templates.iter().any(|t| t == path) {
        Ok(())
    } else {
        Err(RegistryError::InvalidTemplatePath {
            path: path.to_string(),
        })
    }
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
