//! Domain types for layouts and pages.
//!
//! Template paths are kept as `String`: the stored value is either relative to
//! the template root or absolute, depending on the process-wide relative mode
//! (see [`crate::settings::Settings::relative_mode`]), and is compared and
//! rewritten as text by the template path field.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Render template of a fluent contents page.
pub const CONTENTS_PAGE_TEMPLATE: &str = "fluentpages/fluent_contents_page.html";

/// The single placeholder slot of a fluent contents page.
pub const CONTENTS_PAGE_SLOT: &str = "page_content";

/// Module label owning layout pages; scopes the layout-change capability.
pub const LAYOUT_PAGE_MODULE: &str = "layout_page";

/// Module label owning fluent contents pages.
pub const CONTENTS_PAGE_MODULE: &str = "contents_page";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Numeric identifier of a [`Layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LayoutId(pub u64);

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for LayoutId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Numeric identifier of a [`Page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageId(pub u64);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for PageId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Machine-readable layout key (a slug).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutKey(pub String);

impl LayoutKey {
    /// `true` when the key is non-empty and made of ASCII letters, digits, `-` or `_`.
    pub fn is_slug(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for LayoutKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for LayoutKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LayoutKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A template plus metadata that pages can select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub id: LayoutId,
    pub key: LayoutKey,
    pub title: String,
    /// Relative or absolute path of a `.html` file under the template root.
    pub template_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// The page type and its type-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageKind {
    /// Rendered with the template of the referenced layout.
    LayoutPage { layout: LayoutId },
    /// Rendered with [`CONTENTS_PAGE_TEMPLATE`], one content placeholder.
    ContentsPage,
}

impl PageKind {
    /// Label of the module that owns this page type.
    pub fn module(&self) -> &'static str {
        match self {
            PageKind::LayoutPage { .. } => LAYOUT_PAGE_MODULE,
            PageKind::ContentsPage => CONTENTS_PAGE_MODULE,
        }
    }

    /// `<module>.<codename>`, the form capabilities are granted in.
    pub fn capability(&self, codename: &str) -> String {
        format!("{}.{}", self.module(), codename)
    }

    pub fn layout(&self) -> Option<LayoutId> {
        match self {
            PageKind::LayoutPage { layout } => Some(*layout),
            PageKind::ContentsPage => None,
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageKind::LayoutPage { .. } => write!(f, "layout"),
            PageKind::ContentsPage => write!(f, "contents"),
        }
    }
}

/// A page in the page tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub kind: PageKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// On-disk table of layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LayoutTable {
    #[serde(default)]
    pub last_id: u64,
    #[serde(default)]
    pub layouts: Vec<Layout>,
}

impl LayoutTable {
    pub fn get(&self, id: LayoutId) -> Option<&Layout> {
        self.layouts.iter().find(|l| l.id == id)
    }

    /// Layouts ordered by title.
    pub fn ordered(&self) -> Vec<Layout> {
        let mut layouts = self.layouts.clone();
        layouts.sort_by(|a, b| a.title.cmp(&b.title));
        layouts
    }
}

/// On-disk table of pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PageTable {
    #[serde(default)]
    pub last_id: u64,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl PageTable {
    pub fn get(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
