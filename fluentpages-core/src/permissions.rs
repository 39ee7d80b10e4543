//! Layout-change permission gate.
//!
//! A layout must be picked to create a layout page, so the layout field is
//! always editable on a new page. On an existing page the field is read-only
//! unless the [`LayoutChangePolicy`] allows the principal to change it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::Page;

/// Codename of the capability gating layout changes on existing pages.
pub const CHANGE_PAGE_LAYOUT: &str = "change_page_layout";

pub const FIELD_TITLE: &str = "title";
pub const FIELD_LAYOUT: &str = "layout";
pub const FIELD_CONTENT: &str = "content";

/// Editor fields of a layout page.
pub const LAYOUT_PAGE_FIELDS: &[&str] = &[FIELD_TITLE, FIELD_LAYOUT];

/// Editor fields of a fluent contents page.
pub const CONTENTS_PAGE_FIELDS: &[&str] = &[FIELD_TITLE, FIELD_CONTENT];

/// The acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    /// Granted capabilities, as `<module>.<codename>`.
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
}

fn default_active() -> bool {
    true
}

impl Principal {
    /// A principal that holds nothing.
    pub fn anonymous() -> Self {
        Self {
            username: String::new(),
            is_active: false,
            is_superuser: false,
            capabilities: BTreeSet::new(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_empty()
    }

    /// Inactive principals hold nothing; active superusers hold everything.
    pub fn has_capability(&self, capability: &str) -> bool {
        if !self.is_active || self.is_anonymous() {
            return false;
        }
        self.is_superuser || self.capabilities.contains(capability)
    }
}

/// Decides whether `principal` may change the layout of an existing `page`.
pub trait LayoutChangePolicy {
    fn can_change_layout(&self, principal: &Principal, page: &Page) -> bool;
}

/// Requires `<page module>.change_page_layout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityPolicy;

impl LayoutChangePolicy for CapabilityPolicy {
    fn can_change_layout(&self, principal: &Principal, page: &Page) -> bool {
        principal.has_capability(&page.kind.capability(CHANGE_PAGE_LAYOUT))
    }
}

/// All editor fields for `page`; `None` means a new layout page.
pub fn form_fields(page: Option<&Page>) -> &'static [&'static str] {
    match page.map(|p| p.kind.layout().is_some()) {
        Some(false) => CONTENTS_PAGE_FIELDS,
        _ => LAYOUT_PAGE_FIELDS,
    }
}

/// Fields that stay read-only for this edit session.
pub fn readonly_fields<P: LayoutChangePolicy + ?Sized>(
    policy: &P,
    principal: &Principal,
    page: Option<&Page>,
) -> BTreeSet<&'static str> {
    let mut fields = BTreeSet::new();
    if let Some(page) = page {
        if page.kind.layout().is_some() && !policy.can_change_layout(principal, page) {
            fields.insert(FIELD_LAYOUT);
        }
    }
    fields
}

/// Fields the principal may edit; `page` is `None` while the page is being created.
pub fn editable_fields<P: LayoutChangePolicy + ?Sized>(
    policy: &P,
    principal: &Principal,
    page: Option<&Page>,
) -> BTreeSet<&'static str> {
    let readonly = readonly_fields(policy, principal, page);
    form_fields(page)
        .iter()
        .copied()
        .filter(|f| !readonly.contains(f))
        .collect()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
