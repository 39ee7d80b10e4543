//! Layout metadata lookup.

use std::path::Path;

use serde::Serialize;

use fluentpages_core::{
    registry,
    types::CONTENTS_PAGE_SLOT,
    Layout, LayoutId, LayoutKey, Page, PageKind, RegistryError, Settings,
};

use crate::error::LookupError;
use crate::loader::TemplateLoader;
use crate::placeholders::{PlaceholderData, PlaceholderScanner};

/// A layout and the regions its template declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutInfo {
    pub id: LayoutId,
    pub key: LayoutKey,
    pub title: String,
    pub placeholders: Vec<PlaceholderData>,
}

/// Regions of `layout`'s template.
pub fn layout_placeholders(
    settings: &Settings,
    layout: &Layout,
) -> Result<Vec<PlaceholderData>, LookupError> {
    let loader = TemplateLoader::from_settings(settings);
    Ok(PlaceholderScanner::new(&loader, settings).scan(&layout.template_path)?)
}

pub fn describe_layout(
    home: &Path,
    settings: &Settings,
    id: LayoutId,
) -> Result<LayoutInfo, LookupError> {
    let layout = match registry::get_layout_at(home, id) {
        Ok(layout) => layout,
        Err(RegistryError::LayoutNotFound { id }) => return Err(LookupError::NotFound { id }),
        Err(e) => return Err(e.into()),
    };
    let placeholders = layout_placeholders(settings, &layout)?;
    Ok(LayoutInfo {
        id: layout.id,
        key: layout.key,
        title: layout.title,
        placeholders,
    })
}

/// Regions the editor offers for `page`.
///
/// Without a page the first layout by title is assumed, and an empty list is
/// returned when no layouts exist yet.
pub fn placeholder_data_for(
    home: &Path,
    settings: &Settings,
    page: Option<&Page>,
) -> Result<Vec<PlaceholderData>, LookupError> {
    match page.map(|p| &p.kind) {
        None => match registry::list_layouts_at(home)?.first() {
            Some(layout) => layout_placeholders(settings, layout),
            None => Ok(Vec::new()),
        },
        Some(PageKind::LayoutPage { layout }) => {
            let layout = registry::get_layout_at(home, *layout)?;
            layout_placeholders(settings, &layout)
        }
        Some(PageKind::ContentsPage) => Ok(vec![PlaceholderData::for_slot(
            CONTENTS_PAGE_SLOT,
            settings,
        )]),
    }
}
