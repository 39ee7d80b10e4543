//! Page editor state: which fields are editable and what the layout selector offers.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::permissions::{editable_fields, readonly_fields, LayoutChangePolicy, Principal};
use crate::types::{Layout, LayoutId, Page, PageId};

/// One entry of the layout selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutOption {
    pub id: LayoutId,
    pub title: String,
}

/// Serializable editor state for one (principal, page) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageForm {
    /// `None` while the page is being created.
    pub page: Option<PageId>,
    pub editable: BTreeSet<&'static str>,
    pub readonly: BTreeSet<&'static str>,
    /// Layout choices ordered by title; empty for pages without a layout field.
    pub layout_choices: Vec<LayoutOption>,
    /// Layout stored on the page when the editor opened; the client compares
    /// the selector against it to detect a change.
    pub original_value: Option<LayoutId>,
}

impl PageForm {
    pub fn build<P: LayoutChangePolicy + ?Sized>(
        policy: &P,
        principal: &Principal,
        page: Option<&Page>,
        layouts: &[Layout],
    ) -> Self {
        let has_layout_field = page.map_or(true, |p| p.kind.layout().is_some());
        let mut layout_choices: Vec<LayoutOption> = if has_layout_field {
            layouts
                .iter()
                .map(|l| LayoutOption {
                    id: l.id,
                    title: l.title.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };
        layout_choices.sort_by(|a, b| a.title.cmp(&b.title));

        PageForm {
            page: page.map(|p| p.id),
            editable: editable_fields(policy, principal, page),
            readonly: readonly_fields(policy, principal, page),
            layout_choices,
            original_value: page.and_then(|p| p.kind.layout()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{CapabilityPolicy, FIELD_LAYOUT};
    use crate::types::{LayoutKey, PageKind};
    use chrono::Utc;

    fn layouts() -> Vec<Layout> {
        let now = Utc::now();
        ["Wide", "Narrow"]
            .iter()
            .enumerate()
            .map(|(i, title)| Layout {
                id: LayoutId(i as u64 + 1),
                key: LayoutKey::from(title.to_lowercase()),
                title: title.to_string(),
                template_path: "layouts/default.html".to_string(),
                created_at: now,
                updated_at: now,
            })
            .collect()
    }

    #[test]
    fn new_page_form_offers_sorted_layouts() {
        let form = PageForm::build(&CapabilityPolicy, &Principal::anonymous(), None, &layouts());
        assert_eq!(form.page, None);
        assert_eq!(form.original_value, None);
        let titles: Vec<_> = form.layout_choices.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["Narrow", "Wide"]);
        assert!(form.editable.contains(FIELD_LAYOUT));
    }

    #[test]
    fn existing_page_form_keeps_original_value() {
        let now = Utc::now();
        let page = Page {
            id: PageId(9),
            title: "About".to_string(),
            kind: PageKind::LayoutPage { layout: LayoutId(2) },
            created_at: now,
            updated_at: now,
        };
        let form = PageForm::build(
            &CapabilityPolicy,
            &Principal::anonymous(),
            Some(&page),
            &layouts(),
        );
        assert_eq!(form.original_value, Some(LayoutId(2)));
        assert!(form.readonly.contains(FIELD_LAYOUT));
    }
}
