//! Layout lookup and template choices against a real template directory.

use std::fs;
use std::path::Path;

use fluentpages_core::{
    registry::{self, LayoutDraft},
    LayoutId, LayoutKey, Settings,
};
use fluentpages_templates::{
    describe_layout, placeholder_data_for, template_values, FsLister, LookupError,
    TemplateChoice, TemplateError, TemplatePathField,
};
use rstest::rstest;
use serde_json::json;
use tempfile::TempDir;

const DEFAULT_LAYOUT: &str = r#"{% extends "base.html" %}
{% block body %}<main>{% page_placeholder currentpage "main" %}</main>{% endblock %}"#;

struct Fixture {
    home: TempDir,
    _templates: TempDir,
    settings: Settings,
}

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, body).expect("write");
}

fn fixture(relative: bool) -> Fixture {
    let home = TempDir::new().expect("home");
    let templates = TempDir::new().expect("templates");
    write(templates.path(), "base.html", "<html>{% block body %}{% endblock %}</html>");
    write(templates.path(), "layouts/default.html", DEFAULT_LAYOUT);
    write(
        templates.path(),
        "layouts/sidebar.html",
        r#"{% page_placeholder "main" %}{% page_placeholder "sidebar" role="s" fallback=True %}"#,
    );
    let settings = Settings::new(templates.path(), relative).expect("settings");
    Fixture {
        home,
        _templates: templates,
        settings,
    }
}

fn add_layout(fx: &Fixture, key: &str, title: &str, template: &str) -> LayoutId {
    let values = template_values(&fx.settings).expect("choices");
    let template_path = values
        .into_iter()
        .find(|v| v.ends_with(template))
        .expect("template is a choice");
    registry::create_layout_at(
        fx.home.path(),
        LayoutDraft {
            key: LayoutKey::from(key),
            title: title.to_string(),
            template_path,
        },
        &template_values(&fx.settings).expect("choices"),
    )
    .expect("create layout")
    .id
}

#[test]
fn relative_choices_from_disk() {
    let fx = fixture(true);
    let field = TemplatePathField::from_settings(&fx.settings).expect("field");
    let choices = field.choices(&FsLister).expect("choices");
    assert_eq!(
        choices,
        vec![
            TemplateChoice {
                value: "base.html".into(),
                label: "base".into()
            },
            TemplateChoice {
                value: "layouts/default.html".into(),
                label: "default".into()
            },
            TemplateChoice {
                value: "layouts/sidebar.html".into(),
                label: "sidebar".into()
            },
        ]
    );
}

#[rstest]
#[case(true)]
#[case(false)]
fn stored_layout_is_described(#[case] relative: bool) {
    let fx = fixture(relative);
    let id = add_layout(&fx, "default", "Default", "layouts/default.html");

    let info = describe_layout(fx.home.path(), &fx.settings, id).expect("describe");
    let body = serde_json::to_value(&info).expect("json");
    assert_eq!(body["id"], json!(1));
    assert_eq!(body["key"], json!("default"));
    assert_eq!(
        body["placeholders"][0],
        json!({
            "slot": "main",
            "role": "m",
            "allowed_plugins": [],
            "fallback_language": null,
            "title": "Main",
        })
    );
}

#[test]
fn unknown_layout_is_not_found() {
    let fx = fixture(true);
    let err = describe_layout(fx.home.path(), &fx.settings, LayoutId(999)).unwrap_err();
    assert!(matches!(err, LookupError::NotFound { id } if id == LayoutId(999)));
    assert_eq!(err.to_string(), "Layout not found");
}

#[test]
fn deleted_template_file_surfaces_template_not_found() {
    let fx = fixture(true);
    let id = add_layout(&fx, "default", "Default", "layouts/default.html");
    fs::remove_file(fx.settings.template_root().as_path().join("layouts/default.html"))
        .expect("remove");

    let err = describe_layout(fx.home.path(), &fx.settings, id).unwrap_err();
    assert!(
        matches!(err, LookupError::Template(TemplateError::NotFound { .. })),
        "got: {err}"
    );
}

#[test]
fn placeholder_data_for_new_page_uses_first_layout_by_title() {
    let fx = fixture(true);
    assert!(placeholder_data_for(fx.home.path(), &fx.settings, None)
        .expect("empty")
        .is_empty());

    add_layout(&fx, "wide", "Wide", "layouts/default.html");
    add_layout(&fx, "sidebar", "Sidebar", "layouts/sidebar.html");

    let slots: Vec<_> = placeholder_data_for(fx.home.path(), &fx.settings, None)
        .expect("data")
        .into_iter()
        .map(|d| d.slot)
        .collect();
    assert_eq!(slots, vec!["main", "sidebar"]);
}

#[test]
fn placeholder_data_for_existing_pages() {
    let fx = fixture(true);
    let id = add_layout(&fx, "sidebar", "Sidebar", "layouts/sidebar.html");
    let page = registry::create_layout_page_at(fx.home.path(), "Home".into(), Some(id))
        .expect("page");
    let data = placeholder_data_for(fx.home.path(), &fx.settings, Some(&page)).expect("data");
    assert_eq!(data.len(), 2);
    assert_eq!(data[1].fallback_language.as_deref(), Some("en"));

    let news = registry::create_contents_page_at(fx.home.path(), "News".into()).expect("page");
    let data = placeholder_data_for(fx.home.path(), &fx.settings, Some(&news)).expect("data");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].slot, "page_content");
    assert_eq!(data[0].title, "Page content");
}
