//! Boot-time configuration validation. The error messages are operator-facing
//! and asserted verbatim.

use std::fs;

use fluentpages_core::{
    settings::{self, RawSettings, Settings},
    ConfigError,
};
use tempfile::TempDir;

fn write_config(home: &TempDir, yaml: &str) {
    let dir = home.path().join(".fluentpages");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("config.yaml"), yaml).expect("write config");
}

#[test]
fn undefined_template_dir() {
    let err = Settings::from_raw(RawSettings::default()).unwrap_err();
    assert!(matches!(err, ConfigError::TemplateDirUndefined));
    assert_eq!(
        err.to_string(),
        "The setting `template_dir` or `template_dirs[0]` need to be defined!"
    );
}

#[test]
fn relative_template_dir_is_rejected() {
    let err = Settings::from_raw(RawSettings {
        template_dir: Some("./test/".into()),
        ..RawSettings::default()
    })
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "The setting `template_dir` needs to be an absolute path!"
    );
}

#[test]
fn relative_first_template_dirs_entry_names_that_setting() {
    let err = Settings::from_raw(RawSettings {
        template_dirs: vec!["./test/".into()],
        ..RawSettings::default()
    })
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "The setting `template_dirs[0]` needs to be an absolute path!"
    );
}

#[test]
fn missing_template_dir_is_rejected() {
    let err = Settings::from_raw(RawSettings {
        template_dir: Some("/fluentpages-does-not-exist/test".into()),
        ..RawSettings::default()
    })
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "The path `/fluentpages-does-not-exist/test/` in the setting `template_dir` does not exist!"
    );
}

#[test]
fn missing_config_file_is_reported_with_path() {
    let home = TempDir::new().expect("home");
    let err = settings::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn corrupt_config_is_a_parse_error() {
    let home = TempDir::new().expect("home");
    write_config(&home, "template_dir: [unclosed");
    let err = settings::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn full_config_loads() {
    let home = TempDir::new().expect("home");
    let templates = TempDir::new().expect("templates");
    write_config(
        &home,
        &format!(
            r#"
template_dir: {}
relative_template_dir: false
fallback_language: de
listen: 127.0.0.1:9000
placeholders:
  main:
    plugins: [TextPlugin, PicturePlugin]
principals:
  - username: alice
    capabilities: [layout_page.change_page_layout]
  - username: root
    is_superuser: true
"#,
            templates.path().display()
        ),
    );

    let settings = settings::load_at(home.path()).expect("load");
    assert!(!settings.relative_mode());
    assert_eq!(settings.template_root().as_path(), templates.path());
    assert_eq!(settings.fallback_language(), "de");
    assert_eq!(settings.listen(), "127.0.0.1:9000");
    assert_eq!(settings.allowed_plugins("main"), vec!["TextPlugin", "PicturePlugin"]);

    let alice = settings.principal(Some("alice"));
    assert!(alice.is_active);
    assert!(alice.has_capability("layout_page.change_page_layout"));
    assert!(settings.principal(Some("root")).has_capability("anything.at_all"));
    assert!(settings.principal(None).is_anonymous());
}
