//! Placeholder introspection.
//!
//! Scans a template for `{% page_placeholder %}` and `{% placeholder %}` tags
//! and reports the content regions a render would show. `{% extends %}` and
//! `{% include %}` are followed through the [`TemplateLoader`]. A child's
//! `{% block %}` replaces the parent's block of the same name, content of an
//! extending template outside its blocks is dropped, and `{{ block.super }}`
//! pulls in the overridden body. Regions are reported in render order; a slot
//! declared twice keeps its first declaration.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use fluentpages_core::Settings;

use crate::error::TemplateError;
use crate::loader::TemplateLoader;

/// `{# .. #}` comments, `{{ block.super }}`, and `{% name args %}` tags.
const TAG_PATTERN: &str =
    r"(?s)\{#.*?#\}|(\{\{\s*block\.super\s*\}\})|\{%\s*(\w+)\s*(.*?)\s*%\}";

fn tag_regex() -> Result<&'static Regex, TemplateError> {
    static TAG: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = TAG.get() {
        return Ok(re);
    }
    let re = Regex::new(TAG_PATTERN)?;
    Ok(TAG.get_or_init(|| re))
}

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

/// Placement of a region on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Role {
    #[default]
    #[serde(rename = "m")]
    Main,
    #[serde(rename = "s")]
    Sidebar,
    #[serde(rename = "r")]
    Related,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Main => "m",
            Role::Sidebar => "s",
            Role::Related => "r",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "m" => Some(Role::Main),
            "s" => Some(Role::Sidebar),
            "r" => Some(Role::Related),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One content region declared by a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderData {
    pub slot: String,
    pub role: Role,
    pub allowed_plugins: Vec<String>,
    pub fallback_language: Option<String>,
    pub title: String,
}

impl PlaceholderData {
    /// Region with the default title and role, plugins taken from `settings`.
    pub fn for_slot(slot: &str, settings: &Settings) -> Self {
        Self {
            slot: slot.to_string(),
            role: Role::Main,
            allowed_plugins: settings.allowed_plugins(slot),
            fallback_language: None,
            title: default_title(slot),
        }
    }
}

/// `page_content` → `Page content`.
pub fn default_title(slot: &str) -> String {
    let spaced = slot.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Overriding block bodies by name, most derived first.
type BlockMap = HashMap<String, Vec<Vec<Node>>>;

/// Bodies a block can render: overrides, then the block's own body.
type BlockStack<'n> = (&'n [&'n [Node]], usize);

pub struct PlaceholderScanner<'a> {
    loader: &'a TemplateLoader,
    settings: &'a Settings,
}

impl<'a> PlaceholderScanner<'a> {
    pub fn new(loader: &'a TemplateLoader, settings: &'a Settings) -> Self {
        Self { loader, settings }
    }

    /// Regions declared by template `name` and everything it extends or includes.
    pub fn scan(&self, name: &str) -> Result<Vec<PlaceholderData>, TemplateError> {
        let mut out = Vec::new();
        let mut chain = Vec::new();
        self.collect(name, BlockMap::new(), &mut chain, &mut out)?;
        tracing::debug!(template = name, count = out.len(), "scanned placeholders");
        Ok(out)
    }

    fn collect(
        &self,
        name: &str,
        mut blocks: BlockMap,
        chain: &mut Vec<String>,
        out: &mut Vec<PlaceholderData>,
    ) -> Result<(), TemplateError> {
        if chain.iter().any(|seen| seen == name) {
            let mut path = chain.clone();
            path.push(name.to_string());
            return Err(TemplateError::Recursion {
                template: name.to_string(),
                chain: path.join(" -> "),
            });
        }
        let template = self.loader.get_template(name)?;
        let nodes = parse(name, &template.source)?;
        chain.push(name.to_string());

        let parent = nodes.iter().find_map(|node| match node {
            Node::Tag(tag) if tag.name == "extends" => Some(tag),
            _ => None,
        });
        match parent {
            Some(tag) => {
                let target = single_name(name, tag)?;
                register_blocks(nodes.clone(), &mut blocks);
                self.collect(&target, blocks, chain, out)?;
            }
            None => self.render(name, &nodes, &blocks, None, chain, out)?,
        }

        chain.pop();
        Ok(())
    }

    fn render(
        &self,
        name: &str,
        nodes: &[Node],
        blocks: &BlockMap,
        current: Option<BlockStack<'_>>,
        chain: &mut Vec<String>,
        out: &mut Vec<PlaceholderData>,
    ) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Tag(tag) if tag.name == "include" => {
                    let target = single_name(name, tag)?;
                    self.collect(&target, BlockMap::new(), chain, out)?;
                }
                Node::Tag(tag) => {
                    if let Some(data) = self.placeholder(name, tag)? {
                        push_unique(out, data);
                    }
                }
                Node::Block { name: block, body } => {
                    let mut stack: Vec<&[Node]> = blocks
                        .get(block)
                        .map(|bodies| bodies.iter().map(Vec::as_slice).collect())
                        .unwrap_or_default();
                    stack.push(body);
                    self.render(name, stack[0], blocks, Some((stack.as_slice(), 0)), chain, out)?;
                }
                Node::Super => {
                    if let Some((stack, level)) = current {
                        if let Some(body) = stack.get(level + 1) {
                            self.render(name, body, blocks, Some((stack, level + 1)), chain, out)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn placeholder(&self, template: &str, tag: &Tag) -> Result<Option<PlaceholderData>, TemplateError> {
        let slot = match tag.name.as_str() {
            // `{% page_placeholder [object] "slot" %}`
            "page_placeholder" => match tag.positional.as_slice() {
                [slot] | [_, slot] => slot.value.clone(),
                _ => return Err(syntax(template, "page_placeholder takes an optional object and a slot name")),
            },
            "placeholder" => match tag.positional.as_slice() {
                [slot] => slot.value.clone(),
                _ => return Err(syntax(template, "placeholder takes exactly one slot name")),
            },
            _ => return Ok(None),
        };

        let mut data = PlaceholderData::for_slot(&slot, self.settings);
        for (key, value) in &tag.keywords {
            match key.as_str() {
                "title" => data.title = value.value.clone(),
                "role" => {
                    data.role = Role::parse(&value.value).ok_or_else(|| {
                        syntax(
                            template,
                            &format!("role of '{slot}' must be one of m, s, r (got '{}')", value.value),
                        )
                    })?;
                }
                "fallback" => {
                    data.fallback_language = match value.value.as_str() {
                        "True" | "true" => Some(self.settings.fallback_language().to_string()),
                        "False" | "false" => None,
                        other => {
                            return Err(syntax(
                                template,
                                &format!("fallback of '{slot}' must be True or False (got '{other}')"),
                            ))
                        }
                    };
                }
                other => {
                    tracing::warn!(template, slot = %slot, option = other, "ignoring unknown placeholder option");
                }
            }
        }
        Ok(Some(data))
    }
}

fn push_unique(out: &mut Vec<PlaceholderData>, data: PlaceholderData) {
    if !out.iter().any(|d| d.slot == data.slot) {
        out.push(data);
    }
}

fn syntax(template: &str, message: &str) -> TemplateError {
    TemplateError::Syntax {
        template: template.to_string(),
        message: message.to_string(),
    }
}

fn single_name(template: &str, tag: &Tag) -> Result<String, TemplateError> {
    match tag.positional.first() {
        Some(arg) if arg.quoted => Ok(arg.value.clone()),
        _ => Err(syntax(
            template,
            &format!("{} needs a quoted template name", tag.name),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tag parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct Arg {
    value: String,
    quoted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    name: String,
    positional: Vec<Arg>,
    keywords: Vec<(String, Arg)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Tag(Tag),
    Block { name: String, body: Vec<Node> },
    Super,
}

/// Every block in `nodes`, nested ones included, queued behind any more
/// derived override already in `blocks`.
fn register_blocks(nodes: Vec<Node>, blocks: &mut BlockMap) {
    for node in nodes {
        if let Node::Block { name, body } = node {
            register_blocks(body.clone(), blocks);
            blocks.entry(name).or_default().push(body);
        }
    }
}

/// Node tree of `source`, skipping comments.
fn parse(template: &str, source: &str) -> Result<Vec<Node>, TemplateError> {
    let re = tag_regex()?;
    // Open blocks: (name, nodes collected so far). The bottom entry is the template.
    let mut stack: Vec<(String, Vec<Node>)> = vec![(String::new(), Vec::new())];
    let mut in_comment = false;

    for caps in re.captures_iter(source) {
        let node = if caps.get(1).is_some() {
            Node::Super
        } else if let Some(name) = caps.get(2) {
            let name = name.as_str();
            let args = caps.get(3).map_or("", |m| m.as_str());
            if in_comment {
                in_comment = name != "endcomment";
                continue;
            }
            match name {
                "comment" => {
                    in_comment = true;
                    continue;
                }
                "block" => {
                    let tag = parse_tag(name, args);
                    let block = match tag.positional.as_slice() {
                        [arg] => arg.value.clone(),
                        _ => return Err(syntax(template, "block takes exactly one name")),
                    };
                    stack.push((block, Vec::new()));
                    continue;
                }
                "endblock" => {
                    if stack.len() < 2 {
                        return Err(syntax(template, "endblock without a matching block"));
                    }
                    let Some((block, body)) = stack.pop() else {
                        continue;
                    };
                    Node::Block { name: block, body }
                }
                _ => Node::Tag(parse_tag(name, args)),
            }
        } else {
            continue;
        };
        if in_comment {
            continue;
        }
        if let Some((_, nodes)) = stack.last_mut() {
            nodes.push(node);
        }
    }

    if stack.len() > 1 {
        let open = stack.last().map(|(name, _)| name.as_str()).unwrap_or_default();
        return Err(syntax(template, &format!("block '{open}' is never closed")));
    }
    Ok(stack.pop().map(|(_, nodes)| nodes).unwrap_or_default())
}

fn parse_tag(name: &str, args: &str) -> Tag {
    let mut tag = Tag {
        name: name.to_string(),
        positional: Vec::new(),
        keywords: Vec::new(),
    };
    for token in split_args(args) {
        match keyword(&token) {
            Some((key, value)) => tag.keywords.push((key.to_string(), unquote(value))),
            None => tag.positional.push(unquote(&token)),
        }
    }
    tag
}

/// Whitespace-separated tokens; quoted runs keep their spaces.
fn split_args(args: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in args.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                current.push(c);
            }
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// `key=value` with an identifier key, `=` outside quotes.
fn keyword(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once('=')?;
    let is_ident = !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_');
    is_ident.then_some((key, value))
}

fn unquote(raw: &str) -> Arg {
    let quoted = raw.len() >= 2
        && ((raw.starts_with('"') && raw.ends_with('"'))
            || (raw.starts_with('\'') && raw.ends_with('\'')));
    if quoted {
        Arg {
            value: raw[1..raw.len() - 1].to_string(),
            quoted: true,
        }
    } else {
        Arg {
            value: raw.to_string(),
            quoted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(files: &[(&str, &str)]) -> (TempDir, Settings) {
        let root = TempDir::new().expect("tempdir");
        for (rel, body) in files {
            let path = root.path().join(rel);
            fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            fs::write(path, body).expect("write");
        }
        let settings = Settings::new(root.path(), true).expect("settings");
        (root, settings)
    }

    fn scan(files: &[(&str, &str)], name: &str) -> Result<Vec<PlaceholderData>, TemplateError> {
        let (root, settings) = fixture(files);
        let loader = TemplateLoader::new(root.path());
        PlaceholderScanner::new(&loader, &settings).scan(name)
    }

    #[test]
    fn default_titles() {
        assert_eq!(default_title("main"), "Main");
        assert_eq!(default_title("page_content"), "Page content");
        assert_eq!(default_title(""), "");
    }

    #[test]
    fn page_placeholder_with_defaults() {
        let found = scan(
            &[("layouts/default.html", r#"<main>{% page_placeholder currentpage "main" %}</main>"#)],
            "layouts/default.html",
        )
        .expect("scan");
        assert_eq!(
            found,
            vec![PlaceholderData {
                slot: "main".into(),
                role: Role::Main,
                allowed_plugins: vec![],
                fallback_language: None,
                title: "Main".into(),
            }]
        );
    }

    #[test]
    fn options_are_applied() {
        let found = scan(
            &[(
                "two_col.html",
                r#"{% page_placeholder "main" title="Main column" role="m" %}
                   {% placeholder 'sidebar' role=s fallback=True title="Side bar" %}"#,
            )],
            "two_col.html",
        )
        .expect("scan");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].title, "Main column");
        assert_eq!(found[1].slot, "sidebar");
        assert_eq!(found[1].role, Role::Sidebar);
        assert_eq!(found[1].title, "Side bar");
        assert_eq!(found[1].fallback_language.as_deref(), Some("en"));
    }

    #[test]
    fn invalid_role_is_a_syntax_error() {
        let err = scan(&[("bad.html", r#"{% placeholder "main" role="x" %}"#)], "bad.html")
            .unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { .. }), "got: {err}");
    }

    #[test]
    fn child_blocks_fill_parent_and_duplicates_keep_first() {
        let found = scan(
            &[
                (
                    "base.html",
                    r#"{% placeholder "header" %}{% block body %}{% endblock %}{% include "footer.html" %}"#,
                ),
                (
                    "child.html",
                    r#"{% extends "base.html" %}{% block body %}{% placeholder "main" title="Child" %}{% placeholder "header" role="s" %}{% endblock %}"#,
                ),
                ("footer.html", r#"{% placeholder "footer" role="r" %}"#),
            ],
            "child.html",
        )
        .expect("scan");
        let slots: Vec<_> = found.iter().map(|d| d.slot.as_str()).collect();
        assert_eq!(slots, vec!["header", "main", "footer"]);
        assert_eq!(found[0].role, Role::Main);
        assert_eq!(found[1].title, "Child");
    }

    #[test]
    fn overridden_block_hides_parent_slots() {
        let found = scan(
            &[
                ("base.html", r#"<body>{% block body %}{% placeholder "main" %}{% endblock %}</body>"#),
                (
                    "child.html",
                    r#"{% extends "base.html" %}{% block body %}{% placeholder "content" %}{% endblock %}"#,
                ),
            ],
            "child.html",
        )
        .expect("scan");
        let slots: Vec<_> = found.iter().map(|d| d.slot.as_str()).collect();
        assert_eq!(slots, vec!["content"]);
    }

    #[test]
    fn content_outside_blocks_of_extending_template_is_dropped() {
        let found = scan(
            &[
                ("base.html", r#"{% block body %}{% placeholder "main" %}{% endblock %}"#),
                ("child.html", r#"{% extends "base.html" %}{% placeholder "stray" %}"#),
            ],
            "child.html",
        )
        .expect("scan");
        let slots: Vec<_> = found.iter().map(|d| d.slot.as_str()).collect();
        assert_eq!(slots, vec!["main"]);
    }

    #[test]
    fn block_super_keeps_parent_body() {
        let found = scan(
            &[
                ("base.html", r#"{% block body %}{% placeholder "main" %}{% endblock %}"#),
                (
                    "mid.html",
                    r#"{% extends "base.html" %}{% block body %}{% placeholder "mid" %}{{ block.super }}{% endblock %}"#,
                ),
                (
                    "child.html",
                    r#"{% extends "mid.html" %}{% block body %}{{ block.super }}{% placeholder "aside" %}{% endblock %}"#,
                ),
            ],
            "child.html",
        )
        .expect("scan");
        let slots: Vec<_> = found.iter().map(|d| d.slot.as_str()).collect();
        assert_eq!(slots, vec!["mid", "main", "aside"]);
    }

    #[test]
    fn nested_block_overrides_apply_inside_parent_block() {
        let found = scan(
            &[
                (
                    "base.html",
                    r#"{% block body %}{% placeholder "main" %}{% block aside %}{% placeholder "sidebar" %}{% endblock %}{% endblock %}"#,
                ),
                (
                    "child.html",
                    r#"{% extends "base.html" %}{% block aside %}{% placeholder "related" %}{% endblock %}"#,
                ),
            ],
            "child.html",
        )
        .expect("scan");
        let slots: Vec<_> = found.iter().map(|d| d.slot.as_str()).collect();
        assert_eq!(slots, vec!["main", "related"]);
    }

    #[test]
    fn unclosed_block_is_a_syntax_error() {
        let err = scan(&[("open.html", r#"{% block body %}{% placeholder "main" %}"#)], "open.html")
            .unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { .. }), "got: {err}");
    }

    #[test]
    fn include_cycle_is_reported() {
        let err = scan(
            &[
                ("a.html", r#"{% include "b.html" %}"#),
                ("b.html", r#"{% include "a.html" %}"#),
            ],
            "a.html",
        )
        .unwrap_err();
        match err {
            TemplateError::Recursion { template, chain } => {
                assert_eq!(template, "a.html");
                assert_eq!(chain, "a.html -> b.html -> a.html");
            }
            other => panic!("expected recursion, got {other}"),
        }
    }

    #[test]
    fn commented_tags_are_ignored() {
        let found = scan(
            &[(
                "c.html",
                r#"{% comment %}{% placeholder "old" %}{% endcomment %}{% placeholder "new" %}"#,
            )],
            "c.html",
        )
        .expect("scan");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slot, "new");
    }

    #[test]
    fn hash_comments_are_ignored() {
        let found = scan(
            &[("c.html", r#"{# {% placeholder "old" %} #}{% placeholder "main" %}"#)],
            "c.html",
        )
        .expect("scan");
        let slots: Vec<_> = found.iter().map(|d| d.slot.as_str()).collect();
        assert_eq!(slots, vec!["main"]);
    }

    #[test]
    fn quoted_arguments_keep_spaces() {
        assert_eq!(
            split_args(r#"currentpage "main" title="Main column""#),
            vec!["currentpage", "\"main\"", "title=\"Main column\""]
        );
    }
}
