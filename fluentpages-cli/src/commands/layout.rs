//! `fluentpages layout list|add|edit|show|remove`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use fluentpages_core::{
    registry::{self, LayoutDraft, LayoutUpdate},
    LayoutId, LayoutKey,
};
use fluentpages_templates::{describe_layout, template_values, TemplatePathField};

use super::load_context;

#[derive(Subcommand, Debug)]
pub enum LayoutCommand {
    /// List layouts ordered by title.
    List,

    /// Create a layout from a template file.
    Add(AddArgs),

    /// Change the key, title or template of a layout.
    Edit(EditArgs),

    /// Show a layout and the placeholders its template declares.
    Show(ShowArgs),

    /// Delete a layout that no page uses.
    Remove {
        /// Layout id.
        id: u64,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Slug identifying the layout (letters, digits, `-`, `_`).
    #[arg(long)]
    pub key: String,

    #[arg(long)]
    pub title: String,

    /// Template path, relative to the template root or absolute.
    #[arg(long)]
    pub template: String,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Layout id.
    pub id: u64,

    #[arg(long)]
    pub key: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub template: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Layout id.
    pub id: u64,

    /// Emit the same JSON the `get_layout` endpoint returns.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct LayoutRow {
    #[tabled(rename = "id")]
    id: u64,
    #[tabled(rename = "key")]
    key: String,
    #[tabled(rename = "title")]
    title: String,
    #[tabled(rename = "template")]
    template: String,
    #[tabled(rename = "updated")]
    updated: String,
}

pub fn run(cmd: LayoutCommand) -> Result<()> {
    match cmd {
        LayoutCommand::List => list(),
        LayoutCommand::Add(args) => add(args),
        LayoutCommand::Edit(args) => edit(args),
        LayoutCommand::Show(args) => show(args),
        LayoutCommand::Remove { id } => remove(LayoutId(id)),
    }
}

fn list() -> Result<()> {
    let (home, settings) = load_context()?;
    let field = TemplatePathField::from_settings(&settings)?;
    let layouts = registry::list_layouts_at(&home).context("failed to load layouts")?;

    if layouts.is_empty() {
        println!("No layouts defined.");
        println!("Run: fluentpages layout add --key <key> --title <title> --template <path>");
        return Ok(());
    }

    let rows: Vec<LayoutRow> = layouts
        .into_iter()
        .map(|l| LayoutRow {
            id: l.id.0,
            key: l.key.0,
            title: l.title,
            template: field
                .prepare_value(Some(&l.template_path))
                .unwrap_or_default(),
            updated: l
                .updated_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn add(args: AddArgs) -> Result<()> {
    let (home, settings) = load_context()?;
    let field = TemplatePathField::from_settings(&settings)?;
    let template_path = field
        .prepare_value(Some(&args.template))
        .unwrap_or_default();
    let templates = template_values(&settings).context("failed to list templates")?;

    let layout = registry::create_layout_at(
        &home,
        LayoutDraft {
            key: LayoutKey::from(args.key.clone()),
            title: args.title,
            template_path,
        },
        &templates,
    )
    .with_context(|| format!("failed to add layout '{}'", args.key))?;

    println!(
        "{} Added layout {} '{}' ({})",
        "✓".green(),
        layout.id,
        layout.title,
        layout.template_path
    );
    Ok(())
}

fn edit(args: EditArgs) -> Result<()> {
    let (home, settings) = load_context()?;
    let field = TemplatePathField::from_settings(&settings)?;
    let templates = template_values(&settings).context("failed to list templates")?;

    let update = LayoutUpdate {
        key: args.key.map(LayoutKey::from),
        title: args.title,
        template_path: field.prepare_value(args.template.as_deref()),
    };
    let layout = registry::update_layout_at(&home, LayoutId(args.id), update, &templates)
        .with_context(|| format!("failed to edit layout {}", args.id))?;

    println!("{} Updated layout {} '{}'", "✓".green(), layout.id, layout.title);
    Ok(())
}

fn show(args: ShowArgs) -> Result<()> {
    let (home, settings) = load_context()?;
    let info = describe_layout(&home, &settings, LayoutId(args.id))
        .with_context(|| format!("failed to describe layout {}", args.id))?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("failed to serialize layout")?
        );
        return Ok(());
    }

    println!("{} {} ({})", info.title.bold(), info.id, info.key.0);
    if info.placeholders.is_empty() {
        println!("  no placeholders");
    }
    for p in &info.placeholders {
        let plugins = if p.allowed_plugins.is_empty() {
            "any".to_string()
        } else {
            p.allowed_plugins.join(", ")
        };
        println!(
            "  {} [{}] {} plugins: {}{}",
            p.slot,
            p.role,
            p.title,
            plugins,
            p.fallback_language
                .as_deref()
                .map(|l| format!(" fallback: {l}"))
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn remove(id: LayoutId) -> Result<()> {
    let (home, _) = load_context()?;
    let layout = registry::delete_layout_at(&home, id)
        .with_context(|| format!("failed to remove layout {id}"))?;
    println!("{} Removed layout {} '{}'", "✓".green(), layout.id, layout.title);
    Ok(())
}
