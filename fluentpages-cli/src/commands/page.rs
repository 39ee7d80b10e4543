//! `fluentpages page list|add-layout-page|add-contents-page|set-layout|form`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::json;
use tabled::{settings::Style, Table, Tabled};

use fluentpages_core::{registry, CapabilityPolicy, LayoutId, PageForm, PageId, PageKind};
use fluentpages_templates::placeholder_data_for;

use super::load_context;

#[derive(Subcommand, Debug)]
pub enum PageCommand {
    /// List pages.
    List,

    /// Create a page that renders with a layout.
    AddLayoutPage(AddLayoutPageArgs),

    /// Create a page with a single content placeholder.
    AddContentsPage {
        #[arg(long)]
        title: String,
    },

    /// Change the layout of a page on behalf of a user.
    SetLayout(SetLayoutArgs),

    /// Print the editor state for a page (or a new page) as JSON.
    Form(FormArgs),
}

#[derive(Args, Debug)]
pub struct AddLayoutPageArgs {
    #[arg(long)]
    pub title: String,

    /// Layout id; required to save the page.
    #[arg(long)]
    pub layout: Option<u64>,
}

#[derive(Args, Debug)]
pub struct SetLayoutArgs {
    pub page: u64,
    pub layout: u64,

    /// Username from the `principals` setting; unknown names act anonymously.
    #[arg(long = "as", value_name = "USER")]
    pub user: Option<String>,
}

#[derive(Args, Debug)]
pub struct FormArgs {
    /// Page id; omit for a page that is being created.
    pub page: Option<u64>,

    #[arg(long = "as", value_name = "USER")]
    pub user: Option<String>,
}

#[derive(Tabled)]
struct PageRow {
    #[tabled(rename = "id")]
    id: u64,
    #[tabled(rename = "title")]
    title: String,
    #[tabled(rename = "type")]
    kind: String,
    #[tabled(rename = "template")]
    template: String,
}

pub fn run(cmd: PageCommand) -> Result<()> {
    match cmd {
        PageCommand::List => list(),
        PageCommand::AddLayoutPage(args) => add_layout_page(args),
        PageCommand::AddContentsPage { title } => add_contents_page(title),
        PageCommand::SetLayout(args) => set_layout(args),
        PageCommand::Form(args) => form(args),
    }
}

fn list() -> Result<()> {
    let (home, _) = load_context()?;
    let pages = registry::list_pages_at(&home).context("failed to load pages")?;
    if pages.is_empty() {
        println!("No pages.");
        return Ok(());
    }

    let mut rows = Vec::with_capacity(pages.len());
    for page in pages {
        let template = registry::template_name_at(&home, &page)
            .with_context(|| format!("failed to resolve template of page {}", page.id))?;
        rows.push(PageRow {
            id: page.id.0,
            title: page.title,
            kind: page.kind.module().to_string(),
            template,
        });
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn add_layout_page(args: AddLayoutPageArgs) -> Result<()> {
    let (home, _) = load_context()?;
    let page = registry::create_layout_page_at(&home, args.title, args.layout.map(LayoutId))
        .context("failed to add layout page")?;
    println!("{} Added page {} '{}'", "✓".green(), page.id, page.title);
    Ok(())
}

fn add_contents_page(title: String) -> Result<()> {
    let (home, _) = load_context()?;
    let page = registry::create_contents_page_at(&home, title)
        .context("failed to add contents page")?;
    println!("{} Added page {} '{}'", "✓".green(), page.id, page.title);
    Ok(())
}

fn set_layout(args: SetLayoutArgs) -> Result<()> {
    let (home, settings) = load_context()?;
    let principal = settings.principal(args.user.as_deref());
    let page = registry::set_page_layout_at(
        &home,
        PageId(args.page),
        LayoutId(args.layout),
        &principal,
        &CapabilityPolicy,
    )
    .with_context(|| format!("failed to change the layout of page {}", args.page))?;

    if let PageKind::LayoutPage { layout } = page.kind {
        println!(
            "{} Page {} now uses layout {}",
            "✓".green(),
            page.id,
            layout
        );
    }
    Ok(())
}

fn form(args: FormArgs) -> Result<()> {
    let (home, settings) = load_context()?;
    let page = args
        .page
        .map(|id| registry::get_page_at(&home, PageId(id)))
        .transpose()
        .context("failed to load page")?;
    let layouts = registry::list_layouts_at(&home).context("failed to load layouts")?;
    let principal = settings.principal(args.user.as_deref());

    let form = PageForm::build(&CapabilityPolicy, &principal, page.as_ref(), &layouts);
    let placeholders = placeholder_data_for(&home, &settings, page.as_ref())
        .context("failed to read placeholders")?;

    let payload = json!({
        "form": form,
        "placeholders": placeholders,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize page form")?
    );
    Ok(())
}
