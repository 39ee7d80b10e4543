//! `fluentpages templates [--json]`

use anyhow::{Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use fluentpages_templates::{FsLister, TemplatePathField};

use super::load_context;

#[derive(Args, Debug)]
pub struct TemplatesArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct ChoiceRow {
    #[tabled(rename = "label")]
    label: String,
    #[tabled(rename = "value")]
    value: String,
}

impl TemplatesArgs {
    pub fn run(self) -> Result<()> {
        let (_, settings) = load_context()?;
        let field = TemplatePathField::from_settings(&settings)
            .context("failed to build template path field")?;
        let choices = field.choices(&FsLister).context("failed to list templates")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&choices).context("failed to serialize choices")?
            );
            return Ok(());
        }

        if choices.is_empty() {
            println!("No templates under {}", settings.template_root());
            return Ok(());
        }

        let rows: Vec<ChoiceRow> = choices
            .into_iter()
            .map(|c| ChoiceRow {
                label: c.label,
                value: c.value,
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
