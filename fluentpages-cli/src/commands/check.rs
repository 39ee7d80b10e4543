//! `fluentpages check`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use fluentpages_templates::template_values;

use super::load_context;

#[derive(Args, Debug)]
pub struct CheckArgs {}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let (_, settings) = load_context()?;
        let templates = template_values(&settings).context("failed to list templates")?;

        println!("{} configuration is valid", "✓".green());
        println!("  template root: {}", settings.template_root());
        println!(
            "  path mode:     {}",
            if settings.relative_mode() {
                "relative"
            } else {
                "absolute"
            }
        );
        println!("  templates:     {}", templates.len());
        println!("  listen:        {}", settings.listen());
        Ok(())
    }
}
