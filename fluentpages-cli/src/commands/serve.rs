//! `fluentpages serve [--listen <addr>]`

use anyhow::{Context, Result};
use clap::Args;

use fluentpages_server::start_blocking;

use super::load_context;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind; defaults to the `listen` setting.
    #[arg(long)]
    pub listen: Option<String>,
}

impl ServeArgs {
    pub fn run(self) -> Result<()> {
        let (home, settings) = load_context()?;
        start_blocking(&home, settings, self.listen).context("server exited with error")
    }
}
