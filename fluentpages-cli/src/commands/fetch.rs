//! `fluentpages fetch <id> [--server <url>]`

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;

use super::load_context;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Layout id.
    pub id: u64,

    /// Base URL of a running server; defaults to `http://<listen setting>`.
    #[arg(long)]
    pub server: Option<String>,
}

impl FetchArgs {
    pub fn run(self) -> Result<()> {
        let base = match self.server {
            Some(url) => url,
            None => {
                let (_, settings) = load_context()?;
                format!("http://{}", settings.listen())
            }
        };
        let url = format!("{}/get_layout/{}/", base.trim_end_matches('/'), self.id);

        let body: Value = match ureq::get(&url).call() {
            Ok(resp) => resp
                .into_json()
                .with_context(|| format!("invalid JSON from {url}"))?,
            Err(ureq::Error::Status(code, resp)) => {
                let body: Value = resp
                    .into_json()
                    .with_context(|| format!("invalid JSON from {url}"))?;
                let message = body["error"].as_str().unwrap_or("request failed");
                bail!("{url} returned {code}: {message}");
            }
            Err(err) => return Err(err).with_context(|| format!("could not reach {url}")),
        };

        println!(
            "{}",
            serde_json::to_string_pretty(&body).context("failed to render layout JSON")?
        );
        Ok(())
    }
}
