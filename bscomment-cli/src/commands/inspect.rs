//! Inspect command - show the metadata a page publishes.

use anyhow::Result;
use bscomment_fetch::load_metadata;
use clap::Args;

use super::text_formatter;
use crate::context::AppContext;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Published page URL.
    pub url: String,
}

/// Runs the inspect command.
pub async fn run(args: &InspectArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load().await?;
    let metadata = load_metadata(&ctx.http, args.url.trim()).await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = text_formatter(cli);
            println!("{}", formatter.header("Page Metadata"));
            println!();
            println!("{}", formatter.format_metadata(&metadata));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&metadata)?);
        }
    }

    Ok(())
}
