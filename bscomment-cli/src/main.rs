// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! bsComment Editor CLI - stamp a comment into a published page's source on GitHub.
//!
//! # Examples
//!
//! ```bash
//! # Interactive wizard
//! bscomment
//!
//! # Start the wizard with a URL and skip the final confirmation
//! bscomment edit https://example.github.io/site/notes.html --yes
//!
//! # Show the metadata a page publishes
//! bscomment inspect https://example.github.io/site/notes.html --format json
//!
//! # Sign in ahead of time
//! bscomment auth login --access public
//!
//! # Run the device-flow relay
//! bscomment proxy --port 8787
//! ```

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{auth, config, edit, inspect, proxy};

// ============================================================================
// CLI Definition
// ============================================================================

/// bsComment Editor CLI.
#[derive(Parser)]
#[command(name = "bscomment")]
#[command(about = "Commit a timestamp comment to the source of a published page")]
#[command(long_about = r#"
bsComment Editor reads the markpub:* meta tags of a published HTML page,
signs in to GitHub with the OAuth device flow, and commits a timestamp
comment to the page's source file.

Configuration:
  BSCOMMENT_GITHUB_CLIENT_ID   OAuth App client id (or GITHUB_CLIENT_ID)
  BSCOMMENT_PROXY_URL          Device-flow relay URL

Examples:
  bscomment                         # Interactive wizard
  bscomment URL                     # Wizard for one page
  bscomment edit URL --yes          # Non-interactive confirmation
  bscomment inspect URL             # Show page metadata
  bscomment auth status             # Who is signed in
  bscomment proxy --port 8787       # Run the device-flow relay
"#)]
#[command(version)]
#[command(author = "bsComment Editor Contributors")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'edit' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Wizard arguments when no subcommand is given.
    #[command(flatten)]
    pub edit: edit::EditArgs,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the editor wizard (default if no command specified).
    #[command(visible_alias = "e")]
    Edit(edit::EditArgs),

    /// Show the bsComment metadata of a page.
    #[command(visible_alias = "i")]
    Inspect(inspect::InspectArgs),

    /// Manage the GitHub session.
    Auth(auth::AuthArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),

    /// Run the device-flow relay.
    Proxy(proxy::ProxyArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("bscomment=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bscomment=warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Edit(args)) => edit::run(args, &cli).await,
        Some(Commands::Inspect(args)) => inspect::run(args, &cli).await,
        Some(Commands::Auth(args)) => auth::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
        Some(Commands::Proxy(args)) => proxy::run(args, &cli).await,
        None => edit::run(&cli.edit, &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::Error as i32);
    }

    std::process::exit(ExitCode::Success as i32);
}
