//! Auth command - manage the GitHub session.

use anyhow::Result;
use bscomment_core::{AccessLevel, DeviceFlowSession};
use bscomment_github::{clear_session, restore_session};
use bscomment_store::SessionBackend;
use clap::{Args, Subcommand};
use tracing::{info, warn};

use super::text_formatter;
use crate::context::AppContext;
use crate::output::{AuthStatusOutput, JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the auth command.
#[derive(Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Auth subcommands.
#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in with the GitHub device flow.
    Login {
        /// Repository access to request: public or full.
        #[arg(long, short)]
        access: Option<AccessLevel>,
    },

    /// Forget the stored token.
    Logout,

    /// Show who is signed in.
    Status,
}

/// Runs the auth command.
pub async fn run(args: &AuthArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load().await?;

    match &args.action {
        AuthAction::Login { access } => login(&ctx, *access, cli).await,
        AuthAction::Logout => logout(&ctx, cli),
        AuthAction::Status => status(&ctx, cli),
    }
}

/// Prints the user code (to stderr) and optionally opens the verification page.
pub(crate) fn device_prompt(
    formatter: TextFormatter,
    open_browser: bool,
) -> impl FnOnce(&DeviceFlowSession) {
    move |session| {
        eprintln!();
        eprintln!("{}", formatter.format_device_prompt(session));
        eprintln!();

        if open_browser {
            if let Err(e) = open::that(&session.verification_uri) {
                warn!(error = %e, "Failed to open browser");
            }
        }
    }
}

async fn login(ctx: &AppContext, access: Option<AccessLevel>, cli: &Cli) -> Result<()> {
    let access = access.unwrap_or(ctx.settings.default_access);
    let authenticator = ctx.authenticator()?;

    if ctx.settings.session_backend == SessionBackend::Memory && !cli.quiet {
        eprintln!(
            "Note: session_backend is 'memory', so the token is forgotten when this command exits.\n\
             Run `bscomment config set session_backend keychain` to keep it."
        );
    }

    let formatter = text_formatter(cli);
    let auth = authenticator
        .login(access, device_prompt(text_formatter(cli), ctx.settings.open_browser))
        .await?;

    info!(login = %auth.user.login, %access, "Signed in");
    match cli.format {
        OutputFormat::Text => println!("{}", formatter.format_user(&auth)),
        OutputFormat::Json => {
            let output = AuthStatusOutput::new(ctx.settings.session_backend, Some(&auth));
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    Ok(())
}

fn logout(ctx: &AppContext, cli: &Cli) -> Result<()> {
    let store = ctx.session_store()?;
    clear_session(store.as_ref())?;

    info!(backend = %ctx.settings.session_backend, "Signed out");
    if !cli.quiet {
        println!("Signed out");
    }

    Ok(())
}

fn status(ctx: &AppContext, cli: &Cli) -> Result<()> {
    let store = ctx.session_store()?;
    let auth = restore_session(store.as_ref());

    match cli.format {
        OutputFormat::Text => match &auth {
            Some(auth) => println!("{}", text_formatter(cli).format_user(auth)),
            None => println!("Not signed in ({} session)", ctx.settings.session_backend),
        },
        OutputFormat::Json => {
            let output = AuthStatusOutput::new(ctx.settings.session_backend, auth.as_ref());
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    Ok(())
}
