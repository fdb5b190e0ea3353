//! Edit command - the interactive wizard.
//!
//! Drives [`Wizard`] one screen at a time: page URL, metadata review,
//! access level, GitHub sign-in, preview and commit. Failures land on the
//! error screen, which offers retry or start over as the error allows.

use std::io::IsTerminal;
use std::ops::ControlFlow;

use anyhow::{Result, bail};
use bscomment_core::{AccessLevel, Recovery, Screen, Wizard, validate_url};
use bscomment_fetch::{TokioClock, load_metadata};
use bscomment_github::{Authenticator, PendingEdit};
use clap::Args;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use tracing::{debug, info};

use super::auth::device_prompt;
use super::text_formatter;
use crate::context::AppContext;
use crate::output::{EditOutput, JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the edit command.
#[derive(Args, Default)]
pub struct EditArgs {
    /// Published page URL. Prompted for when omitted.
    pub url: Option<String>,

    /// Repository access to request: public or full.
    #[arg(long, short)]
    pub access: Option<AccessLevel>,

    /// Commit without asking for confirmation.
    #[arg(long, short)]
    pub yes: bool,
}

/// Runs the edit command.
pub async fn run(args: &EditArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load().await?;
    let authenticator = ctx.authenticator()?;

    let mut session = EditSession {
        interactive: std::io::stdin().is_terminal(),
        formatter: text_formatter(cli),
        theme: ColorfulTheme::default(),
        url_arg: args.url.clone(),
        access_arg: args.access,
        last_url: None,
        ctx,
        authenticator,
        args,
        cli,
    };

    let mut wizard = Wizard::new();
    loop {
        debug!(screen = %wizard.screen(), "Wizard step");
        let flow = match wizard.screen() {
            Screen::UrlInput => session.url_input(&mut wizard).await?,
            Screen::MetadataReview => session.metadata_review(&mut wizard)?,
            Screen::PermissionSelection => session.permission_selection(&mut wizard)?,
            Screen::GitHubAuth => session.github_auth(&mut wizard).await?,
            Screen::EditConfirmation => session.edit_confirmation(&mut wizard).await?,
            Screen::Success => session.success(&wizard)?,
            Screen::Error => session.error(&mut wizard)?,
        };
        if flow.is_break() {
            return Ok(());
        }
    }
}

// ============================================================================
// Error screen choices
// ============================================================================

/// Actions offered on the error screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorChoice {
    Retry,
    StartOver,
    SignOutAndStartOver,
    Quit,
}

impl ErrorChoice {
    fn label(self) -> &'static str {
        match self {
            ErrorChoice::Retry => "Try again",
            ErrorChoice::StartOver => "Start over",
            ErrorChoice::SignOutAndStartOver => "Sign out and start over",
            ErrorChoice::Quit => "Quit",
        }
    }
}

/// Choices for an error with the given recovery, default first.
fn error_choices(recovery: Recovery) -> &'static [ErrorChoice] {
    match recovery {
        Recovery::Retry => &[ErrorChoice::Retry, ErrorChoice::StartOver, ErrorChoice::Quit],
        Recovery::StartOver => &[
            ErrorChoice::StartOver,
            ErrorChoice::SignOutAndStartOver,
            ErrorChoice::Quit,
        ],
    }
}

/// Position of `access` in the access-level menu.
fn access_index(access: AccessLevel) -> usize {
    ACCESS_LEVELS.iter().position(|a| *a == access).unwrap_or(0)
}

const ACCESS_LEVELS: [AccessLevel; 2] = [AccessLevel::Public, AccessLevel::Full];

// ============================================================================
// Session
// ============================================================================

struct EditSession<'a> {
    ctx: AppContext,
    authenticator: Authenticator<TokioClock>,
    args: &'a EditArgs,
    cli: &'a Cli,
    formatter: TextFormatter,
    theme: ColorfulTheme,
    interactive: bool,
    /// URL from the command line, consumed by the first url-input pass.
    url_arg: Option<String>,
    /// Access level from the command line, consumed by the first selection.
    access_arg: Option<AccessLevel>,
    last_url: Option<String>,
}

impl EditSession<'_> {
    /// Screen text: stdout for text output, stderr when stdout carries JSON.
    fn say(&self, text: &str) {
        match self.cli.format {
            OutputFormat::Text => println!("{text}"),
            OutputFormat::Json => eprintln!("{text}"),
        }
    }

    fn require_interactive(&self, what: &str) -> Result<()> {
        if self.interactive {
            Ok(())
        } else {
            bail!("{what} needs an interactive terminal")
        }
    }

    async fn url_input(&mut self, wizard: &mut Wizard) -> Result<ControlFlow<()>> {
        let url = match self.url_arg.take() {
            Some(url) => url,
            None => {
                self.require_interactive("Entering a page URL (pass it as an argument instead)")?;
                let mut input = Input::<String>::with_theme(&self.theme)
                    .with_prompt("Published page URL")
                    .validate_with(|input: &String| -> Result<(), String> {
                        validate_url(input).map(|_| ()).map_err(|e| e.to_string())
                    });
                if let Some(last) = &self.last_url {
                    input = input.with_initial_text(last.clone());
                }
                input.interact_text()?
            }
        };
        let url = url.trim().to_string();
        self.last_url = Some(url.clone());

        self.say(&format!("Loading {url} ..."));
        match load_metadata(&self.ctx.http, &url).await {
            Ok(metadata) => wizard.submit_url(url, metadata)?,
            Err(e) => wizard.fail_with(e.to_string(), e.class(), Recovery::Retry),
        }
        Ok(ControlFlow::Continue(()))
    }

    fn metadata_review(&self, wizard: &mut Wizard) -> Result<ControlFlow<()>> {
        if let Some(metadata) = wizard.metadata() {
            self.say("");
            self.say(&self.formatter.header("Page Metadata"));
            self.say(&self.formatter.format_metadata(metadata));
            self.say("");
        }

        if !self.interactive {
            wizard.confirm_metadata()?;
            return Ok(ControlFlow::Continue(()));
        }

        let proceed = Confirm::with_theme(&self.theme)
            .with_prompt("Edit this file?")
            .default(true)
            .interact()?;

        if proceed {
            wizard.confirm_metadata()?;
        } else {
            wizard.back()?;
        }
        Ok(ControlFlow::Continue(()))
    }

    fn permission_selection(&mut self, wizard: &mut Wizard) -> Result<ControlFlow<()>> {
        if let Some(access) = self.access_arg.take() {
            wizard.select_access(access)?;
            return Ok(ControlFlow::Continue(()));
        }

        let default = wizard.access().unwrap_or(self.ctx.settings.default_access);
        if !self.interactive {
            wizard.select_access(default)?;
            return Ok(ControlFlow::Continue(()));
        }

        let mut items: Vec<&str> = ACCESS_LEVELS.iter().map(|a| a.label()).collect();
        items.push("Back");

        let selection = Select::with_theme(&self.theme)
            .with_prompt("Repository access to request")
            .items(&items)
            .default(access_index(default))
            .interact()?;

        match ACCESS_LEVELS.get(selection) {
            Some(access) => wizard.select_access(*access)?,
            None => wizard.back()?,
        }
        Ok(ControlFlow::Continue(()))
    }

    async fn github_auth(&self, wizard: &mut Wizard) -> Result<ControlFlow<()>> {
        if let Some(existing) = self.authenticator.restore() {
            let keep = !self.interactive
                || Confirm::with_theme(&self.theme)
                    .with_prompt(format!("Continue as {}?", existing.user.login))
                    .default(true)
                    .interact()?;
            if keep {
                self.say(&self.formatter.format_user(&existing));
                wizard.authenticated(existing)?;
                return Ok(ControlFlow::Continue(()));
            }
            self.authenticator.logout()?;
        }

        let access = wizard.access().unwrap_or(self.ctx.settings.default_access);
        let prompt = device_prompt(text_formatter(self.cli), self.ctx.settings.open_browser);

        match self.authenticator.login(access, prompt).await {
            Ok(auth) => {
                self.say(&self.formatter.format_user(&auth));
                wizard.authenticated(auth)?;
            }
            Err(e) => wizard.fail(e.to_string(), e.class()),
        }
        Ok(ControlFlow::Continue(()))
    }

    async fn edit_confirmation(&self, wizard: &mut Wizard) -> Result<ControlFlow<()>> {
        let (Some(metadata), Some(auth)) = (wizard.metadata().cloned(), wizard.auth().cloned()) else {
            bail!("edit confirmation reached without metadata or a signed-in user");
        };
        let client = self.authenticator.client();

        let edit = match PendingEdit::prepare(client, &auth, metadata).await {
            Ok(edit) => edit,
            Err(e) => {
                wizard.fail(e.to_string(), e.class());
                return Ok(ControlFlow::Continue(()));
            }
        };

        self.say("");
        self.say(&self.formatter.header("Preview"));
        self.say(&self.formatter.format_preview(&edit.preview()));
        self.say("");
        let message = edit.commit_message(&auth.user);
        self.say(&format!("Commit message: {}", message.lines().next().unwrap_or_default()));
        self.say("");

        if !self.args.yes {
            self.require_interactive("Confirming the commit (pass --yes instead)")?;
            let options = &["Commit this change", "Back", "Cancel"];
            let selection = Select::with_theme(&self.theme)
                .with_prompt(format!("Commit to {}?", edit.metadata().full_name()))
                .items(options)
                .default(0)
                .interact()?;

            match selection {
                0 => {}
                1 => {
                    wizard.back()?;
                    return Ok(ControlFlow::Continue(()));
                }
                _ => {
                    self.say("Cancelled. Nothing was committed.");
                    return Ok(ControlFlow::Break(()));
                }
            }
        }

        match edit.commit(client, &auth).await {
            Ok(commit) => {
                info!(sha = %commit.sha, "Committed timestamp comment");
                wizard.committed(commit)?;
            }
            Err(e) => wizard.fail(e.to_string(), e.class()),
        }
        Ok(ControlFlow::Continue(()))
    }

    fn success(&self, wizard: &Wizard) -> Result<ControlFlow<()>> {
        let (Some(metadata), Some(commit)) = (wizard.metadata(), wizard.commit()) else {
            bail!("success reached without a commit");
        };

        match self.cli.format {
            OutputFormat::Text => {
                println!();
                println!("{}", self.formatter.format_commit(metadata, commit));
            }
            OutputFormat::Json => {
                let output = EditOutput::new(wizard.url().unwrap_or_default(), metadata, commit);
                println!("{}", JsonFormatter::new(self.cli.pretty).format(&output)?);
            }
        }
        Ok(ControlFlow::Break(()))
    }

    fn error(&self, wizard: &mut Wizard) -> Result<ControlFlow<()>> {
        let Some(error) = wizard.error().cloned() else {
            wizard.start_over();
            return Ok(ControlFlow::Continue(()));
        };

        eprintln!();
        eprintln!("{}", self.formatter.format_error(&error));
        eprintln!();

        if !self.interactive {
            bail!(error.message);
        }

        let choices = error_choices(error.recovery);
        let labels: Vec<&str> = choices.iter().map(|c| c.label()).collect();
        let selection = Select::with_theme(&self.theme)
            .with_prompt("What next?")
            .items(&labels)
            .default(0)
            .interact()?;

        match choices.get(selection).copied().unwrap_or(ErrorChoice::Quit) {
            ErrorChoice::Retry => wizard.retry()?,
            ErrorChoice::StartOver => wizard.start_over(),
            ErrorChoice::SignOutAndStartOver => {
                self.authenticator.logout()?;
                wizard.start_over();
            }
            ErrorChoice::Quit => bail!(error.message),
        }
        Ok(ControlFlow::Continue(()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bscomment_core::ErrorClass;

    #[test]
    fn test_error_choices_follow_recovery() {
        assert_eq!(error_choices(Recovery::Retry)[0], ErrorChoice::Retry);
        assert!(!error_choices(Recovery::StartOver).contains(&ErrorChoice::Retry));
        assert!(error_choices(Recovery::StartOver).contains(&ErrorChoice::SignOutAndStartOver));
        for recovery in [Recovery::Retry, Recovery::StartOver] {
            assert_eq!(error_choices(recovery).last(), Some(&ErrorChoice::Quit));
        }
    }

    #[test]
    fn test_access_menu_order() {
        assert_eq!(access_index(AccessLevel::Public), 0);
        assert_eq!(access_index(AccessLevel::Full), 1);
        assert_eq!(ACCESS_LEVELS[access_index(AccessLevel::default())], AccessLevel::default());
    }

    #[test]
    fn test_page_load_failure_is_retryable() {
        let mut wizard = Wizard::new();
        wizard.fail_with("Failed to fetch HTML: 404 Not Found", ErrorClass::NotFound, Recovery::Retry);

        let error = wizard.error().cloned().unwrap();
        assert_eq!(error_choices(error.recovery)[0], ErrorChoice::Retry);

        wizard.retry().unwrap();
        assert_eq!(wizard.screen(), Screen::UrlInput);
    }

    #[test]
    fn test_default_args() {
        let args = EditArgs::default();
        assert!(args.url.is_none());
        assert!(args.access.is_none());
        assert!(!args.yes);
    }
}
