//! Config command - manage configuration.

use anyhow::Result;
use bscomment_store::{SettingsStore, default_cache_dir, default_config_dir, default_session_path};
use clap::{Args, Subcommand};
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration (environment overrides applied).
    Show,

    /// Show configuration paths.
    Path,

    /// Set a configuration key. An empty value clears optional keys.
    Set {
        /// One of: client_id, proxy_url, api_base, oauth_base, default_access,
        /// session_backend, request_timeout_secs, open_browser.
        key: String,
        /// New value.
        value: String,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await?;

    match &args.action {
        ConfigAction::Show => show_config(&store, cli).await,
        ConfigAction::Path => show_paths(&store, cli),
        ConfigAction::Set { key, value } => set_value(&store, key, value).await,
        ConfigAction::Reset => reset_config(&store).await,
    }
}

async fn show_config(store: &SettingsStore, cli: &Cli) -> Result<()> {
    let settings = store.effective().await;

    match cli.format {
        OutputFormat::Text => {
            let or_unset = |v: &Option<String>| v.clone().unwrap_or_else(|| "(not set)".to_string());

            println!("bsComment Editor Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Client id:        {}", or_unset(&settings.client_id));
            println!("Proxy URL:        {}", or_unset(&settings.proxy_url));
            println!("API base:         {}", settings.api_base);
            println!("OAuth base:       {}", settings.oauth_base);
            println!("Default access:   {}", settings.default_access);
            println!("Session backend:  {}", settings.session_backend);
            println!("Request timeout:  {}s", settings.request_timeout_secs);
            println!("Open browser:     {}", settings.open_browser);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&settings)?);
        }
    }

    Ok(())
}

fn show_paths(store: &SettingsStore, cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let cache_dir = default_cache_dir();
    let session_path = default_session_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", store.path().display());
            println!("Cache dir:     {}", cache_dir.display());
            println!("Session file:  {}", session_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": store.path().display().to_string(),
                "cache_dir": cache_dir.display().to_string(),
                "session_file": session_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn set_value(store: &SettingsStore, key: &str, value: &str) -> Result<()> {
    store.update(|s| s.set(key, value)).await?;
    store.save().await?;

    info!(%key, "Setting updated");
    println!("{key} updated");

    Ok(())
}

async fn reset_config(store: &SettingsStore) -> Result<()> {
    let existed = store.path().exists();
    store.reset().await?;

    if existed {
        println!("Configuration reset to defaults");
    } else {
        println!("No configuration file to reset");
    }

    Ok(())
}
