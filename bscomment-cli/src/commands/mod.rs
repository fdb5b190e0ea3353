//! CLI command implementations.

pub mod auth;
pub mod config;
pub mod edit;
pub mod inspect;
pub mod proxy;

use std::io::IsTerminal;

use crate::Cli;
use crate::output::TextFormatter;

/// Text formatter honouring `--no-color` and whether stdout is a terminal.
pub(crate) fn text_formatter(cli: &Cli) -> TextFormatter {
    TextFormatter::new(!cli.no_color && std::io::stdout().is_terminal())
}
