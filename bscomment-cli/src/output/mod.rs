//! Output formatting for CLI.

mod json;
mod text;

pub use json::{AuthStatusOutput, EditOutput, JsonFormatter};
pub use text::TextFormatter;
#[cfg(test)]
mod tests;
