//! Text output formatting with colors.

use bscomment_core::{AuthToken, CommitInfo, DeviceFlowSession, ParsedMetadata, WizardError};
use bscomment_github::Preview;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Section header with a rule underneath.
    pub fn header(&self, title: &str) -> String {
        format!("{}\n{}", self.bold(title), "─".repeat(40))
    }

    /// Page metadata as aligned fields.
    pub fn format_metadata(&self, metadata: &ParsedMetadata) -> String {
        [
            format!("Repository: {}", self.cyan(&metadata.full_name())),
            format!("Repo URL:   {}", metadata.repo_url),
            format!("File:       {}", metadata.file_path),
            format!("Generated:  {}", metadata.generated),
            format!("Generator:  {}", metadata.generator),
        ]
        .join("\n")
    }

    /// Instructions for entering the user code.
    pub fn format_device_prompt(&self, session: &DeviceFlowSession) -> String {
        let minutes = session.expires_in / 60;
        [
            format!("Open {} and enter the code:", self.cyan(&session.verification_uri)),
            String::new(),
            format!("    {}", self.bold(&session.user_code)),
            String::new(),
            self.dim(&format!("The code expires in {minutes} minutes. Waiting for approval...")),
        ]
        .join("\n")
    }

    /// Signed-in identity line.
    pub fn format_user(&self, auth: &AuthToken) -> String {
        let user = &auth.user;
        match user.name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => format!("Signed in as {} ({})", self.bold(&user.login), name),
            None => format!("Signed in as {}", self.bold(&user.login)),
        }
    }

    /// Diff-style preview with the added line highlighted.
    pub fn format_preview(&self, preview: &Preview) -> String {
        preview
            .render()
            .split('\n')
            .enumerate()
            .map(|(i, line)| {
                if i == preview.comment_index {
                    self.green(line)
                } else {
                    self.dim(line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Commit confirmation.
    pub fn format_commit(&self, metadata: &ParsedMetadata, commit: &CommitInfo) -> String {
        let short = commit.sha.get(..7).unwrap_or(&commit.sha);
        let mut lines = vec![
            format!("{} Updated {}", self.green("✓"), metadata.file_path),
            format!("Commit: {} in {}", self.bold(short), metadata.full_name()),
        ];
        if !commit.html_url.is_empty() {
            lines.push(format!("View:   {}", self.cyan(&commit.html_url)));
        }
        lines.join("\n")
    }

    /// Error screen body.
    pub fn format_error(&self, error: &WizardError) -> String {
        format!(
            "{} {} {}",
            self.red("✗"),
            self.bold(&format!("[{}]", error.class.label())),
            error.message
        )
    }

    // ========================================================================
    // Color helpers
    // ========================================================================

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}
