//! Page metadata types.

use serde::{Deserialize, Serialize};

/// The four `markpub:*` tag values exactly as found in the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMetadata {
    /// `markpub:repo` - repository URL.
    pub repo: String,
    /// `markpub:filepath` - path of the source file inside the repository.
    pub filepath: String,
    /// `markpub:generated` - generation timestamp.
    pub generated: String,
    /// `markpub:generator` - generator name/version.
    pub generator: String,
}

/// Validated metadata for one wizard run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMetadata {
    /// Repository URL without trailing slash.
    pub repo_url: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo_name: String,
    /// File path inside the repository, starting with `/`.
    pub file_path: String,
    /// Generation timestamp, as published.
    pub generated: String,
    /// Generator, as published.
    pub generator: String,
}

impl ParsedMetadata {
    /// `owner/repo` slug.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo_name)
    }

    /// File path with the leading slash removed, as the Contents API expects.
    pub fn contents_path(&self) -> &str {
        self.file_path.trim_start_matches('/')
    }
}
