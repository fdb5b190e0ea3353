//! Input validation for page URLs, repository URLs, and file paths.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::ValidationError;

/// `https://github.com/<owner>/<repo>` with optional trailing slash.
static GITHUB_REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://github\.com/([^/]+)/([^/]+)/?$").expect("Invalid regex")
});

/// Validates the page URL entered by the user.
pub fn validate_url(input: &str) -> Result<Url, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let url = Url::parse(trimmed).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ValidationError::UnsupportedScheme(other.to_string())),
    }
}

/// Validates a GitHub repository URL and returns `(owner, repo)`.
pub fn validate_github_repo(repo_url: &str) -> Result<(String, String), ValidationError> {
    if !repo_url.contains("github.com") {
        return Err(ValidationError::NotGitHub(repo_url.to_string()));
    }

    let caps = GITHUB_REPO_RE
        .captures(repo_url)
        .ok_or_else(|| ValidationError::InvalidRepoFormat(repo_url.to_string()))?;

    Ok((caps[1].to_string(), caps[2].to_string()))
}

/// Validates a repository-relative HTML file path.
pub fn validate_file_path(path: &str) -> Result<(), ValidationError> {
    if path.trim().is_empty() {
        return Err(ValidationError::EmptyPath);
    }

    if !path.starts_with('/') {
        return Err(ValidationError::PathNotAbsolute(path.to_string()));
    }

    if !path.to_lowercase().ends_with(".html") {
        return Err(ValidationError::NotHtml(path.to_string()));
    }

    Ok(())
}
