//! `markpub:*` metadata extraction and the timestamp edit.
//!
//! A published page identifies its source with four meta tags in `<head>`:
//!
//! ```html
//! <meta name="markpub:repo" content="https://github.com/acme/site">
//! <meta name="markpub:filepath" content="/docs/index.html">
//! <meta name="markpub:generated" content="2024-05-01T10:00:00Z">
//! <meta name="markpub:generator" content="markpub 1.2.0">
//! ```
//!
//! Extraction is a tag scan, not a DOM parse: comments are dropped, every
//! `<meta>` tag is tokenized into attributes, and the first tag carrying each
//! name wins.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use tracing::debug;

use crate::error::{CoreError, ValidationError};
use crate::models::{ParsedMetadata, RawMetadata};
use crate::validate::{validate_file_path, validate_github_repo};

// ============================================================================
// Constants
// ============================================================================

/// Tag carrying the repository URL.
pub const META_REPO: &str = "markpub:repo";

/// Tag carrying the repository file path.
pub const META_FILEPATH: &str = "markpub:filepath";

/// Tag carrying the generation timestamp.
pub const META_GENERATED: &str = "markpub:generated";

/// Tag carrying the generator name.
pub const META_GENERATOR: &str = "markpub:generator";

/// Marker text of the inserted comment.
pub const COMMENT_MARKER: &str = "bsComment Editor: Updated";

const BODY_CLOSE: &str = "</body>";

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("Invalid regex"));

// A tag is a run of attributes, each quoted or unquoted. Quotes only open at
// the start of a value, so an unquoted `O'Brien` never reaches past `>`.
static META_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<meta\b((?:\s*[^\s"'=/<>]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+))?|\s*/)*)\s*>"#,
    )
    .expect("Invalid regex")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'=/<>]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+)))?"#)
        .expect("Invalid regex")
});

// ============================================================================
// Extraction
// ============================================================================

/// Extracts the four `markpub:*` tags from an HTML document.
///
/// Returns `None` when any of the four is missing. A tag without a `content`
/// attribute reads as an empty string.
pub fn extract_metadata(html: &str) -> Option<RawMetadata> {
    let without_comments = COMMENT_RE.replace_all(html, "");
    let mut found: HashMap<String, String> = HashMap::new();

    for tag in META_TAG_RE.captures_iter(&without_comments) {
        let attrs = parse_attributes(&tag[1]);
        let Some(name) = attrs.get("name") else {
            continue;
        };
        if !name.starts_with("markpub:") || found.contains_key(name) {
            continue;
        }
        let content = attrs.get("content").cloned().unwrap_or_default();
        found.insert(name.clone(), content);
    }

    let mut take = |key: &str| found.remove(key);
    let meta = RawMetadata {
        repo: take(META_REPO)?,
        filepath: take(META_FILEPATH)?,
        generated: take(META_GENERATED)?,
        generator: take(META_GENERATOR)?,
    };

    debug!(repo = %meta.repo, filepath = %meta.filepath, "Found markpub metadata");
    Some(meta)
}

/// Validates raw metadata and derives owner/repository.
pub fn parse_metadata(raw: RawMetadata) -> Result<ParsedMetadata, ValidationError> {
    let (owner, repo_name) = validate_github_repo(&raw.repo)?;
    validate_file_path(&raw.filepath)?;

    Ok(ParsedMetadata {
        repo_url: raw.repo.trim_end_matches('/').to_string(),
        owner,
        repo_name,
        file_path: raw.filepath,
        generated: raw.generated,
        generator: raw.generator,
    })
}

/// Extracts and validates the page metadata in one step.
///
/// Missing tags are [`CoreError::MetadataNotFound`]; present tags with bad
/// values are [`CoreError::Validation`].
pub fn read_metadata(html: &str) -> Result<ParsedMetadata, CoreError> {
    let raw = extract_metadata(html).ok_or(CoreError::MetadataNotFound)?;
    Ok(parse_metadata(raw)?)
}

/// Tokenizes the attribute section of a tag. Names are lowercased; the
/// first occurrence of a name wins, as in HTML.
fn parse_attributes(section: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for cap in ATTR_RE.captures_iter(section) {
        let name = cap[1].to_ascii_lowercase();
        let value = cap
            .get(2)
            .or_else(|| cap.get(3))
            .or_else(|| cap.get(4))
            .map(|m| decode_entities(m.as_str()))
            .unwrap_or_default();
        attrs.entry(name).or_insert(value);
    }
    attrs
}

/// Decodes the character references that show up in attribute values.
fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail.find(';').and_then(|end| {
            let entity = &tail[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, end + 1))
        });

        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

// ============================================================================
// Timestamp Edit
// ============================================================================

/// Inserts a timestamp comment using the current time.
pub fn add_timestamp_comment(html: &str) -> String {
    add_timestamp_comment_at(html, Utc::now())
}

/// Inserts `<!-- bsComment Editor: Updated <ts> -->` before the last
/// `</body>`, or appends it on a new line when there is no `</body>`.
pub fn add_timestamp_comment_at(html: &str, at: DateTime<Utc>) -> String {
    let comment = format!(
        "<!-- {COMMENT_MARKER} {} -->",
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    );

    match html.rfind(BODY_CLOSE) {
        Some(idx) => format!("{}{comment}\n{}", &html[..idx], &html[idx..]),
        None => format!("{html}\n{comment}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn page(repo: &str, path: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="markpub:repo" content="{repo}">
  <meta name="markpub:filepath" content="{path}">
  <meta name="markpub:generated" content="2024-05-01T10:00:00Z">
  <meta name="markpub:generator" content="markpub 1.2.0">
</head>
<body><p>Hello</p></body>
</html>"#
        )
    }

    #[test]
    fn test_extract_and_parse_valid_page() {
        let raw = extract_metadata(&page("https://github.com/acme/site", "/docs/index.html"))
            .expect("metadata present");
        let parsed = parse_metadata(raw).unwrap();

        assert_eq!(parsed.owner, "acme");
        assert_eq!(parsed.repo_name, "site");
        assert_eq!(parsed.repo_url, "https://github.com/acme/site");
        assert_eq!(parsed.file_path, "/docs/index.html");
        assert_eq!(parsed.generator, "markpub 1.2.0");
    }

    #[test]
    fn test_trailing_slash_normalizes() {
        let a = parse_metadata(
            extract_metadata(&page("https://github.com/foo/bar/", "/a.html")).unwrap(),
        )
        .unwrap();
        let b = parse_metadata(
            extract_metadata(&page("https://github.com/foo/bar", "/a.html")).unwrap(),
        )
        .unwrap();

        assert_eq!(a.owner, "foo");
        assert_eq!(a.repo_name, "bar");
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_tag_is_not_found() {
        let html = page("https://github.com/acme/site", "/index.html")
            .replace(r#"<meta name="markpub:generator" content="markpub 1.2.0">"#, "");
        assert!(extract_metadata(&html).is_none());
        assert!(extract_metadata("").is_none());
        assert!(extract_metadata("<html><body>plain</body></html>").is_none());
    }

    #[test]
    fn test_commented_out_tags_are_ignored() {
        let html = page("https://github.com/acme/site", "/index.html").replace(
            r#"<meta name="markpub:repo" content="https://github.com/acme/site">"#,
            r#"<!-- <meta name="markpub:repo" content="https://github.com/acme/site"> -->"#,
        );
        assert!(extract_metadata(&html).is_none());
    }

    #[test]
    fn test_attribute_order_quotes_and_entities() {
        let html = r#"<head>
            <META content='https://github.com/a/b' NAME='markpub:repo' />
            <meta content="/x&amp;y.html" name="markpub:filepath">
            <meta name=markpub:generated content=2024>
            <meta name="markpub:generator">
        </head>"#;

        let raw = extract_metadata(html).unwrap();
        assert_eq!(raw.repo, "https://github.com/a/b");
        assert_eq!(raw.filepath, "/x&y.html");
        assert_eq!(raw.generated, "2024");
        assert_eq!(raw.generator, "");
    }

    #[test]
    fn test_first_tag_wins() {
        let html = r#"
            <meta name="markpub:repo" content="https://github.com/first/one">
            <meta name="markpub:repo" content="https://github.com/second/two">
            <meta name="markpub:filepath" content="/a.html">
            <meta name="markpub:generated" content="now">
            <meta name="markpub:generator" content="gen">
        "#;
        assert_eq!(
            extract_metadata(html).unwrap().repo,
            "https://github.com/first/one"
        );
    }

    #[test]
    fn test_content_containing_angle_bracket() {
        let html = r#"
            <meta name="markpub:repo" content="https://github.com/a/b">
            <meta name="markpub:filepath" content="/a.html">
            <meta name="markpub:generated" content="a > b">
            <meta name="markpub:generator" content="gen">
        "#;
        assert_eq!(extract_metadata(html).unwrap().generated, "a > b");
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let raw = extract_metadata(&page("https://gitlab.com/a/b", "/a.html")).unwrap();
        assert!(matches!(
            parse_metadata(raw),
            Err(ValidationError::NotGitHub(_))
        ));

        let raw = extract_metadata(&page("https://github.com/a/b", "a.html")).unwrap();
        assert!(matches!(
            parse_metadata(raw),
            Err(ValidationError::PathNotAbsolute(_))
        ));

        let raw = extract_metadata(&page("https://github.com/a/b", "/a.md")).unwrap();
        assert!(matches!(parse_metadata(raw), Err(ValidationError::NotHtml(_))));
    }

    #[test]
    fn test_unquoted_apostrophe_does_not_hide_later_tags() {
        let html = r#"<head>
            <meta name=author content=O'Brien>
            <meta name="markpub:repo" content="https://github.com/acme/site">
            <meta name="markpub:filepath" content="/index.html">
            <meta name="markpub:generated" content="2024-05-01">
            <meta name="markpub:generator" content="markpub">
        </head>
        <body><p>Don't panic</p></body>"#;

        let raw = extract_metadata(html).expect("metadata after unquoted apostrophe");
        assert_eq!(raw.repo, "https://github.com/acme/site");
        assert_eq!(raw.generator, "markpub");
    }

    #[test]
    fn test_unquoted_value_keeps_quote_characters() {
        let html = r#"
            <meta name=markpub:repo content=https://github.com/a/b>
            <meta name=markpub:filepath content=/a.html>
            <meta name=markpub:generated content=it's>
            <meta name=markpub:generator content=say"hi">
        "#;
        let raw = extract_metadata(html).unwrap();
        assert_eq!(raw.generated, "it's");
        assert_eq!(raw.generator, r#"say"hi""#);
    }

    #[test]
    fn test_read_metadata_errors() {
        assert!(matches!(
            read_metadata("<html><body>plain</body></html>"),
            Err(CoreError::MetadataNotFound)
        ));

        let err = read_metadata(&page("https://gitlab.com/a/b", "/a.html")).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::NotGitHub(_))
        ));
        assert_eq!(err.class(), crate::ErrorClass::Validation);

        let parsed = read_metadata(&page("https://github.com/a/b", "/a.html")).unwrap();
        assert_eq!(parsed.owner, "a");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a&amp;b"), "a&b");
        assert_eq!(decode_entities("&#47;x&#x2F;"), "/x/");
        assert_eq!(decode_entities("a & b"), "a & b");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
    }

    #[test]
    fn test_timestamp_inserted_before_body_close() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let out = add_timestamp_comment_at("<html><body>x</body></html>", at);
        assert_eq!(
            out,
            "<html><body>x<!-- bsComment Editor: Updated 2024-05-01T12:30:00.000Z -->\n</body></html>"
        );
    }

    #[test]
    fn test_timestamp_uses_last_body_close() {
        let html = "<body><pre></body></pre></body>";
        let out = add_timestamp_comment_at(html, Utc::now());
        let comment_idx = out.find(COMMENT_MARKER).unwrap();
        assert!(out[..comment_idx].contains("</body></pre>"));
        assert!(out.ends_with("-->\n</body>"));
    }

    #[test]
    fn test_timestamp_appended_without_body() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let out = add_timestamp_comment_at("<p>fragment</p>", at);
        assert_eq!(
            out,
            "<p>fragment</p>\n<!-- bsComment Editor: Updated 2024-01-02T03:04:05.000Z -->"
        );
    }

    #[test]
    fn test_two_edits_produce_two_comments() {
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap();

        let once = add_timestamp_comment_at("<body>x</body>", first);
        let twice = add_timestamp_comment_at(&once, second);

        let body_close = twice.rfind(BODY_CLOSE).unwrap();
        let lines: Vec<&str> = twice[..body_close]
            .lines()
            .filter(|l| l.contains(COMMENT_MARKER))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_ne!(lines[0], lines[1]);
    }

    #[test]
    fn test_now_variant_inserts_marker() {
        let out = add_timestamp_comment(&add_timestamp_comment("<body></body>"));
        assert_eq!(out.matches(COMMENT_MARKER).count(), 2);
        assert!(out.ends_with("</body>"));
    }
}
