//! CLI output formatting tests.
//!
//! These tests verify that CLI output is correctly formatted for both
//! text and JSON output modes.

fn metadata() -> bscomment_core::ParsedMetadata {
    bscomment_core::ParsedMetadata {
        repo_url: "https://github.com/acme/site".into(),
        owner: "acme".into(),
        repo_name: "site".into(),
        file_path: "/docs/index.html".into(),
        generated: "2024-01-15T10:30:00Z".into(),
        generator: "markpub 1.2".into(),
    }
}

fn commit() -> bscomment_core::CommitInfo {
    bscomment_core::CommitInfo {
        sha: "0123456789abcdef".into(),
        html_url: "https://github.com/acme/site/commit/0123456789abcdef".into(),
        message: "bsComment Editor: Updated /docs/index.html".into(),
        author: Some(bscomment_core::CommitPerson {
            name: "Mona".into(),
            email: "mona@example.com".into(),
            date: None,
        }),
    }
}

#[cfg(test)]
mod text_formatter_tests {
    use super::super::text::TextFormatter;
    use super::{commit, metadata};
    use bscomment_core::{AuthToken, DeviceFlowSession, ErrorClass, GitHubUser, Recovery, Screen, WizardError};
    use bscomment_github::Preview;

    #[test]
    fn test_metadata_fields() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_metadata(&metadata());

        assert!(output.contains("Repository: acme/site"));
        assert!(output.contains("File:       /docs/index.html"));
        assert!(output.contains("markpub 1.2"));
    }

    #[test]
    fn test_device_prompt_shows_code_and_uri() {
        let formatter = TextFormatter::new(false);
        let session = DeviceFlowSession {
            device_code: "3584d83530557fdd1f46af8289938c8ef79f9dc5".into(),
            user_code: "WDJB-MJHT".into(),
            verification_uri: "https://github.com/login/device".into(),
            expires_in: 900,
            interval: 5,
        };
        let output = formatter.format_device_prompt(&session);

        assert!(output.contains("WDJB-MJHT"));
        assert!(output.contains("https://github.com/login/device"));
        assert!(output.contains("15 minutes"));
        assert!(!output.contains("3584d835"), "device code must not be shown");
    }

    #[test]
    fn test_user_line_falls_back_to_login() {
        let formatter = TextFormatter::new(false);
        let mut auth = AuthToken {
            token: "gho_x".into(),
            user: GitHubUser {
                login: "octocat".into(),
                id: 1,
                name: None,
                email: None,
                avatar_url: None,
            },
        };
        assert_eq!(formatter.format_user(&auth), "Signed in as octocat");

        auth.user.name = Some("The Octocat".into());
        assert_eq!(formatter.format_user(&auth), "Signed in as octocat (The Octocat)");
    }

    #[test]
    fn test_preview_highlights_added_line() {
        let preview = Preview {
            first_line: 9,
            comment_index: 1,
            lines: vec![
                "<p>end</p>".into(),
                "<!-- bsComment Editor: Updated 2024-01-15T10:30:00.000Z -->".into(),
                "</body>".into(),
            ],
        };

        let plain = TextFormatter::new(false).format_preview(&preview);
        assert_eq!(plain, preview.render());

        let colored = TextFormatter::new(true).format_preview(&preview);
        let added = colored.lines().nth(1).unwrap();
        assert!(added.starts_with("\x1b[32m"));
        assert!(added.contains("+ <!-- bsComment Editor"));
    }

    #[test]
    fn test_commit_summary() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_commit(&metadata(), &commit());

        assert!(output.contains("Updated /docs/index.html"));
        assert!(output.contains("Commit: 0123456 in acme/site"));
        assert!(output.contains("/commit/0123456789abcdef"));
    }

    #[test]
    fn test_error_line() {
        let formatter = TextFormatter::new(false);
        let error = WizardError {
            message: "File not found".into(),
            class: ErrorClass::NotFound,
            recovery: Recovery::StartOver,
            origin: Screen::EditConfirmation,
        };
        assert_eq!(formatter.format_error(&error), "✗ [not found] File not found");
    }

    #[test]
    fn test_header_rule() {
        let formatter = TextFormatter::new(false);
        let header = formatter.header("Metadata");
        assert_eq!(header.lines().nth(1).unwrap().chars().count(), 40);
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::{AuthStatusOutput, EditOutput, JsonFormatter};
    use super::{commit, metadata};
    use bscomment_core::{AuthToken, GitHubUser};

    #[test]
    fn test_edit_output_fields() {
        let metadata = metadata();
        let commit = commit();
        let output = EditOutput::new("https://acme.github.io/site/", &metadata, &commit);

        let json = JsonFormatter::new(false).format(&output).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["repository"], "acme/site");
        assert_eq!(value["filePath"], "/docs/index.html");
        assert_eq!(value["commitSha"], "0123456789abcdef");
        assert_eq!(value["author"], "Mona");
    }

    #[test]
    fn test_auth_status_signed_out() {
        let output = AuthStatusOutput::new("memory", None);
        let value = serde_json::to_value(&output).unwrap();

        assert_eq!(value["signedIn"], false);
        assert_eq!(value["backend"], "memory");
        assert!(value.get("login").is_none());
    }

    #[test]
    fn test_auth_status_never_includes_token() {
        let auth = AuthToken {
            token: "gho_secret".into(),
            user: GitHubUser {
                login: "octocat".into(),
                id: 1,
                name: Some("The Octocat".into()),
                email: None,
                avatar_url: None,
            },
        };
        let json = JsonFormatter::new(true)
            .format(&AuthStatusOutput::new("keychain", Some(&auth)))
            .unwrap();

        assert!(json.contains("octocat"));
        assert!(!json.contains("gho_secret"));
    }
}
