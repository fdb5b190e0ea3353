//! Serde shape tests against payloads GitHub actually returns.

use super::*;

#[test]
fn test_parse_device_flow_session() {
    let json = r#"{
        "device_code": "3584d83530557fdd1f46af8289938c8ef79f9dc5",
        "user_code": "WDJB-MJHT",
        "verification_uri": "https://github.com/login/device",
        "expires_in": 900,
        "interval": 5
    }"#;

    let session: DeviceFlowSession = serde_json::from_str(json).unwrap();
    assert_eq!(session.user_code, "WDJB-MJHT");
    assert_eq!(session.expires_in, 900);
    assert_eq!(session.interval, 5);
}

#[test]
fn test_parse_access_token_without_optional_fields() {
    let token: AccessToken = serde_json::from_str(r#"{"access_token":"gho_abc"}"#).unwrap();
    assert_eq!(token.access_token, "gho_abc");
    assert!(token.scope.is_empty());
}

#[test]
fn test_parse_user_with_nulls() {
    let json = r#"{
        "login": "octocat",
        "id": 1,
        "avatar_url": "https://github.com/images/error/octocat_happy.gif",
        "name": null,
        "email": null,
        "type": "User"
    }"#;

    let user: GitHubUser = serde_json::from_str(json).unwrap();
    assert_eq!(user.login, "octocat");
    assert_eq!(user.display_name(), "octocat");
}

#[test]
fn test_user_display_name_prefers_name() {
    let user = GitHubUser {
        login: "octocat".into(),
        id: 1,
        name: Some("The Octocat".into()),
        email: None,
        avatar_url: None,
    };
    assert_eq!(user.display_name(), "The Octocat");
}

#[test]
fn test_parse_commit_info() {
    let json = r#"{
        "sha": "7638417db6d59f3c431d3e1f261cc637155684cd",
        "html_url": "https://github.com/octocat/Hello-World/git/commit/7638417",
        "author": {"name": "Monalisa", "email": "mona@github.com", "date": "2014-11-07T22:01:45Z"},
        "message": "my commit message"
    }"#;

    let commit: CommitInfo = serde_json::from_str(json).unwrap();
    assert_eq!(commit.message, "my commit message");
    assert_eq!(commit.author.unwrap().name, "Monalisa");
}

#[test]
fn test_parsed_metadata_camel_case() {
    let meta = ParsedMetadata {
        repo_url: "https://github.com/acme/site".into(),
        owner: "acme".into(),
        repo_name: "site".into(),
        file_path: "/docs/index.html".into(),
        generated: "2024-01-01".into(),
        generator: "markpub 1.0".into(),
    };

    let value = serde_json::to_value(&meta).unwrap();
    assert_eq!(value["repoName"], "site");
    assert_eq!(value["filePath"], "/docs/index.html");
    assert_eq!(meta.full_name(), "acme/site");
    assert_eq!(meta.contents_path(), "docs/index.html");
}

#[test]
fn test_access_level_scopes() {
    assert_eq!(AccessLevel::Public.scope(), "public_repo user:email");
    assert_eq!(AccessLevel::Full.scope(), "repo user:email");
    assert_eq!("PUBLIC".parse::<AccessLevel>(), Ok(AccessLevel::Public));
    assert!("admin".parse::<AccessLevel>().is_err());
}

#[test]
fn test_auth_token_debug_redacts() {
    let auth = AuthToken {
        token: "gho_secret".into(),
        user: GitHubUser {
            login: "octocat".into(),
            id: 1,
            name: None,
            email: None,
            avatar_url: None,
        },
    };
    let printed = format!("{auth:?}");
    assert!(!printed.contains("gho_secret"));
    assert!(printed.contains("octocat"));
}
