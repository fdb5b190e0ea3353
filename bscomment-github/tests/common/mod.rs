//! In-process stand-in for the GitHub endpoints the editor uses.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

pub const TOKEN: &str = "gho_test_token";
pub const CLIENT_ID: &str = "Iv1.test";
pub const INITIAL_SHA: &str = "sha-1";
pub const PAGE: &str = "<html>\n<body>\n<p>hello</p>\n</body>\n</html>\n";

/// A commit accepted by the fake.
#[derive(Debug, Clone)]
pub struct RecordedCommit {
    pub path: String,
    pub message: String,
    pub content: String,
    pub sha: String,
}

#[derive(Debug)]
pub struct FakeState {
    /// Pending responses to hand out before granting a token.
    pub pending_polls: u32,
    /// OAuth error returned once pending polls run out, instead of a token.
    pub poll_error: Option<&'static str>,
    pub token_requests: u32,
    pub device_code_forms: Vec<HashMap<String, String>>,
    pub sha: String,
    pub content: String,
    pub commits: Vec<RecordedCommit>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            pending_polls: 0,
            poll_error: None,
            token_requests: 0,
            device_code_forms: Vec::new(),
            sha: INITIAL_SHA.to_string(),
            content: PAGE.to_string(),
            commits: Vec::new(),
        }
    }
}

pub type Shared = Arc<Mutex<FakeState>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn device_code(State(state): State<Shared>, Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    state.lock().unwrap().device_code_forms.push(form);
    Json(json!({
        "device_code": "dc-123",
        "user_code": "WDJB-MJHT",
        "verification_uri": "https://github.com/login/device",
        "expires_in": 60,
        "interval": 0
    }))
}

async fn access_token(State(state): State<Shared>, Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.token_requests += 1;

    if form.get("grant_type").map(String::as_str) != Some("urn:ietf:params:oauth:grant-type:device_code")
        || form.get("client_id").map(String::as_str) != Some(CLIENT_ID)
    {
        return Json(json!({ "error": "incorrect_client_credentials", "error_description": "bad client" }));
    }
    if state.pending_polls > 0 {
        state.pending_polls -= 1;
        return Json(json!({ "error": "authorization_pending" }));
    }
    if let Some(code) = state.poll_error {
        return Json(json!({ "error": code }));
    }
    Json(json!({ "access_token": TOKEN, "token_type": "bearer", "scope": "repo,user:email" }))
}

async fn user(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Bad credentials");
    }
    Json(json!({
        "login": "octocat",
        "id": 583_231,
        "name": "The Octocat",
        "email": null,
        "avatar_url": "https://avatars.githubusercontent.com/u/583231"
    }))
    .into_response()
}

async fn get_contents(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((owner, repo, path)): Path<(String, String, String)>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Bad credentials");
    }
    match path.as_str() {
        "locked.html" => return error(StatusCode::FORBIDDEN, "Resource not accessible by integration"),
        "limited.html" => return error(StatusCode::FORBIDDEN, "API rate limit exceeded for user ID 1."),
        "docs/my page.html" | "index.html" => {}
        _ => return error(StatusCode::NOT_FOUND, "Not Found"),
    }

    let state = state.lock().unwrap();
    // Wrapped at 60 columns like the real API.
    let encoded = STANDARD.encode(state.content.as_bytes());
    let wrapped = encoded
        .as_bytes()
        .chunks(60)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect::<Vec<_>>()
        .join("\n");

    Json(json!({
        "type": "file",
        "encoding": "base64",
        "path": path,
        "sha": state.sha,
        "content": wrapped,
        "html_url": format!("https://github.com/{owner}/{repo}/blob/main/{path}"),
    }))
    .into_response()
}

async fn put_contents(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Bad credentials");
    }
    if path == "locked.html" {
        return error(StatusCode::FORBIDDEN, "Resource not accessible by integration");
    }

    let mut state = state.lock().unwrap();
    let sha = body["sha"].as_str().unwrap_or_default().to_string();
    if sha != state.sha {
        return error(StatusCode::CONFLICT, &format!("{path} does not match {sha}"));
    }

    let content = STANDARD
        .decode(body["content"].as_str().unwrap_or_default())
        .map(|b| String::from_utf8(b).unwrap())
        .unwrap();
    let message = body["message"].as_str().unwrap_or_default().to_string();

    let new_sha = format!("sha-{}", state.commits.len() + 2);
    state.commits.push(RecordedCommit {
        path: path.clone(),
        message: message.clone(),
        content: content.clone(),
        sha: sha.clone(),
    });
    state.content = content;
    state.sha = new_sha;

    Json(json!({
        "content": { "path": path, "sha": state.sha },
        "commit": {
            "sha": "c0ffee",
            "html_url": "https://github.com/octo/site/commit/c0ffee",
            "message": message,
            "author": { "name": "The Octocat", "email": "octocat@github.com", "date": "2024-05-06T07:08:09Z" }
        }
    }))
    .into_response()
}

/// Relay speaking the `{action}` protocol, backed by the same state.
async fn relay(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    match body["action"].as_str() {
        Some("initiate") => {
            let mut form = HashMap::new();
            form.insert("scope".to_string(), body["scope"].as_str().unwrap_or_default().to_string());
            device_code(State(state), Form(form)).await.into_response()
        }
        Some("poll") => {
            let mut form = HashMap::new();
            form.insert("client_id".to_string(), CLIENT_ID.to_string());
            form.insert(
                "device_code".to_string(),
                body["deviceCode"].as_str().unwrap_or_default().to_string(),
            );
            form.insert(
                "grant_type".to_string(),
                "urn:ietf:params:oauth:grant-type:device_code".to_string(),
            );
            access_token(State(state), Form(form)).await.into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid action. Use \"initiate\" or \"poll\"" })),
        )
            .into_response(),
    }
}

/// Starts the fake on an ephemeral port and returns its base URL.
pub async fn serve(state: Shared) -> String {
    let app = Router::new()
        .route("/login/device/code", post(device_code))
        .route("/login/oauth/access_token", post(access_token))
        .route("/user", get(user))
        .route(
            "/repos/{owner}/{repo}/contents/{*path}",
            get(get_contents).put(put_contents),
        )
        .route("/relay", post(relay))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
