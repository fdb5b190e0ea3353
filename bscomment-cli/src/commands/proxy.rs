//! Proxy command - device-flow relay.
//!
//! Accepts `{action: "initiate" | "poll", scope?, deviceCode?}` on `POST /`,
//! adds the configured client id, forwards to GitHub, and relays the JSON
//! reply with GitHub's status code. CORS is permissive so browser clients can
//! use it without knowing the client id.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use bscomment_fetch::HttpClient;
use bscomment_github::{DEVICE_CODE_GRANT_TYPE, ProxyRequest};
use clap::Args;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::Cli;
use crate::context::AppContext;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8787;

/// Scope requested when `initiate` carries none.
const DEFAULT_SCOPE: &str = "repo user:email";

/// Arguments for the proxy command.
#[derive(Args)]
pub struct ProxyArgs {
    /// Port to listen on.
    #[arg(long, short, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}

// ============================================================================
// Router
// ============================================================================

/// Relay configuration shared by all requests.
pub struct ProxyState {
    http: HttpClient,
    client_id: Option<String>,
    oauth_base: String,
}

impl ProxyState {
    /// Creates the relay state.
    pub fn new(http: HttpClient, client_id: Option<String>, oauth_base: impl Into<String>) -> Self {
        Self {
            http,
            client_id,
            oauth_base: oauth_base.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Builds the relay router with permissive CORS.
pub fn build_router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/", post(relay).fallback(method_not_allowed))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn relay(State(state): State<Arc<ProxyState>>, body: Bytes) -> Response {
    let request: ProxyRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ProxyRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    };

    let ProxyRequest {
        action,
        scope,
        device_code,
    } = request;

    if action != "initiate" && action != "poll" {
        return error_response(
            StatusCode::BAD_REQUEST,
            r#"Invalid action. Use "initiate" or "poll""#,
        );
    }

    let Some(client_id) = state.client_id.as_deref() else {
        warn!("Relay request without a configured client id");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "GitHub OAuth client id is not configured",
        );
    };

    let (path, body) = if action == "initiate" {
        let scope = scope
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SCOPE.to_string());
        ("/login/device/code", json!({ "client_id": client_id, "scope": scope }))
    } else {
        (
            "/login/oauth/access_token",
            json!({
                "client_id": client_id,
                "device_code": device_code.unwrap_or_default(),
                "grant_type": DEVICE_CODE_GRANT_TYPE,
            }),
        )
    };

    debug!(%action, "Relaying device-flow request");
    match forward(&state, path, &body).await {
        Ok((status, value)) => (status, Json(value)).into_response(),
        Err(e) => {
            warn!(error = %e, %action, "Relay failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
        }
    }
}

async fn forward(state: &ProxyState, path: &str, body: &Value) -> Result<(StatusCode, Value)> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let url = format!("{}{}", state.oauth_base, path);
    let response = state.http.post_json(&url, headers, body).await?;

    let status = StatusCode::from_u16(response.status().as_u16())?;
    let text = response.text().await?;
    let value = serde_json::from_str(&text)
        .with_context(|| format!("GitHub returned a non-JSON response (HTTP {status})"))?;

    Ok((status, value))
}

// ============================================================================
// Server
// ============================================================================

/// Runs the proxy command.
pub async fn run(args: &ProxyArgs, _cli: &Cli) -> Result<()> {
    let ctx = AppContext::load().await?;

    if ctx.settings.client_id.is_none() {
        warn!("No client id configured; every relay request will fail");
    }

    let state = Arc::new(ProxyState::new(
        ctx.http.clone(),
        ctx.settings.client_id.clone(),
        ctx.settings.oauth_base.clone(),
    ));
    let app = build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(%addr, oauth_base = %ctx.settings.oauth_base, "Device-flow relay listening");
    println!("Device-flow relay listening on http://{addr}/");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Relay shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}

// ============================================================================
// Tests
// ============================================================================
