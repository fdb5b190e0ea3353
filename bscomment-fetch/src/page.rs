//! Loading metadata from a published page.

use bscomment_core::{ParsedMetadata, read_metadata, validate_url};
use tracing::{debug, instrument, warn};

use crate::error::PageError;
use crate::http::HttpClient;

/// Downloads an HTML page and returns its body.
#[instrument(skip(client))]
pub async fn fetch_html(client: &HttpClient, url: &str) -> Result<String, PageError> {
    let url = validate_url(url)?;

    let response = client
        .get(url.as_str())
        .await
        .map_err(PageError::Unreachable)?;

    let status = response.status();
    if !status.is_success() {
        warn!(status = %status, "Page fetch failed");
        return Err(PageError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| PageError::Unreachable(e.into()))?;
    debug!(len = body.len(), "Fetched page");
    Ok(body)
}

/// Validates the URL, downloads the page, and extracts its metadata.
///
/// Missing or invalid tags are reported as [`PageError::Metadata`].
#[instrument(skip(client))]
pub async fn load_metadata(client: &HttpClient, url: &str) -> Result<ParsedMetadata, PageError> {
    let html = fetch_html(client, url).await?;
    Ok(read_metadata(&html)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, response::Html, routing::get};
    use bscomment_core::{CoreError, ErrorClass, ValidationError};

    const PAGE: &str = r#"<html><head>
        <meta name="markpub:repo" content="https://github.com/acme/site/">
        <meta name="markpub:filepath" content="/index.html">
        <meta name="markpub:generated" content="2024-05-01">
        <meta name="markpub:generator" content="markpub">
        </head><body></body></html>"#;

    async fn serve() -> String {
        let app = Router::new()
            .route("/page.html", get(|| async { Html(PAGE) }))
            .route("/plain.html", get(|| async { Html("<html><body>hi</body></html>") }))
            .route(
                "/bad-repo.html",
                get(|| async { Html(PAGE.replace("github.com/acme/site/", "gitlab.com/acme/site")) }),
            )
            .route("/gone.html", get(|| async { StatusCode::GONE }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_load_metadata_success() {
        let base = serve().await;
        let client = HttpClient::new().unwrap();

        let meta = load_metadata(&client, &format!("{base}/page.html")).await.unwrap();
        assert_eq!(meta.owner, "acme");
        assert_eq!(meta.repo_name, "site");
        assert_eq!(meta.repo_url, "https://github.com/acme/site");
    }

    #[tokio::test]
    async fn test_page_without_metadata() {
        let base = serve().await;
        let client = HttpClient::new().unwrap();

        let err = load_metadata(&client, &format!("{base}/plain.html"))
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::Metadata(CoreError::MetadataNotFound)));
        assert_eq!(err.class(), ErrorClass::Validation);
    }

    #[tokio::test]
    async fn test_page_with_invalid_repo() {
        let base = serve().await;
        let client = HttpClient::new().unwrap();

        let err = load_metadata(&client, &format!("{base}/bad-repo.html"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PageError::Metadata(CoreError::Validation(ValidationError::NotGitHub(_)))
        ));
        assert_eq!(err.class(), ErrorClass::Validation);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let base = serve().await;
        let client = HttpClient::new().unwrap();

        let err = fetch_html(&client, &format!("{base}/gone.html"))
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::Status { status: 410, .. }));
        assert_eq!(err.to_string(), "Failed to fetch HTML: 410 Gone");
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_network() {
        let client = HttpClient::new().unwrap();
        let err = fetch_html(&client, "ftp://example.com/x.html").await.unwrap_err();
        assert!(matches!(
            err,
            PageError::Validation(ValidationError::UnsupportedScheme(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpClient::new().unwrap();
        let err = fetch_html(&client, &format!("http://{addr}/x.html"))
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::Unreachable(_)));
        assert_eq!(err.class(), ErrorClass::Network);
    }
}
