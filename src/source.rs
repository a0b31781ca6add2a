//! Loading redirect rules from a local file or an HTTP(S) endpoint.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::types::error::S3RedirectError;
use crate::types::{RedirectRule, RedirectSource};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Read and validate the rules of `source`.
///
/// Every failure (unreadable source, non-success HTTP status, malformed
/// entries) is an [`S3RedirectError::InvalidRedirects`].
pub async fn load_redirect_rules(source: &RedirectSource) -> Result<Vec<RedirectRule>> {
    let body = match source {
        RedirectSource::File(path) => read_file(path).await,
        RedirectSource::Url(url) => fetch_url(url).await,
    }
    .map_err(|e| invalid_redirects(source, e))?;

    let rules = parse_redirect_rules(&body).map_err(|e| invalid_redirects(source, e))?;

    info!(source = %source, rules = rules.len(), "redirect rules loaded.");
    Ok(rules)
}

/// Parse a JSON array of rules.
///
/// ```
/// use s3redirect_rs::source::parse_redirect_rules;
///
/// let rules = parse_redirect_rules(br#"[{"location": "/a", "redirect": "/b"}]"#).unwrap();
/// assert_eq!(rules[0].redirect, "/b");
/// ```
pub fn parse_redirect_rules(body: &[u8]) -> Result<Vec<RedirectRule>> {
    serde_json::from_slice::<Vec<RedirectRule>>(body)
        .context("redirects must be a JSON array of {location, redirect, pattern?} objects")
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    debug!(path = %path.display(), "reading redirects file.");
    tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

async fn fetch_url(url: &str) -> Result<Vec<u8>> {
    debug!(url, "fetching redirects.");
    let client = Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to create HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .context("failed to send request")?
        .error_for_status()
        .context("redirects request failed")?;

    let body = response
        .bytes()
        .await
        .context("failed to read response body")?;
    Ok(body.to_vec())
}

fn invalid_redirects(source: &RedirectSource, e: anyhow::Error) -> anyhow::Error {
    anyhow::Error::new(S3RedirectError::InvalidRedirects(format!(
        "{source}: {e:#}"
    )))
}
