//! Implements the `Remote` trait with GitHub Pages for reads and the GitHub contents API for
//! writes.

use crate::api::{Remote, RemoteError, Token};
use crate::{Config, Result};
use anyhow::Context;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// GitHub rejects API requests without a user agent.
const USER_AGENT: &str = concat!("donation-ledger/", env!("CARGO_PKG_VERSION"));

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// The subset of the contents API response that we need.
#[derive(Debug, Deserialize)]
struct ContentInfo {
    sha: String,
}

/// Body of the contents API `PUT` request.
#[derive(Debug, Serialize)]
struct ReplaceRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
}

/// Error body returned by the GitHub API.
#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// Reads from `<pages_url>/<path>` and writes to
/// `<api_url>/repos/<owner>/<repo>/contents/<path>`.
/// Clone is cheap - reqwest::Client uses Arc internally.
#[derive(Debug, Clone)]
pub struct GitHubRemote {
    client: Client,
    pages_url: Url,
    api_url: Url,
    owner: String,
    repo: String,
}

impl GitHubRemote {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_urls(
            config.pages_url().clone(),
            config.api_url().clone(),
            config.owner(),
            config.repo(),
        )
    }

    pub fn with_urls(
        pages_url: Url,
        api_url: Url,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("Unable to build the HTTP client")?;
        Ok(Self {
            client,
            pages_url: with_trailing_slash(pages_url),
            api_url: with_trailing_slash(api_url),
            owner: owner.into(),
            repo: repo.into(),
        })
    }

    /// The published URL of `path` with a `t=<millis>` cache buster.
    fn pages_file_url(&self, path: &str) -> std::result::Result<Url, RemoteError> {
        let mut url = join(&self.pages_url, path)?;
        url.query_pairs_mut()
            .append_pair("t", &chrono::Utc::now().timestamp_millis().to_string());
        Ok(url)
    }

    fn contents_url(&self, path: &str) -> std::result::Result<Url, RemoteError> {
        join(
            &self.api_url,
            &format!("repos/{}/{}/contents/{}", self.owner, self.repo, trim(path)),
        )
    }
}

#[async_trait::async_trait]
impl Remote for GitHubRemote {
    async fn fetch(&self, path: &str) -> std::result::Result<String, RemoteError> {
        let url = self.pages_file_url(path)?;
        trace!("GET {url}");
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache")
            .send()
            .await?;
        let response = check(response).await?;
        Ok(response.text().await?)
    }

    async fn content_id(
        &self,
        path: &str,
        token: &Token,
    ) -> std::result::Result<String, RemoteError> {
        let url = self.contents_url(path)?;
        trace!("GET {url}");
        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("token {}", token.secret()))
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .send()
            .await?;
        let response = check(response).await?;
        let info: ContentInfo = response
            .json()
            .await
            .map_err(|e| RemoteError::InvalidResponse(format!("missing sha: {e}")))?;
        debug!("Current sha of {path} is {}", info.sha);
        Ok(info.sha)
    }

    async fn replace(
        &self,
        path: &str,
        token: &Token,
        content: &str,
        content_id: &str,
        message: &str,
    ) -> std::result::Result<(), RemoteError> {
        let url = self.contents_url(path)?;
        trace!("PUT {url}");
        let body = ReplaceRequest {
            message,
            content: B64.encode(content.as_bytes()),
            sha: content_id,
        };
        let response = self
            .client
            .put(url)
            .header(header::AUTHORIZATION, format!("token {}", token.secret()))
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .json(&body)
            .send()
            .await?;
        check(response).await?;
        debug!("Replaced {path} on GitHub");
        Ok(())
    }
}

/// Turns a non-success response into a `RemoteError`, preferring GitHub's `message` field.
async fn check(response: Response) -> std::result::Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());
    let message = serde_json::from_str::<ApiMessage>(&body)
        .map(|m| m.message)
        .unwrap_or(body);
    Err(RemoteError::from_status(status, &message))
}

fn join(base: &Url, path: &str) -> std::result::Result<Url, RemoteError> {
    base.join(trim(path))
        .map_err(|e| RemoteError::InvalidResponse(format!("cannot build a URL for '{path}': {e}")))
}

fn trim(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// `Url::join` replaces the last path segment unless the base ends with a slash.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
