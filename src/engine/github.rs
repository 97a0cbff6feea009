//! GitHub Repository Store
//! Branch and content reads against the GitHub REST API

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const GITHUB_API_URL: &str = "https://api.github.com";

const CLIENT_USER_AGENT: &str = concat!("deploy-lock/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid repository '{0}': expected OWNER/NAME")]
    InvalidRepo(String),
}

impl GitHubError {
    /// True for the store's "resource absent" signal (HTTP 404).
    pub fn is_not_found(&self) -> bool {
        matches!(self, GitHubError::NotFound(_))
    }
}

/// Repository scope for every store request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }
}

impl FromStr for RepoRef {
    type Err = GitHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(GitHubError::InvalidRepo(s.to_string())),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    pub commit: CommitRef,
    #[serde(default)]
    pub protected: bool,
}

/// A file as returned by the contents endpoint. `content` is in the
/// transport encoding named by `encoding` (base64 for regular files) and is
/// `None` when the payload carried no file body (a directory listing, a
/// submodule, or a body that is not a contents object at all).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileContent {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl FileContent {
    /// Interpret a successful contents response. Shape mismatches are kept as
    /// a file without content so callers can treat them as unreadable.
    pub fn from_payload(path: &str, body: &str) -> Self {
        let mut file = match serde_json::from_str::<Value>(body) {
            Ok(Value::Array(_)) => Self {
                kind: Some("dir".to_string()),
                ..Self::default()
            },
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        };
        if file.path.is_empty() {
            file.path = path.to_string();
        }
        file
    }
}

/// Read-only view of a versioned-object store.
#[async_trait]
pub trait RepoStore: Send + Sync {
    async fn get_branch(&self, repo: &RepoRef, branch: &str) -> Result<BranchInfo, GitHubError>;

    async fn get_content(
        &self,
        repo: &RepoRef,
        path: &str,
        reference: &str,
    ) -> Result<FileContent, GitHubError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct GitHubClient {
    token: Option<String>,
    api_url: String,
    http_client: reqwest::Client,
}

impl GitHubClient {
    pub fn new() -> Self {
        Self {
            token: None,
            api_url: GITHUB_API_URL.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_token(token: String) -> Self {
        Self {
            token: Some(token),
            ..Self::new()
        }
    }

    /// Point the client at a different API root (GitHub Enterprise, test servers).
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, GitHubError> {
        self.http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http_client
            .get(url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        match self.token.as_deref() {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    /// Send a GET and classify the status. Only 2xx responses come back.
    async fn send(
        &self,
        url: &str,
        what: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, GitHubError> {
        tracing::debug!(url, "GET {}", what);
        let response = self.request(url).query(query).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(GitHubError::NotFound(what.to_string()));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(text);
            return Err(GitHubError::Api {
                status: status.as_u16(),
                message: format!("Failed to get {}: {}", what, message),
            });
        }

        Ok(response)
    }
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepoStore for GitHubClient {
    async fn get_branch(&self, repo: &RepoRef, branch: &str) -> Result<BranchInfo, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/branches/{}",
            self.api_url, repo.owner, repo.name, branch
        );
        let response = self.send(&url, &format!("branch {}", branch), &[]).await?;
        Ok(response.json().await?)
    }

    async fn get_content(
        &self,
        repo: &RepoRef,
        path: &str,
        reference: &str,
    ) -> Result<FileContent, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url,
            repo.owner,
            repo.name,
            path.trim_start_matches('/')
        );
        let response = self
            .send(&url, &format!("{}@{}", path, reference), &[("ref", reference)])
            .await?;
        let body = response.text().await?;
        Ok(FileContent::from_payload(path, &body))
    }
}
