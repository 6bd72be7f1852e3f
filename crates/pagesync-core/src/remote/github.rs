//! Source-control backend
//!
//! Publishes the content file through the GitHub contents API. Replacing a
//! file requires the current blob sha (optimistic concurrency); creating one
//! omits it. Freshness comes from the latest commit touching the path, since
//! the contents API itself carries no modification time.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::DateTime;
use serde::Deserialize;
use tracing::debug;

use super::{RemoteFileHandle, RemoteStore};
use crate::error::{SyncError, SyncResult};

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("pagesync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ContentsResource {
    name: String,
    path: String,
    sha: String,
    size: u64,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: CommitSignature,
}

#[derive(Debug, Deserialize)]
struct CommitSignature {
    date: String,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: ContentsResource,
    commit: PutCommit,
}

#[derive(Debug, Deserialize)]
struct PutCommit {
    #[serde(default)]
    committer: Option<CommitSignature>,
}

fn parse_commit_date(raw: &str) -> u64 {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.timestamp_millis() as u64)
        .unwrap_or(0)
}

/// Decode the newline-wrapped base64 the contents API returns
fn decode_content(raw: &str) -> SyncResult<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64.decode(compact).map_err(|e| SyncError::Validation {
        reason: format!("invalid base64 content: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| SyncError::Validation {
        reason: format!("content is not valid UTF-8: {}", e),
    })
}

/// GitHub contents-API remote store
#[derive(Debug)]
pub struct GithubStore {
    client: reqwest::Client,
    token: String,
    owner: String,
    repo: String,
    path: String,
    branch: String,
    api_base: String,
}

impl GithubStore {
    pub fn new(token: String, owner: String, repo: String, path: String, branch: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            owner,
            repo,
            path,
            branch,
            api_base: API_BASE.to_string(),
        }
    }

    /// Point the adapter at a different API host (tests, GitHub Enterprise)
    pub fn with_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_base, self.owner, self.repo, path, self.branch
        )
    }

    async fn get(&self, url: &str) -> SyncResult<reqwest::Response> {
        Ok(self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?)
    }

    /// Fetch the current file resource, `Ok(None)` when absent
    async fn fetch_contents(&self, path: &str) -> SyncResult<Option<ContentsResource>> {
        let response = self.get(&self.contents_url(path)).await?;

        let status = response.status().as_u16();
        if status == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status, "contents fetch", body));
        }

        Ok(Some(response.json().await?))
    }

    /// Date of the latest commit touching the path, in epoch ms
    async fn latest_commit_ms(&self, path: &str) -> SyncResult<u64> {
        let url = format!(
            "{}/repos/{}/{}/commits?path={}&sha={}&per_page=1",
            self.api_base, self.owner, self.repo, path, self.branch
        );
        let response = self.get(&url).await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status, "commit lookup", body));
        }

        let commits: Vec<CommitEntry> = response.json().await?;
        Ok(commits
            .first()
            .map(|c| parse_commit_date(&c.commit.committer.date))
            .unwrap_or(0))
    }

    async fn handle_for(&self, resource: &ContentsResource) -> SyncResult<RemoteFileHandle> {
        let modified_at = self.latest_commit_ms(&resource.path).await?;
        Ok(RemoteFileHandle {
            id: resource.path.clone(),
            name: resource.name.clone(),
            modified_at,
            size: Some(resource.size),
        })
    }
}

#[async_trait]
impl RemoteStore for GithubStore {
    async fn metadata(&self, file_id: &str) -> SyncResult<Option<RemoteFileHandle>> {
        // File ids are repository paths for this backend
        let Some(resource) = self.fetch_contents(file_id).await? else {
            return Ok(None);
        };
        Ok(Some(self.handle_for(&resource).await?))
    }

    async fn search_by_name(&self, name: &str) -> SyncResult<Vec<RemoteFileHandle>> {
        // The contents API has no name search; the configured path is the
        // only artifact this backend manages.
        let file_name = self.path.rsplit('/').next().unwrap_or(&self.path);
        if name != file_name && name != self.path {
            return Ok(Vec::new());
        }
        Ok(self.metadata(&self.path).await?.into_iter().collect())
    }

    async fn download(&self, file_id: &str) -> SyncResult<String> {
        let resource = self
            .fetch_contents(file_id)
            .await?
            .ok_or_else(|| SyncError::NotFound {
                what: format!("repository file '{}'", file_id),
            })?;

        let raw = resource.content.ok_or_else(|| SyncError::Validation {
            reason: format!("contents API returned no body for '{}'", file_id),
        })?;
        decode_content(&raw)
    }

    async fn upload(
        &self,
        file_id: Option<&str>,
        _name: &str,
        body: &str,
        description: &str,
    ) -> SyncResult<RemoteFileHandle> {
        let path = file_id.unwrap_or(&self.path).to_string();

        // Current blob sha is required to replace; absent means create
        let existing_sha = self
            .fetch_contents(&path)
            .await?
            .map(|resource| resource.sha);

        let mut payload = serde_json::json!({
            "message": description,
            "content": BASE64.encode(body.as_bytes()),
            "branch": self.branch,
        });
        if let Some(ref sha) = existing_sha {
            payload["sha"] = serde_json::Value::String(sha.clone());
        }

        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.owner, self.repo, path
        );
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status, "contents update", body));
        }

        let put: PutResponse = response.json().await?;
        debug!(
            "{} {} at sha {}",
            if existing_sha.is_some() { "Updated" } else { "Created" },
            path,
            put.content.sha
        );

        let modified_at = put
            .commit
            .committer
            .as_ref()
            .map(|c| parse_commit_date(&c.date))
            .unwrap_or(0);
        Ok(RemoteFileHandle {
            id: put.content.path,
            name: put.content.name,
            modified_at,
            size: Some(put.content.size),
        })
    }
}
